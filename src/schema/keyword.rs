//! Compiled schema nodes and their keywords.

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use super::format::Format;
use super::value::InstanceType;

/// Index of a node inside a [`SchemaGraph`](super::graph::SchemaGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

/// What happens to properties not covered by `properties` or `patternProperties`.
#[derive(Debug, Clone)]
pub(crate) enum AdditionalPolicy {
    Deny,
    Schema(NodeId),
}

/// A `dependencies` entry.
#[derive(Debug, Clone)]
pub(crate) enum Dependency {
    Properties(Vec<String>),
    Schema(NodeId),
}

/// A discriminator with its resolved lookup table.
#[derive(Debug, Clone)]
pub(crate) struct Discriminator {
    pub(crate) property_name: String,
    /// Discriminator value to concrete node.
    pub(crate) mapping: IndexMap<String, NodeId>,
}

impl Discriminator {
    pub(crate) fn lookup(&self, value: &str) -> Option<NodeId> {
        self.mapping.get(value).copied()
    }
}

/// The closed set of keywords this crate evaluates.
#[derive(Debug, Clone)]
pub(crate) enum Keyword {
    Type(Vec<InstanceType>),
    Format(Format),
    Enum(Vec<Value>),
    Minimum { limit: BigDecimal, exclusive: bool },
    Maximum { limit: BigDecimal, exclusive: bool },
    MultipleOf(BigDecimal),
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
    MinItems(usize),
    MaxItems(usize),
    UniqueItems,
    Items(NodeId),
    Contains(NodeId),
    MinProperties(usize),
    MaxProperties(usize),
    Required(Vec<String>),
    Properties(IndexMap<String, NodeId>),
    PatternProperties(Vec<(Regex, NodeId)>),
    AdditionalProperties(AdditionalPolicy),
    Dependencies(IndexMap<String, Dependency>),
    AllOf(Vec<NodeId>),
    AnyOf(Vec<NodeId>),
    OneOf(Vec<NodeId>),
    Not(NodeId),
    Reference(NodeId),
}

/// One compiled schema object.
///
/// Keywords keep the declaration order of the source schema.
#[derive(Debug, Clone, Default)]
pub(crate) struct SchemaNode {
    pub(crate) keywords: Vec<Keyword>,
    pub(crate) nullable: bool,
    pub(crate) read_only: bool,
    pub(crate) write_only: bool,
    pub(crate) discriminator: Option<Discriminator>,
    /// The `$ref` this node was compiled from, if any.
    pub(crate) name: Option<String>,
}

impl SchemaNode {
    /// Returns the target if this node is nothing but a `$ref`.
    pub(crate) fn reference_target(&self) -> Option<NodeId> {
        match self.keywords.as_slice() {
            [Keyword::Reference(target)] => Some(*target),
            _ => None,
        }
    }

    pub(crate) fn properties(&self) -> Option<&IndexMap<String, NodeId>> {
        self.keywords.iter().find_map(|k| match k {
            Keyword::Properties(props) => Some(props),
            _ => None,
        })
    }

    pub(crate) fn pattern_properties(&self) -> Option<&[(Regex, NodeId)]> {
        self.keywords.iter().find_map(|k| match k {
            Keyword::PatternProperties(patterns) => Some(patterns.as_slice()),
            _ => None,
        })
    }

    /// True when `oneOf` or `anyOf` is present; they dispatch the discriminator themselves.
    pub(crate) fn has_alternatives(&self) -> bool {
        self.keywords
            .iter()
            .any(|k| matches!(k, Keyword::OneOf(_) | Keyword::AnyOf(_)))
    }
}
