//! Compiles JSON schema objects into the [`SchemaGraph`] arena.
//!
//! Each `$ref` target is compiled once: its node id is reserved before the
//! target's keywords are built, so a reference cycle resolves to the id that
//! is already in flight.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use super::format::Format;
use super::graph::SchemaGraph;
use super::keyword::{AdditionalPolicy, Dependency, Discriminator, Keyword, NodeId, SchemaNode};
use super::value::{decimal_from_number, InstanceType};
use crate::error::BuildError;
use crate::model::ReferenceRegistry;
use crate::validation::ValidatorOptions;

const COMPONENT_SCHEMAS: &str = "#/components/schemas";

pub(crate) struct SchemaCompiler<'r> {
    registry: &'r dyn ReferenceRegistry,
    restrict_additional: bool,
    nodes: Vec<SchemaNode>,
    refs: HashMap<String, NodeId>,
}

impl<'r> SchemaCompiler<'r> {
    pub(crate) fn new(registry: &'r dyn ReferenceRegistry, options: &ValidatorOptions) -> Self {
        Self {
            registry,
            restrict_additional: options.additional_properties_restricted(),
            nodes: Vec::new(),
            refs: HashMap::new(),
        }
    }

    /// Compiles an inline schema and returns its root node.
    pub(crate) fn compile(&mut self, schema: &Value, location: &str) -> Result<NodeId, BuildError> {
        if let Some(reference) = reference_of(schema) {
            let target = self.compile_ref(reference)?;
            return Ok(self.push(SchemaNode {
                keywords: vec![Keyword::Reference(target)],
                ..SchemaNode::default()
            }));
        }
        let id = self.reserve();
        self.nodes[id.0] = self.build(schema, location, id, None)?;
        Ok(id)
    }

    /// Compiles the target of `reference`, once per reference string.
    pub(crate) fn compile_ref(&mut self, reference: &str) -> Result<NodeId, BuildError> {
        if let Some(id) = self.refs.get(reference) {
            return Ok(*id);
        }
        let registry = self.registry;
        let target = registry
            .resolve(reference)
            .ok_or_else(|| BuildError::UnresolvedReference(reference.to_string()))?;

        let id = self.reserve();
        self.refs.insert(reference.to_string(), id);

        let node = match reference_of(target) {
            Some(inner) => SchemaNode {
                keywords: vec![Keyword::Reference(self.compile_ref(inner)?)],
                name: Some(reference.to_string()),
                ..SchemaNode::default()
            },
            None => self.build(target, reference, id, Some(reference))?,
        };
        self.nodes[id.0] = node;
        Ok(id)
    }

    pub(crate) fn finish(self) -> SchemaGraph {
        SchemaGraph::new(self.nodes)
    }

    fn reserve(&mut self) -> NodeId {
        self.push(SchemaNode::default())
    }

    fn push(&mut self, node: SchemaNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn build(
        &mut self,
        schema: &Value,
        location: &str,
        self_id: NodeId,
        name: Option<&str>,
    ) -> Result<SchemaNode, BuildError> {
        let map = match schema {
            Value::Bool(true) => return Ok(SchemaNode::default()),
            Value::Bool(false) => {
                let anything = self.push(SchemaNode::default());
                return Ok(SchemaNode {
                    keywords: vec![Keyword::Not(anything)],
                    ..SchemaNode::default()
                });
            }
            Value::Object(map) => map,
            _ => return Err(invalid(location, "schema must be an object or a boolean")),
        };

        let mut node = SchemaNode {
            name: name.map(str::to_string),
            ..SchemaNode::default()
        };

        for (key, value) in map {
            let at = format!("{}/{}", location, key);
            let keyword = match key.as_str() {
                "type" => Some(Keyword::Type(parse_types(value, &at)?)),
                "format" => value.as_str().map(|f| Keyword::Format(Format::parse(f))),
                "enum" => match value {
                    Value::Array(values) => Some(Keyword::Enum(values.clone())),
                    _ => return Err(invalid(&at, "'enum' must be an array")),
                },
                "minimum" => Some(Keyword::Minimum {
                    limit: decimal(value, &at)?,
                    exclusive: flag(map, "exclusiveMinimum"),
                }),
                "maximum" => Some(Keyword::Maximum {
                    limit: decimal(value, &at)?,
                    exclusive: flag(map, "exclusiveMaximum"),
                }),
                "exclusiveMinimum" => match value {
                    Value::Bool(_) => None,
                    _ => Some(Keyword::Minimum {
                        limit: decimal(value, &at)?,
                        exclusive: true,
                    }),
                },
                "exclusiveMaximum" => match value {
                    Value::Bool(_) => None,
                    _ => Some(Keyword::Maximum {
                        limit: decimal(value, &at)?,
                        exclusive: true,
                    }),
                },
                "multipleOf" => {
                    let divisor = decimal(value, &at)?;
                    if divisor <= BigDecimal::from(0) {
                        return Err(invalid(&at, "'multipleOf' must be greater than 0"));
                    }
                    Some(Keyword::MultipleOf(divisor))
                }
                "minLength" => Some(Keyword::MinLength(count(value, &at)?)),
                "maxLength" => Some(Keyword::MaxLength(count(value, &at)?)),
                "pattern" => Some(Keyword::Pattern(regex(value, &at)?)),
                "minItems" => Some(Keyword::MinItems(count(value, &at)?)),
                "maxItems" => Some(Keyword::MaxItems(count(value, &at)?)),
                "uniqueItems" => (value == &Value::Bool(true)).then_some(Keyword::UniqueItems),
                "items" => match value {
                    Value::Array(_) => {
                        return Err(invalid(&at, "tuple-form 'items' is not supported"))
                    }
                    _ => Some(Keyword::Items(self.compile(value, &at)?)),
                },
                "contains" => Some(Keyword::Contains(self.compile(value, &at)?)),
                "minProperties" => Some(Keyword::MinProperties(count(value, &at)?)),
                "maxProperties" => Some(Keyword::MaxProperties(count(value, &at)?)),
                "required" => Some(Keyword::Required(strings(value, &at)?)),
                "properties" => {
                    let Value::Object(properties) = value else {
                        return Err(invalid(&at, "'properties' must be an object"));
                    };
                    let mut compiled = IndexMap::with_capacity(properties.len());
                    for (property, schema) in properties {
                        let id = self.compile(schema, &format!("{}/{}", at, property))?;
                        compiled.insert(property.clone(), id);
                    }
                    Some(Keyword::Properties(compiled))
                }
                "patternProperties" => {
                    let Value::Object(patterns) = value else {
                        return Err(invalid(&at, "'patternProperties' must be an object"));
                    };
                    let mut compiled = Vec::with_capacity(patterns.len());
                    for (pattern, schema) in patterns {
                        let regex = compile_regex(pattern)?;
                        compiled.push((regex, self.compile(schema, &format!("{}/{}", at, pattern))?));
                    }
                    Some(Keyword::PatternProperties(compiled))
                }
                "additionalProperties" => match value {
                    Value::Bool(true) => None,
                    Value::Bool(false) => Some(Keyword::AdditionalProperties(AdditionalPolicy::Deny)),
                    _ => Some(Keyword::AdditionalProperties(AdditionalPolicy::Schema(
                        self.compile(value, &at)?,
                    ))),
                },
                "dependencies" => {
                    let Value::Object(dependencies) = value else {
                        return Err(invalid(&at, "'dependencies' must be an object"));
                    };
                    let mut compiled = IndexMap::with_capacity(dependencies.len());
                    for (trigger, dependency) in dependencies {
                        let dep_at = format!("{}/{}", at, trigger);
                        let dependency = match dependency {
                            Value::Array(_) => Dependency::Properties(strings(dependency, &dep_at)?),
                            _ => Dependency::Schema(self.compile(dependency, &dep_at)?),
                        };
                        compiled.insert(trigger.clone(), dependency);
                    }
                    Some(Keyword::Dependencies(compiled))
                }
                "allOf" => Some(Keyword::AllOf(self.compile_branches(value, &at)?)),
                "anyOf" => Some(Keyword::AnyOf(self.compile_branches(value, &at)?)),
                "oneOf" => Some(Keyword::OneOf(self.compile_branches(value, &at)?)),
                "not" => Some(Keyword::Not(self.compile(value, &at)?)),
                "nullable" => {
                    node.nullable = value.as_bool().unwrap_or(false);
                    None
                }
                "readOnly" => {
                    node.read_only = value.as_bool().unwrap_or(false);
                    None
                }
                "writeOnly" => {
                    node.write_only = value.as_bool().unwrap_or(false);
                    None
                }
                _ => None,
            };
            if let Some(keyword) = keyword {
                node.keywords.push(keyword);
            }
        }

        if self.restrict_additional && closes_implicitly(map) {
            node.keywords
                .push(Keyword::AdditionalProperties(AdditionalPolicy::Deny));
        }

        if let Some(discriminator) = map.get("discriminator") {
            node.discriminator = Some(self.discriminator(discriminator, map, self_id, name)?);
        }

        Ok(node)
    }

    fn compile_branches(&mut self, value: &Value, location: &str) -> Result<Vec<NodeId>, BuildError> {
        let Value::Array(branches) = value else {
            return Err(invalid(location, "composition keywords take an array of schemas"));
        };
        if branches.is_empty() {
            return Err(invalid(location, "composition keywords need at least one schema"));
        }
        branches
            .iter()
            .enumerate()
            .map(|(i, branch)| self.compile(branch, &format!("{}/{}", location, i)))
            .collect()
    }

    /// Builds the lookup table of a discriminator.
    ///
    /// Entries come from, in priority order: the explicit `mapping`, the
    /// `$ref`ed `oneOf`/`anyOf` branches, the schema itself, and component
    /// schemas that extend it through `allOf`. Implicit entries are keyed by
    /// the last segment of the reference.
    fn discriminator(
        &mut self,
        discriminator: &Value,
        schema: &Map<String, Value>,
        self_id: NodeId,
        name: Option<&str>,
    ) -> Result<Discriminator, BuildError> {
        let property_name = discriminator
            .get("propertyName")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BuildError::MalformedDiscriminator(format!(
                    "'propertyName' is required (at {})",
                    name.unwrap_or("inline schema")
                ))
            })?
            .to_string();

        let mut mapping = IndexMap::new();

        if let Some(explicit) = discriminator.get("mapping") {
            let Value::Object(explicit) = explicit else {
                return Err(BuildError::MalformedDiscriminator(format!(
                    "mapping of '{}' must be an object",
                    property_name
                )));
            };
            for (value, target) in explicit {
                let target = target.as_str().ok_or_else(|| {
                    BuildError::MalformedDiscriminator(format!(
                        "mapping '{}' must name a schema",
                        value
                    ))
                })?;
                let reference = mapping_reference(target)?;
                let id = self.compile_ref(&reference)?;
                mapping.insert(value.clone(), id);
            }
        }

        for keyword in ["oneOf", "anyOf"] {
            let Some(Value::Array(branches)) = schema.get(keyword) else {
                continue;
            };
            for reference in branches.iter().filter_map(reference_of) {
                let id = self.compile_ref(reference)?;
                mapping.entry(short_name(reference).to_string()).or_insert(id);
            }
        }

        if let Some(name) = name {
            mapping.entry(short_name(name).to_string()).or_insert(self_id);

            let registry = self.registry;
            if let Some(Value::Object(components)) = registry.resolve(COMPONENT_SCHEMAS) {
                for (component, candidate) in components {
                    if extends(candidate, name) && !mapping.contains_key(component) {
                        let id = self.compile_ref(&format!("{}/{}", COMPONENT_SCHEMAS, component))?;
                        mapping.insert(component.clone(), id);
                    }
                }
            }
        }

        Ok(Discriminator {
            property_name,
            mapping,
        })
    }
}

fn invalid(location: &str, reason: &str) -> BuildError {
    BuildError::InvalidSchema {
        location: location.to_string(),
        reason: reason.to_string(),
    }
}

/// The `$ref` string if `value` is a reference object.
fn reference_of(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

/// `#/components/schemas/Cat` -> `Cat`.
fn short_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn mapping_reference(target: &str) -> Result<String, BuildError> {
    if target.starts_with('#') {
        Ok(target.to_string())
    } else if target.contains('/') || target.contains('#') {
        Err(BuildError::MalformedDiscriminator(format!(
            "mapping target '{}' is not a local reference",
            target
        )))
    } else {
        Ok(format!("{}/{}", COMPONENT_SCHEMAS, target))
    }
}

/// True when `candidate` lists `reference` among its `allOf` branches.
fn extends(candidate: &Value, reference: &str) -> bool {
    match candidate.get("allOf") {
        Some(Value::Array(branches)) => branches
            .iter()
            .any(|branch| reference_of(branch) == Some(reference)),
        _ => false,
    }
}

/// Object schemas without `additionalProperties` or composition keywords.
fn closes_implicitly(schema: &Map<String, Value>) -> bool {
    if schema.contains_key("additionalProperties")
        || ["allOf", "anyOf", "oneOf"].iter().any(|k| schema.contains_key(*k))
    {
        return false;
    }
    let declares_object = match schema.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    };
    declares_object || schema.contains_key("properties")
}

fn flag(schema: &Map<String, Value>, key: &str) -> bool {
    schema.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn parse_types(value: &Value, location: &str) -> Result<Vec<InstanceType>, BuildError> {
    let names: Vec<&str> = match value {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        _ => return Err(invalid(location, "'type' must be a string or an array")),
    };
    names
        .into_iter()
        .map(|name| {
            InstanceType::parse(name)
                .ok_or_else(|| invalid(location, &format!("unknown type '{}'", name)))
        })
        .collect()
}

fn decimal(value: &Value, location: &str) -> Result<BigDecimal, BuildError> {
    match value {
        Value::Number(n) => {
            decimal_from_number(n).ok_or_else(|| invalid(location, "number is not representable"))
        }
        _ => Err(invalid(location, "expected a number")),
    }
}

fn count(value: &Value, location: &str) -> Result<usize, BuildError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(location, "expected a non-negative integer"))
}

fn strings(value: &Value, location: &str) -> Result<Vec<String>, BuildError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(location, "expected an array of strings"))
            })
            .collect(),
        _ => Err(invalid(location, "expected an array of strings")),
    }
}

fn regex(value: &Value, location: &str) -> Result<Regex, BuildError> {
    match value {
        Value::String(pattern) => compile_regex(pattern),
        _ => Err(invalid(location, "'pattern' must be a string")),
    }
}

fn compile_regex(pattern: &str) -> Result<Regex, BuildError> {
    Regex::new(pattern).map_err(|e| BuildError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
