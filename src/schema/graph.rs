//! The compiled schema arena and the recursive walk over it.

use serde_json::Value;

use super::format::{Format, FormatCheck};
use super::keyword::{Keyword, NodeId, SchemaNode};
use super::value::{value_type_name, values_equal, InstanceType};
use super::{array, combinators, numeric, object, reference, string};
use crate::crumbs::CrumbPath;
use crate::error::{ResultCode, ValidationOutcome, ValidationResult};
use crate::validation::{Flow, ValidationContext};

/// Maximum length of a chain of pure `$ref` nodes followed by [`SchemaGraph::deref`].
const MAX_REF_CHAIN: usize = 64;

/// Every node compiled for one document scope.
///
/// Nodes reference each other by [`NodeId`], so recursive and mutually
/// recursive schemas are plain cycles in the arena.
#[derive(Debug, Default)]
pub(crate) struct SchemaGraph {
    nodes: Vec<SchemaNode>,
}

impl SchemaGraph {
    pub(crate) fn new(nodes: Vec<SchemaNode>) -> Self {
        Self { nodes }
    }

    pub(crate) fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Follows pure `$ref` nodes to the node that carries keywords.
    pub(crate) fn deref(&self, mut id: NodeId) -> NodeId {
        for _ in 0..MAX_REF_CHAIN {
            match self.node(id).reference_target() {
                Some(target) => id = target,
                None => break,
            }
        }
        id
    }

    /// Validates `value` against node `id`.
    pub(crate) fn validate(
        &self,
        id: NodeId,
        value: &Value,
        path: &CrumbPath,
        ctx: &ValidationContext,
        out: &mut ValidationOutcome,
    ) -> Flow {
        self.validate_node(id, value, path, ctx, out, true)
    }

    /// Validates against node `id`. With `dispatch` off, a node-level
    /// discriminator is ignored and the node's own keywords apply.
    pub(crate) fn validate_node(
        &self,
        id: NodeId,
        value: &Value,
        path: &CrumbPath,
        ctx: &ValidationContext,
        out: &mut ValidationOutcome,
        dispatch: bool,
    ) -> Flow {
        let node = self.node(id);
        if value.is_null() && node.nullable {
            return Ok(());
        }

        if dispatch && !node.has_alternatives() {
            if let Some(discriminator) = &node.discriminator {
                return combinators::check_polymorphic(
                    self,
                    id,
                    discriminator,
                    value,
                    path,
                    ctx,
                    out,
                );
            }
        }

        for keyword in &node.keywords {
            self.evaluate(id, node, keyword, value, path, ctx, out)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        id: NodeId,
        node: &SchemaNode,
        keyword: &Keyword,
        value: &Value,
        path: &CrumbPath,
        ctx: &ValidationContext,
        out: &mut ValidationOutcome,
    ) -> Flow {
        match keyword {
            Keyword::Type(types) => check_type(types, node.nullable, value, path, ctx, out),
            Keyword::Format(format) => check_format(format, value, path, ctx, out),
            Keyword::Enum(allowed) => check_enum(allowed, value, path, ctx, out),
            Keyword::Minimum { limit, exclusive } => {
                numeric::check_minimum(limit, *exclusive, value, path, ctx, out)
            }
            Keyword::Maximum { limit, exclusive } => {
                numeric::check_maximum(limit, *exclusive, value, path, ctx, out)
            }
            Keyword::MultipleOf(divisor) => numeric::check_multiple_of(divisor, value, path, ctx, out),
            Keyword::MinLength(min) => string::check_min_length(*min, value, path, ctx, out),
            Keyword::MaxLength(max) => string::check_max_length(*max, value, path, ctx, out),
            Keyword::Pattern(regex) => string::check_pattern(regex, value, path, ctx, out),
            Keyword::MinItems(min) => array::check_min_items(*min, value, path, ctx, out),
            Keyword::MaxItems(max) => array::check_max_items(*max, value, path, ctx, out),
            Keyword::UniqueItems => array::check_unique_items(value, path, ctx, out),
            Keyword::Items(item) => array::check_items(self, *item, value, path, ctx, out),
            Keyword::Contains(item) => array::check_contains(self, *item, value, path, ctx, out),
            Keyword::MinProperties(min) => object::check_min_properties(*min, value, path, ctx, out),
            Keyword::MaxProperties(max) => object::check_max_properties(*max, value, path, ctx, out),
            Keyword::Required(names) => object::check_required(self, node, names, value, path, ctx, out),
            Keyword::Properties(properties) => {
                object::check_properties(self, properties, value, path, ctx, out)
            }
            Keyword::PatternProperties(patterns) => {
                object::check_pattern_properties(self, patterns, value, path, ctx, out)
            }
            Keyword::AdditionalProperties(policy) => {
                object::check_additional_properties(self, node, policy, value, path, ctx, out)
            }
            Keyword::Dependencies(dependencies) => {
                object::check_dependencies(self, dependencies, value, path, ctx, out)
            }
            Keyword::AllOf(branches) => combinators::check_all_of(self, id, branches, value, path, ctx, out),
            Keyword::AnyOf(branches) => combinators::check_any_of(self, node, branches, value, path, ctx, out),
            Keyword::OneOf(branches) => combinators::check_one_of(self, node, branches, value, path, ctx, out),
            Keyword::Not(inner) => combinators::check_not(self, *inner, value, path, ctx, out),
            Keyword::Reference(target) => reference::follow(self, *target, value, path, ctx, out, true),
        }
    }
}

fn check_type(
    types: &[InstanceType],
    nullable: bool,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    if types.iter().any(|t| t.matches(value)) || (nullable && value.is_null()) {
        return Ok(());
    }
    let expected: Vec<String> = types.iter().map(ToString::to_string).collect();
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::Type,
            path.clone(),
            format!(
                "expected {}, got {}",
                expected.join(" or "),
                value_type_name(value)
            ),
        ),
    )
}

fn check_enum(
    allowed: &[Value],
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    if allowed.iter().any(|candidate| values_equal(candidate, value)) {
        return Ok(());
    }
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::Enum,
            path.clone(),
            format!("value {} is not one of {}", value, Value::Array(allowed.to_vec())),
        ),
    )
}

fn check_format(
    format: &Format,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    if value.is_null() {
        return Ok(());
    }
    match format.check(value) {
        FormatCheck::Valid | FormatCheck::NotApplicable => Ok(()),
        FormatCheck::Invalid => ctx.report(
            out,
            ValidationResult::new(
                ResultCode::Format,
                path.clone(),
                format!("value {} does not match format '{}'", value, format.name()),
            ),
        ),
        FormatCheck::Unknown => ctx.report(
            out,
            ValidationResult::new(
                ResultCode::UnknownFormat,
                path.clone(),
                format!("unknown format '{}' was not checked", format.name()),
            ),
        ),
    }
}
