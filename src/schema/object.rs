//! Object keywords.
//!
//! `readOnly` and `writeOnly` are enforced here: the walk direction decides
//! whether a flagged property is skipped by `required` and reported when present.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use super::graph::SchemaGraph;
use super::keyword::{AdditionalPolicy, Dependency, NodeId, SchemaNode};
use crate::crumbs::CrumbPath;
use crate::error::{ResultCode, ValidationOutcome, ValidationResult};
use crate::validation::{Direction, Flow, ValidationContext};

pub(crate) fn check_min_properties(
    min: usize,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    match value {
        Value::Object(map) if map.len() < min => ctx.report(
            out,
            ValidationResult::new(
                ResultCode::MinProperties,
                path.clone(),
                format!("object must have at least {} properties, got {}", min, map.len()),
            ),
        ),
        _ => Ok(()),
    }
}

pub(crate) fn check_max_properties(
    max: usize,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    match value {
        Value::Object(map) if map.len() > max => ctx.report(
            out,
            ValidationResult::new(
                ResultCode::MaxProperties,
                path.clone(),
                format!("object must have at most {} properties, got {}", max, map.len()),
            ),
        ),
        _ => Ok(()),
    }
}

/// True when the direction makes the property invisible.
fn hidden_for(direction: Direction, property: &SchemaNode) -> bool {
    match direction {
        Direction::Request => property.read_only,
        Direction::Response => property.write_only,
        Direction::Unspecified => false,
    }
}

pub(crate) fn check_required(
    graph: &SchemaGraph,
    node: &SchemaNode,
    names: &[String],
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for name in names {
        if map.contains_key(name) {
            continue;
        }
        let hidden = node
            .properties()
            .and_then(|props| props.get(name))
            .map_or(false, |id| {
                hidden_for(ctx.direction(), graph.node(graph.deref(*id)))
            });
        if hidden {
            continue;
        }
        ctx.report(
            out,
            ValidationResult::new(
                ResultCode::Required,
                path.push_property(name.as_str()),
                format!("required property '{}' is missing", name),
            ),
        )?;
    }
    Ok(())
}

pub(crate) fn check_properties(
    graph: &SchemaGraph,
    properties: &IndexMap<String, NodeId>,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for (name, id) in properties {
        let Some(property_value) = map.get(name) else {
            continue;
        };
        let property_path = path.push_property(name.as_str());
        let property = graph.node(graph.deref(*id));
        match ctx.direction() {
            Direction::Request if property.read_only => ctx.report(
                out,
                ValidationResult::new(
                    ResultCode::ReadOnlyProperty,
                    property_path.clone(),
                    format!("property '{}' is read-only and must not be sent", name),
                ),
            )?,
            Direction::Response if property.write_only => ctx.report(
                out,
                ValidationResult::new(
                    ResultCode::WriteOnlyProperty,
                    property_path.clone(),
                    format!("property '{}' is write-only and must not be returned", name),
                ),
            )?,
            _ => {}
        }
        graph.validate(*id, property_value, &property_path, &ctx.descend(), out)?;
    }
    Ok(())
}

pub(crate) fn check_pattern_properties(
    graph: &SchemaGraph,
    patterns: &[(Regex, NodeId)],
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for (key, property_value) in map {
        for (regex, id) in patterns {
            if regex.is_match(key) {
                graph.validate(*id, property_value, &path.push_property(key.as_str()), &ctx.descend(), out)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn check_additional_properties(
    graph: &SchemaGraph,
    node: &SchemaNode,
    policy: &AdditionalPolicy,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for (key, property_value) in map {
        let declared = node.properties().map_or(false, |props| props.contains_key(key))
            || node
                .pattern_properties()
                .map_or(false, |patterns| patterns.iter().any(|(re, _)| re.is_match(key)));
        if declared {
            continue;
        }
        let property_path = path.push_property(key.as_str());
        match policy {
            AdditionalPolicy::Deny => ctx.report(
                out,
                ValidationResult::new(
                    ResultCode::AdditionalProperties,
                    property_path,
                    format!("additional property '{}' is not allowed", key),
                ),
            )?,
            AdditionalPolicy::Schema(id) => {
                graph.validate(*id, property_value, &property_path, &ctx.descend(), out)?
            }
        }
    }
    Ok(())
}

pub(crate) fn check_dependencies(
    graph: &SchemaGraph,
    dependencies: &IndexMap<String, Dependency>,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for (trigger, dependency) in dependencies {
        if !map.contains_key(trigger) {
            continue;
        }
        match dependency {
            Dependency::Properties(names) => {
                for name in names.iter().filter(|name| !map.contains_key(*name)) {
                    ctx.report(
                        out,
                        ValidationResult::new(
                            ResultCode::Dependencies,
                            path.push_property(name.as_str()),
                            format!("property '{}' requires property '{}'", trigger, name),
                        ),
                    )?;
                }
            }
            Dependency::Schema(id) => graph.validate(*id, value, path, ctx, out)?,
        }
    }
    Ok(())
}
