//! Composition keywords and discriminator dispatch.
//!
//! - `allOf` validates every branch in place; a branch carrying a discriminator
//!   is replaced by the schema the discriminator value selects, unless that
//!   schema is the one declaring the `allOf` (the usual inheritance pattern).
//! - `anyOf` keeps the first passing branch.
//! - `oneOf` requires exactly one passing branch.
//! - With a discriminator, `anyOf`/`oneOf` skip trial validation and validate
//!   the selected branch only.

use serde_json::Value;

use super::graph::SchemaGraph;
use super::keyword::{Discriminator, NodeId, SchemaNode};
use super::reference;
use crate::crumbs::CrumbPath;
use crate::error::{ResultCode, ValidationOutcome, ValidationResult};
use crate::validation::{Flow, ValidationContext, ValidationMode};

/// The schema a discriminator selects for `value`, or the diagnostic explaining why none.
fn select(
    graph: &SchemaGraph,
    discriminator: &Discriminator,
    value: &Value,
    path: &CrumbPath,
) -> Result<NodeId, ValidationResult> {
    let property = &discriminator.property_name;
    let Some(raw) = value.get(property) else {
        return Err(ValidationResult::new(
            ResultCode::DiscriminatorPropertyMissing,
            path.push_property(property.as_str()),
            format!("discriminator property '{}' is missing", property),
        ));
    };
    let Some(name) = raw.as_str() else {
        return Err(ValidationResult::new(
            ResultCode::InvalidDiscriminatorSchema,
            path.push_property(property.as_str()),
            format!("discriminator property '{}' must be a string", property),
        ));
    };
    discriminator
        .lookup(name)
        .map(|id| graph.deref(id))
        .ok_or_else(|| {
            ValidationResult::new(
                ResultCode::InvalidDiscriminatorSchema,
                path.push_property(property.as_str()),
                format!("no schema is mapped to discriminator value '{}'", name),
            )
        })
}

/// Node-level discriminator without `oneOf`/`anyOf`.
pub(crate) fn check_polymorphic(
    graph: &SchemaGraph,
    id: NodeId,
    discriminator: &Discriminator,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    if !value.is_object() {
        return graph.validate_node(id, value, path, ctx, out, false);
    }
    match select(graph, discriminator, value, path) {
        Ok(target) if target == id => graph.validate_node(id, value, path, ctx, out, false),
        Ok(target) => reference::follow(graph, target, value, path, ctx, out, true),
        Err(result) => ctx.report(out, result),
    }
}

pub(crate) fn check_all_of(
    graph: &SchemaGraph,
    owner: NodeId,
    branches: &[NodeId],
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    for branch in branches {
        let concrete = graph.deref(*branch);
        let discriminator = graph.node(concrete).discriminator.as_ref();
        match discriminator {
            Some(discriminator) if concrete != owner && value.is_object() => {
                match select(graph, discriminator, value, path) {
                    Ok(target) if target == owner || target == concrete => {
                        reference::follow(graph, concrete, value, path, ctx, out, false)?
                    }
                    Ok(target) => reference::follow(graph, target, value, path, ctx, out, true)?,
                    Err(result) => ctx.report(out, result)?,
                }
            }
            _ => graph.validate(*branch, value, path, ctx, out)?,
        }
    }
    Ok(())
}

/// Runs one branch on its own outcome, in the caller's mode.
fn trial(
    graph: &SchemaGraph,
    branch: NodeId,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::new();
    let _ = graph.validate(branch, value, path, ctx, &mut outcome);
    outcome
}

/// `oneOf`/`anyOf` with a discriminator: the selected schema must be one of the branches.
#[allow(clippy::too_many_arguments)]
fn check_discriminated(
    graph: &SchemaGraph,
    keyword: &'static str,
    discriminator: &Discriminator,
    branches: &[NodeId],
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let target = match select(graph, discriminator, value, path) {
        Ok(target) => target,
        Err(result) => return ctx.report(out, result),
    };
    match branches.iter().position(|b| graph.deref(*b) == target) {
        Some(index) => {
            let branch_path = path.push_keyword(keyword).push_index(index);
            reference::follow(graph, target, value, &branch_path, ctx, out, true)
        }
        None => ctx.report(
            out,
            ValidationResult::new(
                ResultCode::InvalidDiscriminatorSchema,
                path.push_property(discriminator.property_name.as_str()),
                format!(
                    "discriminator selects '{}', which is not one of the {} schemas",
                    graph.node(target).name.as_deref().unwrap_or("an inline schema"),
                    keyword
                ),
            ),
        ),
    }
}

pub(crate) fn check_any_of(
    graph: &SchemaGraph,
    node: &SchemaNode,
    branches: &[NodeId],
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    if let (Some(discriminator), true) = (&node.discriminator, value.is_object()) {
        return check_discriminated(graph, "anyOf", discriminator, branches, value, path, ctx, out);
    }

    let mut failures = ValidationOutcome::new();
    for (i, branch) in branches.iter().enumerate() {
        let outcome = trial(graph, *branch, value, &path.push_keyword("anyOf").push_index(i), ctx);
        if outcome.is_valid() {
            out.append(outcome);
            return Ok(());
        }
        failures.append(outcome);
    }

    report_no_valid_schema(out, failures, "anyOf", path, ctx)
}

pub(crate) fn check_one_of(
    graph: &SchemaGraph,
    node: &SchemaNode,
    branches: &[NodeId],
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    if let (Some(discriminator), true) = (&node.discriminator, value.is_object()) {
        return check_discriminated(graph, "oneOf", discriminator, branches, value, path, ctx, out);
    }

    let mut passing: Vec<(usize, ValidationOutcome)> = Vec::new();
    let mut failures = ValidationOutcome::new();
    for (i, branch) in branches.iter().enumerate() {
        let outcome = trial(graph, *branch, value, &path.push_keyword("oneOf").push_index(i), ctx);
        if outcome.is_valid() {
            passing.push((i, outcome));
        } else {
            failures.append(outcome);
        }
    }

    match passing.len() {
        0 => report_no_valid_schema(out, failures, "oneOf", path, ctx),
        1 => {
            if let Some((_, outcome)) = passing.pop() {
                out.append(outcome);
            }
            Ok(())
        }
        _ => {
            let indices: Vec<String> = passing.iter().map(|(i, _)| i.to_string()).collect();
            ctx.report(
                out,
                ValidationResult::new(
                    ResultCode::AmbiguousSchema,
                    path.clone(),
                    format!(
                        "value matches more than one oneOf schema (indices {})",
                        indices.join(", ")
                    ),
                ),
            )
        }
    }
}

/// In accumulate mode the summary is followed by every branch's errors.
fn report_no_valid_schema(
    out: &mut ValidationOutcome,
    mut failures: ValidationOutcome,
    keyword: &str,
    path: &CrumbPath,
    ctx: &ValidationContext,
) -> Flow {
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::NoValidSchema,
            path.clone(),
            format!("value does not match any {} schema", keyword),
        ),
    )?;
    failures.retain_errors();
    out.append(failures);
    Ok(())
}

pub(crate) fn check_not(
    graph: &SchemaGraph,
    inner: NodeId,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let quick = ctx.with_mode(ValidationMode::FastFail);
    if !trial(graph, inner, value, path, &quick).is_valid() {
        return Ok(());
    }
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::NotSchema,
            path.clone(),
            "value must not match the 'not' schema",
        ),
    )
}
