//! Array keywords: `minItems`, `maxItems`, `uniqueItems`, `items`, `contains`.

use serde_json::Value;

use super::graph::SchemaGraph;
use super::keyword::NodeId;
use super::value::values_equal;
use crate::crumbs::CrumbPath;
use crate::error::{ResultCode, ValidationOutcome, ValidationResult};
use crate::validation::{Flow, ValidationContext, ValidationMode};

pub(crate) fn check_min_items(
    min: usize,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    match value {
        Value::Array(items) if items.len() < min => ctx.report(
            out,
            ValidationResult::new(
                ResultCode::MinItems,
                path.clone(),
                format!("array must have at least {} items, got {}", min, items.len()),
            ),
        ),
        _ => Ok(()),
    }
}

pub(crate) fn check_max_items(
    max: usize,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    match value {
        Value::Array(items) if items.len() > max => ctx.report(
            out,
            ValidationResult::new(
                ResultCode::MaxItems,
                path.clone(),
                format!("array must have at most {} items, got {}", max, items.len()),
            ),
        ),
        _ => Ok(()),
    }
}

/// Reports each item that repeats an earlier one.
pub(crate) fn check_unique_items(
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::Array(items) = value else {
        return Ok(());
    };
    for (j, item) in items.iter().enumerate() {
        if let Some(i) = items[..j].iter().position(|earlier| values_equal(earlier, item)) {
            ctx.report(
                out,
                ValidationResult::new(
                    ResultCode::UniqueItems,
                    path.push_index(j),
                    format!("item {} duplicates item {}", j, i),
                ),
            )?;
        }
    }
    Ok(())
}

pub(crate) fn check_items(
    graph: &SchemaGraph,
    item_schema: NodeId,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::Array(items) = value else {
        return Ok(());
    };
    for (i, item) in items.iter().enumerate() {
        graph.validate(item_schema, item, &path.push_index(i), &ctx.descend(), out)?;
    }
    Ok(())
}

pub(crate) fn check_contains(
    graph: &SchemaGraph,
    item_schema: NodeId,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::Array(items) = value else {
        return Ok(());
    };
    let item_ctx = ctx.descend().with_mode(ValidationMode::FastFail);
    let found = items.iter().enumerate().any(|(i, item)| {
        let mut trial = ValidationOutcome::new();
        let _ = graph.validate(item_schema, item, &path.push_index(i), &item_ctx, &mut trial);
        trial.is_valid()
    });
    if found {
        return Ok(());
    }
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::Contains,
            path.clone(),
            "array does not contain a matching item",
        ),
    )
}
