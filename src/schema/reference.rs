//! `$ref` traversal with a depth guard.

use serde_json::Value;

use super::graph::SchemaGraph;
use super::keyword::NodeId;
use crate::crumbs::CrumbPath;
use crate::error::{ResultCode, ValidationOutcome, ValidationResult};
use crate::validation::{Flow, ValidationContext};

/// Validates against `target` one reference level deeper.
///
/// Cycles that do not consume input (`A -> B -> A` on the same value) stop
/// at the configured maximum depth with `MaxDepthExceeded`.
pub(crate) fn follow(
    graph: &SchemaGraph,
    target: NodeId,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
    dispatch: bool,
) -> Flow {
    if ctx.depth() >= ctx.max_depth() {
        let name = graph.node(target).name.as_deref().unwrap_or("schema");
        return ctx.report(
            out,
            ValidationResult::new(
                ResultCode::MaxDepthExceeded,
                path.clone(),
                format!(
                    "maximum reference depth {} exceeded at '{}'",
                    ctx.max_depth(),
                    name
                ),
            ),
        );
    }
    graph.validate_node(target, value, path, &ctx.deeper(), out, dispatch)
}
