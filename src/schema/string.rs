//! String keywords: `minLength`, `maxLength`, `pattern`.

use regex::Regex;
use serde_json::Value;

use crate::crumbs::CrumbPath;
use crate::error::{ResultCode, ValidationOutcome, ValidationResult};
use crate::validation::{Flow, ValidationContext};

/// Lengths count Unicode scalar values, not bytes.
pub(crate) fn check_min_length(
    min: usize,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::String(s) = value else {
        return Ok(());
    };
    let len = s.chars().count();
    if len >= min {
        return Ok(());
    }
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::MinLength,
            path.clone(),
            format!("length must be at least {}, got {}", min, len),
        ),
    )
}

pub(crate) fn check_max_length(
    max: usize,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::String(s) = value else {
        return Ok(());
    };
    let len = s.chars().count();
    if len <= max {
        return Ok(());
    }
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::MaxLength,
            path.clone(),
            format!("length must be at most {}, got {}", max, len),
        ),
    )
}

/// `pattern` is unanchored, as in JSON Schema.
pub(crate) fn check_pattern(
    regex: &Regex,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Value::String(s) = value else {
        return Ok(());
    };
    if regex.is_match(s) {
        return Ok(());
    }
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::Pattern,
            path.clone(),
            format!("must match pattern '{}'", regex.as_str()),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Direction, ValidationMode};
    use serde_json::json;

    fn ctx() -> ValidationContext {
        ValidationContext::new(ValidationMode::Accumulate, Direction::Unspecified, 8)
    }

    #[test]
    fn test_length_counts_characters() {
        let mut out = ValidationOutcome::new();
        check_max_length(2, &json!("éé"), &CrumbPath::root(), &ctx(), &mut out).unwrap();
        assert!(out.is_valid());

        check_min_length(3, &json!("éé"), &CrumbPath::root(), &ctx(), &mut out).unwrap();
        assert_eq!(out.first_error().unwrap().message, "length must be at least 3, got 2");
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let regex = Regex::new("[0-9]+").unwrap();
        let mut out = ValidationOutcome::new();
        check_pattern(&regex, &json!("abc123"), &CrumbPath::root(), &ctx(), &mut out).unwrap();
        assert!(out.is_valid());

        check_pattern(&regex, &json!("abc"), &CrumbPath::root(), &ctx(), &mut out).unwrap();
        assert_eq!(out.first_error().unwrap().code, ResultCode::Pattern);
    }
}
