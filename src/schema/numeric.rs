//! Numeric keywords: `minimum`, `maximum`, `exclusive*`, `multipleOf`.
//!
//! Comparisons are exact: both sides are converted to [`BigDecimal`] from the
//! number's written form, so `0.1 + 0.2`-style binary rounding never applies.

use bigdecimal::{BigDecimal, Zero};
use serde_json::Value;

use super::value::decimal_from_number;
use crate::crumbs::CrumbPath;
use crate::error::{ResultCode, ValidationOutcome, ValidationResult};
use crate::validation::{Flow, ValidationContext};

fn decimal_of(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => decimal_from_number(n),
        _ => None,
    }
}

pub(crate) fn check_minimum(
    limit: &BigDecimal,
    exclusive: bool,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Some(actual) = decimal_of(value) else {
        return Ok(());
    };
    let message = if exclusive && actual <= *limit {
        format!("must be greater than {}, got {}", limit, value)
    } else if !exclusive && actual < *limit {
        format!("must be at least {}, got {}", limit, value)
    } else {
        return Ok(());
    };
    ctx.report(
        out,
        ValidationResult::new(ResultCode::Minimum, path.clone(), message),
    )
}

pub(crate) fn check_maximum(
    limit: &BigDecimal,
    exclusive: bool,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Some(actual) = decimal_of(value) else {
        return Ok(());
    };
    let message = if exclusive && actual >= *limit {
        format!("must be less than {}, got {}", limit, value)
    } else if !exclusive && actual > *limit {
        format!("must be at most {}, got {}", limit, value)
    } else {
        return Ok(());
    };
    ctx.report(
        out,
        ValidationResult::new(ResultCode::Maximum, path.clone(), message),
    )
}

pub(crate) fn check_multiple_of(
    divisor: &BigDecimal,
    value: &Value,
    path: &CrumbPath,
    ctx: &ValidationContext,
    out: &mut ValidationOutcome,
) -> Flow {
    let Some(actual) = decimal_of(value) else {
        return Ok(());
    };
    // Exact at any scale, unlike division.
    if (&actual % divisor).is_zero() {
        return Ok(());
    }
    ctx.report(
        out,
        ValidationResult::new(
            ResultCode::MultipleOf,
            path.clone(),
            format!("must be a multiple of {}, got {}", divisor, value),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Direction, ValidationMode};
    use serde_json::json;
    use std::str::FromStr;

    fn ctx() -> ValidationContext {
        ValidationContext::new(ValidationMode::Accumulate, Direction::Unspecified, 8)
    }

    fn dec(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    fn run<F>(check: F) -> ValidationOutcome
    where
        F: FnOnce(&mut ValidationOutcome) -> Flow,
    {
        let mut out = ValidationOutcome::new();
        let _ = check(&mut out);
        out
    }

    #[test]
    fn test_minimum_inclusive_and_exclusive() {
        let root = CrumbPath::root();
        assert!(run(|out| check_minimum(&dec("5"), false, &json!(5), &root, &ctx(), out)).is_valid());
        assert!(!run(|out| check_minimum(&dec("5"), true, &json!(5), &root, &ctx(), out)).is_valid());
        assert!(!run(|out| check_minimum(&dec("5"), false, &json!(4.99), &root, &ctx(), out)).is_valid());
    }

    #[test]
    fn test_maximum_message() {
        let root = CrumbPath::root();
        let outcome = run(|out| check_maximum(&dec("10"), false, &json!(11), &root, &ctx(), out));
        let error = outcome.first_error().unwrap();
        assert_eq!(error.code, ResultCode::Maximum);
        assert_eq!(error.message, "must be at most 10, got 11");
    }

    #[test]
    fn test_multiple_of_is_exact() {
        let root = CrumbPath::root();
        let point_three: Value = serde_json::from_str("0.3").unwrap();
        assert!(run(|out| check_multiple_of(&dec("0.1"), &point_three, &root, &ctx(), out)).is_valid());
        assert!(!run(|out| check_multiple_of(&dec("0.25"), &point_three, &root, &ctx(), out)).is_valid());
        assert!(!run(|out| check_multiple_of(&dec("3"), &json!(10), &root, &ctx(), out)).is_valid());
    }

    #[test]
    fn test_non_numbers_are_ignored() {
        let root = CrumbPath::root();
        assert!(run(|out| check_minimum(&dec("5"), false, &json!("1"), &root, &ctx(), out)).is_valid());
    }
}
