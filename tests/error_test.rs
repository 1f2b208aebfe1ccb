use oas_guard::{
    BuildError, CrumbPath, Document, DocumentError, ResultCode, Severity, ValidationOutcome,
    ValidationResult,
};
use serde_json::json;
use stillwater::prelude::*;
use stillwater::Validation;

fn located(code: ResultCode, path: &str) -> ValidationResult {
    ValidationResult::new(code, CrumbPath::from_property(path), format!("{} failed", path))
}

#[test]
fn test_outcomes_combine_in_order() {
    let query = ValidationOutcome::single(located(ResultCode::Minimum, "limit"));
    let header = ValidationOutcome::single(located(ResultCode::RequiredParameterMissing, "trace"));

    let combined = query.combine(header);
    let codes: Vec<ResultCode> = combined.iter().map(|r| r.code).collect();
    assert_eq!(
        codes,
        vec![ResultCode::Minimum, ResultCode::RequiredParameterMissing]
    );
}

#[test]
fn test_warnings_do_not_invalidate() {
    let mut outcome = ValidationOutcome::new();
    outcome.push(located(ResultCode::UnknownFormat, "zip"));
    assert!(outcome.is_valid());
    assert!(outcome.first_error().is_none());

    outcome.push(located(ResultCode::Pattern, "zip").with_severity(Severity::Info));
    assert!(outcome.is_valid());

    outcome.push(located(ResultCode::Pattern, "zip"));
    assert!(!outcome.is_valid());
    assert_eq!(outcome.at_path(&CrumbPath::from_property("zip")).len(), 3);
}

#[test]
fn test_into_validation() {
    match ValidationOutcome::new().into_validation(5) {
        Validation::Success(value) => assert_eq!(value, 5),
        Validation::Failure(_) => panic!("empty outcome must succeed"),
    }

    let failed = ValidationOutcome::single(located(ResultCode::Type, "id"));
    match failed.into_validation(5) {
        Validation::Success(_) => panic!("outcome with an error must fail"),
        Validation::Failure(outcome) => assert_eq!(outcome.len(), 1),
    }
}

#[test]
fn test_result_display() {
    let result = ValidationResult::new(
        ResultCode::Required,
        CrumbPath::from_property("body").push_index(0).push_property("id"),
        "required property 'id' is missing",
    );
    assert_eq!(
        result.to_string(),
        "[error] body[0].id: required property 'id' is missing (code 1022)"
    );

    let routing = ValidationResult::new(ResultCode::PathNotFound, CrumbPath::root(), "no path");
    assert_eq!(routing.to_string(), "[error] (root): no path (code 205)");
    assert!(routing.code.is_terminal());
}

#[test]
fn test_document_errors() {
    let err = Document::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, DocumentError::Parse(_)));

    let err = Document::from_value(json!({"openapi": "2.0", "paths": {}})).unwrap_err();
    assert!(err.to_string().contains("2.0"));
}

#[test]
fn test_build_error_messages() {
    let err = BuildError::MissingParameterSpec {
        template: "/users/{id}".to_string(),
        name: "id".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("/users/{id}"));
    assert!(message.contains("id"));
}
