use oas_guard::{
    Document, Method, OpenApiValidator, Request, Response, ResultCode, ValidationOutcome,
};
use serde_json::json;

fn validator() -> OpenApiValidator {
    let document = Document::from_value(json!({
        "openapi": "3.0.3",
        "paths": {
            "/pets": {
                "get": {
                    "responses": {
                        "200": {
                            "description": "ok",
                            "headers": {
                                "X-Rate-Limit": {"required": true, "schema": {"type": "integer"}}
                            },
                            "content": {
                                "application/json": {"schema": {
                                    "type": "array",
                                    "items": {"$ref": "#/components/schemas/Pet"}
                                }}
                            }
                        }
                    }
                },
                "post": {
                    "responses": {
                        "201": {"$ref": "#/components/responses/Created"},
                        "4XX": {
                            "description": "client error",
                            "content": {
                                "application/json": {"schema": {"$ref": "#/components/schemas/Error"}}
                            }
                        },
                        "default": {"description": "anything else"}
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": {"type": "integer", "readOnly": true},
                        "name": {"type": "string"},
                        "password": {"type": "string", "writeOnly": true}
                    }
                },
                "Error": {
                    "type": "object",
                    "required": ["code", "message"],
                    "properties": {"code": {"type": "integer"}, "message": {"type": "string"}}
                }
            },
            "responses": {
                "Created": {
                    "description": "created",
                    "content": {
                        "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
                    }
                }
            }
        }
    }))
    .unwrap();
    OpenApiValidator::new(document).unwrap()
}

fn codes(outcome: &ValidationOutcome) -> Vec<ResultCode> {
    outcome.iter().map(|r| r.code).collect()
}

fn list_pets() -> Request {
    Request::builder(Method::Get, "/pets").build()
}

#[test]
fn test_valid_response() {
    let response = Response::builder(200)
        .header("X-Rate-Limit", "100")
        .json(&json!([{"id": 1, "name": "Rex"}]))
        .build();

    assert!(validator().validate_response(&response, &list_pets()).is_ok());
}

#[test]
fn test_response_headers_and_body_accumulate() {
    let response = Response::builder(200)
        .json(&json!([{"id": 1, "name": "Rex"}, {"name": "Tom", "password": "hunter2"}]))
        .build();

    let outcome = validator()
        .validate_response(&response, &list_pets())
        .unwrap_err();
    assert_eq!(
        codes(&outcome),
        vec![
            ResultCode::RequiredParameterMissing,
            ResultCode::Required,
            ResultCode::WriteOnlyProperty
        ]
    );
    let paths: Vec<String> = outcome.iter().map(|r| r.path.to_string()).collect();
    assert_eq!(
        paths,
        vec!["header.X-Rate-Limit", "body[1].id", "body[1].password"]
    );
}

#[test]
fn test_invalid_header_value() {
    let response = Response::builder(200)
        .header("x-rate-limit", "plenty")
        .json(&json!([]))
        .build();

    let outcome = validator()
        .validate_response(&response, &list_pets())
        .unwrap_err();
    assert_eq!(codes(&outcome), vec![ResultCode::Type]);
}

#[test]
fn test_undeclared_status() {
    let response = Response::builder(500).build();
    let outcome = validator()
        .validate_response(&response, &list_pets())
        .unwrap_err();
    assert_eq!(codes(&outcome), vec![ResultCode::ResponseStatusNotFound]);
}

#[test]
fn test_status_ranges_and_default() {
    let validator = validator();
    let create = Request::builder(Method::Post, "/pets").build();

    let created = Response::builder(201)
        .json(&json!({"id": 7, "name": "Rex"}))
        .build();
    assert!(validator.validate_response(&created, &create).is_ok());

    let not_found = Response::builder(404)
        .json(&json!({"code": 404}))
        .build();
    let outcome = validator.validate_response(&not_found, &create).unwrap_err();
    assert_eq!(codes(&outcome), vec![ResultCode::Required]);
    assert_eq!(outcome.first_error().unwrap().path.to_string(), "body.message");

    let unavailable = Response::builder(503).body("down").build();
    assert!(validator.validate_response(&unavailable, &create).is_ok());
}

#[test]
fn test_response_body_content_type() {
    let validator = validator();
    let create = Request::builder(Method::Post, "/pets").build();

    let untyped = Response::builder(201).body(r#"{"id": 1, "name": "Rex"}"#).build();
    let outcome = validator.validate_response(&untyped, &create).unwrap_err();
    assert_eq!(codes(&outcome), vec![ResultCode::ContentTypeMissing]);

    let xml = Response::builder(201)
        .content_type("application/xml")
        .body("<pet/>")
        .build();
    let outcome = validator.validate_response(&xml, &create).unwrap_err();
    assert_eq!(codes(&outcome), vec![ResultCode::UnsupportedMediaType]);
}

#[test]
fn test_response_to_unroutable_request() {
    let response = Response::builder(200).build();
    let request = Request::builder(Method::Get, "/owners").build();

    let outcome = validator()
        .validate_response(&response, &request)
        .unwrap_err();
    assert_eq!(codes(&outcome), vec![ResultCode::PathNotFound]);
}
