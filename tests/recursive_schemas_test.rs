use oas_guard::{Document, ResultCode, SchemaValidator, ValidatorOptions};
use serde_json::{json, Value};

fn document() -> Document {
    Document::from_value(json!({
        "openapi": "3.0.3",
        "paths": {},
        "components": {
            "schemas": {
                "TreeNode": {
                    "type": "object",
                    "required": ["value"],
                    "properties": {
                        "value": {"type": "integer"},
                        "children": {
                            "type": "array",
                            "items": {"$ref": "#/components/schemas/TreeNode"}
                        }
                    }
                },
                "Person": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "employer": {"$ref": "#/components/schemas/Company"}
                    }
                },
                "Company": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "ceo": {"$ref": "#/components/schemas/Person"}
                    }
                },
                "Alpha": {"allOf": [{"$ref": "#/components/schemas/Beta"}]},
                "Beta": {"allOf": [{"$ref": "#/components/schemas/Alpha"}]},
                "Link": {
                    "type": "object",
                    "properties": {
                        "next": {"$ref": "#/components/schemas/Link"}
                    }
                }
            }
        }
    }))
    .unwrap()
}

fn schema_for(name: &str, options: &ValidatorOptions) -> SchemaValidator {
    let reference = json!({"$ref": format!("#/components/schemas/{}", name)});
    SchemaValidator::new(&reference, &document(), options).unwrap()
}

fn chain(length: usize) -> Value {
    (0..length).fold(json!({}), |inner, _| json!({"next": inner}))
}

#[test]
fn test_self_referencing_tree() {
    let tree = schema_for("TreeNode", &ValidatorOptions::new());

    let valid = json!({
        "value": 1,
        "children": [
            {"value": 2},
            {"value": 3, "children": [{"value": 4}]}
        ]
    });
    assert!(tree.validate(&valid).is_valid());

    let invalid = json!({
        "value": 1,
        "children": [
            {"value": 2, "children": [{"value": 3}, {"value": "four"}]},
            {"children": []}
        ]
    });
    let outcome = tree.validate(&invalid);
    assert_eq!(outcome.errors().len(), 2);

    let paths: Vec<String> = outcome.iter().map(|r| r.path.to_string()).collect();
    assert!(paths.contains(&"children[0].children[1].value".to_string()));
    assert!(paths.contains(&"children[1].value".to_string()));
}

#[test]
fn test_mutually_recursive_schemas() {
    let person = schema_for("Person", &ValidatorOptions::new());

    let value = json!({
        "name": "Ada",
        "employer": {
            "title": "Engines Ltd",
            "ceo": {"name": "Charles", "employer": {"title": 7}}
        }
    });
    let outcome = person.validate(&value);
    assert_eq!(outcome.errors().len(), 1);
    assert_eq!(
        outcome.first_error().unwrap().path.to_string(),
        "employer.ceo.employer.title"
    );
}

#[test]
fn test_cycles_compile_to_a_finite_graph() {
    let person = schema_for("Person", &ValidatorOptions::new());
    let again = schema_for("Person", &ValidatorOptions::new());
    assert_eq!(person.node_count(), again.node_count());
    assert!(person.node_count() < 16);
}

#[test]
fn test_deep_instances_do_not_hit_the_depth_guard() {
    let shallow = schema_for("Link", &ValidatorOptions::new().with_max_depth(4));
    assert!(shallow.validate(&chain(10)).is_valid());

    let default = schema_for("Link", &ValidatorOptions::new());
    assert!(default.validate(&chain(150)).is_valid());
}

#[test]
fn test_depth_guard_stops_cycles_on_one_value() {
    let alpha = schema_for("Alpha", &ValidatorOptions::new().with_max_depth(4));

    let outcome = alpha.validate(&json!({}));
    assert_eq!(outcome.errors().len(), 1);
    assert_eq!(
        outcome.first_error().unwrap().code,
        ResultCode::MaxDepthExceeded
    );
}
