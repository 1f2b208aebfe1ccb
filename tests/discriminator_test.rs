use oas_guard::{BuildError, ResultCode, SchemaValidator, ValidatorOptions};
use serde_json::{json, Value};

fn components() -> Value {
    json!({
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["petType"],
                    "properties": {"petType": {"type": "string"}},
                    "discriminator": {
                        "propertyName": "petType",
                        "mapping": {"dog": "#/components/schemas/Dog"}
                    }
                },
                "Cat": {
                    "allOf": [
                        {"$ref": "#/components/schemas/Pet"},
                        {
                            "type": "object",
                            "required": ["huntingSkill"],
                            "properties": {
                                "huntingSkill": {"type": "string", "enum": ["lazy", "active"]}
                            }
                        }
                    ]
                },
                "Dog": {
                    "allOf": [
                        {"$ref": "#/components/schemas/Pet"},
                        {
                            "type": "object",
                            "required": ["packSize"],
                            "properties": {"packSize": {"type": "integer", "minimum": 0}}
                        }
                    ]
                },
                "Circle": {
                    "type": "object",
                    "required": ["kind", "radius"],
                    "properties": {"kind": {"type": "string"}, "radius": {"type": "number"}}
                },
                "Square": {
                    "type": "object",
                    "required": ["kind", "side"],
                    "properties": {"kind": {"type": "string"}, "side": {"type": "number"}}
                },
                "Shape": {
                    "oneOf": [
                        {"$ref": "#/components/schemas/Circle"},
                        {"$ref": "#/components/schemas/Square"}
                    ],
                    "discriminator": {"propertyName": "kind"}
                }
            }
        }
    })
}

fn schema_for(name: &str) -> SchemaValidator {
    let reference = json!({"$ref": format!("#/components/schemas/{}", name)});
    SchemaValidator::new(&reference, &components(), &ValidatorOptions::new()).unwrap()
}

// ====== Inheritance Tests ======

#[test]
fn test_base_schema_dispatches_to_subtype() {
    let pet = schema_for("Pet");

    assert!(pet.validate(&json!({"petType": "Cat", "huntingSkill": "lazy"})).is_valid());

    let outcome = pet.validate(&json!({"petType": "Cat", "huntingSkill": "sleepy"}));
    assert_eq!(outcome.errors().len(), 1);
    assert_eq!(outcome.first_error().unwrap().code, ResultCode::Enum);
    assert_eq!(outcome.first_error().unwrap().path.to_string(), "huntingSkill");
}

#[test]
fn test_explicit_mapping() {
    let pet = schema_for("Pet");

    assert!(pet.validate(&json!({"petType": "dog", "packSize": 3})).is_valid());
    let outcome = pet.validate(&json!({"petType": "dog", "packSize": -1}));
    assert_eq!(outcome.first_error().unwrap().code, ResultCode::Minimum);
}

#[test]
fn test_subtype_keeps_base_constraints() {
    let cat = schema_for("Cat");

    assert!(cat.validate(&json!({"petType": "Cat", "huntingSkill": "active"})).is_valid());
    let outcome = cat.validate(&json!({"petType": "Cat"}));
    assert_eq!(outcome.with_code(ResultCode::Required).len(), 1);
    assert_eq!(outcome.first_error().unwrap().path.to_string(), "huntingSkill");
}

#[test]
fn test_missing_discriminator_property() {
    let pet = schema_for("Pet");

    let outcome = pet.validate(&json!({"name": "Rex"}));
    assert_eq!(outcome.len(), 1);
    let error = outcome.first_error().unwrap();
    assert_eq!(error.code, ResultCode::DiscriminatorPropertyMissing);
    assert_eq!(error.path.to_string(), "petType");
}

#[test]
fn test_unmapped_or_non_string_value() {
    let pet = schema_for("Pet");

    let outcome = pet.validate(&json!({"petType": "Lizard"}));
    assert_eq!(
        outcome.first_error().unwrap().code,
        ResultCode::InvalidDiscriminatorSchema
    );

    let outcome = pet.validate(&json!({"petType": 3}));
    assert_eq!(
        outcome.first_error().unwrap().code,
        ResultCode::InvalidDiscriminatorSchema
    );
}

// ====== oneOf Dispatch Tests ======

#[test]
fn test_one_of_validates_selected_branch_only() {
    let shape = schema_for("Shape");

    assert!(shape.validate(&json!({"kind": "Circle", "radius": 2})).is_valid());
    assert!(shape.validate(&json!({"kind": "Square", "side": 2})).is_valid());

    let outcome = shape.validate(&json!({"kind": "Square", "radius": 2}));
    assert!(!outcome.has_code(ResultCode::NoValidSchema));
    assert_eq!(outcome.errors().len(), 1);
    let error = outcome.first_error().unwrap();
    assert_eq!(error.code, ResultCode::Required);
    assert_eq!(error.path.to_string(), "oneOf[1].side");
}

#[test]
fn test_one_of_unknown_discriminator_value() {
    let shape = schema_for("Shape");

    let outcome = shape.validate(&json!({"kind": "Triangle", "sides": 3}));
    assert_eq!(outcome.errors().len(), 1);
    assert_eq!(
        outcome.first_error().unwrap().code,
        ResultCode::InvalidDiscriminatorSchema
    );
}

// ====== Build Errors ======

#[test]
fn test_discriminator_requires_property_name() {
    let schema = json!({
        "oneOf": [{"type": "object"}],
        "discriminator": {"mapping": {"a": "#/components/schemas/A"}}
    });
    let err = SchemaValidator::new(&schema, &json!({}), &ValidatorOptions::new()).unwrap_err();
    assert!(matches!(err, BuildError::MalformedDiscriminator(_)));
}
