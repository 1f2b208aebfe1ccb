use oas_guard::{
    compile_path_pattern, BuildError, ParameterCodec, ParameterLocation, PathParam, PathTemplate,
    PrimitiveType, RawPathValue, Style, ValueShape,
};
use serde_json::{json, Value};

fn int() -> ValueShape {
    ValueShape::Primitive(PrimitiveType::Integer)
}

fn ints() -> ValueShape {
    ValueShape::Array(Box::new(int()))
}

fn single(text: &str) -> RawPathValue {
    RawPathValue::Single(text.to_string())
}

fn point() -> ValueShape {
    ValueShape::Object(
        [
            ("x".to_string(), int()),
            ("label".to_string(), ValueShape::Primitive(PrimitiveType::String)),
        ]
        .into_iter()
        .collect(),
    )
}

/// Compiles `/items/{p}`, captures `path` and decodes the captured value.
fn decode_through_pattern(style: Style, explode: bool, shape: ValueShape, path: &str) -> Value {
    let codec = ParameterCodec::new("p", ParameterLocation::Path, style, explode, shape);
    let pattern = compile_path_pattern("/items/{p}", &[PathParam::from_codec(&codec)])
        .unwrap()
        .unwrap();
    let captured = pattern
        .captures(path)
        .unwrap_or_else(|| panic!("{:?} explode={} should match {}", style, explode, path));
    codec.decode_path(&captured["p"])
}

#[test]
fn test_template_parameters() {
    let template = PathTemplate::parse("/users/{userId}/posts/{postId}").unwrap();
    assert_eq!(template.parameter_names(), vec!["userId", "postId"]);
    assert!(template.has_parameters());
    assert!(!PathTemplate::parse("/health").unwrap().has_parameters());
}

#[test]
fn test_malformed_templates_are_rejected() {
    for template in ["/users/{id/a}", "/users/{id", "/users/id}", "/users/{}"] {
        assert!(
            matches!(
                PathTemplate::parse(template),
                Err(BuildError::UnsupportedPathTemplate { .. })
            ),
            "{} should be rejected",
            template
        );
    }
}

#[test]
fn test_simple_array_round_trip_through_codec() {
    let shape = ints();
    let codec = ParameterCodec::new("ids", ParameterLocation::Path, Style::Simple, false, shape.clone());
    let pattern = compile_path_pattern("/users/{ids}", &[PathParam::from_codec(&codec)])
        .unwrap()
        .unwrap();

    let captured = pattern.captures("/users/3,4,5").unwrap();
    assert_eq!(captured["ids"], single("3,4,5"));
    assert_eq!(codec.decode_path(&captured["ids"]), json!([3, 4, 5]));
}

#[test]
fn test_label_and_matrix_prefixes() {
    let shape = ints();
    let label = ParameterCodec::new("ids", ParameterLocation::Path, Style::Label, false, shape.clone());
    let pattern = compile_path_pattern("/users/{ids}", &[PathParam::from_codec(&label)])
        .unwrap()
        .unwrap();
    let captured = pattern.captures("/users/.3,4,5").unwrap();
    assert_eq!(label.decode_path(&captured["ids"]), json!([3, 4, 5]));
    assert!(pattern.captures("/users/3,4,5").is_none());

    let matrix = ParameterCodec::new("ids", ParameterLocation::Path, Style::Matrix, false, shape);
    let pattern = compile_path_pattern("/users/{ids}", &[PathParam::from_codec(&matrix)])
        .unwrap()
        .unwrap();
    let captured = pattern.captures("/users/;ids=3,4,5").unwrap();
    assert_eq!(matrix.decode_path(&captured["ids"]), json!([3, 4, 5]));
}

#[test]
fn test_adjacent_placeholders_split_on_label_dot() {
    let shape = ValueShape::Primitive(PrimitiveType::String);
    let pattern = compile_path_pattern(
        "/files/{name}{ext}",
        &[
            PathParam::new("name", Style::Simple, false, &shape),
            PathParam::new("ext", Style::Label, false, &shape),
        ],
    )
    .unwrap()
    .unwrap();

    let captured = pattern.captures("/files/report.pdf").unwrap();
    assert_eq!(captured["name"], single("report"));
    assert_eq!(captured["ext"], single("pdf"));
}

#[test]
fn test_percent_encoded_segments_are_decoded() {
    let codec = ParameterCodec::new(
        "name",
        ParameterLocation::Path,
        Style::Simple,
        false,
        ValueShape::Primitive(PrimitiveType::String),
    );
    assert_eq!(codec.decode_path_str("Jane%20Doe"), json!("Jane Doe"));
}

#[test]
fn test_every_placeholder_needs_a_parameter() {
    let shape = int();
    let err = compile_path_pattern(
        "/users/{id}/posts/{postId}",
        &[PathParam::new("id", Style::Simple, false, &shape)],
    )
    .unwrap_err();
    assert_eq!(
        err,
        BuildError::MissingParameterSpec {
            template: "/users/{id}/posts/{postId}".to_string(),
            name: "postId".to_string(),
        }
    );
}

// ====== Style Matrix Tests ======

#[test]
fn test_simple_style_every_shape() {
    for explode in [false, true] {
        assert_eq!(decode_through_pattern(Style::Simple, explode, int(), "/items/7"), json!(7));
        assert_eq!(
            decode_through_pattern(Style::Simple, explode, ints(), "/items/3,4,5"),
            json!([3, 4, 5])
        );
    }
    assert_eq!(
        decode_through_pattern(Style::Simple, false, point(), "/items/x,1,label,a"),
        json!({"x": 1, "label": "a"})
    );
    assert_eq!(
        decode_through_pattern(Style::Simple, true, point(), "/items/x=1,label=a"),
        json!({"x": 1, "label": "a"})
    );
}

#[test]
fn test_label_style_every_shape() {
    for explode in [false, true] {
        assert_eq!(decode_through_pattern(Style::Label, explode, int(), "/items/.7"), json!(7));
    }
    assert_eq!(
        decode_through_pattern(Style::Label, false, ints(), "/items/.3,4,5"),
        json!([3, 4, 5])
    );
    assert_eq!(
        decode_through_pattern(Style::Label, true, ints(), "/items/.3.4.5"),
        json!([3, 4, 5])
    );
    assert_eq!(
        decode_through_pattern(Style::Label, false, point(), "/items/.x,1,label,a"),
        json!({"x": 1, "label": "a"})
    );
    assert_eq!(
        decode_through_pattern(Style::Label, true, point(), "/items/.x=1.label=a"),
        json!({"x": 1, "label": "a"})
    );
}

#[test]
fn test_matrix_style_every_shape() {
    for explode in [false, true] {
        assert_eq!(decode_through_pattern(Style::Matrix, explode, int(), "/items/;p=7"), json!(7));
    }
    assert_eq!(
        decode_through_pattern(Style::Matrix, false, ints(), "/items/;p=3,4,5"),
        json!([3, 4, 5])
    );
    assert_eq!(
        decode_through_pattern(Style::Matrix, true, ints(), "/items/;p=3;p=4;p=5"),
        json!([3, 4, 5])
    );
    assert_eq!(
        decode_through_pattern(Style::Matrix, false, point(), "/items/;p=x,1,label,a"),
        json!({"x": 1, "label": "a"})
    );
    assert_eq!(
        decode_through_pattern(Style::Matrix, true, point(), "/items/;x=1;label=a"),
        json!({"x": 1, "label": "a"})
    );
}
