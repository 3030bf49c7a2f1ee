use serde_json::json;

use zenith_core::{FieldKind, MessageShape, SchemaRegistry, ServiceDescriptor, ShapeError, Status};

fn echo_shape() -> MessageShape {
    MessageShape::new()
        .field("text", FieldKind::Text)
        .optional_field("count", FieldKind::Int)
}

#[test]
fn accepts_matching_payload() {
    let shape = echo_shape();
    assert_eq!(shape.validate(&json!({"text": "hi"})), Ok(()));
    assert_eq!(shape.validate(&json!({"text": "hi", "count": 3})), Ok(()));
}

#[test]
fn optional_fields_may_be_null() {
    let shape = echo_shape();
    assert_eq!(shape.validate(&json!({"text": "hi", "count": null})), Ok(()));
}

#[test]
fn rejects_non_object_payload() {
    let shape = echo_shape();
    assert_eq!(shape.validate(&json!("hi")), Err(ShapeError::NotAnObject));
}

#[test]
fn rejects_missing_required_field() {
    let shape = echo_shape();
    assert_eq!(
        shape.validate(&json!({"count": 3})),
        Err(ShapeError::MissingField("text".to_string()))
    );
}

#[test]
fn rejects_wrong_kind() {
    let shape = echo_shape();
    assert_eq!(
        shape.validate(&json!({"text": 7})),
        Err(ShapeError::WrongKind {
            field: "text".to_string(),
            expected: FieldKind::Text,
        })
    );
}

#[test]
fn rejects_undeclared_field() {
    let shape = echo_shape();
    assert_eq!(
        shape.validate(&json!({"text": "hi", "extra": true})),
        Err(ShapeError::UnknownField("extra".to_string()))
    );
}

#[test]
fn any_field_accepts_everything() {
    let shape = MessageShape::new().field("value", FieldKind::Any);
    assert_eq!(shape.validate(&json!({"value": [1, 2, 3]})), Ok(()));
    assert_eq!(shape.validate(&json!({"value": "text"})), Ok(()));
}

#[test]
fn registry_resolves_registered_methods() {
    let mut registry = SchemaRegistry::new();
    registry.register(ServiceDescriptor::new("echo").method(
        "Echo",
        echo_shape(),
        MessageShape::new().field("text", FieldKind::Text),
    ));

    let method = registry.resolve("echo", "Echo").unwrap();
    assert_eq!(method.service(), "echo");
    assert_eq!(method.name(), "Echo");
    assert_eq!(method.full_name(), "echo.Echo");

    assert!(registry.resolve("echo", "Nope").is_none());
    assert!(registry.resolve("nope", "Echo").is_none());
}

#[test]
fn registry_loads_from_json() {
    let text = r#"
    {
      "services": [
        {
          "name": "echo",
          "methods": [
            {
              "name": "Echo",
              "input": { "fields": { "text": { "kind": "text" } } },
              "output": { "fields": { "text": { "kind": "text" } } }
            },
            { "name": "Ping" }
          ]
        }
      ]
    }
    "#;

    let registry = SchemaRegistry::from_json_str(text).unwrap();

    let echo = registry.resolve("echo", "Echo").unwrap();
    assert_eq!(echo.input().validate(&json!({"text": "hi"})), Ok(()));
    assert_eq!(
        echo.input().validate(&json!({"text": 1})),
        Err(ShapeError::WrongKind {
            field: "text".to_string(),
            expected: FieldKind::Text,
        })
    );

    // A method with no declared shapes accepts an empty object
    let ping = registry.resolve("echo", "Ping").unwrap();
    assert_eq!(ping.input().validate(&json!({})), Ok(()));
}

#[test]
fn registry_rejects_malformed_json() {
    assert!(SchemaRegistry::from_json_str("{not json").is_err());
    assert!(SchemaRegistry::from_json_str(r#"{"services": 3}"#).is_err());
}

#[test]
fn status_labels_are_stable() {
    assert_eq!(Status::Ok.to_string(), "ok");
    assert_eq!(Status::ApplicationError.to_string(), "application_error");
    assert_eq!(Status::DeadlineExceeded.to_string(), "deadline_exceeded");
    assert!(Status::Ok.is_ok());
    assert!(!Status::Cancelled.is_ok());
}
