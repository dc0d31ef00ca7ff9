use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use dto_marshal::{inspect, FieldKind, KeyCase, Map, MarshalError, SchemaBuilder, TransferObject};
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, PartialEq)]
struct UserDto {
    name: String,
    age: u32,
}

impl TransferObject for UserDto {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .field("name", |u: &Self| &u.name, |u, v| u.name = v)
            .field("age", |u: &Self| &u.age, |u, v| u.age = v)
    }
}

#[derive(Debug, Default)]
struct ComplexDto {
    user: Option<UserDto>,
    role: String,
}

impl TransferObject for ComplexDto {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .nested("user", |c: &Self| c.user.as_ref(), |c, v| c.user = Some(v))
            .field("role", |c: &Self| &c.role, |c, v| c.role = v)
    }
}

#[derive(Debug, Default)]
struct SignupDto {
    first_name: String,
    last_name: Option<String>,
    email_verified: bool,
    created_at: Option<DateTime<FixedOffset>>,
    reviewed_at: Option<DateTime<Utc>>,
    birthday: Option<NaiveDate>,
    preferences: BTreeMap<String, String>,
}

impl TransferObject for SignupDto {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .field("firstName", |s: &Self| &s.first_name, |s, v| s.first_name = v)
            .field("lastName", |s: &Self| &s.last_name, |s, v| s.last_name = v)
            .field("emailVerified", |s: &Self| &s.email_verified, |s, v| s.email_verified = v)
            .date("createdAt", |s: &Self| s.created_at.as_ref(), |s, v| s.created_at = Some(v))
            .date("reviewedAt", |s: &Self| s.reviewed_at.as_ref(), |s, v| s.reviewed_at = Some(v))
            .date("birthday", |s: &Self| s.birthday.as_ref(), |s, v| s.birthday = Some(v))
            .field("preferences", |s: &Self| &s.preferences, |s, v| s.preferences = v)
    }
}

fn object(value: Value) -> Map {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// 測試基本的 JSON 往返
#[test]
fn test_simple_json_round_trip() -> Result<()> {
    let user = UserDto::from_json(r#"{"name":"John","age":30}"#)?;
    assert_eq!(user, UserDto { name: "John".to_string(), age: 30 });
    assert_eq!(user.to_json()?, r#"{"name":"John","age":30}"#);
    Ok(())
}

#[test]
fn test_display_prints_json() -> Result<()> {
    let user = UserDto { name: "John".to_string(), age: 30 };
    assert_eq!(user.display().to_string(), user.to_json()?);
    assert_eq!(format!("user={}", user.display()), r#"user={"name":"John","age":30}"#);
    Ok(())
}

#[test]
fn test_snake_case_input_and_output() -> Result<()> {
    let signup = SignupDto::from_array(object(json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email_verified": true,
        "preferences": {"color_theme": "dark"}
    })))?;

    assert_eq!(signup.first_name, "Ada");
    assert_eq!(signup.last_name.as_deref(), Some("Lovelace"));
    assert!(signup.email_verified);
    assert_eq!(signup.preferences.get("colorTheme").map(String::as_str), Some("dark"));

    let snake = signup.to_snake_case_array()?;
    assert_eq!(snake["first_name"], json!("Ada"));
    assert_eq!(snake["email_verified"], json!(true));
    assert_eq!(snake["preferences"], json!({"color_theme": "dark"}));
    assert_eq!(snake["created_at"], Value::Null);

    let json = signup.to_snake_case_json()?;
    assert!(json.starts_with(r#"{"first_name":"Ada","last_name":"Lovelace""#));
    Ok(())
}

#[test]
fn test_other_key_cases() -> Result<()> {
    let signup = SignupDto::from_json(r#"{"firstName":"Ada","emailVerified":false}"#)?;

    let kebab = signup.to_cased_array(KeyCase::Kebab)?;
    assert_eq!(kebab["first-name"], json!("Ada"));

    let pascal = signup.to_cased_array(KeyCase::Pascal)?;
    assert_eq!(pascal["EmailVerified"], json!(false));
    Ok(())
}

#[test]
fn test_nested_structure_round_trip() -> Result<()> {
    let input = object(json!({"user": {"name": "John", "age": 30}, "role": "admin"}));

    let complex = ComplexDto::from_array(input.clone())?;
    assert_eq!(
        complex.user,
        Some(UserDto { name: "John".to_string(), age: 30 })
    );
    assert_eq!(complex.role, "admin");
    assert_eq!(complex.to_array()?, input);
    Ok(())
}

#[test]
fn test_nested_field_rejects_scalars() {
    let err = ComplexDto::from_array(object(json!({"user": "John"}))).unwrap_err();
    assert!(matches!(err, MarshalError::TypeMismatch { ref field, .. } if field == "user"));
}

#[test]
fn test_date_fidelity() -> Result<()> {
    let signup = SignupDto::from_array(object(json!({"created_at": "2023-10-27T10:00:00+00:00"})))?;
    let map = signup.to_array()?;
    assert_eq!(map["createdAt"], json!("2023-10-27T10:00:00+00:00"));

    let signup = SignupDto::from_array(object(json!({"created_at": "2023-10-27T10:00:00+05:30"})))?;
    assert_eq!(signup.to_array()?["createdAt"], json!("2023-10-27T10:00:00+05:30"));
    Ok(())
}

#[test]
fn test_date_flavours() -> Result<()> {
    let signup = SignupDto::from_array(object(json!({
        "reviewed_at": "2024-03-01T08:00:00+02:00",
        "birthday": "1815-12-10"
    })))?;

    let map = signup.to_array()?;
    assert_eq!(map["reviewedAt"], json!("2024-03-01T06:00:00+00:00"));
    assert_eq!(map["birthday"], json!("1815-12-10T00:00:00+00:00"));
    Ok(())
}

#[test]
fn test_malformed_date_is_rejected() {
    let err = SignupDto::from_array(object(json!({"createdAt": "yesterday"}))).unwrap_err();
    assert!(matches!(err, MarshalError::DateParse { ref value, .. } if value == "yesterday"));
}

#[test]
fn test_missing_field_tolerance() -> Result<()> {
    let signup = SignupDto::from_array(Map::new())?;
    assert!(signup.first_name.is_empty());
    assert!(signup.last_name.is_none());
    assert!(signup.created_at.is_none());

    let complex = ComplexDto::from_array(Map::new())?;
    assert!(complex.user.is_none());
    Ok(())
}

#[test]
fn test_round_trip_property() -> Result<()> {
    let samples = [
        json!({"first_name": "Ada", "created_at": "2023-10-27T10:00:00+00:00"}),
        json!({"firstName": "Grace", "lastName": "Hopper", "emailVerified": true}),
        json!({"birthday": "1906-12-09", "preferences": {"lang": "en"}}),
        json!({}),
    ];

    for sample in samples {
        let first = SignupDto::from_array(object(sample))?.to_array()?;
        let second = SignupDto::from_array(first.clone())?.to_array()?;
        assert_eq!(first, second);
    }
    Ok(())
}

#[test]
fn test_from_json_requires_an_object() {
    for payload in ["[]", "null", "{\"name\":"] {
        assert!(matches!(
            UserDto::from_json(payload),
            Err(MarshalError::MalformedPayload { .. })
        ));
    }
}

#[test]
fn test_field_inspector() -> Result<()> {
    let fields = inspect::<SignupDto>()?;
    let keys: Vec<&str> = fields.iter().map(|f| f.external_key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "first_name",
            "last_name",
            "email_verified",
            "created_at",
            "reviewed_at",
            "birthday",
            "preferences"
        ]
    );
    assert_eq!(fields[3].kind, FieldKind::DateTime);

    let nested = inspect::<ComplexDto>()?;
    assert!(nested[0].is_nested_transfer_object);
    assert!(nested[0].declared_type.ends_with("UserDto"));
    Ok(())
}
