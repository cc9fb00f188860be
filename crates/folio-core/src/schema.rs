use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Declared shape of a flow input or output record
///
/// A Shape is an ordered list of fields. The same description drives runtime
/// validation and the JSON Schema sent to the model for structured
/// generation.
///
/// # Examples
///
/// ```rust
/// use folio_core::schema::{Field, Shape};
/// use serde_json::json;
///
/// let shape = Shape::new("ExplainTechStackInput")
///     .field(Field::string("technologyName").describe("The name of the technology to explain."))
///     .field(Field::string("projectContext").optional());
///
/// let validated = shape.validate(&json!({"technologyName": "Firebase"})).unwrap();
/// assert_eq!(validated.get_str("technologyName"), Some("Firebase"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    /// Shape name, used in schema output and logs
    pub name: String,

    /// Optional description of what this shape represents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared fields, in order
    pub fields: Vec<Field>,
}

/// A single declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default = "default_required")]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Minimum length in characters, string fields only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
}

fn default_required() -> bool {
    true
}

/// Primitive field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Boolean,
    /// A string restricted to a fixed set of values
    Enum(Vec<String>),
}

impl FieldType {
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Enum(_) => "string",
            FieldType::Boolean => "boolean",
        }
    }
}

impl Field {
    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            description: None,
            min_length: None,
        }
    }

    /// Required string field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Required boolean field
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Required enum-of-strings field
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FieldType::Enum(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn describe(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    fn check(&self, value: &Value) -> Result<Value, SchemaError> {
        match (&self.field_type, value) {
            (FieldType::String, Value::String(s)) => {
                self.check_length(s)?;
                Ok(value.clone())
            }
            (FieldType::Enum(allowed), Value::String(s)) => {
                if !allowed.iter().any(|a| a == s) {
                    return Err(SchemaError::ConstraintViolation {
                        field: self.name.clone(),
                        constraint: format!("one of [{}]", allowed.join(", ")),
                    });
                }
                Ok(value.clone())
            }
            (FieldType::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (expected, actual) => Err(SchemaError::TypeMismatch {
                field: self.name.clone(),
                expected: expected.label().to_string(),
                actual: json_type_name(actual).to_string(),
            }),
        }
    }

    fn check_length(&self, s: &str) -> Result<(), SchemaError> {
        if let Some(min) = self.min_length {
            if s.chars().count() < min {
                return Err(SchemaError::ConstraintViolation {
                    field: self.name.clone(),
                    constraint: format!("at least {} characters", min),
                });
            }
        }
        Ok(())
    }

    fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), Value::String(self.field_type.label().into()));
        if let FieldType::Enum(values) = &self.field_type {
            prop.insert(
                "enum".into(),
                Value::Array(values.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(desc) = &self.description {
            prop.insert("description".into(), Value::String(desc.clone()));
        }
        if let Some(min) = self.min_length {
            prop.insert("minLength".into(), Value::from(min));
        }
        Value::Object(prop)
    }
}

impl Shape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Create with description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Append a field
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a declared field by name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Same fields and types with every length constraint dropped
    pub fn without_constraints(&self) -> Shape {
        let mut shape = self.clone();
        for field in &mut shape.fields {
            field.min_length = None;
        }
        shape
    }

    /// Validate a value against this shape
    ///
    /// Fields are checked in declaration order, so the first violation
    /// reported is the first offending declared field. Undeclared fields in
    /// `value` are dropped from the result rather than rejected.
    pub fn validate(&self, value: &Value) -> Result<ValidatedValue, SchemaError> {
        let obj = match value {
            Value::Object(obj) => obj,
            other => {
                return Err(SchemaError::TypeMismatch {
                    field: "$".to_string(),
                    expected: "object".to_string(),
                    actual: json_type_name(other).to_string(),
                })
            }
        };

        let mut out = Map::new();
        for field in &self.fields {
            match obj.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(SchemaError::MissingField(field.name.clone()));
                    }
                }
                Some(v) => {
                    out.insert(field.name.clone(), field.check(v)?);
                }
            }
        }

        Ok(ValidatedValue(out))
    }

    /// JSON Schema description of this shape
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json_schema()))
            .collect();
        let required: Vec<Value> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| Value::String(f.name.clone()))
            .collect();

        let mut schema = serde_json::json!({
            "type": "object",
            "title": self.name,
            "properties": properties,
            "required": required,
        });
        if let Some(desc) = &self.description {
            schema["description"] = Value::String(desc.clone());
        }
        schema
    }
}

/// Free-function form of [`Shape::validate`]
pub fn validate(shape: &Shape, value: &Value) -> Result<ValidatedValue, SchemaError> {
    shape.validate(value)
}

/// A record that passed shape validation
///
/// Holds exactly the declared fields that were present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedValue(Map<String, Value>);

impl ValidatedValue {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// JSON type name of a value, as used in mismatch messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_input() -> Shape {
        Shape::new("GenerateProjectDocumentationInput")
            .field(Field::string("projectName").min_length(3))
            .field(Field::string("projectDescription").min_length(10))
            .field(Field::string("techStack").min_length(3))
            .field(Field::string("keyFeatures").min_length(10))
    }

    fn valid_doc_input() -> Value {
        json!({
            "projectName": "Folio",
            "projectDescription": "A portfolio with AI helpers",
            "techStack": "Next.js, Firebase",
            "keyFeatures": "Fast\nSimple\nTyped"
        })
    }

    #[test]
    fn test_exact_input_round_trips() {
        let input = valid_doc_input();
        let validated = doc_input().validate(&input).unwrap();
        assert_eq!(validated.into_value(), input);
    }

    #[test]
    fn test_each_missing_required_field_is_named() {
        let shape = doc_input();
        for field in &shape.fields {
            let mut input = valid_doc_input();
            input.as_object_mut().unwrap().remove(&field.name);
            let err = shape.validate(&input).unwrap_err();
            assert_eq!(err, SchemaError::MissingField(field.name.clone()));
        }
    }

    #[test]
    fn test_null_counts_as_missing() {
        let shape = Shape::new("S").field(Field::string("a"));
        assert_eq!(
            shape.validate(&json!({"a": null})).unwrap_err(),
            SchemaError::MissingField("a".into())
        );
    }

    #[test]
    fn test_type_mismatch() {
        let shape = Shape::new("S").field(Field::string("a"));
        let err = shape.validate(&json!({"a": 42})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::TypeMismatch {
                field: "a".into(),
                expected: "string".into(),
                actual: "number".into(),
            }
        );
    }

    #[test]
    fn test_root_must_be_object() {
        let shape = Shape::new("S").field(Field::string("a"));
        let err = shape.validate(&json!("just text")).unwrap_err();
        assert_eq!(err.field(), "$");
    }

    #[test]
    fn test_min_length_counts_characters() {
        let shape = Shape::new("S").field(Field::string("a").min_length(3));
        assert!(shape.validate(&json!({"a": "äöü"})).is_ok());
        let err = shape.validate(&json!({"a": "ab"})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::ConstraintViolation {
                field: "a".into(),
                constraint: "at least 3 characters".into(),
            }
        );
    }

    #[test]
    fn test_enum_and_boolean() {
        let shape = Shape::new("S")
            .field(Field::enumeration("tone", ["formal", "casual"]))
            .field(Field::boolean("brief").optional());

        let ok = shape.validate(&json!({"tone": "casual", "brief": true})).unwrap();
        assert_eq!(ok.get("brief"), Some(&json!(true)));

        let err = shape.validate(&json!({"tone": "angry"})).unwrap_err();
        assert!(matches!(err, SchemaError::ConstraintViolation { .. }));

        let err = shape.validate(&json!({"tone": "formal", "brief": "yes"})).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn test_undeclared_fields_dropped() {
        let shape = Shape::new("ExplainCodeOutput").field(Field::string("explanation"));
        let validated = shape
            .validate(&json!({"explanation": "ok", "safety": {"score": 1}}))
            .unwrap();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.into_value(), json!({"explanation": "ok"}));
    }

    #[test]
    fn test_optional_absent_is_omitted() {
        let shape = Shape::new("S")
            .field(Field::string("technologyName"))
            .field(Field::string("projectContext").optional());
        let validated = shape.validate(&json!({"technologyName": "Rust"})).unwrap();
        assert!(validated.get("projectContext").is_none());
    }

    #[test]
    fn test_without_constraints() {
        let relaxed = doc_input().without_constraints();
        assert!(relaxed.fields.iter().all(|f| f.min_length.is_none()));
        assert!(relaxed.validate(&json!({
            "projectName": "X",
            "projectDescription": "desc",
            "techStack": "Go",
            "keyFeatures": "Fast"
        }))
        .is_ok());
    }

    #[test]
    fn test_json_schema() {
        let schema = Shape::new("S")
            .with_description("demo")
            .field(Field::string("a").describe("first").min_length(2))
            .field(Field::enumeration("b", ["x", "y"]).optional())
            .to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["description"], "demo");
        assert_eq!(schema["properties"]["a"]["minLength"], 2);
        assert_eq!(schema["properties"]["b"]["enum"], json!(["x", "y"]));
        assert_eq!(schema["required"], json!(["a"]));
    }
}
