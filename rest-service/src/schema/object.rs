use std::fmt;

use futures::future::{self, BoxFuture, FutureExt};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use super::{FieldSpec, FieldViolation, Schema};
use crate::bucket::Args;

/// Value type accepted by a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    /// Any JSON number. Numeric strings are converted.
    Number,
    /// A whole number. Integral strings and floats are converted.
    Integer,
    /// `true`/`false`, also from the strings `"true"` and `"false"`.
    Boolean,
    Object,
    Array,
    /// Anything, including `null`.
    Any,
}

impl FieldType {
    fn expected(self) -> &'static str {
        match self {
            Self::String => "must be a string",
            Self::Number => "must be a number",
            Self::Integer => "must be an integer",
            Self::Boolean => "must be a boolean",
            Self::Object => "must be an object",
            Self::Array => "must be an array",
            Self::Any => "is invalid",
        }
    }

    /// Checks a present value, converting it where the type allows.
    fn coerce(self, value: Value) -> Option<Value> {
        match (self, value) {
            (Self::Any, v) => Some(v),
            (Self::String, v @ Value::String(_)) => Some(v),
            (Self::Number, v @ Value::Number(_)) => Some(v),
            (Self::Number, Value::String(s)) => parse_number(s.trim()).map(Value::Number),
            (Self::Integer, Value::Number(n)) => integral(&n).map(Value::Number),
            (Self::Integer, Value::String(s)) => parse_number(s.trim())
                .and_then(|n| integral(&n))
                .map(Value::Number),
            (Self::Boolean, v @ Value::Bool(_)) => Some(v),
            (Self::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (Self::Object, v @ Value::Object(_)) => Some(v),
            (Self::Array, v @ Value::Array(_)) => Some(v),
            _ => None,
        }
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i.into());
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn integral(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return Some(n.clone());
    }
    let f = n.as_f64()?;
    // i64::MAX as f64 rounds up, so the upper bound is exclusive
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| Number::from(f as i64))
}

/// A field declaration in an [`ObjectSchema`].
///
/// Fields are optional unless marked [`required`](Field::required). A field
/// with a default is never reported missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    kind: FieldType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<Value>,
}

impl Field {
    pub fn new(kind: FieldType) -> Self {
        Self {
            kind,
            required: false,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn object() -> Self {
        Self::new(FieldType::Object)
    }

    pub fn array() -> Self {
        Self::new(FieldType::Array)
    }

    pub fn any() -> Self {
        Self::new(FieldType::Any)
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value injected when the field is absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn kind(&self) -> FieldType {
        self.kind
    }
}

/// A Joi-style object schema: named, typed fields with optional defaults.
///
/// Validation runs field by field in declaration order and stops at the first
/// violation. A deserialized schema keeps the order its fields have in the
/// source document. Keys the schema does not declare are rejected with
/// `is not allowed`.
///
/// ## Examples
///
/// ```rust
/// use rest_service::schema::{Field, ObjectSchema};
/// use serde_json::json;
///
/// let schema = ObjectSchema::new()
///     .field("take", Field::number().required())
///     .field("x-site-code", Field::string().default("test"));
///
/// let input = json!({ "take": "10" }).as_object().cloned().unwrap();
/// let validated = schema.check(input).unwrap();
/// assert_eq!(validated["take"], json!(10));
/// assert_eq!(validated["x-site-code"], json!("test"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<(String, Field)>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field, replacing any earlier declaration with the same name.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        let name = name.into();
        self.fields.retain(|(existing, _)| *existing != name);
        self.fields.push((name, field));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates synchronously. [`Schema::validate`] wraps this.
    pub fn check(&self, mut value: Args) -> Result<Args, FieldViolation> {
        let mut validated = Args::new();

        for (name, field) in &self.fields {
            match value.remove(name) {
                Some(raw) => {
                    let coerced = field
                        .kind
                        .coerce(raw)
                        .ok_or_else(|| FieldViolation::new(name, field.kind.expected()))?;
                    validated.insert(name.clone(), coerced);
                }
                None => {
                    if let Some(default) = &field.default {
                        validated.insert(name.clone(), default.clone());
                    } else if field.required {
                        return Err(FieldViolation::new(name, "is required"));
                    }
                }
            }
        }

        if let Some(unknown) = value.keys().next() {
            return Err(FieldViolation::new(unknown, "is not allowed"));
        }

        Ok(validated)
    }
}

impl<'de> Deserialize<'de> for ObjectSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = ObjectSchema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field declarations")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut schema = ObjectSchema::new();
                while let Some((name, field)) = map.next_entry::<String, Field>()? {
                    schema = schema.field(name, field);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

impl Schema for ObjectSchema {
    fn fields(&self) -> Vec<FieldSpec> {
        self.fields
            .iter()
            .map(|(name, field)| FieldSpec {
                name: name.clone(),
                required: field.required,
                default: field.default.clone(),
            })
            .collect()
    }

    fn validate(&self, value: Args) -> BoxFuture<'_, Result<Args, FieldViolation>> {
        future::ready(self.check(value)).boxed()
    }
}
