//! The schema collaborator.
//!
//! The service never inspects values itself: each bucket is handed to a
//! [`Schema`] which validates it, applies defaults and may coerce values.
//! Besides validation, a schema must list its declared fields so that call
//! arguments can be classified before validation runs.
//!
//! [`ObjectSchema`] is the built-in implementation. Any other validator can be
//! plugged in by implementing [`Schema`].

mod object;

use std::fmt;

use futures::future::BoxFuture;
use serde_json::Value;

pub use object::{Field, FieldType, ObjectSchema};

use crate::bucket::Args;

/// A field declared by a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The field name, spelled as the schema declares it.
    pub name: String,
    /// Whether validation fails when the field is absent and has no default.
    pub required: bool,
    /// The value injected when the field is absent.
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: None,
        }
    }
}

/// A single rejected field reported by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.field, self.reason)
    }
}

/// Validation contract for one bucket of arguments.
///
/// This trait is dyn-compatible by returning boxed futures, so descriptors can
/// hold any mix of schema implementations.
///
/// ## Examples
///
/// ```rust
/// use rest_service::schema::{Field, ObjectSchema, Schema};
///
/// let schema = ObjectSchema::new()
///     .field("take", Field::number().required())
///     .field("x-site-code", Field::string().default("test"));
///
/// let names: Vec<_> = schema.fields().into_iter().map(|f| f.name).collect();
/// assert_eq!(names, vec!["take", "x-site-code"]);
/// ```
pub trait Schema: fmt::Debug + Send + Sync {
    /// Lists every declared field with its requirement and default.
    fn fields(&self) -> Vec<FieldSpec>;

    /// Validates an object, returning the validated (possibly coerced and
    /// defaulted) object or the first violation.
    fn validate(&self, value: Args) -> BoxFuture<'_, Result<Args, FieldViolation>>;
}
