use thiserror::Error;

use crate::bucket::BucketKind;

/// A bucket of call arguments failed its schema.
///
/// Only the first failing bucket (in priority order) is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{bucket} validation failed: \"{field}\" {reason}")]
pub struct ValidationError {
    /// The bucket whose schema rejected the value.
    pub bucket: BucketKind,
    /// The offending field name.
    pub field: String,
    /// Why the field was rejected, e.g. `is required`.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for a field in the given bucket.
    pub fn new(bucket: BucketKind, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            bucket,
            field: field.into(),
            reason: reason.into(),
        }
    }
}
