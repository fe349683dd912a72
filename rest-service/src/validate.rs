//! Per-bucket validation.
//!
//! All four buckets are validated concurrently and awaited jointly. A bucket
//! without arguments is validated as an empty object so schema defaults still
//! appear. Template-declared parameters the schema does not cover are checked
//! here: path parameters are required, query parameters optional.

use tracing::debug;

use crate::bucket::{Args, BucketArgs, BucketKind};
use crate::descriptor::SchemaIndex;
use crate::error::ValidationError;
use crate::template::ParsedTemplate;

/// Validates classified arguments bucket by bucket.
///
/// Every bucket's validation runs to completion. If any fail, the first
/// failure in [`BucketKind::PRIORITY`] order is returned and the other results
/// are discarded.
pub async fn validate_buckets(
    classified: BucketArgs,
    index: &SchemaIndex,
    template: &ParsedTemplate,
) -> Result<BucketArgs, ValidationError> {
    let [headers, params, query, payload] = classified.into_array();

    let (headers, params, query, payload) = tokio::join!(
        validate_bucket(BucketKind::Headers, headers, index, template),
        validate_bucket(BucketKind::Params, params, index, template),
        validate_bucket(BucketKind::Query, query, index, template),
        validate_bucket(BucketKind::Payload, payload, index, template),
    );

    let mut validated = [headers?, params?, query?, payload?].into_iter();
    Ok(BucketArgs::from_fn(|_| validated.next().unwrap_or_default()))
}

async fn validate_bucket(
    kind: BucketKind,
    mut values: Args,
    index: &SchemaIndex,
    template: &ParsedTemplate,
) -> Result<Args, ValidationError> {
    let implicit_names: &[String] = match kind {
        BucketKind::Params => &template.path_param_names,
        BucketKind::Query => &template.query_param_names,
        BucketKind::Headers | BucketKind::Payload => &[],
    };

    // Template names the schema does not declare are validated here rather
    // than by the schema.
    let mut implicit = Args::new();
    for name in implicit_names {
        if index.lookup(kind, name).is_some() || implicit.contains_key(name) {
            continue;
        }
        match values.remove(name) {
            Some(value) => {
                implicit.insert(name.clone(), value);
            }
            None if kind == BucketKind::Params => {
                debug!(bucket = %kind, field = %name, "path parameter missing");
                return Err(ValidationError::new(kind, name, "is required"));
            }
            None => {}
        }
    }

    let mut validated = match index.bucket(kind) {
        Some(bucket) => bucket.schema().validate(values).await.map_err(|violation| {
            debug!(bucket = %kind, field = %violation.field, reason = %violation.reason, "validation failed");
            ValidationError::new(kind, violation.field, violation.reason)
        })?,
        None => values,
    };

    validated.extend(implicit);
    Ok(validated)
}
