//! Argument classification.
//!
//! Call arguments arrive as one flat object. Each key is assigned to the first
//! bucket, in [`BucketKind::PRIORITY`] order, that declares it: either through
//! the bucket's schema or, for path and query parameters, through the
//! template itself. Keys no bucket declares are dropped.

use crate::bucket::{Args, BucketArgs, BucketKind};
use crate::descriptor::{AliasTable, SchemaIndex};
use crate::template::ParsedTemplate;

/// The outcome of classifying one call's arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Arguments grouped by bucket, keyed by the declared field name.
    pub args: BucketArgs,
    /// Caller keys that matched no bucket.
    pub dropped: Vec<String>,
}

/// Assigns every caller argument to a bucket.
///
/// For each key, every bucket is tried in priority order with the key first
/// resolved through that bucket's aliases. A bucket accepts the key when its
/// schema declares the field (case-insensitive) or, for
/// [`Params`](BucketKind::Params) and [`Query`](BucketKind::Query), when the
/// template declares it. The value is stored under the field name as declared.
///
/// This is a pure function of its inputs.
pub fn classify(
    args: &Args,
    index: &SchemaIndex,
    alias: &AliasTable,
    template: &ParsedTemplate,
) -> Classification {
    let mut classification = Classification::default();

    for (key, value) in args {
        match place(key, index, alias, template) {
            Some((bucket, field)) => {
                classification
                    .args
                    .get_mut(bucket)
                    .insert(field.to_string(), value.clone());
            }
            None => classification.dropped.push(key.clone()),
        }
    }

    classification
}

fn place<'a>(
    key: &'a str,
    index: &'a SchemaIndex,
    alias: &'a AliasTable,
    template: &'a ParsedTemplate,
) -> Option<(BucketKind, &'a str)> {
    BucketKind::PRIORITY.into_iter().find_map(|bucket| {
        let effective = alias.resolve(bucket, key);
        if let Some(spec) = index.lookup(bucket, effective) {
            return Some((bucket, spec.name.as_str()));
        }
        let implicit = match bucket {
            BucketKind::Params => template.declares_path_param(effective),
            BucketKind::Query => template.declares_query_param(effective),
            BucketKind::Headers | BucketKind::Payload => None,
        };
        implicit.map(|name| (bucket, name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::EndpointDescriptor;
    use crate::schema::{Field, ObjectSchema};
    use serde_json::{json, Value};

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    fn games_descriptor() -> (EndpointDescriptor, ParsedTemplate) {
        let template = "GET /players/{playerId}/games/{gameId}{?take,skip,limit}";
        let descriptor = EndpointDescriptor::builder()
            .template(template)
            .headers(
                ObjectSchema::new()
                    .field("x-site-code", Field::string().default("test"))
                    .field("x-correlation-token", Field::string().required()),
            )
            .query(
                ObjectSchema::new()
                    .field("take", Field::number().required())
                    .field("skip", Field::number().required()),
            )
            .alias("playerId", "id")
            .build();
        (descriptor, ParsedTemplate::parse(template).unwrap())
    }

    #[test]
    fn test_classifies_into_buckets_and_drops_extras() {
        let (descriptor, template) = games_descriptor();
        let input = args(json!({
            "x-correlation-token": "53b0eaed",
            "id": "12345",
            "thisShouldBeIgnored": "ggg",
            "take": 10,
            "skip": 20,
            "gameId": "87678"
        }));

        let result = classify(&input, &descriptor.index(), descriptor.alias(), &template);

        assert_eq!(result.args.headers(), &args(json!({ "x-correlation-token": "53b0eaed" })));
        assert_eq!(
            result.args.params(),
            &args(json!({ "playerId": "12345", "gameId": "87678" }))
        );
        assert_eq!(result.args.query(), &args(json!({ "take": 10, "skip": 20 })));
        assert!(result.args.payload().is_empty());
        assert_eq!(result.dropped, vec!["thisShouldBeIgnored".to_string()]);
    }

    #[test]
    fn test_headers_win_over_query() {
        let template = ParsedTemplate::parse("GET /games{?token}").unwrap();
        let descriptor = EndpointDescriptor::builder()
            .template("GET /games{?token}")
            .headers(ObjectSchema::new().field("token", Field::string()))
            .query(ObjectSchema::new().field("token", Field::string()))
            .build();

        let result = classify(
            &args(json!({ "token": "t" })),
            &descriptor.index(),
            descriptor.alias(),
            &template,
        );

        assert_eq!(result.args.headers(), &args(json!({ "token": "t" })));
        assert!(result.args.query().is_empty());
    }

    #[test]
    fn test_case_insensitive_match_uses_declared_name() {
        let (descriptor, template) = games_descriptor();
        let result = classify(
            &args(json!({ "X-Correlation-Token": "abc", "GAMEID": "1", "Limit": 5 })),
            &descriptor.index(),
            descriptor.alias(),
            &template,
        );
        assert_eq!(result.args.headers(), &args(json!({ "x-correlation-token": "abc" })));
        assert_eq!(result.args.params(), &args(json!({ "gameId": "1" })));
        assert_eq!(result.args.query(), &args(json!({ "limit": 5 })));
    }

    #[test]
    fn test_payload_requires_declared_field() {
        let template = ParsedTemplate::parse("POST /games").unwrap();
        let descriptor = EndpointDescriptor::builder()
            .template("POST /games")
            .payload(ObjectSchema::new().field("name", Field::string()))
            .build();
        let result = classify(
            &args(json!({ "name": "poker", "other": 1 })),
            &descriptor.index(),
            descriptor.alias(),
            &template,
        );
        assert_eq!(result.args.payload(), &args(json!({ "name": "poker" })));
        assert_eq!(result.dropped, vec!["other".to_string()]);
    }

    #[test]
    fn test_bucket_alias_only_applies_to_its_bucket() {
        let template = ParsedTemplate::parse("GET /players/{playerId}{?q}").unwrap();
        let descriptor = EndpointDescriptor::builder()
            .template("GET /players/{playerId}{?q}")
            .bucket_alias(BucketKind::Query, "q", "search")
            .build();
        let result = classify(
            &args(json!({ "search": "abc", "playerId": "7" })),
            &descriptor.index(),
            descriptor.alias(),
            &template,
        );
        assert_eq!(result.args.query(), &args(json!({ "q": "abc" })));
        assert_eq!(result.args.params(), &args(json!({ "playerId": "7" })));
    }

    #[test]
    fn test_no_schemas_no_template_params_drops_everything() {
        let template = ParsedTemplate::parse("GET /diagnostics/health").unwrap();
        let descriptor = EndpointDescriptor::builder().template("GET /diagnostics/health").build();
        let result = classify(
            &args(json!({ "a": 1 })),
            &descriptor.index(),
            descriptor.alias(),
            &template,
        );
        assert!(result.args.iter().all(|(_, bucket)| bucket.is_empty()));
        assert_eq!(result.dropped, vec!["a".to_string()]);
    }
}
