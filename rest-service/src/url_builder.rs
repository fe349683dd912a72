//! URL assembly from a parsed template and validated arguments.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::bucket::{plain_string, Args};
use crate::error::ServiceError;
use crate::template::{ParsedTemplate, Segment};

/// Characters `encodeURIComponent` leaves alone are the only ones not escaped.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a single path segment or query component.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT_ENCODE_SET).to_string()
}

/// Builds the request URL.
///
/// Every `{name}` placeholder is replaced by the encoded value of the matching
/// path parameter. The `{?...}` group becomes `?k=v&...` with pairs in the
/// order the template declares them, followed by any other query fields in
/// key order, or disappears when there is nothing to send. Without a query
/// group, a non-empty query is appended to the end of the path. `null` query
/// values are omitted.
///
/// ## Errors
///
/// Returns [`ServiceError::MissingPathParam`] if a placeholder has no value.
///
/// ## Examples
///
/// ```rust
/// use rest_service::{build_url, ParsedTemplate};
/// use serde_json::json;
///
/// let template = ParsedTemplate::parse("GET /games/{gameId}{?take,skip}").unwrap();
/// let params = json!({ "gameId": "a b" }).as_object().cloned().unwrap();
/// let query = json!({ "skip": 10, "take": 5 }).as_object().cloned().unwrap();
///
/// let url = build_url("https://api.example.com/", &template, &params, &query).unwrap();
/// assert_eq!(url, "https://api.example.com/games/a%20b?take=5&skip=10");
/// ```
pub fn build_url(
    base_uri: &str,
    template: &ParsedTemplate,
    params: &Args,
    query: &Args,
) -> Result<String, ServiceError> {
    let query_string = render_query(template, query);
    let mut url = base_uri.trim_end_matches('/').to_string();

    for segment in template.segments() {
        match segment {
            Segment::Literal(text) => url.push_str(text),
            Segment::Param(name) => {
                let value = lookup(params, name).ok_or_else(|| ServiceError::MissingPathParam {
                    name: name.clone(),
                })?;
                url.push_str(&encode_component(&plain_string(value)));
            }
            Segment::QueryGroup => url.push_str(&query_string),
        }
    }

    if !template.has_query_group() {
        url.push_str(&query_string);
    }

    Ok(url)
}

fn lookup<'a>(args: &'a Args, name: &str) -> Option<&'a Value> {
    args.get(name).or_else(|| {
        args.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Renders `?k=v&...`, or an empty string when no pair is sent.
fn render_query(template: &ParsedTemplate, query: &Args) -> String {
    let mut ordered: Vec<(&str, &Value)> = Vec::with_capacity(query.len());

    for name in &template.query_param_names {
        if let Some((key, value)) = query.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            if !ordered.iter().any(|(seen, _)| *seen == key.as_str()) {
                ordered.push((key.as_str(), value));
            }
        }
    }

    let mut rest: Vec<(&str, &Value)> = query
        .iter()
        .filter(|(key, _)| !ordered.iter().any(|(seen, _)| *seen == key.as_str()))
        .map(|(key, value)| (key.as_str(), value))
        .collect();
    rest.sort_by(|a, b| a.0.cmp(b.0));
    ordered.extend(rest);

    let pairs: Vec<String> = ordered
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            format!(
                "{}={}",
                encode_component(key),
                encode_component(&plain_string(value))
            )
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "http://baseuri.com";

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    fn url(template: &str, params: Value, query: Value) -> Result<String, ServiceError> {
        let parsed = ParsedTemplate::parse(template).unwrap();
        build_url(BASE, &parsed, &args(params), &args(query))
    }

    #[test]
    fn test_query_only_template() {
        assert_eq!(
            url("GET /games{?take,skip}", json!({}), json!({ "take": 10, "skip": 10 })).unwrap(),
            "http://baseuri.com/games?take=10&skip=10"
        );
    }

    #[test]
    fn test_whole_floats_render_as_integers() {
        assert_eq!(
            url("GET /games/{gameId}{?take}", json!({ "gameId": 7.0 }), json!({ "take": 10.0 }))
                .unwrap(),
            "http://baseuri.com/games/7?take=10"
        );
    }

    #[test]
    fn test_path_and_query_with_absent_optional() {
        assert_eq!(
            url(
                "GET /players/{playerId}/games/{gameId}{?take,skip,limit}",
                json!({ "playerId": "12345", "gameId": "87678" }),
                json!({ "skip": 20, "take": 10 }),
            )
            .unwrap(),
            "http://baseuri.com/players/12345/games/87678?take=10&skip=20"
        );
    }

    #[test]
    fn test_no_placeholders() {
        assert_eq!(
            url("GET /diagnostics/health", json!({}), json!({})).unwrap(),
            "http://baseuri.com/diagnostics/health"
        );
    }

    #[test]
    fn test_empty_query_removes_group() {
        assert_eq!(
            url("GET /games{?take,skip}", json!({}), json!({})).unwrap(),
            "http://baseuri.com/games"
        );
        assert_eq!(
            url("GET /games{?take}", json!({}), json!({ "take": null })).unwrap(),
            "http://baseuri.com/games"
        );
    }

    #[test]
    fn test_undeclared_query_fields_follow_declared_ones() {
        assert_eq!(
            url("GET /games{?take}", json!({}), json!({ "zeta": 1, "alpha": 2, "take": 3 })).unwrap(),
            "http://baseuri.com/games?take=3&alpha=2&zeta=1"
        );
        assert_eq!(
            url("GET /games", json!({}), json!({ "take": 3 })).unwrap(),
            "http://baseuri.com/games?take=3"
        );
    }

    #[test]
    fn test_values_are_percent_encoded() {
        assert_eq!(
            url(
                "GET /search/{term}{?q}",
                json!({ "term": "a/b c" }),
                json!({ "q": "x&y=z é" }),
            )
            .unwrap(),
            "http://baseuri.com/search/a%2Fb%20c?q=x%26y%3Dz%20%C3%A9"
        );
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn test_repeated_placeholder_substituted_everywhere() {
        assert_eq!(
            url("GET /a/{id}/b/{id}", json!({ "id": 7 }), json!({})).unwrap(),
            "http://baseuri.com/a/7/b/7"
        );
    }

    #[test]
    fn test_missing_path_param() {
        let err = url("GET /players/{playerId}", json!({}), json!({})).unwrap_err();
        assert!(matches!(err, ServiceError::MissingPathParam { name } if name == "playerId"));
    }

    #[test]
    fn test_trailing_slash_stripped_and_stable() {
        let parsed = ParsedTemplate::parse("GET /games/{id}").unwrap();
        let params = args(json!({ "id": "x" }));
        let first = build_url("http://baseuri.com///", &parsed, &params, &Args::new()).unwrap();
        let second = build_url("http://baseuri.com///", &parsed, &params, &Args::new()).unwrap();
        assert_eq!(first, "http://baseuri.com/games/x");
        assert_eq!(first, second);
    }

    #[test]
    fn test_encoded_values_decode_to_original() {
        let original = "player #1 / ñ & co";
        let encoded = encode_component(original);
        let decoded = percent_encoding::percent_decode_str(&encoded)
            .decode_utf8()
            .unwrap();
        assert_eq!(decoded, original);
    }
}
