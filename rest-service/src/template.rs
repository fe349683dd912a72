//! URI template parsing.
//!
//! Templates are RFC 6570 flavoured: `"GET /players/{playerId}/games{?take,skip}"`.
//! Simple `{name}` expressions are path parameters; a single `{?a,b,c}`
//! expression declares the query parameters and marks where the query string
//! goes.

use crate::error::TemplateError;
use crate::method::RestMethod;

/// One piece of a template path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the URL unchanged.
    Literal(String),
    /// A `{name}` path placeholder.
    Param(String),
    /// The `{?...}` query placeholder.
    QueryGroup,
}

/// A template split into its method, path pieces and declared parameter names.
///
/// ## Examples
///
/// ```rust
/// use rest_service::{ParsedTemplate, RestMethod};
///
/// let parsed = ParsedTemplate::parse("GET /players/{playerId}/games{?take,skip}").unwrap();
/// assert_eq!(parsed.method, RestMethod::Get);
/// assert_eq!(parsed.path_param_names, vec!["playerId"]);
/// assert_eq!(parsed.query_param_names, vec!["take", "skip"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    pub method: RestMethod,
    /// The raw path token, placeholders included.
    pub path_template: String,
    /// Path placeholders in template order. Repeated placeholders appear once
    /// per occurrence.
    pub path_param_names: Vec<String>,
    /// Names declared by the query group, in template order.
    pub query_param_names: Vec<String>,
    segments: Vec<Segment>,
}

impl ParsedTemplate {
    /// Parses a `"<METHOD> <path>"` template.
    ///
    /// ## Errors
    ///
    /// - [`TemplateError::MissingMethod`] for a blank template
    /// - [`TemplateError::MissingPath`] when only a method is given
    /// - [`TemplateError::UnknownMethod`] for an unrecognised method token
    /// - [`TemplateError::MalformedPlaceholder`] for an unclosed or empty
    ///   `{}`, or a second query group
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut tokens = template.split_whitespace();
        let method_token = tokens.next().ok_or(TemplateError::MissingMethod)?;
        let path = tokens.next().ok_or_else(|| TemplateError::MissingPath {
            template: template.to_string(),
        })?;
        let method = method_token
            .parse::<RestMethod>()
            .map_err(|_| TemplateError::UnknownMethod(method_token.to_string()))?;

        let mut parsed = Self {
            method,
            path_template: path.to_string(),
            path_param_names: Vec::new(),
            query_param_names: Vec::new(),
            segments: Vec::new(),
        };
        parsed.scan_path(path)?;
        Ok(parsed)
    }

    fn scan_path(&mut self, path: &str) -> Result<(), TemplateError> {
        let malformed = || TemplateError::MalformedPlaceholder {
            path: path.to_string(),
        };
        let mut has_query_group = false;
        let mut rest = path;

        while let Some(open) = rest.find('{') {
            if rest[..open].contains('}') {
                return Err(malformed());
            }
            if open > 0 {
                self.segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + 1..];
            let close = after_open.find('}').ok_or_else(malformed)?;
            let expr = &after_open[..close];

            if let Some(names) = expr.strip_prefix('?') {
                if has_query_group {
                    return Err(malformed());
                }
                has_query_group = true;
                self.query_param_names = names
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect();
                self.segments.push(Segment::QueryGroup);
            } else {
                let name = expr.trim();
                if name.is_empty() || name.contains('{') {
                    return Err(malformed());
                }
                self.path_param_names.push(name.to_string());
                self.segments.push(Segment::Param(name.to_string()));
            }
            rest = &after_open[close + 1..];
        }

        if rest.contains('}') {
            return Err(malformed());
        }
        if !rest.is_empty() {
            self.segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(())
    }

    /// The path split into literal text and placeholders, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` if the template has a `{?...}` group.
    pub fn has_query_group(&self) -> bool {
        self.segments.contains(&Segment::QueryGroup)
    }

    /// Looks up a declared path parameter ignoring case, returning the name as
    /// the template spells it.
    pub fn declares_path_param(&self, name: &str) -> Option<&str> {
        find_ignore_case(&self.path_param_names, name)
    }

    /// Looks up a declared query parameter ignoring case.
    pub fn declares_query_param(&self, name: &str) -> Option<&str> {
        find_ignore_case(&self.query_param_names, name)
    }
}

fn find_ignore_case<'a>(names: &'a [String], name: &str) -> Option<&'a str> {
    names
        .iter()
        .find(|declared| declared.eq_ignore_ascii_case(name))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_path_and_query_params() {
        let parsed = ParsedTemplate::parse("GET /players/{playerId}/games/{gameId}{?take,skip,limit}").unwrap();
        assert_eq!(parsed.method, RestMethod::Get);
        assert_eq!(parsed.path_template, "/players/{playerId}/games/{gameId}{?take,skip,limit}");
        assert_eq!(parsed.path_param_names, vec!["playerId", "gameId"]);
        assert_eq!(parsed.query_param_names, vec!["take", "skip", "limit"]);
        assert_eq!(
            parsed.segments(),
            &[
                Segment::Literal("/players/".into()),
                Segment::Param("playerId".into()),
                Segment::Literal("/games/".into()),
                Segment::Param("gameId".into()),
                Segment::QueryGroup,
            ]
        );
    }

    #[test]
    fn test_plain_path_has_no_params() {
        let parsed = ParsedTemplate::parse("  GET   /diagnostics/health ").unwrap();
        assert!(parsed.path_param_names.is_empty());
        assert!(parsed.query_param_names.is_empty());
        assert!(!parsed.has_query_group());
        assert_eq!(parsed.segments(), &[Segment::Literal("/diagnostics/health".into())]);
    }

    #[test]
    fn test_query_group_only() {
        let parsed = ParsedTemplate::parse("get /games{?take,skip}").unwrap();
        assert_eq!(parsed.method, RestMethod::Get);
        assert!(parsed.path_param_names.is_empty());
        assert_eq!(parsed.query_param_names, vec!["take", "skip"]);
        assert!(parsed.has_query_group());
    }

    #[test]
    fn test_whitespace_splits_query_group() {
        // the path token ends at the first space, leaving the group unclosed
        assert_eq!(
            ParsedTemplate::parse("get /games{?take, skip}"),
            Err(TemplateError::MalformedPlaceholder {
                path: "/games{?take,".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_path_params_are_kept() {
        let parsed = ParsedTemplate::parse("PUT /a/{id}/b/{id}").unwrap();
        assert_eq!(parsed.path_param_names, vec!["id", "id"]);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let parsed = ParsedTemplate::parse("GET /players/{playerId}{?Take}").unwrap();
        assert_eq!(parsed.declares_path_param("PLAYERID"), Some("playerId"));
        assert_eq!(parsed.declares_query_param("take"), Some("Take"));
        assert_eq!(parsed.declares_query_param("skip"), None);
    }

    #[test]
    fn test_missing_method_and_path() {
        assert_eq!(ParsedTemplate::parse("   "), Err(TemplateError::MissingMethod));
        assert!(matches!(
            ParsedTemplate::parse("GET"),
            Err(TemplateError::MissingPath { .. })
        ));
    }

    #[test]
    fn test_unknown_method() {
        assert_eq!(
            ParsedTemplate::parse("FETCH /games"),
            Err(TemplateError::UnknownMethod("FETCH".into()))
        );
    }

    #[test]
    fn test_malformed_placeholders() {
        for template in [
            "GET /games/{id",
            "GET /games/{}",
            "GET /games/id}",
            "GET /games{?a}{?b}",
            "GET /a}/{b}",
        ] {
            assert!(
                matches!(
                    ParsedTemplate::parse(template),
                    Err(TemplateError::MalformedPlaceholder { .. })
                ),
                "{template} should be rejected"
            );
        }
    }
}
