//! HTTP methods accepted in endpoint templates.

use serde::Deserialize;
use strum::{Display, EnumIter, EnumString};

/// HTTP method of an endpoint.
///
/// Parsed case-insensitively from the first token of a template, so
/// `"get /games"` and `"GET /games"` describe the same endpoint. Displays in
/// upper case.
///
/// ## Examples
///
/// ```rust
/// use rest_service::RestMethod;
///
/// let parsed: RestMethod = "post".parse().unwrap();
/// assert_eq!(parsed, RestMethod::Post);
/// assert_eq!(parsed.to_string(), "POST");
/// assert_eq!(reqwest::Method::from(parsed), reqwest::Method::POST);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Deserialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(try_from = "String")]
pub enum RestMethod {
    /// HTTP GET - Retrieve a resource.
    Get,
    /// HTTP POST - Create a resource or trigger an action.
    Post,
    /// HTTP PUT - Replace a resource entirely.
    Put,
    /// HTTP PATCH - Partially update a resource.
    Patch,
    /// HTTP DELETE - Remove a resource.
    Delete,
    /// HTTP HEAD - Retrieve headers only.
    Head,
    /// HTTP OPTIONS - Query supported methods.
    Options,
}

impl RestMethod {
    /// Converts to the equivalent `reqwest::Method`.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}

impl TryFrom<String> for RestMethod {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}
