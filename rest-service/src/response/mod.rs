//! The response envelope handed back to callers.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ServiceError, TransportError};

/// A completed HTTP exchange.
///
/// Any status code is a successful call at this layer; use
/// [`error_for_status`](Self::error_for_status) to treat non-2xx answers as
/// failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub status_code: u16,
    /// Response headers with lower-cased names.
    pub headers: BTreeMap<String, String>,
    /// The decoded JSON body. An empty body decodes to `{}`.
    pub payload: Value,
}

impl ResponseEnvelope {
    pub fn new(status_code: u16, payload: Value) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            payload,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns a header value, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Turns a non-2xx envelope into an error carrying the status and body.
    ///
    /// ## Errors
    ///
    /// Returns [`TransportError::HttpStatus`] when the status is not 2xx.
    pub fn error_for_status(self) -> Result<Self, ServiceError> {
        if self.is_success() {
            return Ok(self);
        }
        let message = match &self.payload {
            Value::String(text) => text.clone(),
            Value::Object(map) if map.is_empty() => reqwest::StatusCode::from_u16(self.status_code)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("unknown status")
                .to_string(),
            other => other.to_string(),
        };
        Err(TransportError::HttpStatus {
            status: self.status_code,
            message,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_passes_through() {
        let envelope = ResponseEnvelope::new(204, json!({}));
        assert!(envelope.is_success());
        assert_eq!(envelope.clone().error_for_status().unwrap(), envelope);
    }

    #[test]
    fn test_error_for_status_uses_body() {
        let err = ResponseEnvelope::new(404, json!({ "error": "no such game" }))
            .error_for_status()
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Transport(TransportError::HttpStatus { status: 404, ref message })
                if message.contains("no such game")
        ));
    }

    #[test]
    fn test_error_for_status_empty_body_uses_reason() {
        let err = ResponseEnvelope::new(503, json!({})).error_for_status().unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut envelope = ResponseEnvelope::new(200, json!({}));
        envelope.headers.insert("content-type".into(), "application/json".into());
        assert_eq!(envelope.header("Content-Type"), Some("application/json"));
    }
}
