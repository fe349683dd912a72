use thiserror::Error;

/// Failures of the HTTP exchange.
///
/// These are the only per-call errors handed to a response hook, which may
/// turn them into a successful outcome.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The resolved URL does not parse.
    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl {
        /// The URL as built.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A request header name or value cannot be sent.
    #[error("invalid request header \"{name}\"")]
    InvalidHeader {
        /// The header name.
        name: String,
    },

    /// The response body is not valid JSON.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The server answered with a non-success status.
    ///
    /// Produced only by [`ResponseEnvelope::error_for_status`](crate::ResponseEnvelope::error_for_status).
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The response body, or the canonical reason if empty.
        message: String,
    },

    /// A custom transport failed for its own reasons.
    #[error("{0}")]
    Other(String),
}
