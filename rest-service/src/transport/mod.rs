//! The HTTP transport collaborator.
//!
//! The dispatcher only needs `request(method, url, options) -> response`.
//! [`ReqwestTransport`] is the default implementation; tests and embedders can
//! supply their own.

mod reqwest_transport;

use std::collections::BTreeMap;

use bytes::Bytes;
use futures::future::BoxFuture;
use serde_json::Value;

pub use reqwest_transport::{ReqwestTransport, ReqwestTransportBuilder};

use crate::error::TransportError;
use crate::method::RestMethod;

/// Headers and body of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    /// The serialized JSON body, if the endpoint sends one.
    pub body: Option<Bytes>,
}

impl RequestOptions {
    /// Returns a header value, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response body as produced by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportPayload {
    /// Raw bytes, JSON-decoded by the dispatcher.
    Bytes(Bytes),
    /// A body the transport already decoded.
    Json(Value),
}

/// A response as produced by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub payload: TransportPayload,
}

/// Sends one HTTP request.
///
/// This trait is dyn-compatible by using boxed futures. A transport may impose
/// its own timeouts; nothing above it does.
pub trait Transport: Send + Sync {
    fn request<'a>(
        &'a self,
        method: RestMethod,
        url: &'a str,
        options: RequestOptions,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>>;
}
