//! Request dispatch and the hook extension points.
//!
//! A call that passed validation is turned into an [`OutgoingRequest`], shown
//! to the request hook, sent through the [`Transport`], and its outcome is
//! handed to the response hook. The response hook runs exactly once per
//! dispatched call, with either the response or the failure, and its return
//! value is what the caller receives.

use std::future::Future;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::bucket::{plain_string, Args};
use crate::error::{ServiceError, TransportError};
use crate::method::RestMethod;
use crate::response::ResponseEnvelope;
use crate::transport::{RequestOptions, Transport, TransportPayload, TransportResponse};

/// Headers every request starts with. Caller headers override them.
pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "application/json"),
    ("Accept", "application/json"),
];

/// The request as it will be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: RestMethod,
    pub url: String,
    pub options: RequestOptions,
}

/// Sees every outgoing request and returns the one actually sent.
///
/// Implemented for any `Fn(OutgoingRequest) -> impl Future<Output =
/// Result<OutgoingRequest, ServiceError>>`. An error skips the transport and
/// goes to the response hook.
pub trait RequestHook: Send + Sync {
    fn on_request(
        &self,
        request: OutgoingRequest,
    ) -> BoxFuture<'static, Result<OutgoingRequest, ServiceError>>;
}

impl<F, Fut> RequestHook for F
where
    F: Fn(OutgoingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<OutgoingRequest, ServiceError>> + Send + 'static,
{
    fn on_request(
        &self,
        request: OutgoingRequest,
    ) -> BoxFuture<'static, Result<OutgoingRequest, ServiceError>> {
        self(request).boxed()
    }
}

/// Decides the final outcome of a dispatched call.
///
/// Receives `Ok(response)` for a completed exchange or `Err(error)` for a
/// transport or request-hook failure. Returning `Ok` from an `Err` input
/// recovers the call.
///
/// ## Examples
///
/// ```rust
/// use rest_service::{ResponseEnvelope, ServiceError};
/// use serde_json::json;
///
/// let fallback = |outcome: Result<ResponseEnvelope, ServiceError>| async move {
///     outcome.or_else(|_| Ok::<_, ServiceError>(ResponseEnvelope::new(200, json!({ "games": [] }))))
/// };
/// # let _: &dyn rest_service::ResponseHook = &fallback;
/// ```
pub trait ResponseHook: Send + Sync {
    fn on_response(
        &self,
        outcome: Result<ResponseEnvelope, ServiceError>,
    ) -> BoxFuture<'static, Result<ResponseEnvelope, ServiceError>>;
}

impl<F, Fut> ResponseHook for F
where
    F: Fn(Result<ResponseEnvelope, ServiceError>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ResponseEnvelope, ServiceError>> + Send + 'static,
{
    fn on_response(
        &self,
        outcome: Result<ResponseEnvelope, ServiceError>,
    ) -> BoxFuture<'static, Result<ResponseEnvelope, ServiceError>> {
        self(outcome).boxed()
    }
}

/// Merges caller headers over [`DEFAULT_HEADERS`], comparing names
/// case-insensitively. Values are rendered as plain strings.
pub fn merge_headers(caller: &Args) -> RequestOptions {
    let mut options = RequestOptions::default();
    for (name, value) in DEFAULT_HEADERS {
        if !caller.keys().any(|key| key.eq_ignore_ascii_case(name)) {
            options.headers.insert(name.to_string(), value.to_string());
        }
    }
    for (name, value) in caller {
        options.headers.insert(name.clone(), plain_string(value));
    }
    options
}

/// Decodes a transport response into an envelope.
///
/// Byte bodies are parsed as JSON; an empty (or whitespace-only) body becomes
/// `{}`.
///
/// ## Errors
///
/// Returns [`TransportError::Decode`] if a byte body is not valid JSON.
pub fn decode_response(response: TransportResponse) -> Result<ResponseEnvelope, TransportError> {
    let payload = match response.payload {
        TransportPayload::Json(value) => value,
        TransportPayload::Bytes(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
            Value::Object(Default::default())
        }
        TransportPayload::Bytes(bytes) => {
            serde_json::from_slice(&bytes).map_err(TransportError::Decode)?
        }
    };
    Ok(ResponseEnvelope {
        status_code: response.status_code,
        headers: response.headers,
        payload,
    })
}

/// Everything the dispatcher needs for one call.
pub struct Dispatch<'a> {
    pub transport: &'a dyn Transport,
    pub request_hook: Option<&'a dyn RequestHook>,
    pub response_hook: Option<&'a dyn ResponseHook>,
}

impl Dispatch<'_> {
    /// Sends a request and resolves the call's final outcome.
    pub async fn send(
        &self,
        method: RestMethod,
        url: String,
        headers: &Args,
        payload: Option<&Args>,
    ) -> Result<ResponseEnvelope, ServiceError> {
        let mut options = merge_headers(headers);
        options.body = payload.map(|fields| Bytes::from(Value::Object(fields.clone()).to_string()));

        let request = OutgoingRequest { method, url, options };
        let outcome = self.exchange(request).await;
        let failed = outcome.is_err();

        match self.response_hook {
            Some(hook) => {
                let resolved = hook.on_response(outcome).await;
                if failed && resolved.is_ok() {
                    warn!("response hook recovered a failed request");
                }
                resolved
            }
            None => outcome,
        }
    }

    async fn exchange(&self, request: OutgoingRequest) -> Result<ResponseEnvelope, ServiceError> {
        let request = match self.request_hook {
            Some(hook) => hook.on_request(request).await?,
            None => request,
        };
        debug!(method = %request.method, url = %request.url, "dispatching request");

        let response = self
            .transport
            .request(request.method, &request.url, request.options)
            .await?;
        Ok(decode_response(response)?)
    }
}
