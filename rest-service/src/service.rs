//! The service builder and the callable endpoints it produces.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, field, instrument, Span};
use url::Url;

use crate::bucket::{Args, BucketKind};
use crate::classify::classify;
use crate::definition::ServiceDefinition;
use crate::descriptor::{AliasTable, EndpointDescriptor, SchemaIndex};
use crate::dispatch::{Dispatch, RequestHook, ResponseHook};
use crate::endpoint_id::EndpointId;
use crate::error::{ConfigError, ServiceError};
use crate::response::ResponseEnvelope;
use crate::template::ParsedTemplate;
use crate::transport::{ReqwestTransport, Transport};
use crate::url_builder::build_url;
use crate::validate::validate_buckets;

/// Where a service's base URI comes from.
///
/// A factory is called exactly once, when the service is built.
pub enum BaseUri {
    Static(String),
    Factory(Box<dyn FnOnce() -> String + Send>),
}

impl BaseUri {
    /// Defers the base URI to a factory evaluated at build time.
    pub fn from_fn(factory: impl FnOnce() -> String + Send + 'static) -> Self {
        Self::Factory(Box::new(factory))
    }

    fn resolve(self) -> Result<String, ConfigError> {
        let uri = match self {
            Self::Static(uri) => uri,
            Self::Factory(factory) => factory(),
        };
        let trimmed = uri.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidBaseUri {
                uri,
                reason: "base URI is empty".to_string(),
            });
        }
        Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUri {
            uri: uri.clone(),
            reason: e.to_string(),
        })?;
        Ok(trimmed.trim_end_matches('/').to_string())
    }
}

impl fmt::Debug for BaseUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(uri) => f.debug_tuple("Static").field(uri).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<&str> for BaseUri {
    fn from(uri: &str) -> Self {
        Self::Static(uri.to_string())
    }
}

impl From<String> for BaseUri {
    fn from(uri: String) -> Self {
        Self::Static(uri)
    }
}

/// Builder for a [`Service`].
///
/// ## Examples
///
/// ```rust
/// use rest_service::{EndpointDescriptor, Service};
///
/// let service = Service::builder("http://baseuri.com")
///     .endpoint(
///         "getHealth",
///         EndpointDescriptor::builder().template("GET /diagnostics/health").build(),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(service.endpoint_names().collect::<Vec<_>>(), vec!["getHealth"]);
/// ```
pub struct ServiceBuilder {
    base_uri: BaseUri,
    endpoints: Vec<(String, EndpointDescriptor)>,
    request_hooks: Vec<(String, Arc<dyn RequestHook>)>,
    response_hooks: Vec<(String, Arc<dyn ResponseHook>)>,
    transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for ServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("base_uri", &self.base_uri)
            .field("endpoints", &self.endpoints)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

impl ServiceBuilder {
    fn new(base_uri: BaseUri) -> Self {
        Self {
            base_uri,
            endpoints: Vec::new(),
            request_hooks: Vec::new(),
            response_hooks: Vec::new(),
            transport: None,
        }
    }

    /// Registers an endpoint under `name`.
    pub fn endpoint(mut self, name: impl Into<String>, descriptor: EndpointDescriptor) -> Self {
        self.endpoints.push((name.into(), descriptor));
        self
    }

    /// Registers every endpoint of a declarative definition.
    pub fn definitions(mut self, definition: ServiceDefinition) -> Self {
        self.endpoints.extend(definition.into_descriptors());
        self
    }

    /// Attaches a request hook to an already registered endpoint, replacing
    /// any hook its descriptor carries.
    pub fn request_hook(
        mut self,
        name: impl Into<String>,
        hook: impl RequestHook + 'static,
    ) -> Self {
        let hook: Arc<dyn RequestHook> = Arc::new(hook);
        self.request_hooks.push((name.into(), hook));
        self
    }

    /// Attaches a response hook to an already registered endpoint, replacing
    /// any hook its descriptor carries.
    pub fn response_hook(
        mut self,
        name: impl Into<String>,
        hook: impl ResponseHook + 'static,
    ) -> Self {
        let hook: Arc<dyn ResponseHook> = Arc::new(hook);
        self.response_hooks.push((name.into(), hook));
        self
    }

    /// Uses a custom transport instead of a default [`ReqwestTransport`].
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Uses an already shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolves the base URI and binds every descriptor to it.
    ///
    /// ## Errors
    ///
    /// Returns a [`ConfigError`] if the base URI is empty or not a URL, an
    /// endpoint name is invalid or repeated, a descriptor has no template, a
    /// hook names an unknown endpoint, or the default transport cannot be
    /// built.
    pub fn build(self) -> Result<Service, ConfigError> {
        let base_uri: Arc<str> = Arc::from(self.base_uri.resolve()?);
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let mut descriptors: BTreeMap<EndpointId, EndpointDescriptor> = BTreeMap::new();
        for (name, descriptor) in self.endpoints {
            let id = EndpointId::new(name.clone()).map_err(|e| ConfigError::InvalidEndpointName {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            if descriptors.insert(id, descriptor).is_some() {
                return Err(ConfigError::DuplicateEndpoint(name));
            }
        }

        for (name, hook) in self.request_hooks {
            descriptors
                .get_mut(name.as_str())
                .ok_or(ConfigError::UnknownEndpoint(name.clone()))?
                .set_request_hook(hook);
        }
        for (name, hook) in self.response_hooks {
            descriptors
                .get_mut(name.as_str())
                .ok_or(ConfigError::UnknownEndpoint(name.clone()))?
                .set_response_hook(hook);
        }

        let endpoints = descriptors
            .into_iter()
            .map(|(id, descriptor)| {
                let endpoint = Endpoint::bind(id.clone(), &descriptor, &base_uri, &transport)?;
                Ok((id, endpoint))
            })
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        debug!(base_uri = %base_uri, endpoints = endpoints.len(), "service built");

        Ok(Service { base_uri, endpoints })
    }
}

/// A set of callable endpoints sharing one base URI and transport.
///
/// Cheap to clone; endpoints share their compiled descriptors.
#[derive(Clone)]
pub struct Service {
    base_uri: Arc<str>,
    endpoints: BTreeMap<EndpointId, Endpoint>,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("base_uri", &self.base_uri)
            .field("endpoints", &self.endpoints.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Service {
    pub fn builder(base_uri: impl Into<BaseUri>) -> ServiceBuilder {
        ServiceBuilder::new(base_uri.into())
    }

    /// The resolved base URI, without a trailing slash.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Endpoint names in sorted order.
    pub fn endpoint_names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(EndpointId::as_str)
    }

    /// Calls the endpoint registered as `name`.
    ///
    /// ## Errors
    ///
    /// Returns [`ServiceError::UnknownEndpoint`] for an unregistered name,
    /// otherwise whatever [`Endpoint::call`] returns.
    pub async fn call(&self, name: &str, args: Value) -> Result<ResponseEnvelope, ServiceError> {
        let endpoint = self
            .endpoint(name)
            .ok_or_else(|| ServiceError::UnknownEndpoint(name.to_string()))?;
        endpoint.call(args).await
    }
}

/// One descriptor bound to a base URI and transport.
#[derive(Clone)]
pub struct Endpoint {
    name: EndpointId,
    base_uri: Arc<str>,
    template: Arc<str>,
    index: SchemaIndex,
    alias: AliasTable,
    request_hook: Option<Arc<dyn RequestHook>>,
    response_hook: Option<Arc<dyn ResponseHook>>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl Endpoint {
    fn bind(
        name: EndpointId,
        descriptor: &EndpointDescriptor,
        base_uri: &Arc<str>,
        transport: &Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        let template = descriptor
            .resolved_template()
            .ok_or_else(|| ConfigError::MissingTemplate {
                endpoint: name.to_string(),
            })?;
        Ok(Self {
            name,
            base_uri: Arc::clone(base_uri),
            template: Arc::from(template),
            index: descriptor.index(),
            alias: descriptor.alias().clone(),
            request_hook: descriptor.request_hook().cloned(),
            response_hook: descriptor.response_hook().cloned(),
            transport: Arc::clone(transport),
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The `"<METHOD> <path>"` template this endpoint was declared with.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Validates `args`, builds the request and sends it.
    ///
    /// `args` must be a JSON object (or `null` for no arguments). Keys are
    /// classified into headers, path parameters, query parameters and payload;
    /// keys that fit nowhere are ignored.
    ///
    /// ## Errors
    ///
    /// Template, argument and validation errors are returned directly and
    /// never reach the response hook. Transport failures go through the
    /// response hook when one is registered, and the hook's result is
    /// returned.
    #[instrument(
        name = "rest_call",
        skip_all,
        fields(
            endpoint = %self.name,
            http.method = field::Empty,
            http.url = field::Empty,
            http.status_code = field::Empty,
            otel.kind = "client",
            otel.status_code = field::Empty,
        )
    )]
    pub async fn call(&self, args: Value) -> Result<ResponseEnvelope, ServiceError> {
        let args = into_args(args)?;
        let template = ParsedTemplate::parse(&self.template)?;
        Span::current().record("http.method", template.method.to_string().as_str());

        let classified = classify(&args, &self.index, &self.alias, &template);
        if !classified.dropped.is_empty() {
            debug!(dropped = ?classified.dropped, "ignoring arguments no bucket declares");
        }

        let validated = validate_buckets(classified.args, &self.index, &template).await?;
        let url = build_url(&self.base_uri, &template, validated.params(), validated.query())?;
        Span::current().record("http.url", url.as_str());

        let payload = self
            .index
            .bucket(BucketKind::Payload)
            .map(|_| validated.payload());
        let dispatch = Dispatch {
            transport: self.transport.as_ref(),
            request_hook: self.request_hook.as_deref(),
            response_hook: self.response_hook.as_deref(),
        };
        let result = dispatch
            .send(template.method, url, validated.headers(), payload)
            .await;

        match &result {
            Ok(response) => {
                Span::current().record("http.status_code", response.status_code);
                let otel_status = if response.status_code >= 500 { "ERROR" } else { "OK" };
                Span::current().record("otel.status_code", otel_status);
            }
            Err(err) => {
                Span::current().record("otel.status_code", "ERROR");
                debug!(error = %err, "call failed");
            }
        }

        result
    }
}

fn into_args(args: Value) -> Result<Args, ServiceError> {
    match args {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Args::new()),
        other => Err(ServiceError::InvalidArguments(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::tests::ScriptedTransport;
    use crate::dispatch::OutgoingRequest;
    use crate::error::{TemplateError, TransportError};
    use crate::schema::{Field, ObjectSchema};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn games_service(transport: Arc<ScriptedTransport>) -> Service {
        Service::builder("http://baseuri.com/")
            .shared_transport(transport)
            .endpoint(
                "getGames",
                EndpointDescriptor::builder()
                    .template("GET /games{?take,skip}")
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
                    .build(),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_call_builds_url_and_default_headers() {
        let transport = Arc::new(ScriptedTransport::default());
        let service = games_service(Arc::clone(&transport));

        service
            .call(
                "getGames",
                json!({ "x-correlation-token": "53b0eaed", "take": 10, "skip": 10 }),
            )
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].url, "http://baseuri.com/games?take=10&skip=10");
        assert_eq!(sent[0].options.header("x-site-code"), Some("test"));
        assert_eq!(sent[0].options.header("x-correlation-token"), Some("53b0eaed"));
        assert_eq!(sent[0].options.header("accept"), Some("application/json"));
        assert_eq!(sent[0].options.body, None);
    }

    #[tokio::test]
    async fn test_validation_error_skips_transport_and_hook() {
        let transport = Arc::new(ScriptedTransport::default());
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hook_calls);
        let service = Service::builder("http://baseuri.com")
            .shared_transport(Arc::clone(&transport) as Arc<dyn Transport>)
            .endpoint(
                "getGames",
                EndpointDescriptor::builder()
                    .template("GET /games{?take,skip}")
                    .query(ObjectSchema::new().field("take", Field::number().required()))
                    .build(),
            )
            .response_hook("getGames", move |outcome: Result<ResponseEnvelope, ServiceError>| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { outcome }
            })
            .build()
            .unwrap();

        let err = service.call("getGames", json!({ "skip": 1 })).await.unwrap_err();
        let validation = err.as_validation().unwrap();
        assert_eq!(validation.bucket, BucketKind::Query);
        assert_eq!(validation.field, "take");
        assert!(transport.sent().is_empty());
        assert_eq!(hook_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_template_error_detected_at_call() {
        let transport = Arc::new(ScriptedTransport::default());
        let service = Service::builder("http://baseuri.com")
            .shared_transport(transport)
            .endpoint("broken", EndpointDescriptor::builder().template("FETCH /games").build())
            .build()
            .unwrap();

        let err = service.call("broken", Value::Null).await.unwrap_err();
        assert!(matches!(err, ServiceError::Template(TemplateError::UnknownMethod(_))));
    }

    #[tokio::test]
    async fn test_optional_path_param_missing() {
        let transport = Arc::new(ScriptedTransport::default());
        let service = Service::builder("http://baseuri.com")
            .shared_transport(transport)
            .endpoint(
                "getPlayer",
                EndpointDescriptor::builder()
                    .template("GET /players/{playerId}")
                    .params(ObjectSchema::new().field("playerId", Field::string()))
                    .build(),
            )
            .build()
            .unwrap();

        let err = service.call("getPlayer", json!({})).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingPathParam { ref name } if name == "playerId"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_without_hook() {
        let transport = Arc::new(ScriptedTransport::failing());
        let service = Service::builder("http://baseuri.com")
            .shared_transport(transport)
            .endpoint(
                "getHealth",
                EndpointDescriptor::builder()
                    .template("GET /diagnostics/health")
                    .build(),
            )
            .build()
            .unwrap();

        let err = service.call("getHealth", Value::Null).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(TransportError::Other(_))));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_and_bad_arguments() {
        let service = games_service(Arc::new(ScriptedTransport::default()));
        assert!(matches!(
            service.call("nope", Value::Null).await,
            Err(ServiceError::UnknownEndpoint(_))
        ));
        assert!(matches!(
            service.call("getGames", json!([1, 2])).await,
            Err(ServiceError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_base_uri_factory_called_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let service = Service::builder(BaseUri::from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "http://factory.example.com/".to_string()
        }))
        .transport(ScriptedTransport::default())
        .build()
        .unwrap();

        assert_eq!(service.base_uri(), "http://factory.example.com");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_base_uri() {
        for uri in ["", "   ", "not a url"] {
            let result = Service::builder(uri).transport(ScriptedTransport::default()).build();
            assert!(matches!(result, Err(ConfigError::InvalidBaseUri { .. })), "{uri:?}");
        }
    }

    #[test]
    fn test_descriptor_without_template() {
        let result = Service::builder("http://baseuri.com")
            .transport(ScriptedTransport::default())
            .endpoint("getNothing", EndpointDescriptor::builder().build())
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingTemplate { ref endpoint }) if endpoint == "getNothing"
        ));
    }

    #[test]
    fn test_invalid_and_duplicate_names() {
        let health = || EndpointDescriptor::builder().template("GET /health").build();

        let invalid = Service::builder("http://baseuri.com")
            .transport(ScriptedTransport::default())
            .endpoint("get-health", health())
            .build();
        assert!(matches!(invalid, Err(ConfigError::InvalidEndpointName { .. })));

        let duplicate = Service::builder("http://baseuri.com")
            .transport(ScriptedTransport::default())
            .endpoint("getHealth", health())
            .endpoint("getHealth", health())
            .build();
        assert!(matches!(duplicate, Err(ConfigError::DuplicateEndpoint(_))));
    }

    #[test]
    fn test_hook_for_unknown_endpoint() {
        let result = Service::builder("http://baseuri.com")
            .transport(ScriptedTransport::default())
            .request_hook("ghost", |request: OutgoingRequest| async move { Ok::<_, ServiceError>(request) })
            .build();
        assert!(matches!(result, Err(ConfigError::UnknownEndpoint(_))));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_call_emits_tracing_events() {
        let transport = Arc::new(ScriptedTransport::default());
        let service = games_service(transport);

        service
            .call(
                "getGames",
                json!({ "x-correlation-token": "abc", "take": 1, "skip": 2, "unused": true }),
            )
            .await
            .unwrap();

        assert!(logs_contain("rest_call"));
        assert!(logs_contain("ignoring arguments no bucket declares"));
        assert!(logs_contain("dispatching request"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_validation_failure_is_logged() {
        let service = games_service(Arc::new(ScriptedTransport::default()));
        let _ = service.call("getGames", json!({ "take": 1, "skip": 2 })).await;
        assert!(logs_contain("validation failed"));
    }
}
