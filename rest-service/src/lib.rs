//! Declarative REST client factory.
//!
//! A [`Service`] is built from named [`EndpointDescriptor`]s. Each descriptor
//! pairs a URI template such as `GET /players/{playerId}/games{?take,skip}`
//! with optional schemas for headers, path parameters, query parameters and
//! payload. Calling an endpoint with a flat JSON object:
//!
//! 1. parses the template ([`ParsedTemplate`])
//! 2. sorts each argument into a bucket ([`classify()`])
//! 3. validates all four buckets concurrently ([`validate_buckets`])
//! 4. builds the URL ([`build_url`])
//! 5. sends the request through hooks and a [`Transport`] ([`Dispatch`])
//!
//! ## Examples
//!
//! ```rust,no_run
//! use rest_service::{EndpointDescriptor, Service};
//! use rest_service::schema::{Field, ObjectSchema};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let service = Service::builder("http://baseuri.com")
//!     .endpoint(
//!         "getGames",
//!         EndpointDescriptor::builder()
//!             .template("GET /games{?take,skip}")
//!             .headers(ObjectSchema::new().field("x-site-code", Field::string().default("test")))
//!             .query(
//!                 ObjectSchema::new()
//!                     .field("take", Field::number().required())
//!                     .field("skip", Field::number().required()),
//!             )
//!             .build(),
//!     )
//!     .build()?;
//!
//! let response = service.call("getGames", json!({ "take": 10, "skip": 10 })).await?;
//! println!("{}: {}", response.status_code, response.payload);
//! # Ok(())
//! # }
//! ```

pub mod bucket;
pub mod classify;
pub mod definition;
pub mod descriptor;
pub mod dispatch;
pub mod endpoint_id;
pub mod error;
pub mod method;
pub mod response;
pub mod schema;
pub mod service;
pub mod template;
pub mod transport;
pub mod url_builder;
pub mod validate;

pub use bucket::{Args, BucketArgs, BucketKind, Buckets};
pub use classify::{classify, Classification};
pub use definition::{AliasDefinition, EndpointDefinition, ServiceDefinition};
pub use descriptor::{AliasTable, EndpointDescriptor, EndpointDescriptorBuilder, SchemaIndex};
pub use dispatch::{Dispatch, OutgoingRequest, RequestHook, ResponseHook};
pub use endpoint_id::{EndpointId, EndpointIdError};
pub use error::{ConfigError, ServiceError, TemplateError, TransportError, ValidationError};
pub use method::RestMethod;
pub use response::ResponseEnvelope;
pub use service::{BaseUri, Endpoint, Service, ServiceBuilder};
pub use template::ParsedTemplate;
pub use transport::{
    ReqwestTransport, ReqwestTransportBuilder, RequestOptions, Transport, TransportPayload,
    TransportResponse,
};
pub use url_builder::build_url;
pub use validate::validate_buckets;
