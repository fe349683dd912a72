use thiserror::Error;

/// Errors raised while assembling a service.
///
/// These are fatal to service setup and are reported synchronously from
/// [`ServiceBuilder::build`](crate::ServiceBuilder::build).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URI is empty or does not parse as an absolute URL.
    #[error("invalid base URI \"{uri}\": {reason}")]
    InvalidBaseUri {
        /// The URI as resolved from the builder input.
        uri: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The descriptor has neither a template nor a method + path pair.
    #[error("endpoint \"{endpoint}\" must declare a template or a method and path")]
    MissingTemplate {
        /// Name of the offending endpoint.
        endpoint: String,
    },

    /// The endpoint name is not a valid identifier.
    #[error("invalid endpoint name \"{name}\": {reason}")]
    InvalidEndpointName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two descriptors were registered under the same name.
    #[error("endpoint \"{0}\" is registered more than once")]
    DuplicateEndpoint(String),

    /// A hook was attached to a name with no descriptor.
    #[error("cannot attach hook to unknown endpoint \"{0}\"")]
    UnknownEndpoint(String),

    /// A declarative endpoint definition could not be parsed.
    #[error("invalid endpoint definition: {0}")]
    Definition(String),

    /// A default transport header name or value is invalid.
    #[error("invalid header \"{name}\": {reason}")]
    InvalidHeader {
        /// The header name as supplied.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
