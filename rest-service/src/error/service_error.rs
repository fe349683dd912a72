use thiserror::Error;

use super::{ConfigError, TemplateError, TransportError, ValidationError};

/// Top-level error for all service operations.
///
/// Construction-time failures surface as [`ServiceError::Config`] from
/// [`ServiceBuilder::build`](crate::ServiceBuilder::build). Everything else is
/// produced by an endpoint call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service or one of its descriptors is misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The endpoint's URI template could not be parsed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A bucket of arguments failed its schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The template declares a path parameter that has no resolved value.
    #[error("missing value for path parameter \"{name}\"")]
    MissingPathParam {
        /// The placeholder name as written in the template.
        name: String,
    },

    /// The HTTP exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No endpoint with this name is registered on the service.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// The call arguments were not a JSON object.
    #[error("invalid call arguments: {0}")]
    InvalidArguments(String),

    /// A request or response hook failed with its own error.
    #[error("hook failed: {0}")]
    Hook(String),
}

impl ServiceError {
    /// Returns `true` if the failure came from the HTTP exchange.
    ///
    /// Only these failures (and request-hook failures) are routed through a
    /// response hook.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns the validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}
