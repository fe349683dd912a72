//! Layered error types for the REST service crate.
//!
//! The error hierarchy mirrors the stage at which a failure is detected:
//! - [`ServiceError`] - Top-level error returned by every endpoint call
//! - [`ConfigError`] - Malformed descriptors or base URI, raised at construction
//! - [`TemplateError`] - Malformed URI templates, raised on the first call
//! - [`ValidationError`] - A bucket failed its schema, raised per call
//! - [`TransportError`] - The HTTP exchange itself failed

mod config_error;
mod service_error;
mod template_error;
mod transport_error;
mod validation_error;

pub use config_error::ConfigError;
pub use service_error::ServiceError;
pub use template_error::TemplateError;
pub use transport_error::TransportError;
pub use validation_error::ValidationError;
