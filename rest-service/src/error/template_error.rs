use thiserror::Error;

/// Errors raised while parsing a `"<METHOD> <path>"` URI template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template is blank.
    #[error("template has no method")]
    MissingMethod,

    /// The template has a method but no path.
    #[error("template \"{template}\" has no path")]
    MissingPath {
        /// The raw template.
        template: String,
    },

    /// The method token is not a known HTTP method.
    #[error("unknown HTTP method \"{0}\"")]
    UnknownMethod(String),

    /// A `{` is never closed, or a placeholder is empty.
    #[error("malformed placeholder in template path \"{path}\"")]
    MalformedPlaceholder {
        /// The raw path.
        path: String,
    },
}
