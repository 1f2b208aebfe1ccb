//! Build-time, document and content decoding errors.

/// Errors raised while turning the document into validators.
///
/// All of these are fatal for the operation being indexed and are reported
/// the first time the operation is built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// A path template has unbalanced braces or a placeholder spanning `/`.
    #[error("unsupported path template '{template}': {reason}")]
    UnsupportedPathTemplate { template: String, reason: String },

    /// A path placeholder has no matching `in: path` parameter.
    #[error("path template '{template}' has no parameter spec for '{{{name}}}'")]
    MissingParameterSpec { template: String, name: String },

    /// A `$ref` could not be resolved through the registry.
    #[error("reference '{0}' cannot be resolved")]
    UnresolvedReference(String),

    /// A schema node is not an object (or boolean) or a keyword has the wrong shape.
    #[error("invalid schema at '{location}': {reason}")]
    InvalidSchema { location: String, reason: String },

    /// A `pattern` or `patternProperties` key is not a valid regular expression.
    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A discriminator lacks `propertyName` or maps to an unusable target.
    #[error("malformed discriminator: {0}")]
    MalformedDiscriminator(String),

    /// A parameter or header declares neither a schema nor a usable content map.
    #[error("unsupported encoding for '{name}': {reason}")]
    UnsupportedEncoding { name: String, reason: String },

    /// The operation does not exist in the document.
    #[error("operation {method} '{path}' is not declared")]
    UnknownOperation { path: String, method: String },
}

/// Errors raised while loading a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is not valid OpenAPI JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version '{0}', expected 3.x")]
    UnsupportedVersion(String),
}

/// Errors raised by a content decoder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("no decoder for media type '{0}'")]
    UnsupportedMediaType(String),

    #[error("malformed '{media_type}' content: {reason}")]
    Malformed { media_type: String, reason: String },
}
