//! Error types for fieldops
//!
//! Centralized error handling using snafu for ergonomic error definitions.

use snafu::Snafu;

/// Main error type for the crate
#[derive(Debug, Snafu)]
pub enum Error {
    /// Invalid input or configuration
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// IO error (config files, etc.)
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// JSON serialization/deserialization error
    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },

    /// Transport-level HTTP failure
    #[snafu(display("HTTP error: {source}"))]
    Http { source: reqwest::Error },

    /// Server answered with a failure code inside the response envelope
    #[snafu(display("API error ({code}): {message}"))]
    Api { code: String, message: String },

    /// Response body did not have the expected shape
    #[snafu(display("Malformed response: {message}"))]
    MalformedResponse { message: String },

    /// Timeout error
    #[snafu(display("Timeout: {message}"))]
    Timeout { message: String },

    /// SDK could not be initialized after all retries
    #[snafu(display("SDK unavailable: {sdk}"))]
    SdkUnavailable { sdk: String },

    /// Image decoding or encoding failure
    #[snafu(display("Image error: {source}"))]
    Image { source: image::ImageError },

    /// Camera acquisition failure
    #[snafu(display("Camera error ({kind:?}): {message}"))]
    Camera {
        kind: crate::camera::CameraErrorKind,
        message: String,
    },
}

impl Error {
    /// Shorthand for [`Error::Invalid`]
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::Invalid {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::MalformedResponse`]
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedResponse {
            message: message.into(),
        }
    }

    /// Whether this error came from a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        Error::Http { source }
    }
}

impl From<image::ImageError> for Error {
    fn from(source: image::ImageError) -> Self {
        Error::Image { source }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;
