//! Error types for oci-discovery.

use thiserror::Error;

use crate::template::TemplateError;

/// oci-discovery error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Name does not match the host-based image name grammar
    #[error("{0:?} does not match the host-based-image-name pattern")]
    InvalidName(String),

    /// Malformed engine configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed URI Template
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// URI parse or resolution failure
    #[error("URI error: {0}")]
    Uri(#[from] url::ParseError),

    /// URI that parses but cannot be used
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with an error status
    #[error("{uri} returned status {status}")]
    Status { uri: String, status: u16 },

    /// Server answered with an unexpected media type
    #[error("requested {requested} from {uri} but got {received}")]
    MediaType {
        uri: String,
        requested: String,
        received: String,
    },

    /// Response body did not match the expected schema
    #[error("{uri} returned an invalid document: {source}")]
    Decode {
        uri: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No constructor registered for a ref-engine protocol
    #[error("unsupported ref-engine protocol {0:?}")]
    UnsupportedProtocol(String),

    /// Caller requested cancellation
    #[error("Operation cancelled")]
    Cancelled,

    /// Failure returned by a caller-supplied callback
    #[error("Callback error: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether this error came from a cancelled context.
    ///
    /// Cancellation is never recovered locally; every other per-attempt
    /// failure is logged and skipped.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Wrap an arbitrary caller error.
    pub fn callback<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Callback(err.into())
    }
}

/// Result type alias for oci-discovery operations.
pub type Result<T> = std::result::Result<T, Error>;
