//! # Error Types
//!
//! Error types for the credgate gateway using `thiserror`.

/// Custom result type for credgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the credgate gateway.
///
/// The HTTP layer maps each variant to a status code in exactly one place
/// (`status_code`); handlers never pick status codes themselves.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed input: missing form field, empty username, unparseable body
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Signature mismatch, CSRF state mismatch, OAuth exchange failure,
    /// backend login rejection
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A provider identifier with no registered handler
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// Secrets-backend connectivity or issuance failures
    #[error("backend error: {0}")]
    Backend(String),

    /// Challenge-store errors, protocol violations, serialization failures
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration errors (fatal at startup)
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
}

impl Error {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn unknown_provider<S: Into<String>>(provider: S) -> Self {
        Self::UnknownProvider(provider.into())
    }

    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn io_context<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::UnknownProvider(_) => 400,
            Error::Backend(_) => 500,
            Error::Internal(_) => 500,
            Error::Config(_) => 500,
            Error::Io { .. } => 500,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization failed: {}", error))
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::Config(format!("configuration loading failed: {}", error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::Config(format!("validation failed: {}", message))
    }
}
