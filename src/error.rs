use std::fmt;
use std::io;

/// Failure raised inside request handling and consumed by the chain engine
/// and the acceptor.
///
/// The first four variants are the kinds the framework itself raises; the
/// `Response` variant is the user-extensible form carrying an arbitrary
/// status code. Unauthorized, forbidden, conflict and similar statuses are
/// spellings of `Response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// No endpoint matched the request path (404).
    NotFound(String),
    /// The endpoint exists but has no handler for the method (405).
    MethodNotAllowed(String),
    /// The request body could not be decoded (400).
    BadRequest(String),
    /// A decoding middleware rejected the content type (415).
    UnsupportedMediaType(String),
    /// User-raised error with an explicit status code.
    Response { status: u16, message: String },
}

impl HttpError {
    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::NotFound(message.into())
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        HttpError::MethodNotAllowed(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::BadRequest(message.into())
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        HttpError::UnsupportedMediaType(message.into())
    }

    pub fn response(status: u16, message: impl Into<String>) -> Self {
        HttpError::Response {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::response(500, message)
    }

    /// Status code the acceptor writes when no error handler intervenes.
    pub fn status(&self) -> u16 {
        match self {
            HttpError::NotFound(_) => 404,
            HttpError::MethodNotAllowed(_) => 405,
            HttpError::BadRequest(_) => 400,
            HttpError::UnsupportedMediaType(_) => 415,
            HttpError::Response { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            HttpError::NotFound(m)
            | HttpError::MethodNotAllowed(m)
            | HttpError::BadRequest(m)
            | HttpError::UnsupportedMediaType(m) => m,
            HttpError::Response { message, .. } => message,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for HttpError {}

impl From<io::Error> for HttpError {
    fn from(err: io::Error) -> Self {
        HttpError::internal(err.to_string())
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::bad_request(err.to_string())
    }
}
