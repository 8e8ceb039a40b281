use std::borrow::Cow;

use reqwest::StatusCode;

/// Client-side error taxonomy.
///
/// `Validation` and `Unauthorized` are raised before a request is issued;
/// the HTTP-mapped variants mirror the status codes the backend answers
/// with. Every variant is cheap to clone so a shared in-flight fetch can
/// hand its outcome to all waiters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Validation: {0}")]
    Validation(Cow<'static, str>),
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Forbidden: {0}")]
    Forbidden(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Server Error ({status}): {message}")]
    Upstream { status: u16, message: Cow<'static, str> },
    #[error("Network Error: {0}")]
    Network(Cow<'static, str>),
    #[error("Malformed Response: {0}")]
    Decode(Cow<'static, str>),
    #[error("Session Storage Error: {0}")]
    Storage(Cow<'static, str>),
}

/// Error payload shape the backend responds with.
#[derive(Debug, serde::Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl Error {
    pub fn validation(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn network(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Network(msg.into())
    }

    pub fn decode(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn storage(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Storage(msg.into())
    }

    /// Maps a non-success HTTP status onto the taxonomy.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest(message.into()),
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message.into()),
            StatusCode::FORBIDDEN => Self::Forbidden(message.into()),
            StatusCode::NOT_FOUND => Self::NotFound(message.into()),
            StatusCode::CONFLICT => Self::Conflict(message.into()),
            _ => Self::Upstream { status: status.as_u16(), message: message.into() },
        }
    }

    /// Transient failures a read query may retry once. Mutations never retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Error::network("request timed out");
        }
        if err.is_decode() {
            return Error::Decode(err.to_string().into());
        }
        Error::Network(err.to_string().into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string().into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Validation(err.to_string().into())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        log::debug!("token rejected: {err}");
        Error::unauthorized("Token Invalid or Expired")
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string().into())
    }
}
