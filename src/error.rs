//! Unified error type.

use http::StatusCode;

/// Shorthand for results whose error is [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by every fallible operation in the crate.
///
/// Two families live here. Startup failures (`Io`, `Config`, `InvalidRoute`, `Route`)
/// come back from [`Api::mount_routes`](crate::Api::mount_routes),
/// [`Node::mount`](crate::Node::mount) and [`Api::listen`](crate::Api::listen)
/// and should abort the process. Request failures (`Decode`, `Encode`,
/// `Status`, `Custom`) come out of a pipeline and are turned into an HTTP
/// response by [`Error::into_response`](crate::IntoResponse).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding or accepting on a listener failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value could not be parsed.
    #[error("config: {0}")]
    Config(String),

    /// A route pattern does not start with `/`.
    #[error("route `{0}` must start with `/`")]
    InvalidRoute(String),

    /// The router rejected a registration (duplicate or conflicting pattern).
    #[error("cannot register {method} {path}: {reason}")]
    Route {
        method: http::Method,
        path: String,
        reason: String,
    },

    /// The request could not be turned into the pipeline's input type.
    #[error("invalid request: {0}")]
    Decode(String),

    /// The pipeline's output could not be serialised.
    #[error("cannot encode response: {0}")]
    Encode(String),

    /// A middleware or business function rejected the request with an
    /// explicit status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Any other middleware or business failure.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// A failure carrying its own HTTP status, e.g. `Error::status(StatusCode::NOT_FOUND, "no such dog")`.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status { status, message: message.into() }
    }

    /// A failure that surfaces as `500 Internal Server Error`.
    pub fn custom(message: impl std::fmt::Display) -> Self {
        Self::Custom(message.to_string())
    }

    /// The status a request failing with this error is answered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Status { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
