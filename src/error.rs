//! Error types.
//!
//! Two families, split by who reads them:
//!
//! - [`Error`] is for the operator. Binding a port, parsing configuration,
//!   wiring the router. It never reaches an HTTP client.
//! - [`HttpError`] is for the client. Each variant is resolved into exactly
//!   one error response where it is detected and never travels further up
//!   the middleware chain.

use http::StatusCode;
use thiserror::Error;

use crate::response::{IntoResponse, Response};
use crate::router::Route;

/// The error type returned by hush's fallible setup operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("config parse: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation failed: {}", .0.join(", "))]
    ConfigInvalid(Vec<String>),

    #[error("no handler registered for {0}")]
    MissingHandler(Route),

    #[error("logging setup: {0}")]
    Telemetry(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A request-level failure the pipeline knows how to answer.
///
/// The `Display` output is the `message` field of the error body.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HttpError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Origin not allowed")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)    => StatusCode::BAD_REQUEST,
            Self::Forbidden        => StatusCode::FORBIDDEN,
            Self::NotFound         => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        Response::error(self.to_string(), self.status())
    }
}
