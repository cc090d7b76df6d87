//! Cross-origin resource sharing for a single allowed origin.
//!
//! Every response is annotated with the configured origin and
//! `Access-Control-Allow-Credentials: true`, since the identity cookie has to
//! travel with cross-origin requests. The browser enforces the rest.
//!
//! Preflights (`OPTIONS` with `Origin` and `Access-Control-Request-Method`)
//! are answered here and never reach the dispatcher: `204` for the allowed
//! origin, `403` for any other.

use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_METHOD,
    HeaderValue, InvalidHeaderValue, ORIGIN, VARY,
};
use http::{Method, StatusCode};

use super::{Middleware, Next};
use crate::error::HttpError;
use crate::handler::{BoxFuture, ready};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

pub struct Cors {
    origin: HeaderValue,
}

impl Cors {
    pub fn new(origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self { origin: HeaderValue::from_str(origin)? })
    }

    pub fn origin(&self) -> &HeaderValue {
        &self.origin
    }

    fn preflight(&self, req: &Request) -> Response {
        if req.headers().get(ORIGIN) != Some(&self.origin) {
            return HttpError::Forbidden.into_response();
        }
        Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, OPTIONS"))
            .header(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type"))
            .header(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"))
            .no_body()
    }
}

impl Middleware for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let origin = self.origin.clone();
        if is_preflight(&req) {
            return ready(annotate(self.preflight(&req), origin));
        }
        Box::pin(async move { annotate(next.run(req).await, origin) })
    }
}

fn is_preflight(req: &Request) -> bool {
    req.method() == Method::OPTIONS
        && req.headers().contains_key(ORIGIN)
        && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// Sets the cross-origin headers every response leaving hush carries.
pub(super) fn annotate(mut res: Response, origin: HeaderValue) -> Response {
    let headers = res.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    headers.append(VARY, HeaderValue::from_static("origin"));
    res
}
