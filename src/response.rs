//! Outgoing HTTP response type, the uniform error body, and the
//! [`IntoResponse`] conversion trait.
//!
//! Handlers build a [`Response`] and return it. Middleware receives it by
//! value on the way back up and may decorate its headers. A response is never
//! written twice: it is moved into the transport exactly once, in
//! [`Response::into_inner`].

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use tracing::error;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use hush::Response;
/// use http::StatusCode;
///
/// Response::json(r#"{"events":[]}"#);
/// Response::status(StatusCode::NO_CONTENT);
/// Response::error("Not found", StatusCode::NOT_FOUND);
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Bytes,
    pub(crate) headers: HeaderMap,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` with `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::with_type(JSON, body.into())
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_type(TEXT, Bytes::from(body.into()))
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Bytes::new(), headers: HeaderMap::new(), status: code }
    }

    /// The uniform error body: `{"status": <code>, "message": <message>}`,
    /// with `code` set on the response as well.
    pub fn error(message: impl Into<String>, code: StatusCode) -> Self {
        let body = ErrorBody { status: code.as_u16(), message: message.into() };
        match serde_json::to_vec(&body) {
            Ok(bytes) => Self { status: code, ..Self::json(bytes) },
            Err(e) => {
                error!(error = %e, "failed to serialise error body");
                Self::status(code)
            }
        }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    fn with_type(content_type: &'static str, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self { body, headers, status: StatusCode::OK }
    }

    /// Hands the response to hyper. Consumes `self`, so it happens once.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(JSON, body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(TEXT, Bytes::from(body.into()))
    }

    /// Terminate with no body (e.g. `204 No Content`).
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }

    fn finish(mut self, content_type: &'static str, body: Bytes) -> Response {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Response { body, headers: self.headers, status: self.status }
    }
}

// ── Json ──────────────────────────────────────────────────────────────────────

/// Serialises `T` as the JSON body of a `200 OK`.
///
/// ```rust
/// use hush::{Json, Request};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Status { ok: bool }
///
/// async fn status(_req: Request, _db: ()) -> Json<Status> {
///     Json(Status { ok: true })
/// }
/// ```
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => {
                error!(error = %e, "failed to serialise response body");
                Response::error("Internal Server Error", StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::CREATED`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// Lets handlers use `?` on anything convertible, typically [`HttpError`](crate::HttpError).
impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: IntoResponse,
{
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_carries_status_and_message() {
        let res = Response::error("Not found", StatusCode::NOT_FOUND);
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[CONTENT_TYPE], JSON);

        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, serde_json::json!({ "status": 404, "message": "Not found" }));
    }

    #[test]
    fn builder_appends_headers() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header(http::header::LOCATION, HeaderValue::from_static("/events/1"))
            .json("{}");
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.headers()[http::header::LOCATION], "/events/1");
        assert_eq!(res.headers()[CONTENT_TYPE], JSON);
    }

    #[test]
    fn json_wrapper_serialises() {
        let res = Json(serde_json::json!({ "ok": true })).into_response();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), br#"{"ok":true}"#);
    }

    #[test]
    fn result_picks_the_matching_arm() {
        let ok: Result<&'static str, StatusCode> = Ok("fine");
        assert_eq!(ok.into_response().status_code(), StatusCode::OK);

        let err: Result<&'static str, StatusCode> = Err(StatusCode::CONFLICT);
        assert_eq!(err.into_response().status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn into_inner_keeps_status_and_headers() {
        let res = Response::error("Method not allowed", StatusCode::METHOD_NOT_ALLOWED).into_inner();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[CONTENT_TYPE], JSON);
    }
}
