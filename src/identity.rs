//! Caller identity, carried from a cookie into request scope.
//!
//! The token is opaque. It is stored in the request extensions under
//! [`Identity`], a type private to this module, so nothing else in the
//! process can read it by name or overwrite it. Downstream code reads it
//! through [`Request::identity`].
//!
//! The token value is never logged here.

use crate::error::HttpError;
use crate::request::Request;

#[derive(Clone)]
struct Identity(String);

/// Validates the `cookie` on `req` and returns the request with the caller
/// identity attached.
///
/// Fails with [`HttpError::BadRequest`] when the cookie is absent or empty.
pub fn extract(mut req: Request, cookie: &str) -> Result<Request, HttpError> {
    let token = match req.cookie(cookie) {
        None => return Err(HttpError::BadRequest("missing user identifier".to_owned())),
        Some("") => return Err(HttpError::BadRequest("received blank user identifier".to_owned())),
        Some(token) => token.to_owned(),
    };
    req.head.extensions.insert(Identity(token));
    Ok(req)
}

pub(crate) fn token(req: &Request) -> Option<&str> {
    req.head.extensions.get::<Identity>().map(|id| id.0.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::COOKIE;

    fn request(cookie: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/events");
        if let Some(c) = cookie {
            builder = builder.header(COOKIE, c);
        }
        Request::new(builder.body(Bytes::new()).unwrap())
    }

    #[test]
    fn missing_cookie_is_bad_request() {
        let err = extract(request(None), "user").unwrap_err();
        assert_eq!(err, HttpError::BadRequest("missing user identifier".into()));
    }

    #[test]
    fn other_cookies_do_not_count() {
        let err = extract(request(Some("session=abc")), "user").unwrap_err();
        assert!(matches!(err, HttpError::BadRequest(_)));
    }

    #[test]
    fn blank_cookie_is_bad_request() {
        for cookie in ["user=", r#"user="""#, "user=  "] {
            let err = extract(request(Some(cookie)), "user").unwrap_err();
            assert_eq!(err, HttpError::BadRequest("received blank user identifier".into()), "{cookie}");
        }
    }

    #[test]
    fn token_is_passed_through_unmodified() {
        let req = extract(request(Some("user=abc")), "user").unwrap();
        assert_eq!(req.identity(), Some("abc"));
    }

    #[test]
    fn cookie_name_is_configurable() {
        let req = extract(request(Some("uid=42; user=abc")), "uid").unwrap();
        assert_eq!(req.identity(), Some("42"));
    }

    #[test]
    fn request_keeps_its_head() {
        let req = extract(request(Some("user=abc")), "user").unwrap();
        assert_eq!(req.path(), "/events");
        assert_eq!(req.cookie("user"), Some("abc"));
    }
}
