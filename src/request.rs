//! Incoming HTTP request type.

use bytes::Bytes;
use http::header::{AsHeaderName, COOKIE};
use http::request::Parts;
use http::{HeaderMap, Method};

/// An incoming HTTP request with its body already collected.
///
/// Requests are never mutated in place by the pipeline. Attaching
/// request-scoped values consumes the request and hands back an extended one.
#[derive(Debug)]
pub struct Request {
    pub(crate) head: Parts,
    pub(crate) body: Bytes,
}

impl Request {
    pub fn new(req: http::Request<Bytes>) -> Self {
        let (head, body) = req.into_parts();
        Self { head, body }
    }

    pub(crate) fn from_parts(head: Parts, body: Bytes) -> Self {
        Self { head, body }
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header lookup. Values that are not visible ASCII read as absent.
    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the value of the first cookie named `name`.
    ///
    /// Every `Cookie` header is searched. Whitespace around pairs is ignored
    /// and a value wrapped in double quotes is returned without them, so
    /// `user=""` yields `Some("")`.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.head.headers.get_all(COOKIE).iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| k.trim() == name)
            .map(|(_, v)| unquote(v.trim()))
    }

    /// The caller identity attached by the identity extractor.
    ///
    /// Only set on routes that require it, and never empty when set.
    pub fn identity(&self) -> Option<&str> {
        crate::identity::token(self)
    }
}

fn unquote(value: &str) -> &str {
    value.strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
