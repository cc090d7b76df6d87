//! Declares `application/json` on responses that did not pick a media type.

use http::header::{CONTENT_TYPE, HeaderValue};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

pub struct ContentType;

impl Middleware for ContentType {
    fn name(&self) -> &'static str {
        "content_type"
    }

    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin(async move {
            let mut res = next.run(req).await;
            res.headers_mut()
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
            res
        })
    }
}
