//! Do-Not-Track.
//!
//! A request carrying `DNT: 1` is answered `204 No Content` and goes no
//! further. It sits directly inside [`Recovery`](super::Recovery) and outside
//! [`Trace`](super::Trace), so opted-out traffic is never logged and never
//! reaches a handler or the database.

use http::StatusCode;
use http::HeaderMap;
use http::header::DNT;

use super::{Middleware, Next};
use crate::handler::{BoxFuture, ready};
use crate::request::Request;

pub struct DoNotTrack;

impl Middleware for DoNotTrack {
    fn name(&self) -> &'static str {
        "do_not_track"
    }

    fn call(&self, req: Request, next: Next) -> BoxFuture {
        if opted_out(req.headers()) {
            return ready(StatusCode::NO_CONTENT);
        }
        next.run(req)
    }
}

/// Whether the request asks not to be tracked. Only `DNT: 1` counts.
pub(crate) fn opted_out(headers: &HeaderMap) -> bool {
    headers.get(DNT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::handler::ErasedHandler;
    use crate::middleware::Stack;
    use crate::response::Response;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl ErasedHandler for Arc<Counting> {
        fn call(&self, _: Request, _: ()) -> BoxFuture {
            self.0.fetch_add(1, Ordering::SeqCst);
            ready(Response::text("tracked"))
        }
    }

    fn request(dnt: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/events");
        if let Some(v) = dnt {
            builder = builder.header(DNT, v);
        }
        Request::new(builder.body(Bytes::new()).unwrap())
    }

    #[tokio::test]
    async fn opt_out_is_dropped() {
        let counter = Arc::new(Counting::default());
        let handler = Stack::new().layer(DoNotTrack).wrap(Arc::new(Arc::clone(&counter)));

        let res = handler.call(request(Some("1")), ()).await;

        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_values_pass() {
        let counter = Arc::new(Counting::default());
        let handler = Stack::new().layer(DoNotTrack).wrap(Arc::new(Arc::clone(&counter)));

        for dnt in [None, Some("0"), Some("null")] {
            let res = handler.call(request(dnt), ()).await;
            assert_eq!(res.body(), b"tracked");
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn reads_raw_headers() {
        let mut headers = HeaderMap::new();
        assert!(!opted_out(&headers));
        headers.insert(DNT, " 1 ".parse().unwrap());
        assert!(opted_out(&headers));
        headers.insert(DNT, "1, 0".parse().unwrap());
        assert!(!opted_out(&headers));
    }
}
