//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the place for
//! cross-cutting concerns. A [`Stack`] is an explicit, ordered list of
//! [`Middleware`] values, outermost first. It is built once and applied once,
//! around the dispatcher, by [`Stack::wrap`]:
//!
//! ```text
//! Stack [recovery, do_not_track, trace, cors, content_type]
//!
//! request ─▶ recovery ─▶ do_not_track ─▶ trace ─▶ cors ─▶ content_type ─▶ dispatcher
//! response ◀─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A middleware either answers the request itself or passes it on with
//! [`Next::run`]. Nothing can be inserted or reordered after `wrap`.

use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;

mod content_type;
mod cors;
mod dnt;
mod recovery;
mod trace;

pub use content_type::ContentType;
pub use cors::Cors;
pub use dnt::DoNotTrack;
pub use recovery::Recovery;
pub use trace::Trace;

pub(crate) use dnt::opted_out;
pub(crate) use recovery::{catching, panic_message};

/// A cross-cutting behavior wrapped around the dispatcher.
pub trait Middleware: Send + Sync + 'static {
    /// Stable name, used to inspect a stack's order.
    fn name(&self) -> &'static str;

    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

/// The rest of the chain below a middleware.
#[derive(Clone)]
pub struct Next {
    inner: BoxedHandler,
}

impl Next {
    pub fn run(self, req: Request) -> BoxFuture {
        self.inner.call(req, ())
    }
}

/// An ordered list of middleware, outermost first.
#[derive(Clone, Default)]
pub struct Stack {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware` inside every layer added so far.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Layer names, outermost first.
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|m| m.name()).collect()
    }

    /// Wraps `endpoint` so that the first layer sees each request first.
    pub fn wrap(&self, endpoint: BoxedHandler) -> BoxedHandler {
        self.layers.iter().rev().fold(endpoint, |next, middleware| {
            let layered: BoxedHandler = Arc::new(Layered { middleware: Arc::clone(middleware), next });
            layered
        })
    }
}

struct Layered {
    middleware: Arc<dyn Middleware>,
    next: BoxedHandler,
}

impl ErasedHandler for Layered {
    fn call(&self, req: Request, _: ()) -> BoxFuture {
        let next = Next { inner: Arc::clone(&self.next) };
        self.middleware.call(req, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::{HeaderName, HeaderValue};
    use std::sync::Mutex;

    use crate::handler::ready;
    use crate::response::Response;

    /// Records its name on the way down and appends it to a header on the way up.
    struct Mark(&'static str, Arc<Mutex<Vec<&'static str>>>);

    impl Middleware for Mark {
        fn name(&self) -> &'static str { self.0 }

        fn call(&self, req: Request, next: Next) -> BoxFuture {
            self.1.lock().unwrap().push(self.0);
            let name = self.0;
            Box::pin(async move {
                let mut res = next.run(req).await;
                res.headers_mut().append(HeaderName::from_static("x-seen"), HeaderValue::from_static(name));
                res
            })
        }
    }

    struct Endpoint;

    impl ErasedHandler for Endpoint {
        fn call(&self, _: Request, _: ()) -> BoxFuture {
            ready(Response::text("endpoint"))
        }
    }

    #[tokio::test]
    async fn first_layer_is_outermost() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stack = Stack::new()
            .layer(Mark("outer", Arc::clone(&seen)))
            .layer(Mark("middle", Arc::clone(&seen)))
            .layer(Mark("inner", Arc::clone(&seen)));
        assert_eq!(stack.names(), ["outer", "middle", "inner"]);

        let handler = stack.wrap(Arc::new(Endpoint));
        let res = handler.call(Request::new(http::Request::new(Bytes::new())), ()).await;

        assert_eq!(*seen.lock().unwrap(), ["outer", "middle", "inner"]);
        let up: Vec<_> = res.headers().get_all("x-seen").iter().collect();
        assert_eq!(up, ["inner", "middle", "outer"]);
        assert_eq!(res.body(), b"endpoint");
    }

    #[tokio::test]
    async fn empty_stack_is_the_endpoint() {
        let handler = Stack::new().wrap(Arc::new(Endpoint));
        let res = handler.call(Request::new(http::Request::new(Bytes::new())), ()).await;
        assert_eq!(res.body(), b"endpoint");
    }
}
