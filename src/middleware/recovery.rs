//! Panic recovery.
//!
//! The outermost layer. A panic anywhere below it, including one raised while
//! a handler builds its future, is caught here, logged once, and answered with
//! a generic `500`. This is the only place a panic becomes a response.
//!
//! The panic unwinds past [`Cors`](super::Cors), so the `500` is annotated
//! here with the same cross-origin headers, or a browser client could not
//! read it. While a request is polled under this layer, [`catching`] is true;
//! the panic hook installed by [`telemetry::init`](crate::telemetry::init)
//! stays quiet then, leaving this layer's ERROR event as the only record.
//!
//! A request whose future is dropped by the transport is never polled again,
//! so nothing is written for it.

use std::any::Any;
use std::cell::Cell;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use http::StatusCode;
use http::header::HeaderValue;
use tracing::error;

use super::cors::annotate;
use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

#[derive(Default)]
pub struct Recovery {
    origin: Option<HeaderValue>,
}

impl Recovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotates the `500` for `origin`, as [`Cors`](super::Cors) would.
    pub fn with_origin(origin: HeaderValue) -> Self {
        Self { origin: Some(origin) }
    }
}

impl Middleware for Recovery {
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let method = req.method().clone();
        let path = req.path().to_owned();
        let origin = self.origin.clone();

        Box::pin(async move {
            let inner = AssertUnwindSafe(Guarded(Box::pin(async move { next.run(req).await })));
            match inner.catch_unwind().await {
                Ok(res) => res,
                Err(payload) => {
                    error!(%method, %path, panic = panic_message(payload.as_ref()), "recovered from panic");
                    let res = Response::error("Internal Server Error", StatusCode::INTERNAL_SERVER_ERROR);
                    match origin {
                        Some(origin) => annotate(res, origin),
                        None => res,
                    }
                }
            }
        })
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload.downcast_ref::<&str>().copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}

// ── Catch scope ───────────────────────────────────────────────────────────────

thread_local! {
    static CATCHING: Cell<usize> = const { Cell::new(0) };
}

/// Whether this thread is currently polling a request under [`Recovery`].
pub(crate) fn catching() -> bool {
    CATCHING.with(|depth| depth.get() > 0)
}

/// Counts the current poll as caught. Dropped during unwinding too, after
/// the panic hook has run.
struct Scope;

impl Scope {
    fn enter() -> Self {
        CATCHING.with(|depth| depth.set(depth.get() + 1));
        Scope
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        CATCHING.with(|depth| depth.set(depth.get() - 1));
    }
}

struct Guarded(BoxFuture);

impl Future for Guarded {
    type Output = Response;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Response> {
        let _scope = Scope::enter();
        self.0.as_mut().poll(cx)
    }
}
