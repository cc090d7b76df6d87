//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! Business handlers and middleware layers are all different concrete types,
//! but the router and the middleware stack have to keep them side by side.
//! Both are hidden behind one trait object, [`ErasedHandler`]:
//!
//! ```text
//! async fn get_events(req: Request, db: Db) -> Response { … }  ← user writes this
//!        ↓ router.on(Route::GetEvents, get_events)
//! get_events.into_boxed_handler()                               ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(get_events))                               ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler<Db> = Arc<dyn ErasedHandler<Db>>
//! handler.call(req, db.clone())  at request time                ← one vtable dispatch
//!        ↓
//! Box::pin(async { get_events(req, db).await.into_response() }) ← BoxFuture
//! ```
//!
//! The handler's state parameter is the persistence handle. The pipeline
//! only clones it; it never looks inside.
//!
//! Middleware layers and the dispatcher itself are `BoxedHandler<()>`: by the
//! time a request enters the stack, the state is already owned by the router.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Erased types ──────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` let tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of the public
/// `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler<S = ()> {
    fn call(&self, req: Request, state: S) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler<S = ()> = Arc<dyn ErasedHandler<S> + Send + Sync + 'static>;

/// An already-computed response as a [`BoxFuture`].
pub(crate) fn ready(res: impl IntoResponse) -> BoxFuture {
    Box::pin(std::future::ready(res.into_response()))
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request, state: S) -> impl IntoResponse
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler<S>: private::Sealed<S> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler<S>;
}

mod private {
    pub trait Sealed<S> {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R, S> private::Sealed<S> for F
where
    F: Fn(Request, S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R, S> Handler<S> for F
where
    F: Fn(Request, S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
    S: 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler<S> {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R, S> ErasedHandler<S> for FnHandler<F>
where
    F: Fn(Request, S) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, state: S) -> BoxFuture {
        let fut = (self.0)(req, state);
        Box::pin(async move { fut.await.into_response() })
    }
}
