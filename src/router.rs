//! Route table and dispatcher.
//!
//! The table is fixed. Three static paths, exact match only, no parameters:
//!
//! | Path        | Method | Route        | Identity |
//! |-------------|--------|--------------|----------|
//! | `/exchange` | GET    | `PublicKey`  | no       |
//! | `/exchange` | POST   | `UserSecret` | no       |
//! | `/events`   | GET    | `GetEvents`  | yes      |
//! | `/events`   | POST   | `PostEvents` | yes      |
//! | `/status`   | any    | `Status`     | no       |
//!
//! Anything else is `NotFound`; a known path with another method is
//! `MethodNotAllowed`. [`route`] is the pure decision; [`Router`] owns the
//! handlers and the persistence state and turns the decision into a call.
//!
//! The dispatcher matches the percent-decoded path, so `/ev%65nts` is
//! `/events`. A path that does not decode to UTF-8 matches nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use http::Method;
use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;

use crate::error::{Error, HttpError};
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, ready};
use crate::identity;
use crate::request::Request;

// ── Routes ────────────────────────────────────────────────────────────────────

/// A business handler slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Route {
    PublicKey,
    UserSecret,
    GetEvents,
    PostEvents,
    Status,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::PublicKey,
        Route::UserSecret,
        Route::GetEvents,
        Route::PostEvents,
        Route::Status,
    ];

    /// Whether the caller identity cookie must be present before the handler runs.
    pub fn requires_identity(self) -> bool {
        matches!(self, Route::GetEvents | Route::PostEvents)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Route::PublicKey  => "GET /exchange",
            Route::UserSecret => "POST /exchange",
            Route::GetEvents  => "GET /events",
            Route::PostEvents => "POST /events",
            Route::Status     => "* /status",
        })
    }
}

/// Result of routing one request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Handled(Route),
    NotFound,
    MethodNotAllowed,
}

#[derive(Clone, Copy)]
enum Resource {
    Exchange,
    Events,
    Status,
}

static RESOURCES: LazyLock<MatchitRouter<Resource>> = LazyLock::new(|| {
    let mut tree = MatchitRouter::new();
    for (path, resource) in [
        ("/exchange", Resource::Exchange),
        ("/events",   Resource::Events),
        ("/status",   Resource::Status),
    ] {
        tree.insert(path, resource)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
    }
    tree
});

/// Maps a path and method to exactly one [`Outcome`].
pub fn route(path: &str, method: &Method) -> Outcome {
    let Ok(matched) = RESOURCES.at(path) else {
        return Outcome::NotFound;
    };
    match (*matched.value, method) {
        (Resource::Exchange, &Method::GET)  => Outcome::Handled(Route::PublicKey),
        (Resource::Exchange, &Method::POST) => Outcome::Handled(Route::UserSecret),
        (Resource::Events,   &Method::GET)  => Outcome::Handled(Route::GetEvents),
        (Resource::Events,   &Method::POST) => Outcome::Handled(Route::PostEvents),
        (Resource::Status,   _)             => Outcome::Handled(Route::Status),
        _                                   => Outcome::MethodNotAllowed,
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router.
///
/// Holds the persistence state `S` and one handler per [`Route`]. Build it
/// once at startup and pass it to [`App::new`](crate::App::new), which
/// checks that every route has a handler.
///
/// ```rust,no_run
/// # use hush::{Request, Response, Route, Router};
/// # #[derive(Clone)] struct Db;
/// # async fn public_key(_: Request, _: Db) -> Response { Response::json("{}") }
/// # async fn user_secret(_: Request, _: Db) -> Response { Response::json("{}") }
/// # async fn get_events(_: Request, _: Db) -> Response { Response::json("{}") }
/// # async fn post_events(_: Request, _: Db) -> Response { Response::json("{}") }
/// # async fn status(_: Request, _: Db) -> Response { Response::json("{}") }
/// Router::new(Db)
///     .on(Route::PublicKey,  public_key)
///     .on(Route::UserSecret, user_secret)
///     .on(Route::GetEvents,  get_events)
///     .on(Route::PostEvents, post_events)
///     .on(Route::Status,     status);
/// ```
#[derive(Clone)]
pub struct Router<S> {
    state: S,
    handlers: HashMap<Route, BoxedHandler<S>>,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(state: S) -> Self {
        Self { state, handlers: HashMap::new() }
    }

    /// Registers `handler` for `route`, replacing any earlier registration.
    pub fn on(mut self, route: Route, handler: impl Handler<S>) -> Self {
        self.handlers.insert(route, handler.into_boxed_handler());
        self
    }

    /// Freezes the router into the innermost layer of the middleware stack.
    pub(crate) fn into_dispatcher(mut self, identity_cookie: &str) -> Result<BoxedHandler, Error> {
        let mut handlers = Vec::with_capacity(Route::ALL.len());
        for route in Route::ALL {
            let handler = self.handlers.remove(&route).ok_or(Error::MissingHandler(route))?;
            handlers.push(handler);
        }
        Ok(Arc::new(Dispatcher {
            state: self.state,
            handlers,
            identity_cookie: identity_cookie.into(),
        }))
    }
}

/// The frozen router. `handlers` is indexed by [`Route::index`].
struct Dispatcher<S> {
    state: S,
    handlers: Vec<BoxedHandler<S>>,
    identity_cookie: Arc<str>,
}

impl<S> ErasedHandler for Dispatcher<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn call(&self, req: Request, _: ()) -> BoxFuture {
        let outcome = route(&percent_decode_str(req.path()).decode_utf8_lossy(), req.method());
        let route = match outcome {
            Outcome::Handled(route) => route,
            Outcome::NotFound => return ready(HttpError::NotFound),
            Outcome::MethodNotAllowed => return ready(HttpError::MethodNotAllowed),
        };

        let req = if route.requires_identity() {
            match identity::extract(req, &self.identity_cookie) {
                Ok(req) => req,
                Err(e) => return ready(e),
            }
        } else {
            req
        };

        self.handlers[route.index()].call(req, self.state.clone())
    }
}
