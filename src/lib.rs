//! # hush
//!
//! The front door of a privacy-respecting event collection service. Every
//! inbound request passes through hush, which decides which business handler
//! runs, carries the caller's identity cookie into request scope, and wraps it
//! all in a fixed chain of middleware.
//!
//! ## The pipeline
//!
//! ```text
//! Recovery ─▶ Do-Not-Track ─▶ Trace ─▶ CORS ─▶ Content-Type ─▶ Router ─▶ handler
//! ```
//!
//! - **Recovery** turns any panic below it into a logged `500`.
//! - **Do-Not-Track** answers `DNT: 1` with `204` before anything is logged.
//! - **Trace** logs method, path, status and latency.
//! - **CORS** allows one configured origin, with credentials.
//! - **Content-Type** defaults responses to `application/json`.
//! - **Router** picks one of five routes or answers `404` / `405`. The
//!   `/events` routes require a non-empty identity cookie, or get `400`.
//!
//! Storage, encryption and the business handlers live elsewhere. hush only
//! hands each handler its request and a clone of the persistence state.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hush::{App, Config, HttpError, Json, Request, Response, Route, Router, Server, health};
//!
//! #[derive(Clone)]
//! struct Db;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hush::Error> {
//!     let config = Config::load("hush.toml")?;
//!     hush::telemetry::init(&config)?;
//!
//!     let router = Router::new(Db)
//!         .on(Route::PublicKey,  public_key)
//!         .on(Route::UserSecret, user_secret)
//!         .on(Route::GetEvents,  get_events)
//!         .on(Route::PostEvents, post_events)
//!         .on(Route::Status,     health::liveness);
//!
//!     let app = App::new(router, &config)?;
//!     Server::bind(&config.bind_address)?.serve(app).await
//! }
//!
//! async fn public_key(_req: Request, _db: Db) -> Response {
//!     Response::json(r#"{"key":"..."}"#)
//! }
//!
//! async fn user_secret(req: Request, _db: Db) -> Result<Response, HttpError> {
//!     if req.body().is_empty() {
//!         return Err(HttpError::BadRequest("empty secret".into()));
//!     }
//!     Ok(Response::json("{}"))
//! }
//!
//! async fn get_events(req: Request, _db: Db) -> Json<Vec<String>> {
//!     // Always set on /events.
//!     let _user = req.identity();
//!     Json(Vec::new())
//! }
//!
//! async fn post_events(_req: Request, _db: Db) -> http::StatusCode {
//!     http::StatusCode::CREATED
//! }
//! ```

mod app;
mod config;
mod error;
mod handler;
mod identity;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;
pub mod telemetry;

pub use app::{App, pipeline};
pub use config::Config;
pub use error::{Error, HttpError};
pub use handler::{BoxFuture, Handler};
pub use identity::extract as extract_identity;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::{Outcome, Route, Router, route};
pub use server::Server;
