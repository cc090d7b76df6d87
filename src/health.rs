//! A ready-made status handler.
//!
//! `/status` is routed for every method and needs no identity. Services that
//! have nothing richer to report can register this one:
//!
//! ```rust,no_run
//! use hush::{Route, Router, health};
//!
//! # #[derive(Clone)] struct Db;
//! let router = Router::new(Db).on(Route::Status, health::liveness);
//! ```
//!
//! Replace it with your own handler to gate on database health.

use serde::Serialize;

use crate::request::Request;
use crate::response::Json;

#[derive(Serialize)]
pub struct Status {
    pub ok: bool,
}

/// Always `200 OK` with `{"ok":true}`. If the process can answer at all, it
/// is alive.
pub async fn liveness<S>(_req: Request, _state: S) -> Json<Status> {
    Json(Status { ok: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;

    use crate::response::IntoResponse;

    #[tokio::test]
    async fn reports_ok() {
        let res = liveness(Request::new(http::Request::new(Bytes::new())), ()).await.into_response();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), br#"{"ok":true}"#);
    }
}
