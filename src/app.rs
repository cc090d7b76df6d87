//! The assembled service: router plus middleware, in the one order hush runs.

use crate::config::Config;
use crate::error::Error;
use crate::handler::{BoxedHandler, ErasedHandler};
use crate::middleware::{ContentType, Cors, DoNotTrack, Recovery, Stack, Trace};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The fixed middleware order, outermost first.
///
/// Recovery wraps everything so even dropped requests are panic-safe. It
/// carries the CORS origin too, since a panic unwinds past [`Cors`].
/// Do-Not-Track comes before Trace so opted-out requests are never logged.
pub fn pipeline(config: &Config) -> Result<Stack, Error> {
    let cors = Cors::new(&config.allowed_origin)
        .map_err(|e| Error::ConfigInvalid(vec![format!("allowed_origin: {e}")]))?;

    Ok(Stack::new()
        .layer(Recovery::with_origin(cors.origin().clone()))
        .layer(DoNotTrack)
        .layer(Trace)
        .layer(cors)
        .layer(ContentType))
}

/// The request-handling entry point.
///
/// Built once at startup and shared, read-only, by every connection.
/// Building twice from the same router and config gives two apps that answer
/// every request the same way.
pub struct App {
    endpoint: BoxedHandler,
    layers: Vec<&'static str>,
}

impl App {
    /// Validates `config`, checks that `router` has every handler, and wraps
    /// it in the middleware [`pipeline`].
    pub fn new<S>(router: Router<S>, config: &Config) -> Result<Self, Error>
    where
        S: Clone + Send + Sync + 'static,
    {
        config.validate()?;
        let stack = pipeline(config)?;
        let dispatcher = router.into_dispatcher(&config.identity_cookie)?;
        Ok(Self { endpoint: stack.wrap(dispatcher), layers: stack.names() })
    }

    /// Middleware names, outermost first.
    pub fn layers(&self) -> &[&'static str] {
        &self.layers
    }

    /// Runs one request through the whole chain.
    pub async fn call(&self, req: Request) -> Response {
        self.endpoint.call(req, ()).await
    }

    pub(crate) fn endpoint(&self) -> BoxedHandler {
        self.endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Route;

    #[test]
    fn order_is_fixed() {
        let stack = pipeline(&Config::default()).unwrap();
        assert_eq!(stack.names(), ["recovery", "do_not_track", "trace", "cors", "content_type"]);
    }

    #[test]
    fn rejects_invalid_config() {
        let router = Route::ALL.into_iter().fold(Router::new(()), |r, route| {
            r.on(route, |_: Request, _: ()| async { "ok" })
        });
        let config = Config { allowed_origin: "*".into(), ..Config::default() };
        assert!(matches!(App::new(router, &config), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn rejects_incomplete_router() {
        let router = Router::new(()).on(Route::Status, |_: Request, _: ()| async { "ok" });
        assert!(matches!(
            App::new(router, &Config::default()),
            Err(Error::MissingHandler(Route::PublicKey))
        ));
    }
}
