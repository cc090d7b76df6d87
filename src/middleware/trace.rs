//! Request logging: one INFO event per request with method, path, status and
//! latency. Never sees requests dropped by [`DoNotTrack`](super::DoNotTrack).

use std::time::Instant;

use tracing::info;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

pub struct Trace;

impl Middleware for Trace {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let method = req.method().clone();
        let path = req.path().to_owned();

        Box::pin(async move {
            let started = Instant::now();
            let res = next.run(req).await;
            info!(
                %method,
                %path,
                status = res.status_code().as_u16(),
                latency_ms = started.elapsed().as_secs_f64() * 1000.0,
                "request"
            );
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::instrument::WithSubscriber;
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use crate::handler::{ErasedHandler, ready};
    use crate::middleware::Stack;
    use crate::response::Response;

    /// Collects the fields of every event as `name=value` strings.
    #[derive(Clone, Default)]
    struct Fields(Arc<Mutex<Vec<Vec<String>>>>);

    struct Collect<'a>(&'a mut Vec<String>);

    impl Visit for Collect<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.push(format!("{}={:?}", field.name(), value));
        }
    }

    impl<S: Subscriber> Layer<S> for Fields {
        fn on_event(&self, event: &Event<'_>, _: Context<'_, S>) {
            let mut fields = Vec::new();
            event.record(&mut Collect(&mut fields));
            self.0.lock().unwrap().push(fields);
        }
    }

    struct Teapot;

    impl ErasedHandler for Teapot {
        fn call(&self, _: Request, _: ()) -> BoxFuture {
            ready(Response::status(StatusCode::IM_A_TEAPOT))
        }
    }

    #[tokio::test]
    async fn logs_method_path_status_latency() {
        let fields = Fields::default();
        let handler = Stack::new().layer(Trace).wrap(Arc::new(Teapot));
        let req = http::Request::builder()
            .method("POST")
            .uri("/events?since=1")
            .body(Bytes::new())
            .unwrap();

        let res = handler.call(Request::new(req), ())
            .with_subscriber(tracing_subscriber::registry().with(fields.clone()))
            .await;
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);

        let events = fields.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert!(event.contains(&"method=POST".to_owned()), "{event:?}");
        assert!(event.contains(&"path=/events".to_owned()), "{event:?}");
        assert!(event.contains(&"status=418".to_owned()), "{event:?}");
        assert!(event.iter().any(|f| f.starts_with("latency_ms=")), "{event:?}");
    }
}
