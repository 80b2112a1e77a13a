//! Tower middleware attributing response bytes to a per-request key.
//!
//! ```text
//! request -> extract key -> Meter::start (spawns accumulation task)
//!         -> inner service -> Response<CountingBody<_>>
//!         -> body polled by transport (each frame reported)
//!         -> body finished / dropped -> sentinel -> TrafficRecord
//! ```

use std::task::{Context, Poll};

use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use tokio::sync::mpsc;
use tower::{Layer, Service};

use bytemeter_core::TrafficRecord;

use crate::config::MeterConfig;
use crate::meter::accumulator::Meter;
use crate::meter::key::KeyExtractor;
use crate::meter::writer::CountingBody;

/// Default capacity of the record channel.
pub const DEFAULT_RECORD_BUFFER: usize = 1024;

/// Consumer side of the record channel.
pub type TrafficReceiver<K> = mpsc::Receiver<TrafficRecord<K>>;

/// What to do with a request whose key cannot be derived.
///
/// Either way the request is not metered and a warning is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyErrorPolicy {
    /// Serve the request through the inner service, unmetered. Opt-in.
    PassThrough,
    /// Do not invoke the inner service; answer with an empty default response.
    #[default]
    Abandon,
}

/// Layer producing [`TrafficService`].
pub struct TrafficLayer<X: KeyExtractor> {
    extractor: X,
    records: mpsc::Sender<TrafficRecord<X::Key>>,
    policy: KeyErrorPolicy,
}

impl<X: KeyExtractor> TrafficLayer<X> {
    /// New layer with a fresh record channel of [`DEFAULT_RECORD_BUFFER`].
    pub fn new(extractor: X) -> (Self, TrafficReceiver<X::Key>) {
        let (tx, rx) = mpsc::channel(DEFAULT_RECORD_BUFFER);
        (Self::with_channel(extractor, tx), rx)
    }

    /// New layer sending into an existing channel (e.g. shared by several routers).
    pub fn with_channel(extractor: X, records: mpsc::Sender<TrafficRecord<X::Key>>) -> Self {
        Self {
            extractor,
            records,
            policy: KeyErrorPolicy::default(),
        }
    }

    /// Build from the `meter` config section.
    pub fn from_config(extractor: X, cfg: &MeterConfig) -> (Self, TrafficReceiver<X::Key>) {
        let (tx, rx) = mpsc::channel(cfg.record_buffer.max(1));
        (Self::with_channel(extractor, tx).on_key_error(cfg.on_key_error), rx)
    }

    pub fn on_key_error(mut self, policy: KeyErrorPolicy) -> Self {
        self.policy = policy;
        self
    }
}

// Manual impls: a derive would also demand `X::Key: Clone`.
impl<X: KeyExtractor> Clone for TrafficLayer<X> {
    fn clone(&self) -> Self {
        Self {
            extractor: self.extractor.clone(),
            records: self.records.clone(),
            policy: self.policy,
        }
    }
}

impl<S, X: KeyExtractor> Layer<S> for TrafficLayer<X> {
    type Service = TrafficService<S, X>;

    fn layer(&self, inner: S) -> Self::Service {
        TrafficService {
            inner,
            extractor: self.extractor.clone(),
            records: self.records.clone(),
            policy: self.policy,
        }
    }
}

/// Wraps an inner HTTP service and meters its response bodies.
pub struct TrafficService<S, X: KeyExtractor> {
    inner: S,
    extractor: X,
    records: mpsc::Sender<TrafficRecord<X::Key>>,
    policy: KeyErrorPolicy,
}

impl<S: Clone, X: KeyExtractor> Clone for TrafficService<S, X> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            extractor: self.extractor.clone(),
            records: self.records.clone(),
            policy: self.policy,
        }
    }
}

impl<S, X, ReqBody, ResBody> Service<Request<ReqBody>> for TrafficService<S, X>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    X: KeyExtractor,
    ResBody: Default + Send + 'static,
{
    type Response = Response<CountingBody<ResBody>>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (parts, body) = req.into_parts();
        let key = self.extractor.extract(&parts);
        let req = Request::from_parts(parts, body);

        let key = match key {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    code = e.code().as_str(),
                    method = %req.method(),
                    uri = %req.uri(),
                    policy = ?self.policy,
                    "request not metered"
                );
                return match self.policy {
                    KeyErrorPolicy::PassThrough => {
                        let fut = self.inner.call(req);
                        Box::pin(async move { fut.await.map(|res| res.map(CountingBody::passthrough)) })
                    }
                    KeyErrorPolicy::Abandon => {
                        let res: Result<Self::Response, Self::Error> =
                            Ok(Response::new(CountingBody::passthrough(ResBody::default())));
                        Box::pin(std::future::ready(res))
                    }
                };
            }
        };

        // Owned by the future until the response exists, then by the body.
        let meter = Meter::start(key, self.records.clone());
        let fut = self.inner.call(req);

        Box::pin(async move {
            fut.await.map(move |res| {
                res.map(move |body| CountingBody::new(body, move |n| meter.record(n)))
            })
        })
    }
}
