//! Test utilities for HTTP route stores.
//!
//! [`StubRouteService`] is an `axum` router served on a loopback port from a
//! background thread. Every request, whatever its path, is answered with a
//! canned status and body and recorded, so store behaviour can be checked
//! without a real route service.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use log::debug;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One request received by [`StubRouteService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method, e.g. `POST`.
    pub method: String,
    /// Request target, e.g. `/routes/r1/stops/positions`.
    pub path: String,
    /// Request body after transfer decoding.
    pub body: String,
}

impl RecordedRequest {
    /// Request body parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns the parser error when the body is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Debug, Clone)]
struct StubState {
    status: StatusCode,
    reply: Arc<str>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn record(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    body: String,
) -> impl IntoResponse {
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            method: method.to_string(),
            path: uri.path().to_owned(),
            body,
        });
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.reply.to_string(),
    )
}

/// Loopback route service answering every request with one canned reply.
///
/// # Example
///
/// ```
/// use stopline_core::{LegType, OrderId, RouteStore};
/// use stopline_data::remote::HttpRouteStore;
/// use stopline_data::remote::test_support::StubRouteService;
///
/// let service = StubRouteService::start(200, "")?;
/// let store = HttpRouteStore::new(service.base_url(), "r1")?;
/// store.detach_leg(&OrderId::new("O1"), LegType::Pickup)?;
/// let requests = service.finish()?;
/// assert_eq!(requests[0].path, "/orders/O1/unroute");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct StubRouteService {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<io::Result<()>>>,
}

impl StubRouteService {
    /// Bind a loopback port and answer every request with `status` and
    /// `body`.
    ///
    /// Must be called outside a Tokio runtime; the service drives its own.
    ///
    /// # Errors
    ///
    /// Returns an error if `status` is not a valid HTTP status code, or if
    /// the runtime or listener cannot be created.
    pub fn start(status: u16, body: &str) -> io::Result<Self> {
        let status = StatusCode::from_u16(status)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let listener = runtime.block_on(TcpListener::bind("127.0.0.1:0"))?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(record).with_state(StubState {
            status,
            reply: Arc::from(body),
            requests: Arc::clone(&requests),
        });
        let (shutdown, signal) = oneshot::channel::<()>();
        let worker = thread::spawn(move || {
            runtime.block_on(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        if signal.await.is_ok() {
                            debug!("stub route service shutting down");
                        }
                    })
                    .await
            })
        });
        Ok(Self {
            base_url,
            requests,
            shutdown: Some(shutdown),
            worker: Some(worker),
        })
    }

    /// Base URL to point a store at.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop serving and return the recorded requests in arrival order.
    ///
    /// # Errors
    ///
    /// Returns the server's I/O error if it stopped abnormally.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from the serving thread.
    pub fn finish(mut self) -> io::Result<Vec<RecordedRequest>> {
        self.stop()?;
        Ok(self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn stop(&mut self) -> io::Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            // The server may already have gone, leaving nobody to signal.
            shutdown.send(()).unwrap_or_default();
        }
        self.worker.take().map_or(Ok(()), join_worker)
    }
}

impl Drop for StubRouteService {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).unwrap_or_default();
        }
    }
}

fn join_worker(worker: JoinHandle<io::Result<()>>) -> io::Result<()> {
    match worker.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
