//! Catch-all webhook ingestion.
//!
//! Every request on the bound port, whatever its method or path, is captured
//! as a [`WebhookRecord`], persisted to the [`RecordStore`], offered to the
//! bounded live queue, and answered with `200 OK`.

mod error;
mod feed;

pub use error::ServerError;
pub use feed::LiveFeed;

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, StatusCode, Uri},
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use webhook_tui_core::WebhookRecord;
use webhook_tui_core::record::collect_headers;
use webhook_tui_local_db::RecordStore;

/// Records buffered for the UI before new captures skip the live path.
pub const LIVE_QUEUE_CAPACITY: usize = 100;

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// `0.0.0.0:<port>`
pub fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// State shared by every connection task.
#[derive(Clone)]
struct IngestState {
    store: Arc<RecordStore>,
    next_id: Arc<AtomicI64>,
    live_tx: mpsc::Sender<WebhookRecord>,
}

impl IngestState {
    fn assign_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

pub struct IngestServer {
    store: Arc<RecordStore>,
    first_id: i64,
    queue_capacity: usize,
}

impl IngestServer {
    /// `first_id` is the id given to the first captured request.
    pub fn new(store: Arc<RecordStore>, first_id: i64) -> Self {
        Self {
            store,
            first_id,
            queue_capacity: LIVE_QUEUE_CAPACITY,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    fn into_router(self) -> (Router, LiveFeed) {
        let (live_tx, live_rx) = mpsc::channel(self.queue_capacity);
        let state = IngestState {
            store: self.store,
            next_id: Arc::new(AtomicI64::new(self.first_id)),
            live_tx,
        };
        let app = Router::new()
            .fallback(capture)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TraceLayer::new_for_http())
            .with_state(state);
        (app, LiveFeed::new(live_rx))
    }

    /// Bind `addr` and serve in the background on the current tokio runtime.
    pub async fn bind(self, addr: SocketAddr) -> Result<(BoundServer, LiveFeed), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let (app, feed) = self.into_router();
        tracing::info!("webhook server listening on {local_addr}");

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!("webhook server stopped: {e}");
            }
        });

        Ok((
            BoundServer {
                addr: local_addr,
                task,
            },
            feed,
        ))
    }
}

/// Handle to a running ingestion server.
pub struct BoundServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections. In-flight responses are not awaited.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn capture(
    State(state): State<IngestState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let record = WebhookRecord::capture(
        state.assign_id(),
        chrono::Utc::now(),
        method.as_str(),
        uri.path(),
        collect_headers(
            headers
                .iter()
                .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()))),
        ),
        String::from_utf8_lossy(&body).into_owned(),
    );

    persist(&state.store, &record).await;

    let id = record.id;
    match state.live_tx.try_send(record) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::debug!(id, "live queue full, record skipped for live view");
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(id, "live feed dropped");
        }
    }

    (StatusCode::OK, "OK")
}

async fn persist(store: &Arc<RecordStore>, record: &WebhookRecord) {
    let store = Arc::clone(store);
    let owned = record.clone();
    match tokio::task::spawn_blocking(move || store.insert(&owned)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(id = record.id, "failed to persist webhook: {e}"),
        Err(e) => tracing::warn!(id = record.id, "persist task failed: {e}"),
    }
}
