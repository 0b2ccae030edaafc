//! WebSocket transport server using Axum.
//!
//! Handles HTTP upgrade to WebSocket, assigns connection ids, and turns
//! socket activity into `ConnectionEvents` callbacks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use relay_protocol::{RelayError, RelayResult, Welcome};
use serde_json::json;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::client::{OUTBOUND_BUFFER_SIZE, WsConnection};
use crate::events::{ConnectionEvents, ConnectionHandle};

/// Transport server configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Port to listen on (0 for OS-assigned)
    pub port: u16,
    /// Hostname to bind to
    pub hostname: String,
    /// WebSocket endpoint path
    pub path: String,
    /// Maximum concurrent connections (None = unlimited)
    pub max_connections: Option<usize>,
    /// Enable permissive CORS
    pub enable_cors: bool,
    /// Tell each client its connection id right after connecting
    pub send_welcome: bool,
    /// Frames queued per connection before further sends are dropped
    pub outbound_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 7070,
            hostname: "127.0.0.1".into(),
            path: "/test/oneToOne".into(),
            max_connections: None,
            enable_cors: false,
            send_welcome: true,
            outbound_buffer: OUTBOUND_BUFFER_SIZE,
        }
    }
}

/// Shared state for the transport server.
struct AppState<E: ConnectionEvents> {
    events: Arc<E>,
    config: TransportConfig,
    /// Open sockets, for the connection limit
    open_sockets: AtomicUsize,
}

/// The transport server — accepts WebSocket connections and drives events.
pub struct TransportServer {
    /// Shutdown signal
    shutdown_tx: Option<mpsc::Sender<()>>,
    /// Server task handle
    handle: Option<tokio::task::JoinHandle<()>>,
    /// Actual bound port
    port: u16,
    path: String,
}

impl TransportServer {
    /// Start the transport server with the given event handler.
    pub async fn start<E: ConnectionEvents>(config: TransportConfig, events: E) -> RelayResult<Self> {
        Self::start_shared(config, Arc::new(events)).await
    }

    /// Start the transport server with a handler the caller keeps a reference to.
    pub async fn start_shared<E: ConnectionEvents>(
        config: TransportConfig,
        events: Arc<E>,
    ) -> RelayResult<Self> {
        if !config.path.starts_with('/') {
            return Err(RelayError::InvalidPath(config.path.clone()));
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let state = Arc::new(AppState {
            events,
            config: config.clone(),
            open_sockets: AtomicUsize::new(0),
        });

        let mut app = Router::new()
            .route(&config.path, get(ws_upgrade_handler::<E>))
            .route("/health", get(health_handler::<E>))
            .with_state(state);
        if config.enable_cors {
            app = app.layer(CorsLayer::permissive());
        }

        let addr: SocketAddr = format!("{}:{}", config.hostname, config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        info!("Relay listening on ws://{}:{}{}", config.hostname, actual_port, config.path);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            port: actual_port,
            path: config.path,
        })
    }

    /// Get the actual bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The WebSocket endpoint path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Gracefully stop the server.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Relay transport stopped");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn ws_upgrade_handler<E: ConnectionEvents>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<E>>>,
) -> impl IntoResponse {
    if let Some(max) = state.config.max_connections {
        let current = state.open_sockets.load(Ordering::Relaxed);
        if current >= max {
            warn!("Connection rejected: max connections reached ({max})");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
        .into_response()
}

async fn health_handler<E: ConnectionEvents>(
    State(state): State<Arc<AppState<E>>>,
) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "clients": state.events.live_count(),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket Connection Handler
// ─────────────────────────────────────────────────────────────────────────────

async fn handle_ws_connection<E: ConnectionEvents>(socket: WebSocket, state: Arc<AppState<E>>) {
    state.open_sockets.fetch_add(1, Ordering::Relaxed);

    let client_id = uuid::Uuid::new_v4().to_string();
    let (ws_tx, ws_rx) = socket.split();
    run_connection(client_id.clone(), ws_tx, ws_rx, state.events.clone(), &state.config).await;

    state.open_sockets.fetch_sub(1, Ordering::Relaxed);
    debug!(
        "Connection {client_id} released (open sockets: {})",
        state.open_sockets.load(Ordering::Relaxed),
    );
}

/// Drive one connection from registration to its single `on_disconnect`.
///
/// The reader loop ends on close, stream end, a read error, or the writer
/// task stopping after a write error. Every path falls through to exactly
/// one `on_disconnect`.
async fn run_connection<E, K, S, SE>(
    client_id: String,
    mut sink: K,
    mut stream: S,
    events: Arc<E>,
    config: &TransportConfig,
) where
    E: ConnectionEvents,
    K: Sink<Message> + Unpin + Send + 'static,
    K::Error: std::fmt::Display + Send,
    S: Stream<Item = Result<Message, SE>> + Unpin + Send,
    SE: std::fmt::Display + Send,
{
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(config.outbound_buffer.max(1));
    let conn = Arc::new(WsConnection::new(client_id.clone(), out_tx));

    // Writer: the only task that touches the sink.
    let mut writer = {
        let events = events.clone();
        let client_id = client_id.clone();
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = sink.send(frame).await {
                    events.on_error(&client_id, &RelayError::transport(e));
                    return;
                }
            }
            let _ = sink.close().await;
        })
    };

    // Register before the welcome goes out: once a client knows its id,
    // peers may address it.
    events.on_connect(conn.clone());
    if config.send_welcome {
        if let Err(e) = conn.send_text(&Welcome::new(&client_id).to_json()) {
            events.on_error(&client_id, &e);
        }
    }

    loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        events.on_message(&client_id, text.as_str());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = conn.send_frame(Message::Pong(data));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Ignoring {} byte binary frame from {client_id}", data.len());
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Client closed: {client_id}");
                        break;
                    }
                    Some(Err(e)) => {
                        events.on_error(&client_id, &RelayError::transport(e));
                        break;
                    }
                }
            }

            // Writer died on a write fault; the socket is unusable.
            _ = &mut writer => {
                debug!("Writer stopped for {client_id}");
                break;
            }
        }
    }

    events.on_disconnect(&client_id);
    debug!("Connection {client_id} closed after {:?}", conn.uptime());
    // Dropping the last handle closes the queue; the writer flushes and exits.
}
