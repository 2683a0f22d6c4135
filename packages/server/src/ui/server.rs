//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{MAX_OUTBOUND_BUFFER, ServerConfig},
    usecase::{ConnectParticipantUseCase, DisconnectParticipantUseCase, SendMessageUseCase},
};

use super::{
    handler::{http::health_check, websocket::websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Middleware shared by every route
///
/// A panicking handler becomes a 500 response instead of a dropped connection,
/// cross-origin requests are allowed from anywhere, and every request is traced.
fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// WebSocket room broadcast server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_participant_usecase,
///     send_message_usecase,
///     disconnect_participant_usecase,
///     ServerConfig::default(),
/// );
/// server.run().await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `connect_participant_usecase` - UseCase for joining a room
    /// * `send_message_usecase` - UseCase for broadcasting a message
    /// * `disconnect_participant_usecase` - UseCase for leaving a room
    /// * `config` - Listen address and per-connection limits
    pub fn new(
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        config: ServerConfig,
    ) -> Self {
        let state = Arc::new(AppState {
            connect_participant_usecase,
            send_message_usecase,
            disconnect_participant_usecase,
            idle_timeout: config.idle_timeout,
            outbound_buffer: config.outbound_buffer.clamp(1, MAX_OUTBOUND_BUFFER),
        });
        Self { state, config }
    }

    /// Build the router with all endpoints
    pub fn router(&self) -> Router {
        let routes = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check));

        with_middleware(routes).with_state(self.state.clone())
    }

    /// Run the server on the configured address until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws?room=<room>&user=<user>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            "WebSocket room server listening on {} (idle timeout: {:?}, outbound buffer: {}, evict empty rooms: {})",
            listener.local_addr()?,
            self.config.idle_timeout,
            self.state.outbound_buffer,
            self.config.evict_empty_rooms
        );

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
