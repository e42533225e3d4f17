//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{config::RelayConfig, hub::HubHandle};

use super::{
    handler::{
        http::{get_room, health_check, list_rooms},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Whiteboard relay server
///
/// Owns the hub and serves the WebSocket endpoint plus the read-only HTTP API.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(RelayConfig::default());
/// server.run().await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance and start its hub.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: RelayConfig) -> Self {
        let hub = HubHandle::spawn(config.limits.command_capacity);
        Self {
            state: Arc::new(AppState::new(config, hub)),
        }
    }

    /// Build the router with every endpoint attached.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(list_rooms))
            .route("/api/rooms/{name}", get(get_room))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = self.state.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Whiteboard relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?name=<client name>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// On shutdown every open connection is closed so its outbound loop can flush
    /// queued messages and send a close frame.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let hub = self.state.hub.clone();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                match hub.close_all().await {
                    Ok(closed) => tracing::info!("Closed {} connection(s)", closed),
                    Err(e) => tracing::error!("Failed to close connections: {}", e),
                }
            })
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
