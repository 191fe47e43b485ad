use crate::config::GatewayConfig;
use crate::connection::{CloseReason, Connection, ConnectionOptions, ConnectionRegistry};
use crate::error::{ConnectionError, ServerError};
use crate::handler::CommandHandler;
use crate::server::handle::GatewayServerHandle;
use crate::transport::WebSocketTransport;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn as TokioSpawn;
use tokio::sync::watch;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Starts the gateway WebSocket server.
///
/// Binds `server.host:server.port` and spawns a background task accepting
/// connections. Each accepted client gets its own task and its own
/// [`Connection`] bound to `handler`, registered in `registry`.
///
/// # Returns
///
/// Returns [`GatewayServerHandle`] on success, representing the running server.
///
/// # Errors
///
/// Returns [`ServerError::Io`] if the address cannot be bound (port in use,
/// insufficient permissions, unknown host).
pub async fn start_gateway_server(
    config: &GatewayConfig,
    handler: Arc<dyn CommandHandler>,
    registry: ConnectionRegistry,
) -> Result<GatewayServerHandle, ServerError> {
    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    let local_addr = listener.local_addr()?;

    info!("Gateway server listening on {}", local_addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loopback_only = config.server.loopback_only;
    let options = ConnectionOptions::from(&config.messaging);

    TokioSpawn(accept_loop(
        listener,
        handler,
        registry.clone(),
        options,
        loopback_only,
        shutdown_rx,
    ));

    Ok(GatewayServerHandle::new(local_addr, registry, shutdown_tx))
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<dyn CommandHandler>,
    registry: ConnectionRegistry,
    options: ConnectionOptions,
    loopback_only: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.wait_for(|stopped| *stopped) => break,
        };

        match accepted {
            Ok((stream, addr)) => {
                if loopback_only && !addr.ip().is_loopback() {
                    warn!("Rejected non-loopback connection from {}", addr);
                    continue;
                }

                info!("Client connecting from {}", addr);
                let handler = Arc::clone(&handler);
                let registry = registry.clone();
                TokioSpawn(async move {
                    if let Err(e) = handle_connection(stream, addr, handler, registry, options).await {
                        error!("Connection from {} ended with error: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }

    info!("Gateway accept loop stopped");
}

/// Runs one client from handshake to close.
///
/// # Errors
///
/// - [`ServerError::Handshake`] - WebSocket upgrade failed
/// - [`ServerError::Connection`] - the connection could not be opened
/// - [`ServerError::Read`] - reading from the socket failed (the connection
///   has been closed with [`CloseReason::ReadError`])
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handler: Arc<dyn CommandHandler>,
    registry: ConnectionRegistry,
    options: ConnectionOptions,
) -> Result<(), ServerError> {
    let ws_stream = match accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            error!("WebSocket handshake failed: {}", e);
            return Err(ServerError::Handshake {
                message: format!("WebSocket handshake failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    let (write, mut read) = ws_stream.split();
    let transport = Arc::new(WebSocketTransport::new(write));
    let connection = Connection::open(transport, handler, &registry, options).await?;
    let mut status = connection.subscribe_status();

    info!("Client {} connected as {}", addr, connection.id());

    loop {
        let frame = tokio::select! {
            frame = read.next() => frame,
            _ = status.wait_for(|status| status.is_closed()) => {
                debug!("Connection {} closed, stopping read loop", connection.id());
                return Ok(());
            }
        };

        match frame {
            Some(Ok(Message::Text(text))) => match connection.on_text(text.as_str()).await {
                Ok(()) => {}
                Err(ConnectionError::Closed { .. }) => return Ok(()),
                Err(e) => warn!("Dropped message from {}: {}", connection.id(), e),
            },
            Some(Ok(Message::Binary(bytes))) => {
                if let Err(e) = connection.on_binary(&bytes) {
                    warn!("Rejected frame from {}: {}", connection.id(), e);
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                info!("Client {} disconnected", addr);
                connection.close(CloseReason::ClientClosed).await;
                return Ok(());
            }
            // Ping/pong are answered by tungstenite itself.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!("Error reading message from {}: {}", addr, e);
                connection.close(CloseReason::ReadError).await;
                return Err(ServerError::Read {
                    message: format!("Error reading message: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }
}
