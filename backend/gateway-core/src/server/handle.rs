//! Server handle type.

use crate::connection::{CloseReason, ConnectionRegistry};

use std::net::SocketAddr;

use log::info;
use tokio::sync::watch;

/// Handle to a running gateway server.
///
/// Returned by [`start_gateway_server`](crate::server::start_gateway_server).
/// Dropping the handle does not stop the server; call
/// [`shutdown`](Self::shutdown).
///
/// # Examples
///
/// ```no_run
/// use gateway_core::{ConnectionRegistry, GatewayConfig, start_gateway_server};
/// # use gateway_core::CommandHandler;
/// # use std::sync::Arc;
/// # struct Nothing;
/// # impl CommandHandler for Nothing {}
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = start_gateway_server(
///         &GatewayConfig::default(),
///         Arc::new(Nothing),
///         ConnectionRegistry::new(),
///     )
///     .await?;
///     println!("listening on {}", handle.local_addr());
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct GatewayServerHandle {
    local_addr: SocketAddr,
    registry: ConnectionRegistry,
    shutdown: watch::Sender<bool>,
}

impl GatewayServerHandle {
    pub(crate) fn new(
        local_addr: SocketAddr,
        registry: ConnectionRegistry,
        shutdown: watch::Sender<bool>,
    ) -> Self {
        Self {
            local_addr,
            registry,
            shutdown,
        }
    }

    /// The bound address (useful when the configured port was 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Stop accepting and close every registered connection.
    pub async fn shutdown(&self) {
        info!("Gateway server on {} shutting down", self.local_addr);
        self.shutdown.send_replace(true);
        self.registry.close_all(CloseReason::ServerShutdown).await;
    }
}
