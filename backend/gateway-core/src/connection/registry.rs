//! Table of live connections.
//!
//! One registry is created at process start and passed to the server and to
//! every connection it opens. Tests create their own.

use crate::connection::{CloseReason, Connection};
use crate::error::ConnectionError;

use models::{ConnectionId, OutboundTag};

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use log::{debug, info};
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, Arc<Connection>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an unused [`ConnectionId`], build the connection for it and
    /// register it, all under one write lock.
    ///
    /// # Errors
    ///
    /// Returns whatever `build` fails with; nothing is registered then.
    pub async fn add_connection<F>(&self, build: F) -> Result<Arc<Connection>, ConnectionError>
    where
        F: FnOnce(ConnectionId) -> Result<Arc<Connection>, ConnectionError>,
    {
        let mut connections = self.connections.write().await;

        let id = loop {
            let candidate = ConnectionId::generate();
            if !connections.contains_key(&candidate) {
                break candidate;
            }
        };

        let connection = build(id.clone())?;
        connections.insert(id.clone(), Arc::clone(&connection));
        debug!("Registered {} ({} live)", id, connections.len());
        Ok(connection)
    }

    /// Remove `id`. Returns `false` if it was not registered.
    pub async fn remove_connection(&self, id: &ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(id).is_some();
        if removed {
            debug!("Deregistered {} ({} live)", id, connections.len());
        }
        removed
    }

    pub async fn get(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Snapshot of the registered IDs.
    pub async fn ids(&self) -> Vec<ConnectionId> {
        self.connections.read().await.keys().cloned().collect()
    }

    /// Queue `message` on every live connection. Returns how many accepted it.
    pub async fn broadcast(&self, message_type: OutboundTag, message: &str) -> usize {
        let connections = self.snapshot().await;
        connections
            .iter()
            .filter(|connection| connection.send(None, message_type, message))
            .count()
    }

    /// Close every registered connection.
    pub async fn close_all(&self, reason: CloseReason) {
        let connections = self.snapshot().await;
        if connections.is_empty() {
            return;
        }

        info!("Closing {} connection(s): {}", connections.len(), reason);
        join_all(
            connections
                .iter()
                .map(|connection| connection.close(reason)),
        )
        .await;
    }

    // Connections call back into the registry when they close, so the lock
    // must not be held while talking to them.
    async fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.read().await.values().cloned().collect()
    }
}
