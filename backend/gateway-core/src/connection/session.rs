use crate::connection::{CloseReason, ConnectionOptions, ConnectionRegistry, ConnectionStatus};
use crate::error::ConnectionError;
use crate::framing;
use crate::handler::CommandHandler;
use crate::messaging::{MessageSender, SenderFailureSignal};
use crate::transport::Transport;

use common::ErrorLocation;

use models::{ConnectionId, InboundEnvelope, OutboundTag};

use std::panic::Location;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Instant;

use log::{debug, error, info, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::{Mutex, watch};
use tokio::time::timeout;

/// One client session.
///
/// Owns the connection's [`MessageSender`] and is bound to one
/// [`CommandHandler`]. Inbound commands are dispatched one at a time.
pub struct Connection {
    id: ConnectionId,
    transport: Arc<dyn Transport>,
    sender: MessageSender,
    pub(super) handler: Arc<dyn CommandHandler>,
    registry: ConnectionRegistry,
    options: ConnectionOptions,
    status: watch::Sender<ConnectionStatus>,
    dispatch_lock: Mutex<()>,
}

impl Connection {
    /// Register a new connection and greet the client with its `CLIENT_ID`.
    ///
    /// `CLIENT_ID` has been written to the transport by the time this returns,
    /// so it is always the first outbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Open`] if the greeting cannot be delivered.
    /// The connection is closed and deregistered in that case.
    pub async fn open(
        transport: Arc<dyn Transport>,
        handler: Arc<dyn CommandHandler>,
        registry: &ConnectionRegistry,
        options: ConnectionOptions,
    ) -> Result<Arc<Self>, ConnectionError> {
        let connection = registry
            .add_connection(|id| {
                let (sender, failure_signal) = MessageSender::spawn(id.clone(), Arc::clone(&transport));
                // Queued before the registry insert so no broadcast can overtake it.
                if !sender.send(None, OutboundTag::ClientId, id.as_str()) {
                    return Err(ConnectionError::Open {
                        message: format!("Failed to queue CLIENT_ID for {id}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                let (status, _) = watch::channel(ConnectionStatus::Open);

                let connection = Arc::new(Self {
                    id,
                    transport,
                    sender,
                    handler,
                    registry: registry.clone(),
                    options,
                    status,
                    dispatch_lock: Mutex::new(()),
                });

                spawn_failure_supervisor(Arc::downgrade(&connection), failure_signal);
                Ok(connection)
            })
            .await?;

        if !connection.sender.flush().await {
            connection.close(CloseReason::TransportFailure).await;
            return Err(ConnectionError::Open {
                message: format!("Failed to deliver CLIENT_ID to {}", connection.id),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!("Connection {} opened", connection.id);
        Ok(connection)
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn sender(&self) -> &MessageSender {
        &self.sender
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.status().is_closed()
    }

    /// Watch for the transition to [`ConnectionStatus::Closed`].
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Shut the connection down and deregister it. Idempotent: only the first
    /// call has any effect.
    pub async fn close(&self, reason: CloseReason) {
        let transitioned = self.status.send_if_modified(|status| {
            if status.is_closed() {
                return false;
            }
            *status = ConnectionStatus::Closed(reason);
            true
        });
        if !transitioned {
            return;
        }

        if self.options.drain_on_close && !reason.is_failure() {
            match timeout(self.options.flush_timeout, self.sender.flush()).await {
                Ok(true) => {}
                Ok(false) => debug!("Outbound queue of {} not drained", self.id),
                Err(_) => warn!(
                    "Timed out after {:?} draining outbound queue of {}",
                    self.options.flush_timeout, self.id
                ),
            }
        }

        self.sender.shutdown();
        self.registry.remove_connection(&self.id).await;

        if let Err(e) = self.transport.close().await {
            debug!("Closing transport of {}: {}", self.id, e);
        }

        info!("Connection {} closed ({})", self.id, reason);
    }

    /// Handle one inbound text frame.
    ///
    /// Unknown command tags are ignored. Decode and handler failures that the
    /// protocol can report are sent back to the client and do not make this
    /// return an error.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::Closed`] if the connection is already closed
    /// - [`ConnectionError::MalformedEnvelope`] if `raw` is not an envelope
    /// - errors from a file transfer requested by the handler
    pub async fn on_text(&self, raw: &str) -> Result<(), ConnectionError> {
        self.ensure_open()?;

        let envelope = InboundEnvelope::parse(raw)?;
        let Some(tag) = envelope.tag() else {
            debug!(
                "Ignoring unknown command '{}' from {}",
                envelope.message_type, self.id
            );
            return Ok(());
        };

        let _dispatching = self.dispatch_lock.lock().await;
        self.ensure_open()?;
        self.dispatch(envelope.request_id, tag, envelope.data.as_deref())
            .await
    }

    /// Binary inbound frames are not part of the protocol.
    ///
    /// # Errors
    ///
    /// Always returns [`ConnectionError::UnsupportedOperation`]; the
    /// connection stays open.
    pub fn on_binary(&self, bytes: &[u8]) -> Result<(), ConnectionError> {
        Err(ConnectionError::UnsupportedOperation {
            message: format!(
                "Binary frames are not accepted ({} bytes from {})",
                bytes.len(),
                self.id
            ),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Queue a text message. Returns `false` once the connection is closed.
    pub fn send(
        &self,
        request_id: Option<String>,
        message_type: OutboundTag,
        message: impl Into<String>,
    ) -> bool {
        if self.is_closed() {
            return false;
        }
        self.sender.send(request_id, message_type, message)
    }

    /// Send a file as one binary frame, bypassing the text queue.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::Framing`] if the file name does not fit the frame;
    ///   the file is not read and the connection stays open
    /// - [`ConnectionError::FileRead`] / [`ConnectionError::Transport`] if the
    ///   file cannot be read or the frame cannot be written; the connection is
    ///   closed with [`CloseReason::BinarySendFailure`]
    pub async fn send_file(&self, path: &Path) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        let started = Instant::now();

        let Some(name) = path.file_name().map(|name| name.to_string_lossy()) else {
            let error = ConnectionError::FileRead {
                message: format!("No file name in {}", path.display()),
                location: ErrorLocation::from(Location::caller()),
            };
            return self.fail_binary_send(error).await;
        };

        // Checked before reading so an unsendable name costs no I/O.
        if let Err(e) = framing::name_length(&name) {
            warn!("Cannot send {} to {}: {}", path.display(), self.id, e);
            return Err(e.into());
        }

        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to read {} for {}: {}", path.display(), self.id, e);
                return self.fail_binary_send(e.into()).await;
            }
        };

        let frame = framing::encode(&name, &data)?;

        if let Err(e) = self.transport.write_binary(frame).await {
            error!("Failed to send {} to {}: {}", name, self.id, e);
            return self.fail_binary_send(e.into()).await;
        }

        info!(
            "Sent {} to {} in {} ms ({} KB)",
            name,
            self.id,
            started.elapsed().as_millis(),
            data.len() / 1024
        );
        Ok(())
    }

    async fn fail_binary_send(&self, error: ConnectionError) -> Result<(), ConnectionError> {
        self.close(CloseReason::BinarySendFailure).await;
        Err(error)
    }

    #[track_caller]
    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed {
                connection_id: self.id.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

fn spawn_failure_supervisor(connection: Weak<Connection>, failure_signal: SenderFailureSignal) {
    TokioSpawn(async move {
        let Some(failure) = failure_signal.wait().await else {
            return;
        };
        warn!("{}", failure);
        if let Some(connection) = connection.upgrade() {
            connection.close(CloseReason::TransportFailure).await;
        }
    });
}
