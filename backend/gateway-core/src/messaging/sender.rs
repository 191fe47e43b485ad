//! Per-connection outbound queue.
//!
//! Every connection owns one writer task fed by an unbounded FIFO. Callers
//! enqueue without waiting for the socket; the writer serializes frames onto
//! the [`Transport`] in submission order.
//!
//! # Generations
//!
//! [`MessageSender::reset`] bumps a generation counter. Each queued message
//! remembers the generation it was enqueued under, and the writer drops any
//! message whose generation is no longer current. This is how a project load
//! discards replies still queued for the previous project.
//!
//! # Failure
//!
//! The first failed transport write shuts the sender down and fires the
//! [`SenderFailureSignal`] returned by [`MessageSender::spawn`]. The signal is
//! a one-shot channel so the owner hears about the failure at most once.

use crate::error::TransportError;
use crate::transport::Transport;

use models::{ConnectionId, OutboundEnvelope, OutboundTag};

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::{debug, error, trace, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderStatus {
    Active,
    Shutdown,
}

/// A transport write failure reported by the writer task.
#[derive(Debug)]
pub struct SenderFailure {
    pub connection_id: ConnectionId,
    pub error: TransportError,
}

impl Display for SenderFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(
            formatter,
            "send failure on connection {}: {}",
            self.connection_id, self.error
        )
    }
}

/// Resolves once, when the writer task hits a transport failure.
pub struct SenderFailureSignal {
    receiver: oneshot::Receiver<SenderFailure>,
}

impl SenderFailureSignal {
    /// Wait for a failure.
    ///
    /// Returns `None` if the writer stopped without failing (shutdown, or every
    /// sender handle dropped).
    pub async fn wait(self) -> Option<SenderFailure> {
        self.receiver.await.ok()
    }
}

enum Outgoing {
    Envelope { generation: u64, text: String },
    Flush(oneshot::Sender<()>),
    Stop,
}

struct SenderShared {
    connection_id: ConnectionId,
    shutdown: AtomicBool,
    generation: AtomicU64,
}

/// Cloneable handle to a connection's outbound queue.
///
/// The queue is unbounded so `send` never blocks a producer. Nothing caps
/// memory for a client that stops reading; the entries are only released
/// when a write fails, on `shutdown`, or when the connection closes.
///
/// The writer task exits once every handle is dropped.
#[derive(Clone)]
pub struct MessageSender {
    shared: Arc<SenderShared>,
    queue: UnboundedSender<Outgoing>,
}

impl MessageSender {
    /// Start the writer task for `connection_id`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        connection_id: ConnectionId,
        transport: Arc<dyn Transport>,
    ) -> (Self, SenderFailureSignal) {
        let (queue, receiver) = unbounded_channel();
        let (failure_tx, failure_rx) = oneshot::channel();

        let shared = Arc::new(SenderShared {
            connection_id,
            shutdown: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        });

        TokioSpawn(run_writer(
            Arc::clone(&shared),
            transport,
            receiver,
            failure_tx,
        ));

        (
            Self { shared, queue },
            SenderFailureSignal {
                receiver: failure_rx,
            },
        )
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.shared.connection_id
    }

    /// Enqueue one outbound envelope.
    ///
    /// Never waits for the socket. Returns `false` when the message was not
    /// accepted (sender shut down, or the envelope could not be serialized).
    pub fn send(
        &self,
        request_id: Option<String>,
        message_type: OutboundTag,
        message: impl Into<String>,
    ) -> bool {
        if self.is_shutdown() {
            trace!(
                "Dropping {} for {}: sender is shut down",
                message_type, self.shared.connection_id
            );
            return false;
        }

        let envelope = OutboundEnvelope::new(request_id, message_type, message);
        let text = match envelope.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!(
                    "Failed to encode {} for {}: {}",
                    message_type, self.shared.connection_id, e
                );
                return false;
            }
        };

        let generation = self.shared.generation.load(Ordering::SeqCst);
        self.queue
            .send(Outgoing::Envelope { generation, text })
            .is_ok()
    }

    /// Wait until everything enqueued before this call has been written.
    ///
    /// Returns `false` if the writer stopped before reaching this point.
    pub async fn flush(&self) -> bool {
        if self.is_shutdown() {
            return false;
        }

        let (done_tx, done_rx) = oneshot::channel();
        if self.queue.send(Outgoing::Flush(done_tx)).is_err() {
            return false;
        }
        done_rx.await.is_ok()
    }

    /// Start a new context. Messages queued and not yet written are dropped.
    pub fn reset(&self) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Sender for {} reset to generation {}",
            self.shared.connection_id, generation
        );
    }

    /// Stop accepting messages and stop the writer. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Sender for {} shutting down", self.shared.connection_id);
        // The writer may already have exited after a failure.
        let _ = self.queue.send(Outgoing::Stop);
    }

    pub fn status(&self) -> SenderStatus {
        if self.is_shutdown() {
            SenderStatus::Shutdown
        } else {
            SenderStatus::Active
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::SeqCst)
    }
}

async fn run_writer(
    shared: Arc<SenderShared>,
    transport: Arc<dyn Transport>,
    mut receiver: UnboundedReceiver<Outgoing>,
    failure_tx: oneshot::Sender<SenderFailure>,
) {
    while let Some(outgoing) = receiver.recv().await {
        match outgoing {
            Outgoing::Envelope { generation, text } => {
                if shared.shutdown.load(Ordering::SeqCst) {
                    trace!("Discarding queued message for {}", shared.connection_id);
                    continue;
                }
                if generation != shared.generation.load(Ordering::SeqCst) {
                    debug!(
                        "Discarding message from stale generation {} for {}",
                        generation, shared.connection_id
                    );
                    continue;
                }

                if let Err(e) = transport.write_text(text).await {
                    warn!("Write to {} failed: {}", shared.connection_id, e);
                    shared.shutdown.store(true, Ordering::SeqCst);
                    let _ = failure_tx.send(SenderFailure {
                        connection_id: shared.connection_id.clone(),
                        error: e,
                    });
                    return;
                }
            }
            Outgoing::Flush(done) => {
                let _ = done.send(());
            }
            Outgoing::Stop => break,
        }
    }

    debug!("Writer for {} stopped", shared.connection_id);
}
