//! Ordered outbound text delivery for one connection.

mod sender;

pub use sender::{MessageSender, SenderFailure, SenderFailureSignal, SenderStatus};
