pub mod config;
pub mod connection;
pub mod error;
pub mod framing;
pub mod handler;
pub mod messaging;
pub mod server;
pub mod transport;

#[cfg(test)]
mod tests;

pub use config::GatewayConfig;
pub use connection::{
    CloseReason, Connection, ConnectionOptions, ConnectionRegistry, ConnectionStatus,
};
pub use handler::{CommandContext, CommandHandler, HandlerReply};
pub use messaging::{MessageSender, SenderFailure, SenderFailureSignal, SenderStatus};
pub use server::{GatewayServerHandle, start_gateway_server};
pub use transport::{ChannelTransport, Transport, TransportFrame, WebSocketTransport};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_ADDRESS: &str = const_format::concatcp!(DEFAULT_HOST, ":", DEFAULT_PORT);
