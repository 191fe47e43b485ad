pub mod config;
pub mod connection;
pub mod framing;
pub mod handler;
pub mod server;
pub mod transport;

pub use config::ConfigError;
pub use connection::ConnectionError;
pub use framing::FramingError;
pub use handler::HandlerError;
pub use server::ServerError;
pub use transport::TransportError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),

    #[error(transparent)]
    Framing(#[from] framing::FramingError),

    #[error(transparent)]
    Server(#[from] server::ServerError),

    #[error(transparent)]
    Transport(#[from] transport::TransportError),
}
