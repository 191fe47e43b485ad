//! JSON envelopes carried on the text channel.
//!
//! Inbound (client → server): `{"requestID": string|null, "type": string, "data": string}`
//!
//! Outbound (server → client): `{"requestID": string|null, "type": string, "message": string}`

mod inbound;
mod inbound_tag;
mod outbound;
mod outbound_tag;

pub use inbound::InboundEnvelope;
pub use inbound_tag::InboundTag;
pub use outbound::OutboundEnvelope;
pub use outbound_tag::OutboundTag;
