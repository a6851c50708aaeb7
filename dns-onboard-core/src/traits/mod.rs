//! Abstraction traits at the transport and provider seams

mod gateway_factory;
mod message_sink;

pub use gateway_factory::{CloudflareGatewayFactory, GatewayFactory};
pub use message_sink::MessageSink;
