//! Client-facing transport: the WebSocket listener and the message format.

pub mod handshake;
pub mod network_listener;

pub use handshake::{ClientMessage, Handshake};
pub use network_listener::NetworkListener;
