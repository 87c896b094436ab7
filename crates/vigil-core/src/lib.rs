//! Core shared types and utilities for vigil
//!
//! This crate contains the wire protocol codec, protocol configuration and
//! the datagram transport seam used by both the coordinator and agent
//! binaries.

pub mod config;
pub mod protocol;
pub mod transport;

// Re-export commonly used items
pub use config::ProtocolConfig;
pub use protocol::{DecodeError, Message, MAX_DATAGRAM};
pub use transport::{Transport, TransportError, UdpTransport};
