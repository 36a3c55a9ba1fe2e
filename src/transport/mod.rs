//! RTR session - Transport Layer
//!
//! This module provides everything between the session engine and the
//! socket:
//!
//! - **Framing**: [`RtrCodec`] splits the byte stream into [`Pdu`]s
//! - **Connection state**: [`ConnectionState`] and the atomically
//!   transitioned [`ConnectionStateCell`]
//! - **Streams**: [`connect`] for plain TCP or TLS, erased to [`BoxedStream`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Session Engine               │
//! ├─────────────────────────────────────────┤
//! │         Transport Layer                 │  ← This module
//! │   framing, connection state, streams    │
//! ├─────────────────────────────────────────┤
//! │            TLS (optional)               │
//! ├─────────────────────────────────────────┤
//! │              TCP                        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! [`Pdu`]: crate::pdu::Pdu

mod codec;
mod connection;
mod stream;

pub use codec::*;
pub use connection::*;
pub use stream::*;
