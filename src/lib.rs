//! # rtr-session
//!
//! Client side of the **RPKI-to-Router** protocol (RFC 6810 version 0,
//! RFC 8210 version 1). A router uses it to keep its route origin
//! validation data synchronized with an RPKI cache:
//!
//! - **Lifecycle**: connect over TCP or TLS, run, disconnect exactly once
//! - **Concurrency**: a transmit task and a receive loop per session, joined
//!   by a bounded outbound queue
//! - **Versioning**: start at version 1 and fall back to version 0 once if
//!   the cache answers with it
//! - **Timers**: refresh, retry and expire per RFC 8210 section 6
//!
//! ## Feature Flags
//!
//! - `transport`: PDU framing codec and TCP streams
//! - `tls` (default): TLS-wrapped transport via rustls
//! - `client` (default): session engine, sync state and supervisor
//!
//! ## Modules
//!
//! - [`core`]: constants, error types and the version model (always included)
//! - [`pdu`]: RTR PDUs and their wire format (always included)
//! - [`transport`]: framing, connection state and streams (requires `transport`)
//! - [`sync`]: serial and timer state (requires `client`)
//! - [`client`]: the session engine (requires `client`)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rtr_session::prelude::*;
//!
//! struct Vrps;
//!
//! impl SessionEventHandler for Vrps {
//!     async fn handle_pdu(&self, _session: &ClientSession<Self>, pdu: Pdu) {
//!         if let Message::Ipv4Prefix(prefix) = pdu.message() {
//!             println!("{}/{} AS{}", prefix.prefix, prefix.prefix_len, prefix.asn);
//!         }
//!     }
//!
//!     async fn client_connected(&self, session: &ClientSession<Self>) {
//!         let _ = session.send_sync_query().await;
//!     }
//! }
//!
//! # async fn run() -> Result<(), SessionError> {
//! let config = ClientConfig::builder().build()?;
//! let session = ClientSession::new(config, Vrps);
//! session.start("rpki.example.net:323", &Security::Plain).await
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// PDU model (always included)
pub mod pdu;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Sync layer (feature-gated)
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod sync;

// Client API (feature-gated)
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core traits and types
    pub use crate::core::*;

    // PDU model
    pub use crate::pdu::*;

    // Transport types (when enabled)
    #[cfg(feature = "transport")]
    pub use crate::transport::{ConnectionState, RtrCodec, Security};

    #[cfg(feature = "tls")]
    pub use crate::transport::TlsSettings;

    // Session engine (when enabled)
    #[cfg(feature = "client")]
    pub use crate::client::*;

    #[cfg(feature = "client")]
    pub use crate::sync::{SerialState, SyncQuery, SyncSnapshot, TimerConfig};
}

// Re-export commonly used items at crate root
pub use crate::core::{ConfigError, DecodeError, ProtocolVersion, SessionError, Versioned};
pub use crate::pdu::{Message, Pdu};

#[cfg(feature = "transport")]
pub use crate::transport::{ConnectionState, Security};

#[cfg(feature = "client")]
pub use crate::client::{ClientConfig, ClientSession, SessionEventHandler, SessionSupervisor};
