//! RTR session - Client Library
//!
//! The session engine, its configuration, the event handler seam and a
//! reconnecting supervisor.

mod config;
mod handler;
mod session;
mod supervisor;

pub use config::*;
pub use handler::*;
pub use session::*;
pub use supervisor::*;
