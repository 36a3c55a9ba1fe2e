//! RTR session - Sync Layer
//!
//! Implements:
//! - Serial tracking, advanced only by End of Data
//! - The refresh/retry/expire timer model of RFC 8210 section 6
//! - Selection between Serial Query and Reset Query

mod state;
mod timers;

pub use state::*;
pub use timers::*;
