//! RTR session - Core traits, types, and constants.
//!
//! This module provides the foundational types shared by the PDU model, the
//! transport and the session engine. It has minimal dependencies.

mod constants;
mod error;
mod traits;
mod version;

pub use constants::*;
pub use error::*;
pub use traits::*;
pub use version::*;
