//! RTR PDU model
//!
//! Typed representation of every PDU defined by RFC 6810 and RFC 8210,
//! together with its wire encoding. Stream framing lives in
//! [`crate::transport::RtrCodec`].

mod message;

pub use message::*;
