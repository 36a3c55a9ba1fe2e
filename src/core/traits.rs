//! Core traits for the RTR session engine.

use super::version::ProtocolVersion;

/// Per-message protocol version tagging.
///
/// Every RTR PDU carries the protocol version it was produced with. The
/// session stamps its negotiated version onto outgoing messages and reads
/// the version of incoming ones to detect a cache running an older protocol.
///
/// # Example
///
/// ```ignore
/// let mut pdu = Pdu::reset_query(ProtocolVersion::V1);
/// pdu.set_version(ProtocolVersion::V0);
/// assert_eq!(pdu.version(), ProtocolVersion::V0);
/// ```
pub trait Versioned {
    /// Protocol version this message is tagged with.
    fn version(&self) -> ProtocolVersion;

    /// Re-tag the message with another protocol version.
    fn set_version(&mut self, version: ProtocolVersion);

    /// Builder-style variant of [`Versioned::set_version`].
    fn with_version(mut self, version: ProtocolVersion) -> Self
    where
        Self: Sized,
    {
        self.set_version(version);
        self
    }
}
