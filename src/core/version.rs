//! RTR protocol versions.

use std::fmt;

use super::constants::{PROTOCOL_VERSION_0, PROTOCOL_VERSION_1};
use super::error::DecodeError;

/// RTR protocol version.
///
/// Ordered so that `V0 < V1`; a session may only ever move downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum ProtocolVersion {
    /// RFC 6810.
    V0 = PROTOCOL_VERSION_0,
    /// RFC 8210.
    #[default]
    V1 = PROTOCOL_VERSION_1,
}

impl ProtocolVersion {
    /// Wire value of this version.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            PROTOCOL_VERSION_0 => Ok(Self::V0),
            PROTOCOL_VERSION_1 => Ok(Self::V1),
            other => Err(DecodeError::UnsupportedVersion(other)),
        }
    }
}

impl From<ProtocolVersion> for u8 {
    fn from(version: ProtocolVersion) -> u8 {
        version.as_u8()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
