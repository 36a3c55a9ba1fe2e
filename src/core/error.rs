//! Error types for the RTR session engine.

use thiserror::Error;

/// Errors that can occur when decoding a PDU.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than the PDU requires.
    #[error("truncated PDU: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Unsupported protocol version.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Unknown PDU type.
    #[error("unknown PDU type: {0}")]
    UnknownType(u8),

    /// The PDU type does not exist in the version it was sent with.
    #[error("PDU type {pdu_type} not valid in protocol version {version}")]
    TypeNotInVersion {
        /// PDU type code.
        pdu_type: u8,
        /// Protocol version of the PDU.
        version: u8,
    },

    /// Length field inconsistent with the PDU type.
    #[error("invalid length {length} for PDU type {pdu_type}")]
    InvalidLength {
        /// PDU type code.
        pdu_type: u8,
        /// Length from the header.
        length: u32,
    },

    /// Length field above the accepted maximum.
    #[error("PDU length {0} exceeds maximum")]
    TooLarge(u32),

    /// Prefix length or max length out of range for the address family.
    #[error("invalid prefix: length {prefix_len}, max length {max_len}")]
    InvalidPrefix {
        /// Prefix length.
        prefix_len: u8,
        /// Maximum length.
        max_len: u8,
    },

    /// Error Report text is not valid UTF-8.
    #[error("error text is not valid UTF-8")]
    InvalidErrorText,
}

/// Errors in session configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An interval is zero.
    #[error("{0} interval must be positive")]
    ZeroInterval(&'static str),

    /// Expire interval shorter than refresh or retry.
    #[error("expire interval must not be shorter than the {0} interval")]
    ExpireTooShort(&'static str),

    /// An interval exceeds its RFC 8210 maximum.
    #[error("{name} interval must not exceed {max_secs} seconds")]
    IntervalTooLong {
        /// Which interval.
        name: &'static str,
        /// Largest accepted value.
        max_secs: u32,
    },

    /// Outbound queue capacity is zero.
    #[error("outbound queue capacity must be positive")]
    ZeroQueueCapacity,
}

/// Top-level session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Transport could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address being connected to.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed data on the wire.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// I/O error on an established transport.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache closed the stream.
    #[error("connection closed by peer")]
    Closed,

    /// The session has been shut down.
    #[error("session disconnected")]
    Disconnected,

    /// Operation not valid in the current connection state.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
