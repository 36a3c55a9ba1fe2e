//! Protocol constants from RFC 6810 and RFC 8210.
//!
//! These values are fixed by the protocol and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// PROTOCOL VERSIONS (RFC 6810, RFC 8210)
// =============================================================================

/// Protocol version 0 (RFC 6810).
pub const PROTOCOL_VERSION_0: u8 = 0;

/// Protocol version 1 (RFC 8210).
pub const PROTOCOL_VERSION_1: u8 = 1;

// =============================================================================
// PDU TYPES (RFC 8210 section 5)
// =============================================================================

/// Serial Notify (cache -> router).
pub const PDU_SERIAL_NOTIFY: u8 = 0;

/// Serial Query (router -> cache).
pub const PDU_SERIAL_QUERY: u8 = 1;

/// Reset Query (router -> cache).
pub const PDU_RESET_QUERY: u8 = 2;

/// Cache Response (cache -> router).
pub const PDU_CACHE_RESPONSE: u8 = 3;

/// IPv4 Prefix (cache -> router).
pub const PDU_IPV4_PREFIX: u8 = 4;

/// IPv6 Prefix (cache -> router).
pub const PDU_IPV6_PREFIX: u8 = 6;

/// End of Data (cache -> router).
pub const PDU_END_OF_DATA: u8 = 7;

/// Cache Reset (cache -> router).
pub const PDU_CACHE_RESET: u8 = 8;

/// Router Key (cache -> router, version 1 only).
pub const PDU_ROUTER_KEY: u8 = 9;

/// Error Report (both directions).
pub const PDU_ERROR_REPORT: u8 = 10;

// =============================================================================
// PDU SIZES
// =============================================================================

/// Common header size (version + type + session/field + length).
pub const PDU_HEADER_SIZE: usize = 8;

/// Serial Notify and Serial Query size.
pub const SERIAL_PDU_SIZE: usize = 12;

/// IPv4 Prefix size.
pub const IPV4_PREFIX_SIZE: usize = 20;

/// IPv6 Prefix size.
pub const IPV6_PREFIX_SIZE: usize = 32;

/// End of Data size in version 0.
pub const END_OF_DATA_V0_SIZE: usize = 12;

/// End of Data size in version 1 (adds the three timing intervals).
pub const END_OF_DATA_V1_SIZE: usize = 24;

/// Subject Key Identifier size in a Router Key PDU.
pub const SKI_SIZE: usize = 20;

/// Upper bound accepted for any single PDU on the wire.
pub const MAX_PDU_LENGTH: usize = 65_536;

// =============================================================================
// PREFIX FLAGS
// =============================================================================

/// Prefix flag: announcement (withdrawal when clear).
pub const FLAG_ANNOUNCE: u8 = 0x01;

// =============================================================================
// TIMING DEFAULTS AND RANGES (RFC 8210 section 6)
// =============================================================================

/// Default refresh interval.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Default retry interval.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(600);

/// Default expire interval.
pub const DEFAULT_EXPIRE_INTERVAL: Duration = Duration::from_secs(7200);

/// Accepted refresh interval range advertised by a cache, in seconds.
pub const REFRESH_RANGE_SECS: (u32, u32) = (1, 86_400);

/// Accepted retry interval range advertised by a cache, in seconds.
pub const RETRY_RANGE_SECS: (u32, u32) = (1, 7_200);

/// Accepted expire interval range advertised by a cache, in seconds.
pub const EXPIRE_RANGE_SECS: (u32, u32) = (600, 172_800);

// =============================================================================
// SESSION
// =============================================================================

/// Default capacity of the outbound PDU queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Upper bound on a graceful transport shutdown at teardown.
pub const TRANSPORT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);
