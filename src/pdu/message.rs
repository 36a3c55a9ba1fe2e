//! RTR PDU types
//!
//! Implements the PDU formats of RFC 6810 (version 0) and RFC 8210
//! (version 1). All integers are in network byte order.
//!
//! Common header:
//! ```text
//! +0   Protocol Version (1 byte)
//! +1   PDU Type (1 byte)
//! +2   Session ID / Error Code / zero (2 bytes)
//! +4   Length (4 bytes, whole PDU including header)
//! ```

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::core::{
    DecodeError, ProtocolVersion, Versioned, END_OF_DATA_V0_SIZE, END_OF_DATA_V1_SIZE,
    FLAG_ANNOUNCE, IPV4_PREFIX_SIZE, IPV6_PREFIX_SIZE, MAX_PDU_LENGTH, PDU_CACHE_RESET,
    PDU_CACHE_RESPONSE, PDU_END_OF_DATA, PDU_ERROR_REPORT, PDU_HEADER_SIZE, PDU_IPV4_PREFIX,
    PDU_IPV6_PREFIX, PDU_RESET_QUERY, PDU_ROUTER_KEY, PDU_SERIAL_NOTIFY, PDU_SERIAL_QUERY,
    SERIAL_PDU_SIZE, SKI_SIZE,
};

/// Timing parameters carried by a version 1 End of Data PDU, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    /// Refresh interval.
    pub refresh: u32,
    /// Retry interval.
    pub retry: u32,
    /// Expire interval.
    pub expire: u32,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            refresh: crate::core::DEFAULT_REFRESH_INTERVAL.as_secs() as u32,
            retry: crate::core::DEFAULT_RETRY_INTERVAL.as_secs() as u32,
            expire: crate::core::DEFAULT_EXPIRE_INTERVAL.as_secs() as u32,
        }
    }
}

/// IPv4 Prefix payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Prefix {
    /// Announcement (`true`) or withdrawal (`false`).
    pub announce: bool,
    /// Prefix length.
    pub prefix_len: u8,
    /// Maximum length.
    pub max_len: u8,
    /// Prefix address.
    pub prefix: Ipv4Addr,
    /// Origin autonomous system.
    pub asn: u32,
}

/// IPv6 Prefix payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Prefix {
    /// Announcement (`true`) or withdrawal (`false`).
    pub announce: bool,
    /// Prefix length.
    pub prefix_len: u8,
    /// Maximum length.
    pub max_len: u8,
    /// Prefix address.
    pub prefix: Ipv6Addr,
    /// Origin autonomous system.
    pub asn: u32,
}

/// End of Data payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfData {
    /// Cache session id.
    pub session_id: u16,
    /// Serial number of the data just transferred.
    pub serial: u32,
    /// Timing parameters; present on the wire only in version 1.
    pub intervals: Option<Intervals>,
}

/// Router Key payload (version 1 only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterKey {
    /// Announcement (`true`) or withdrawal (`false`).
    pub announce: bool,
    /// Subject Key Identifier.
    pub ski: [u8; SKI_SIZE],
    /// Autonomous system.
    pub asn: u32,
    /// DER-encoded Subject Public Key Info.
    pub spki: Vec<u8>,
}

/// Error Report codes (RFC 8210 section 12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Corrupt Data.
    CorruptData,
    /// Internal Error.
    InternalError,
    /// No Data Available.
    NoDataAvailable,
    /// Invalid Request.
    InvalidRequest,
    /// Unsupported Protocol Version.
    UnsupportedProtocolVersion,
    /// Unsupported PDU Type.
    UnsupportedPduType,
    /// Withdrawal of Unknown Record.
    WithdrawalOfUnknownRecord,
    /// Duplicate Announcement Received.
    DuplicateAnnouncement,
    /// Unexpected Protocol Version.
    UnexpectedProtocolVersion,
    /// Any code not listed above.
    Other(u16),
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        match code {
            0 => Self::CorruptData,
            1 => Self::InternalError,
            2 => Self::NoDataAvailable,
            3 => Self::InvalidRequest,
            4 => Self::UnsupportedProtocolVersion,
            5 => Self::UnsupportedPduType,
            6 => Self::WithdrawalOfUnknownRecord,
            7 => Self::DuplicateAnnouncement,
            8 => Self::UnexpectedProtocolVersion,
            other => Self::Other(other),
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        match code {
            ErrorCode::CorruptData => 0,
            ErrorCode::InternalError => 1,
            ErrorCode::NoDataAvailable => 2,
            ErrorCode::InvalidRequest => 3,
            ErrorCode::UnsupportedProtocolVersion => 4,
            ErrorCode::UnsupportedPduType => 5,
            ErrorCode::WithdrawalOfUnknownRecord => 6,
            ErrorCode::DuplicateAnnouncement => 7,
            ErrorCode::UnexpectedProtocolVersion => 8,
            ErrorCode::Other(other) => other,
        }
    }
}

/// Error Report payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Error code.
    pub code: ErrorCode,
    /// Copy of the erroneous PDU (may be empty).
    pub pdu: Vec<u8>,
    /// Diagnostic text (may be empty).
    pub text: String,
}

/// PDU body, one variant per PDU type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Cache has new data.
    SerialNotify {
        /// Cache session id.
        session_id: u16,
        /// New serial number.
        serial: u32,
    },
    /// Request for changes since `serial`.
    SerialQuery {
        /// Cache session id.
        session_id: u16,
        /// Serial the router already has.
        serial: u32,
    },
    /// Request for the full data set.
    ResetQuery,
    /// Start of a data transfer.
    CacheResponse {
        /// Cache session id.
        session_id: u16,
    },
    /// IPv4 origin record.
    Ipv4Prefix(Ipv4Prefix),
    /// IPv6 origin record.
    Ipv6Prefix(Ipv6Prefix),
    /// End of a data transfer.
    EndOfData(EndOfData),
    /// Cache cannot serve incremental updates.
    CacheReset,
    /// BGPsec router key.
    RouterKey(RouterKey),
    /// Error notification.
    ErrorReport(ErrorReport),
}

impl Message {
    /// PDU type code of this message.
    pub fn pdu_type(&self) -> u8 {
        match self {
            Message::SerialNotify { .. } => PDU_SERIAL_NOTIFY,
            Message::SerialQuery { .. } => PDU_SERIAL_QUERY,
            Message::ResetQuery => PDU_RESET_QUERY,
            Message::CacheResponse { .. } => PDU_CACHE_RESPONSE,
            Message::Ipv4Prefix(_) => PDU_IPV4_PREFIX,
            Message::Ipv6Prefix(_) => PDU_IPV6_PREFIX,
            Message::EndOfData(_) => PDU_END_OF_DATA,
            Message::CacheReset => PDU_CACHE_RESET,
            Message::RouterKey(_) => PDU_ROUTER_KEY,
            Message::ErrorReport(_) => PDU_ERROR_REPORT,
        }
    }
}

/// A single RTR PDU: a message tagged with a protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    version: ProtocolVersion,
    message: Message,
}

impl Versioned for Pdu {
    fn version(&self) -> ProtocolVersion {
        self.version
    }

    fn set_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }
}

impl Pdu {
    /// Create a PDU from a message.
    pub fn new(version: ProtocolVersion, message: Message) -> Self {
        Self { version, message }
    }

    /// Reset Query.
    pub fn reset_query(version: ProtocolVersion) -> Self {
        Self::new(version, Message::ResetQuery)
    }

    /// Serial Query for changes since `serial`.
    pub fn serial_query(version: ProtocolVersion, session_id: u16, serial: u32) -> Self {
        Self::new(version, Message::SerialQuery { session_id, serial })
    }

    /// Error Report.
    pub fn error_report(
        version: ProtocolVersion,
        code: ErrorCode,
        pdu: Vec<u8>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            version,
            Message::ErrorReport(ErrorReport {
                code,
                pdu,
                text: text.into(),
            }),
        )
    }

    /// The message body.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Consume the PDU, returning the message body.
    pub fn into_message(self) -> Message {
        self.message
    }

    /// PDU type code.
    pub fn pdu_type(&self) -> u8 {
        self.message.pdu_type()
    }

    /// Cache session id, for the PDU types that carry one.
    pub fn session_id(&self) -> Option<u16> {
        match &self.message {
            Message::SerialNotify { session_id, .. }
            | Message::SerialQuery { session_id, .. }
            | Message::CacheResponse { session_id } => Some(*session_id),
            Message::EndOfData(eod) => Some(eod.session_id),
            _ => None,
        }
    }

    /// Total wire size.
    pub fn wire_size(&self) -> usize {
        match &self.message {
            Message::SerialNotify { .. } | Message::SerialQuery { .. } => SERIAL_PDU_SIZE,
            Message::ResetQuery | Message::CacheResponse { .. } | Message::CacheReset => {
                PDU_HEADER_SIZE
            }
            Message::Ipv4Prefix(_) => IPV4_PREFIX_SIZE,
            Message::Ipv6Prefix(_) => IPV6_PREFIX_SIZE,
            Message::EndOfData(_) => match self.version {
                ProtocolVersion::V0 => END_OF_DATA_V0_SIZE,
                ProtocolVersion::V1 => END_OF_DATA_V1_SIZE,
            },
            Message::RouterKey(key) => PDU_HEADER_SIZE + SKI_SIZE + 4 + key.spki.len(),
            Message::ErrorReport(report) => {
                PDU_HEADER_SIZE + 4 + report.pdu.len() + 4 + report.text.len()
            }
        }
    }

    /// Encode to wire format.
    pub fn encode(&self) -> Vec<u8> {
        let size = self.wire_size();
        let mut buf = Vec::with_capacity(size);
        buf.push(self.version.as_u8());
        buf.push(self.pdu_type());

        match &self.message {
            Message::SerialNotify { session_id, serial }
            | Message::SerialQuery { session_id, serial } => {
                buf.extend_from_slice(&session_id.to_be_bytes());
                buf.extend_from_slice(&(size as u32).to_be_bytes());
                buf.extend_from_slice(&serial.to_be_bytes());
            }
            Message::ResetQuery | Message::CacheReset => {
                buf.extend_from_slice(&0u16.to_be_bytes());
                buf.extend_from_slice(&(size as u32).to_be_bytes());
            }
            Message::CacheResponse { session_id } => {
                buf.extend_from_slice(&session_id.to_be_bytes());
                buf.extend_from_slice(&(size as u32).to_be_bytes());
            }
            Message::Ipv4Prefix(p) => {
                buf.extend_from_slice(&0u16.to_be_bytes());
                buf.extend_from_slice(&(size as u32).to_be_bytes());
                buf.extend_from_slice(&[flags(p.announce), p.prefix_len, p.max_len, 0]);
                buf.extend_from_slice(&p.prefix.octets());
                buf.extend_from_slice(&p.asn.to_be_bytes());
            }
            Message::Ipv6Prefix(p) => {
                buf.extend_from_slice(&0u16.to_be_bytes());
                buf.extend_from_slice(&(size as u32).to_be_bytes());
                buf.extend_from_slice(&[flags(p.announce), p.prefix_len, p.max_len, 0]);
                buf.extend_from_slice(&p.prefix.octets());
                buf.extend_from_slice(&p.asn.to_be_bytes());
            }
            Message::EndOfData(eod) => {
                buf.extend_from_slice(&eod.session_id.to_be_bytes());
                buf.extend_from_slice(&(size as u32).to_be_bytes());
                buf.extend_from_slice(&eod.serial.to_be_bytes());
                if self.version == ProtocolVersion::V1 {
                    let intervals = eod.intervals.unwrap_or_default();
                    buf.extend_from_slice(&intervals.refresh.to_be_bytes());
                    buf.extend_from_slice(&intervals.retry.to_be_bytes());
                    buf.extend_from_slice(&intervals.expire.to_be_bytes());
                }
            }
            Message::RouterKey(key) => {
                buf.extend_from_slice(&[flags(key.announce), 0]);
                buf.extend_from_slice(&(size as u32).to_be_bytes());
                buf.extend_from_slice(&key.ski);
                buf.extend_from_slice(&key.asn.to_be_bytes());
                buf.extend_from_slice(&key.spki);
            }
            Message::ErrorReport(report) => {
                buf.extend_from_slice(&u16::from(report.code).to_be_bytes());
                buf.extend_from_slice(&(size as u32).to_be_bytes());
                buf.extend_from_slice(&(report.pdu.len() as u32).to_be_bytes());
                buf.extend_from_slice(&report.pdu);
                buf.extend_from_slice(&(report.text.len() as u32).to_be_bytes());
                buf.extend_from_slice(report.text.as_bytes());
            }
        }

        buf
    }

    /// Read the total PDU length from a buffer holding at least the header.
    ///
    /// Returns `Ok(None)` if fewer than [`PDU_HEADER_SIZE`] bytes are
    /// available. Validates the version so framing stops at the first
    /// foreign byte instead of waiting on a bogus length.
    pub fn frame_length(data: &[u8]) -> Result<Option<usize>, DecodeError> {
        if data.len() < PDU_HEADER_SIZE {
            return Ok(None);
        }
        ProtocolVersion::try_from(data[0])?;
        let length = read_u32(data, 4);
        if (length as usize) < PDU_HEADER_SIZE {
            return Err(DecodeError::InvalidLength {
                pdu_type: data[1],
                length,
            });
        }
        if length as usize > MAX_PDU_LENGTH {
            return Err(DecodeError::TooLarge(length));
        }
        Ok(Some(length as usize))
    }

    /// Decode exactly one PDU from `data`.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let length = match Self::frame_length(data)? {
            Some(length) => length,
            None => {
                return Err(DecodeError::Truncated {
                    expected: PDU_HEADER_SIZE,
                    actual: data.len(),
                });
            }
        };
        if data.len() < length {
            return Err(DecodeError::Truncated {
                expected: length,
                actual: data.len(),
            });
        }
        let data = &data[..length];

        let version = ProtocolVersion::try_from(data[0])?;
        let pdu_type = data[1];
        let field = read_u16(data, 2);
        let expect_len = |expected: usize| {
            if length == expected {
                Ok(())
            } else {
                Err(DecodeError::InvalidLength {
                    pdu_type,
                    length: length as u32,
                })
            }
        };

        let message = match pdu_type {
            PDU_SERIAL_NOTIFY => {
                expect_len(SERIAL_PDU_SIZE)?;
                Message::SerialNotify {
                    session_id: field,
                    serial: read_u32(data, 8),
                }
            }
            PDU_SERIAL_QUERY => {
                expect_len(SERIAL_PDU_SIZE)?;
                Message::SerialQuery {
                    session_id: field,
                    serial: read_u32(data, 8),
                }
            }
            PDU_RESET_QUERY => {
                expect_len(PDU_HEADER_SIZE)?;
                Message::ResetQuery
            }
            PDU_CACHE_RESPONSE => {
                expect_len(PDU_HEADER_SIZE)?;
                Message::CacheResponse { session_id: field }
            }
            PDU_IPV4_PREFIX => {
                expect_len(IPV4_PREFIX_SIZE)?;
                let (prefix_len, max_len) = check_prefix(data[9], data[10], 32)?;
                Message::Ipv4Prefix(Ipv4Prefix {
                    announce: data[8] & FLAG_ANNOUNCE != 0,
                    prefix_len,
                    max_len,
                    prefix: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
                    asn: read_u32(data, 16),
                })
            }
            PDU_IPV6_PREFIX => {
                expect_len(IPV6_PREFIX_SIZE)?;
                let (prefix_len, max_len) = check_prefix(data[9], data[10], 128)?;
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&data[12..28]);
                Message::Ipv6Prefix(Ipv6Prefix {
                    announce: data[8] & FLAG_ANNOUNCE != 0,
                    prefix_len,
                    max_len,
                    prefix: Ipv6Addr::from(octets),
                    asn: read_u32(data, 28),
                })
            }
            PDU_END_OF_DATA => {
                let intervals = match version {
                    ProtocolVersion::V0 => {
                        expect_len(END_OF_DATA_V0_SIZE)?;
                        None
                    }
                    ProtocolVersion::V1 => {
                        expect_len(END_OF_DATA_V1_SIZE)?;
                        Some(Intervals {
                            refresh: read_u32(data, 12),
                            retry: read_u32(data, 16),
                            expire: read_u32(data, 20),
                        })
                    }
                };
                Message::EndOfData(EndOfData {
                    session_id: field,
                    serial: read_u32(data, 8),
                    intervals,
                })
            }
            PDU_CACHE_RESET => {
                expect_len(PDU_HEADER_SIZE)?;
                Message::CacheReset
            }
            PDU_ROUTER_KEY => {
                if version == ProtocolVersion::V0 {
                    return Err(DecodeError::TypeNotInVersion {
                        pdu_type,
                        version: version.as_u8(),
                    });
                }
                let fixed = PDU_HEADER_SIZE + SKI_SIZE + 4;
                if length <= fixed {
                    return Err(DecodeError::InvalidLength {
                        pdu_type,
                        length: length as u32,
                    });
                }
                let mut ski = [0u8; SKI_SIZE];
                ski.copy_from_slice(&data[PDU_HEADER_SIZE..PDU_HEADER_SIZE + SKI_SIZE]);
                Message::RouterKey(RouterKey {
                    announce: data[2] & FLAG_ANNOUNCE != 0,
                    ski,
                    asn: read_u32(data, PDU_HEADER_SIZE + SKI_SIZE),
                    spki: data[fixed..].to_vec(),
                })
            }
            PDU_ERROR_REPORT => Message::ErrorReport(decode_error_report(data, field)?),
            other => return Err(DecodeError::UnknownType(other)),
        };

        Ok(Self { version, message })
    }
}

fn decode_error_report(data: &[u8], code: u16) -> Result<ErrorReport, DecodeError> {
    let invalid = || DecodeError::InvalidLength {
        pdu_type: PDU_ERROR_REPORT,
        length: data.len() as u32,
    };

    let mut offset = PDU_HEADER_SIZE;
    if data.len() < offset + 4 {
        return Err(invalid());
    }
    let pdu_len = read_u32(data, offset) as usize;
    offset += 4;
    if data.len() < offset + pdu_len + 4 {
        return Err(invalid());
    }
    let pdu = data[offset..offset + pdu_len].to_vec();
    offset += pdu_len;

    let text_len = read_u32(data, offset) as usize;
    offset += 4;
    if data.len() != offset + text_len {
        return Err(invalid());
    }
    let text = String::from_utf8(data[offset..].to_vec())
        .map_err(|_| DecodeError::InvalidErrorText)?;

    Ok(ErrorReport {
        code: ErrorCode::from(code),
        pdu,
        text,
    })
}

fn check_prefix(prefix_len: u8, max_len: u8, bits: u8) -> Result<(u8, u8), DecodeError> {
    if prefix_len > max_len || max_len > bits {
        return Err(DecodeError::InvalidPrefix {
            prefix_len,
            max_len,
        });
    }
    Ok((prefix_len, max_len))
}

fn flags(announce: bool) -> u8 {
    if announce { FLAG_ANNOUNCE } else { 0 }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_serial_query() {
        let data = hex::decode("010100070000000c0000002a").unwrap();
        let pdu = Pdu::decode(&data).unwrap();

        assert_eq!(pdu.version(), ProtocolVersion::V1);
        assert_eq!(
            pdu.message(),
            &Message::SerialQuery {
                session_id: 7,
                serial: 42
            }
        );
        assert_eq!(pdu.encode(), data);
    }

    #[test]
    fn test_encode_reset_query() {
        let pdu = Pdu::reset_query(ProtocolVersion::V0);
        assert_eq!(hex::encode(pdu.encode()), "0002000000000008");
    }

    #[test]
    fn test_decode_ipv4_prefix() {
        // announce 192.0.2.0/24-24 AS64496
        let mut data = hex::decode("0104000000000014").unwrap();
        data.extend_from_slice(&[0x01, 24, 24, 0]);
        data.extend_from_slice(&[192, 0, 2, 0]);
        data.extend_from_slice(&64496u32.to_be_bytes());

        let pdu = Pdu::decode(&data).unwrap();
        match pdu.message() {
            Message::Ipv4Prefix(p) => {
                assert!(p.announce);
                assert_eq!(p.prefix, Ipv4Addr::new(192, 0, 2, 0));
                assert_eq!(p.prefix_len, 24);
                assert_eq!(p.max_len, 24);
                assert_eq!(p.asn, 64496);
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert_eq!(pdu.encode(), data);
    }

    #[test]
    fn test_decode_ipv6_withdrawal() {
        let mut data = hex::decode("0006000000000020").unwrap();
        data.extend_from_slice(&[0x00, 32, 48, 0]);
        data.extend_from_slice(&"2001:db8::".parse::<Ipv6Addr>().unwrap().octets());
        data.extend_from_slice(&65551u32.to_be_bytes());

        let pdu = Pdu::decode(&data).unwrap();
        assert_eq!(pdu.version(), ProtocolVersion::V0);
        match pdu.message() {
            Message::Ipv6Prefix(p) => {
                assert!(!p.announce);
                assert_eq!(p.max_len, 48);
                assert_eq!(p.asn, 65551);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_end_of_data_versions() {
        let v0 = hex::decode("000700030000000c00000064").unwrap();
        let pdu = Pdu::decode(&v0).unwrap();
        assert_eq!(
            pdu.message(),
            &Message::EndOfData(EndOfData {
                session_id: 3,
                serial: 100,
                intervals: None
            })
        );

        let v1 = hex::decode("010700030000001800000064000000780000003c00000e10").unwrap();
        let pdu = Pdu::decode(&v1).unwrap();
        assert_eq!(
            pdu.message(),
            &Message::EndOfData(EndOfData {
                session_id: 3,
                serial: 100,
                intervals: Some(Intervals {
                    refresh: 120,
                    retry: 60,
                    expire: 3600
                })
            })
        );
        assert_eq!(pdu.encode(), v1);
    }

    #[test]
    fn test_end_of_data_length_must_match_version() {
        // Version 1 header with a version 0 length.
        let data = hex::decode("010700030000000c00000064").unwrap();
        assert_eq!(
            Pdu::decode(&data),
            Err(DecodeError::InvalidLength {
                pdu_type: PDU_END_OF_DATA,
                length: 12
            })
        );
    }

    #[test]
    fn test_router_key_requires_v1() {
        let key = Pdu::new(
            ProtocolVersion::V1,
            Message::RouterKey(RouterKey {
                announce: true,
                ski: [0xab; SKI_SIZE],
                asn: 65000,
                spki: vec![1, 2, 3, 4],
            }),
        );
        let mut data = key.encode();
        assert_eq!(data.len(), PDU_HEADER_SIZE + SKI_SIZE + 4 + 4);
        assert_eq!(Pdu::decode(&data).unwrap(), key);

        data[0] = 0;
        assert_eq!(
            Pdu::decode(&data),
            Err(DecodeError::TypeNotInVersion {
                pdu_type: PDU_ROUTER_KEY,
                version: 0
            })
        );
    }

    #[test]
    fn test_error_report() {
        let offending = Pdu::reset_query(ProtocolVersion::V1).encode();
        let report = Pdu::error_report(
            ProtocolVersion::V1,
            ErrorCode::UnsupportedProtocolVersion,
            offending.clone(),
            "version 1 not supported",
        );
        let data = report.encode();
        assert_eq!(data.len(), report.wire_size());

        let decoded = Pdu::decode(&data).unwrap();
        match decoded.message() {
            Message::ErrorReport(r) => {
                assert_eq!(r.code, ErrorCode::UnsupportedProtocolVersion);
                assert_eq!(r.pdu, offending);
                assert_eq!(r.text, "version 1 not supported");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_error_report_inconsistent_lengths() {
        let mut data = Pdu::error_report(ProtocolVersion::V1, ErrorCode::InternalError, vec![], "x")
            .encode();
        // Claim a longer text than present.
        let text_len_offset = data.len() - 5;
        data[text_len_offset..text_len_offset + 4].copy_from_slice(&9u32.to_be_bytes());
        assert!(matches!(
            Pdu::decode(&data),
            Err(DecodeError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_reject_unknown_version_and_type() {
        let data = hex::decode("0202000000000008").unwrap();
        assert_eq!(Pdu::decode(&data), Err(DecodeError::UnsupportedVersion(2)));

        let data = hex::decode("0105000000000008").unwrap();
        assert_eq!(Pdu::decode(&data), Err(DecodeError::UnknownType(5)));
    }

    #[test]
    fn test_reject_bad_prefix() {
        let mut data = hex::decode("0104000000000014").unwrap();
        data.extend_from_slice(&[0x01, 24, 33, 0, 10, 0, 0, 0]);
        data.extend_from_slice(&1u32.to_be_bytes());
        assert_eq!(
            Pdu::decode(&data),
            Err(DecodeError::InvalidPrefix {
                prefix_len: 24,
                max_len: 33
            })
        );
    }

    #[test]
    fn test_frame_length() {
        assert_eq!(Pdu::frame_length(&[1, 2, 0]), Ok(None));
        assert_eq!(
            Pdu::frame_length(&hex::decode("010300050000000800").unwrap()),
            Ok(Some(8))
        );
        assert_eq!(
            Pdu::frame_length(&hex::decode("0103000500000004").unwrap()),
            Err(DecodeError::InvalidLength {
                pdu_type: PDU_CACHE_RESPONSE,
                length: 4
            })
        );
        assert_eq!(
            Pdu::frame_length(&hex::decode("01030005ffffffff").unwrap()),
            Err(DecodeError::TooLarge(u32::MAX))
        );
    }

    #[test]
    fn test_set_version_changes_end_of_data_layout() {
        let eod = Pdu::new(
            ProtocolVersion::V1,
            Message::EndOfData(EndOfData {
                session_id: 1,
                serial: 2,
                intervals: None,
            }),
        );
        assert_eq!(eod.encode().len(), END_OF_DATA_V1_SIZE);

        let eod = eod.with_version(ProtocolVersion::V0);
        assert_eq!(eod.encode().len(), END_OF_DATA_V0_SIZE);
    }
}
