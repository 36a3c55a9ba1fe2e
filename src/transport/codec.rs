//! Stream framing for RTR PDUs.
//!
//! RTR runs over a byte stream, so PDUs are delimited by the length field
//! of their common header. [`RtrCodec`] buffers partial input, which makes
//! a `FramedRead<_, RtrCodec>` safe to poll from `tokio::select!`.

use bytes::BytesMut;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::core::{DecodeError, SessionError, PDU_HEADER_SIZE};
use crate::pdu::Pdu;

/// Errors from the framing codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// I/O error on the underlying stream.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed PDU.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl From<CodecError> for SessionError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(err) => SessionError::Io(err),
            CodecError::Decode(err) => SessionError::Decode(err),
        }
    }
}

/// Length-delimited RTR PDU codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct RtrCodec;

impl RtrCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for RtrCodec {
    type Item = Pdu;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Pdu>, CodecError> {
        let Some(length) = Pdu::frame_length(&src[..])? else {
            src.reserve(PDU_HEADER_SIZE - src.len());
            return Ok(None);
        };

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let frame = src.split_to(length);
        Ok(Some(Pdu::decode(&frame)?))
    }
}

impl Encoder<Pdu> for RtrCodec {
    type Error = CodecError;

    fn encode(&mut self, pdu: Pdu, dst: &mut BytesMut) -> Result<(), CodecError> {
        dst.reserve(pdu.wire_size());
        dst.extend_from_slice(&pdu.encode());
        Ok(())
    }
}
