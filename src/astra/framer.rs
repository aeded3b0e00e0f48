//! # Packet Framer
//!
//! The transport learns how many bytes make up a packet from its first three:
//!
//! | Case | Result |
//! |---|---|
//! | fewer than 3 bytes | `NeedMoreData` |
//! | byte 0 not `C`, `K` or `M` | `UnknownProtocol` error |
//! | length outside 12..=1024 | `InvalidPacketLength` error |
//! | otherwise | `Complete { variant, length }` |
//!
//! The variant found here is passed explicitly to the decode step.
//!
//! [`StreamFramer`] applies the same rule to a byte stream, splitting it into
//! complete packets.

use super::variant::ProtocolVariant;
use crate::constants::{MAX_PACKET_LENGTH, MIN_DECODE_LENGTH, MIN_PACKET_LENGTH};
use crate::error::AstraError;
use bytes::{Bytes, BytesMut};

/// Framing answer for the leading bytes of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketLength {
    /// Total packet length, including header and checksum
    Complete {
        variant: ProtocolVariant,
        length: usize,
    },
    NeedMoreData,
}

/// Determine the variant and total length of the packet starting at `header[0]`.
pub fn packet_length(header: &[u8]) -> Result<PacketLength, AstraError> {
    if header.len() < MIN_PACKET_LENGTH {
        return Ok(PacketLength::NeedMoreData);
    }

    let identifier = header[0];
    let variant = ProtocolVariant::from_identifier(identifier)
        .ok_or(AstraError::UnknownProtocol { identifier })?;

    let length = usize::from(u16::from_be_bytes([header[1], header[2]]));
    if !(MIN_DECODE_LENGTH..=MAX_PACKET_LENGTH).contains(&length) {
        return Err(AstraError::InvalidPacketLength { length });
    }

    Ok(PacketLength::Complete { variant, length })
}

/// Accumulates stream bytes and yields whole packets
#[derive(Debug, Default)]
pub struct StreamFramer {
    buffer: BytesMut,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(MAX_PACKET_LENGTH),
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes waiting for the rest of their packet
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next complete packet, if one is buffered.
    ///
    /// A framing error discards the buffer, since the stream can no longer be
    /// split reliably.
    pub fn next_packet(&mut self) -> Result<Option<(ProtocolVariant, Bytes)>, AstraError> {
        match packet_length(&self.buffer) {
            Ok(PacketLength::Complete { variant, length }) if self.buffer.len() >= length => {
                Ok(Some((variant, self.buffer.split_to(length).freeze())))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                self.buffer.clear();
                Err(e)
            }
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
