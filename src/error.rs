//! # Astra Error Handling
//!
//! This module defines the AstraError enum, which represents the different error
//! types that can occur while framing and decoding Astra tracker packets.

use crate::astra::variant::ProtocolVariant;
use crate::util::field_reader::FieldReaderError;
use crate::util::hex::HexError;
use thiserror::Error;

/// Represents the different error types that can occur in the astra-rs crate.
#[derive(Debug, Error)]
pub enum AstraError {
    /// The leading byte is not one of the known protocol identifiers.
    #[error("Unknown protocol identifier: 0x{identifier:02X}")]
    UnknownProtocol { identifier: u8 },

    /// A known identifier that differs from the variant the packet was framed as.
    #[error("Variant mismatch: framed as {framed}, packet is {found}")]
    VariantMismatch {
        framed: ProtocolVariant,
        found: ProtocolVariant,
    },

    /// The embedded packet length cannot describe a valid packet.
    #[error("Invalid packet length: {length}")]
    InvalidPacketLength { length: usize },

    /// Not enough bytes to read the identifier and the length field.
    #[error("Incomplete packet header: {available} bytes available")]
    IncompleteHeader { available: usize },

    /// The trailing CRC does not match the calculated one.
    #[error("Invalid checksum: expected {expected:04X}, calculated {calculated:04X}")]
    ChecksumMismatch { expected: u16, calculated: u16 },

    /// No device resolves for the modem id under any configured prefix.
    #[error("Device not found: {modem_id} [{}]", .prefixes.join(","))]
    DeviceNotFound {
        modem_id: String,
        prefixes: Vec<String>,
    },

    /// The device resolved but its account or the device itself is disabled.
    #[error("Account/Device is inactive: {account_id}/{device_id}")]
    DeviceInactive {
        account_id: String,
        device_id: String,
    },

    /// A report does not fit in the bytes remaining before the checksum.
    #[error("Malformed report at offset {offset}: need {needed} bytes, {available} available")]
    MalformedReport {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The embedded length field disagrees with the packet size.
    #[error("Packet length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Field read error: {0}")]
    Field(#[from] FieldReaderError),

    /// The event sink rejected an event.
    #[error("Event emit failed: {0}")]
    EmitFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid hexadecimal string: {0}")]
    InvalidHex(String),
}

impl AstraError {
    /// True for errors raised while sizing a packet, before a full decode.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            AstraError::UnknownProtocol { .. }
                | AstraError::InvalidPacketLength { .. }
                | AstraError::IncompleteHeader { .. }
        )
    }
}

impl From<HexError> for AstraError {
    fn from(error: HexError) -> Self {
        AstraError::InvalidHex(error.to_string())
    }
}
