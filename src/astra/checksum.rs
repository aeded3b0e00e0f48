//! # Packet Checksum
//!
//! Astra packets end in a big-endian CRC-16 computed over every preceding byte.
//! The CRC is reflected, table driven, starts at `0xFFFF` and has no final XOR:
//!
//! ```text
//! crc = (crc >> 8) ^ CRC16_TABLE[(crc ^ byte) & 0xFF]
//! ```
//!
//! The table is the reflected form of polynomial 0x8005 (0xA001), so the
//! parameters match the catalogued CRC-16/MODBUS.

use crate::constants::CHECKSUM_LEN;
use crate::error::AstraError;

const CRC_POLY_REFLECTED: u16 = 0xA001;

/// Initial register value
pub const CRC_INIT: u16 = 0xFFFF;

/// Byte-at-a-time lookup table
pub const CRC16_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC_POLY_REFLECTED
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-16 over all of `data`
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(CRC_INIT, |crc, &byte| {
        (crc >> 8) ^ CRC16_TABLE[usize::from((crc ^ u16::from(byte)) & 0x00FF)]
    })
}

/// CRC-16 over a packet, excluding its trailing checksum field
pub fn packet_checksum(packet: &[u8]) -> u16 {
    crc16(&packet[..packet.len().saturating_sub(CHECKSUM_LEN)])
}

/// The big-endian checksum stored in the last two bytes
pub fn stored_checksum(packet: &[u8]) -> Option<u16> {
    match packet {
        [.., hi, lo] if packet.len() >= CHECKSUM_LEN => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

/// Verifies the integrity of a complete packet.
pub fn verify_packet(packet: &[u8]) -> Result<u16, AstraError> {
    let expected = stored_checksum(packet).ok_or(AstraError::MalformedReport {
        offset: 0,
        needed: CHECKSUM_LEN,
        available: packet.len(),
    })?;
    let calculated = packet_checksum(packet);
    if expected != calculated {
        return Err(AstraError::ChecksumMismatch {
            expected,
            calculated,
        });
    }
    Ok(calculated)
}

/// Append the checksum of `payload` to it, producing a complete packet body.
pub fn append_checksum(payload: &mut Vec<u8>) {
    let crc = crc16(payload);
    payload.extend_from_slice(&crc.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_entries() {
        assert_eq!(CRC16_TABLE.len(), 256);
        assert_eq!(CRC16_TABLE[0x00], 0x0000);
        assert_eq!(CRC16_TABLE[0x01], 0xC0C1);
        assert_eq!(CRC16_TABLE[0x02], 0xC181);
        assert_eq!(CRC16_TABLE[0x80], 0xA001);
        assert_eq!(CRC16_TABLE[0xFF], 0x4040);
    }

    #[test]
    fn test_empty_payload_is_initial_value() {
        assert_eq!(crc16(&[]), 0xFFFF);
        assert_eq!(packet_checksum(&[0x12, 0x34]), 0xFFFF);
    }

    #[test]
    fn test_check_value() {
        assert_eq!(crc16(b"123456789"), 0x4B37);
    }

    #[test]
    fn test_verify_packet() {
        let mut packet = vec![0x4B, 0x00, 0x05];
        append_checksum(&mut packet);
        assert_eq!(packet.len(), 5);
        assert!(verify_packet(&packet).is_ok());

        let last = packet.len() - 1;
        packet[last] ^= 0x01;
        assert!(matches!(
            verify_packet(&packet),
            Err(AstraError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_stored_checksum_needs_two_bytes() {
        assert_eq!(stored_checksum(&[0x01]), None);
        assert_eq!(stored_checksum(&[0xAB, 0xCD]), Some(0xABCD));
        assert!(verify_packet(&[0x01]).is_err());
    }
}
