//! Tests for the packet CRC-16
//!
//! Cross-checks the table-driven implementation against the `crc` crate's
//! catalogued CRC-16/MODBUS and against packets built by the test support.

mod packet_support;

use astra_rs::astra::checksum::{
    append_checksum, crc16, packet_checksum, stored_checksum, verify_packet, CRC16_TABLE,
};
use astra_rs::{AstraError, ProtocolVariant};
use crc::{Crc, CRC_16_MODBUS};
use packet_support::*;
use proptest::prelude::*;

const MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

#[test]
fn test_table_has_256_entries() {
    assert_eq!(CRC16_TABLE.len(), 256);
    assert_eq!(&CRC16_TABLE[..4], &[0x0000, 0xC0C1, 0xC181, 0x0140]);
}

#[test]
fn test_empty_payload() {
    assert_eq!(crc16(&[]), 0xFFFF);
}

#[test]
fn test_catalogue_check_value() {
    assert_eq!(crc16(b"123456789"), MODBUS.checksum(b"123456789"));
    assert_eq!(crc16(b"123456789"), 0x4B37);
}

/// The checksum covers every byte except the trailing two
#[test]
fn test_packet_checksum_excludes_trailer() {
    let packet = chained_packet(ProtocolVariant::K, &[ReportSpec::default()]);
    let body = &packet[..packet.len() - 2];
    assert_eq!(packet_checksum(&packet), crc16(body));
    assert_eq!(stored_checksum(&packet), Some(crc16(body)));
    assert!(verify_packet(&packet).is_ok());
}

/// The stored checksum is big-endian
#[test]
fn test_stored_checksum_is_big_endian() {
    let mut payload = b"K\x00\x05".to_vec();
    let crc = crc16(&payload);
    append_checksum(&mut payload);
    assert_eq!(payload[3], (crc >> 8) as u8);
    assert_eq!(payload[4], (crc & 0xFF) as u8);
}

#[test]
fn test_mismatch_reports_both_values() {
    let mut packet = chained_packet(ProtocolVariant::C, &[ReportSpec::default()]);
    let good = stored_checksum(&packet).unwrap();
    let len = packet.len();
    packet[len - 2..].copy_from_slice(&(good ^ 0x1234).to_be_bytes());

    match verify_packet(&packet) {
        Err(AstraError::ChecksumMismatch {
            expected,
            calculated,
        }) => {
            assert_eq!(expected, good ^ 0x1234);
            assert_eq!(calculated, good);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

/// Reseal fixes a packet after its body was edited
#[test]
fn test_body_edit_breaks_checksum() {
    let mut packet = chained_packet(ProtocolVariant::M, &[ReportSpec::default()]);
    packet[20] ^= 0x40;
    assert!(verify_packet(&packet).is_err());
    reseal(&mut packet);
    assert!(verify_packet(&packet).is_ok());
}

proptest! {
    /// Same input, same checksum, equal to the catalogued algorithm
    #[test]
    fn prop_matches_modbus(data in prop::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(crc16(&data), crc16(&data));
        prop_assert_eq!(crc16(&data), MODBUS.checksum(&data));
    }

    /// Flipping any body bit is detected
    #[test]
    fn prop_single_bit_flip_detected(
        data in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut packet = data.clone();
        append_checksum(&mut packet);
        let at = index.index(data.len());
        packet[at] ^= 1 << bit;
        prop_assert!(verify_packet(&packet).is_err());
    }
}
