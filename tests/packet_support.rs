//! Packet builder shared by the integration tests
//!
//! Encodes reports field by field in wire order, independently of the
//! crate's layout tables, so the decoder is checked against a second
//! description of the formats.

#![allow(dead_code)]

use astra_rs::astra::checksum::crc16;
use astra_rs::{
    DeviceRecord, HandlerConfig, InMemoryDeviceDirectory, MemoryEventSink, ProtocolVariant,
    TrackSession,
};
use std::sync::Arc;

pub const TEST_TAC: u32 = 35_395_108;
pub const TEST_SERIAL: u32 = 123_456;
pub const TEST_MODEM_ID: &str = "35395108123456";
pub const TEST_ACCOUNT: &str = "demo";
pub const TEST_DEVICE: &str = "tracker1";

pub const STATUS_IGNITION_ON: u16 = 0x0001;
pub const STATUS_REPORTS_TO_FOLLOW: u16 = 0x0010;
pub const STATUS_EXTRA_DATA: u16 = 0x0100;

/// Raw field values of one report
#[derive(Debug, Clone, Default)]
pub struct ReportSpec {
    pub sequence: u8,
    pub latitude: i32,
    pub longitude: i32,
    pub gps_time: u32,
    pub speed: u8,
    pub heading: u8,
    pub altitude: u8,
    pub reason: u32,
    pub status: u16,
    pub geofence: u8,
    pub digitals: u32,
    pub digital_changes: u8,
    pub adc1: u8,
    pub adc2: u8,
    pub battery: u8,
    pub ext_power: u8,
    pub max_speed: u8,
    pub accel: [u8; 6],
    pub distance: u16,
    pub idle: u16,
    pub signal: u8,
    /// Written only when `status` carries the extra data bit
    pub odometer: u32,
}

impl ReportSpec {
    pub fn with_reason(reason: u32) -> Self {
        Self {
            reason,
            ..Self::default()
        }
    }

    /// Encode the report for `variant`.
    pub fn encode(&self, variant: ProtocolVariant) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.sequence);
        out.extend_from_slice(&self.latitude.to_be_bytes());
        out.extend_from_slice(&self.longitude.to_be_bytes());
        out.extend_from_slice(&self.gps_time.to_be_bytes());
        out.push(self.speed);
        out.push(self.heading);

        match variant {
            ProtocolVariant::C => {
                out.push(self.altitude);
                out.extend_from_slice(&(self.reason as u16).to_be_bytes());
                out.push(self.status as u8);
                out.push(self.geofence);
                out.push(self.digitals as u8);
                out.push(self.digital_changes);
                out.push(self.adc2);
                out.push(self.adc1);
                out.push(self.battery);
                out.push(self.ext_power);
                out.push(self.max_speed);
                out.extend_from_slice(&self.accel[..2]);
                out.extend_from_slice(&self.distance.to_be_bytes());
                out.extend_from_slice(&self.idle.to_be_bytes());
                assert_eq!(out.len(), 33);
            }
            ProtocolVariant::K | ProtocolVariant::M => {
                out.extend_from_slice(&self.reason.to_be_bytes()[1..]);
                out.extend_from_slice(&self.status.to_be_bytes());
                if variant == ProtocolVariant::K {
                    out.push(self.digitals as u8);
                    out.push(self.adc1);
                } else {
                    out.extend_from_slice(&self.digitals.to_le_bytes()[..3]);
                    out.push(self.adc1);
                    out.push(self.adc2);
                }
                out.push(self.battery);
                out.push(self.ext_power);
                out.push(self.max_speed);
                out.extend_from_slice(&self.accel);
                out.extend_from_slice(&self.distance.to_be_bytes());
                out.extend_from_slice(&self.idle.to_be_bytes());
                out.push(self.altitude);
                out.push(self.signal);
                out.push(self.geofence);

                let (basic, start_stop, odometer_at) = if variant == ProtocolVariant::K {
                    (38, 50, 45)
                } else {
                    (41, 53, 48)
                };
                assert_eq!(out.len(), basic);
                if self.status & STATUS_EXTRA_DATA != 0 {
                    out.resize(start_stop, 0);
                    out[odometer_at..odometer_at + 3]
                        .copy_from_slice(&self.odometer.to_be_bytes()[1..]);
                }
            }
        }
        out
    }
}

/// Wrap encoded reports in a header and checksum.
pub fn build_packet(variant: ProtocolVariant, tac: u32, serial: u32, reports: &[Vec<u8>]) -> Vec<u8> {
    let mut packet = vec![variant.identifier(), 0x00, 0x00];
    packet.extend_from_slice(&tac.to_be_bytes());
    packet.extend_from_slice(&serial.to_be_bytes()[1..]);
    for report in reports {
        packet.extend_from_slice(report);
    }
    let total = (packet.len() + 2) as u16;
    packet[1..3].copy_from_slice(&total.to_be_bytes());
    let crc = crc16(&packet);
    packet.extend_from_slice(&crc.to_be_bytes());
    packet
}

/// Packet for the test device with the follow bit set on all but the last report.
pub fn chained_packet(variant: ProtocolVariant, specs: &[ReportSpec]) -> Vec<u8> {
    let reports: Vec<Vec<u8>> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let mut spec = spec.clone();
            if i + 1 < specs.len() {
                spec.status |= STATUS_REPORTS_TO_FOLLOW;
            } else {
                spec.status &= !STATUS_REPORTS_TO_FOLLOW;
            }
            spec.encode(variant)
        })
        .collect();
    build_packet(variant, TEST_TAC, TEST_SERIAL, &reports)
}

/// Recompute the trailing checksum after editing a packet.
pub fn reseal(packet: &mut [u8]) {
    let len = packet.len();
    let crc = crc16(&packet[..len - 2]);
    packet[len - 2..].copy_from_slice(&crc.to_be_bytes());
}

pub fn test_device() -> DeviceRecord {
    DeviceRecord::new(TEST_ACCOUNT, TEST_DEVICE, &format!("astra_{TEST_MODEM_ID}"))
}

pub fn test_directory() -> InMemoryDeviceDirectory {
    InMemoryDeviceDirectory::with_devices([test_device()])
}

/// Session over the test device with an observable sink and directory
pub fn test_session(
    config: HandlerConfig,
) -> (TrackSession, MemoryEventSink, InMemoryDeviceDirectory) {
    let directory = test_directory();
    let sink = MemoryEventSink::new();
    let session = TrackSession::new(
        Arc::new(config),
        Arc::new(directory.clone()),
        Arc::new(sink.clone()),
    );
    (session, sink, directory)
}
