//! # Packet Decoder
//!
//! Turns one complete packet into the sending device and its reports.
//!
//! ```text
//! +----+--------+---------+--------+-----------+-----+-----------+-------+
//! | id | length | TAC (4) | serial | report 1  | ... | report n  | CRC16 |
//! +----+--------+---------+--------+-----------+-----+-----------+-------+
//!   0     1-2      3-6      7-9     10 ..                         len-2
//! ```
//!
//! Decoding is all-or-nothing: a checksum mismatch, an unknown device or a
//! report that runs into the checksum rejects the whole packet and no report
//! is returned.
//!
//! Reports are chained through the "reports to follow" status bit. After a
//! report with the bit set the cursor moves past it (38 or 50 bytes for K,
//! depending on the extra data bit) and the loop continues while more than the
//! two checksum bytes remain.

use super::checksum::verify_packet;
use super::report::{GeoPoint, NormalizedReport, RawReport};
use super::variant::ProtocolVariant;
use crate::config::HandlerConfig;
use crate::constants::*;
use crate::device::{resolve_device, DeviceDirectory, DeviceRecord};
use crate::error::AstraError;
use crate::util::field_reader::{Endian, FieldReader};
use bytes::Bytes;
use log::{debug, info, warn};

/// Result of a successful decode
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPacket {
    pub variant: ProtocolVariant,
    /// TAC and serial as decimal strings, concatenated
    pub modem_id: String,
    pub device: DeviceRecord,
    pub reports: Vec<NormalizedReport>,
}

impl DecodedPacket {
    /// Acknowledgement to write back to the device
    pub fn ack(&self) -> Bytes {
        Bytes::from_static(&[ACK])
    }
}

/// Read the declared total length of a packet.
pub fn declared_length(packet: &[u8]) -> Result<usize, AstraError> {
    let mut reader = FieldReader::new(packet, PACKET_LENGTH_OFFSET, 2)
        .map_err(|_| AstraError::IncompleteHeader {
            available: packet.len(),
        })?;
    Ok(reader.read_uint(2, Endian::Big)? as usize)
}

/// Build the modem id from the TAC and serial fields.
///
/// Both are printed as plain decimal numbers without padding.
pub fn read_modem_id(packet: &[u8]) -> Result<String, AstraError> {
    let mut reader = FieldReader::new(packet, DEVICE_ID_OFFSET, DEVICE_ID_LEN)?;
    let tac = reader.read_ulong(4, Endian::Big)?;
    let serial = reader.read_uint(3, Endian::Big)?;
    Ok(format!("{tac}{serial}"))
}

/// Check the identifier byte and embedded length against the buffer.
pub fn check_header(variant: ProtocolVariant, packet: &[u8]) -> Result<(), AstraError> {
    let identifier = *packet.first().ok_or(AstraError::IncompleteHeader { available: 0 })?;
    if identifier != variant.identifier() {
        return Err(match ProtocolVariant::from_identifier(identifier) {
            Some(found) => AstraError::VariantMismatch {
                framed: variant,
                found,
            },
            None => AstraError::UnknownProtocol { identifier },
        });
    }
    if packet.len() < MIN_DECODE_LENGTH || packet.len() > MAX_PACKET_LENGTH {
        return Err(AstraError::InvalidPacketLength {
            length: packet.len(),
        });
    }
    let declared = declared_length(packet)?;
    if declared != packet.len() {
        return Err(AstraError::LengthMismatch {
            declared,
            actual: packet.len(),
        });
    }
    Ok(())
}

/// Decode every report of a checked packet, in wire order.
pub fn decode_reports(
    variant: ProtocolVariant,
    packet: &[u8],
    include_raw_data: bool,
) -> Result<Vec<NormalizedReport>, AstraError> {
    let layout = variant.layout();
    let mut reports = Vec::new();
    let mut index = FIRST_REPORT_OFFSET;

    loop {
        let (raw, report_len) = RawReport::read(layout, packet, index)?;
        let report = NormalizedReport::from_raw(layout, &raw, include_raw_data);
        let more = report.reports_to_follow();
        debug!(
            "{variant} report #{} at offset {index}: {} bytes, more={more}",
            report.sequence, report_len
        );
        reports.push(report);

        if !more {
            break;
        }
        index += report_len;
        if packet.len().saturating_sub(index) <= CHECKSUM_LEN {
            break;
        }
    }
    Ok(reports)
}

/// Running odometer carried across the reports of a device
#[derive(Debug, Clone, Copy)]
struct OdometerTrack {
    odometer_km: f64,
    point: Option<GeoPoint>,
}

impl OdometerTrack {
    fn for_device(device: &DeviceRecord) -> Self {
        Self {
            odometer_km: device.last_odometer_km,
            point: device.last_point.filter(|p| p.is_valid() && !p.is_origin()),
        }
    }

    fn apply(&mut self, report: &mut NormalizedReport, estimate: bool) {
        let has_fix = report.point.is_valid() && !report.point.is_origin();

        if report.odometer_km > 0.0 {
            self.odometer_km = report.odometer_km;
            if has_fix {
                self.point = Some(report.point);
            }
            return;
        }
        if !estimate {
            return;
        }
        if has_fix {
            if let Some(last) = self.point {
                self.odometer_km += last.kilometers_to(&report.point);
            }
            self.point = Some(report.point);
        }
        report.odometer_km = self.odometer_km;
    }
}

/// Packet decoder bound to a configuration and a device directory
pub struct PacketDecoder<'a> {
    config: &'a HandlerConfig,
    directory: &'a dyn DeviceDirectory,
}

impl<'a> PacketDecoder<'a> {
    pub fn new(config: &'a HandlerConfig, directory: &'a dyn DeviceDirectory) -> Self {
        Self { config, directory }
    }

    /// Decode a complete packet framed as `variant`.
    pub fn decode(
        &self,
        variant: ProtocolVariant,
        packet: &[u8],
    ) -> Result<DecodedPacket, AstraError> {
        check_header(variant, packet)?;
        verify_packet(packet)?;

        let modem_id = read_modem_id(packet)?;
        info!("{variant} modem id: {modem_id}");

        let device = resolve_device(self.directory, &self.config.unique_id_prefixes, &modem_id)?;
        let mut reports = decode_reports(variant, packet, self.config.include_raw_data)?;

        let mut odometer = OdometerTrack::for_device(&device);
        for report in reports.iter_mut() {
            self.adjust(report);
            odometer.apply(report, self.config.estimate_odometer);
            if self.config.debug_mode {
                log_report(report);
            }
        }

        Ok(DecodedPacket {
            variant,
            modem_id,
            device,
            reports,
        })
    }

    fn adjust(&self, report: &mut NormalizedReport) {
        if !report.point.is_valid() {
            warn!(
                "Invalid lat/lon: {}/{} (seq {})",
                report.point.latitude, report.point.longitude, report.sequence
            );
            report.point = GeoPoint::default();
        }
        if report.speed_kph < self.config.minimum_speed_kph {
            report.speed_kph = 0.0;
            report.heading_deg = 0.0;
        }
    }
}

fn log_report(report: &NormalizedReport) {
    info!("Seq Num: {}", report.sequence);
    info!("GPS: {}", report.point);
    info!("Time: {}", report.fix_time);
    info!("Speed: {:?}", report.speed_kph);
    info!("Heading: {:?}", report.heading_deg);
    info!("Journey Dist: {:?}", report.distance_km);
    info!("Altitude: {:?}", report.altitude_m);
    info!("Odometer: {:?}", report.odometer_km);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astra::checksum::append_checksum;

    fn packet_with_identity(tac: u32, serial: u32) -> Vec<u8> {
        let mut packet = vec![PROTOCOL_K, 0x00, 0x00];
        packet.extend_from_slice(&tac.to_be_bytes());
        packet.extend_from_slice(&serial.to_be_bytes()[1..]);
        packet
    }

    #[test]
    fn test_modem_id_is_unpadded_decimal() {
        let packet = packet_with_identity(35_395_108, 123);
        assert_eq!(read_modem_id(&packet).unwrap(), "35395108123");

        let packet = packet_with_identity(u32::MAX, 0x00FF_FFFF);
        assert_eq!(read_modem_id(&packet).unwrap(), "429496729516777215");
    }

    #[test]
    fn test_check_header() {
        let mut packet = packet_with_identity(1, 2);
        packet[2] = 12;
        append_checksum(&mut packet);
        assert!(check_header(ProtocolVariant::K, &packet).is_ok());
        assert!(matches!(
            check_header(ProtocolVariant::M, &packet),
            Err(AstraError::VariantMismatch {
                framed: ProtocolVariant::M,
                found: ProtocolVariant::K,
            })
        ));

        let mut unknown = packet.clone();
        unknown[0] = b'X';
        assert!(matches!(
            check_header(ProtocolVariant::K, &unknown),
            Err(AstraError::UnknownProtocol { identifier: b'X' })
        ));

        packet[2] = 40;
        assert!(matches!(
            check_header(ProtocolVariant::K, &packet),
            Err(AstraError::LengthMismatch {
                declared: 40,
                actual: 12
            })
        ));
        assert!(matches!(
            check_header(ProtocolVariant::K, &[]),
            Err(AstraError::IncompleteHeader { available: 0 })
        ));
    }

    #[test]
    fn test_odometer_estimate_chains() {
        let mut track = OdometerTrack {
            odometer_km: 100.0,
            point: Some(GeoPoint::new(0.0, 1.0)),
        };
        let mut report = NormalizedReport::from_raw(
            ProtocolVariant::K.layout(),
            &RawReport {
                latitude: 0,
                longitude: 2_000_000,
                ..RawReport::default()
            },
            false,
        );
        track.apply(&mut report, true);
        // one degree of longitude on the equator
        assert!((report.odometer_km - 211.19).abs() < 0.1, "{}", report.odometer_km);

        let mut unchanged = report.clone();
        unchanged.odometer_km = 0.0;
        OdometerTrack {
            odometer_km: 5.0,
            point: None,
        }
        .apply(&mut unchanged, false);
        assert_eq!(unchanged.odometer_km, 0.0);
    }

    #[test]
    fn test_reported_odometer_resets_track() {
        let mut track = OdometerTrack {
            odometer_km: 1.0,
            point: None,
        };
        let mut report = NormalizedReport::from_raw(
            ProtocolVariant::K.layout(),
            &RawReport {
                latitude: 51_000_000,
                odometer: Some(5000),
                ..RawReport::default()
            },
            false,
        );
        track.apply(&mut report, true);
        assert_eq!(report.odometer_km, 5000.0);
        assert_eq!(track.odometer_km, 5000.0);
        assert!(track.point.is_some());
    }
}
