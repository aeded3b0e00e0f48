//! # Report Decoding
//!
//! A report is read in two steps. [`RawReport::read`] walks the variant's
//! [`ReportLayout`] and collects the unscaled wire values; then
//! [`NormalizedReport::from_raw`] applies the unit conversions, classifies the
//! report and optionally renders the diagnostic string.
//!
//! ## Scaling
//!
//! | Field | Wire unit | Result |
//! |---|---|---|
//! | Latitude / longitude | micro-degrees | `raw / 1_000_000` |
//! | Fix time | GPS seconds | `raw + 315_964_800` (Unix) |
//! | Speed, max speed | km/h / 2 | `raw * 2` |
//! | Heading | degrees / 2 | `raw * 2` |
//! | Altitude | metres / 20 | `raw * 20` |
//! | Journey distance | 0.1 km | `raw / 10` |
//! | External power | 0.2 V | `raw / 5` |

use super::flags::{GeofenceEvent, ReasonFlags, SignalQuality, StatusFlags};
use super::status::{classify, StatusCode};
use super::variant::{Field, ProtocolVariant, ReportLayout};
use crate::constants::{CHECKSUM_LEN, GPS_EPOCH_OFFSET};
use crate::error::AstraError;
use crate::util::field_reader::{Endian, FieldReader};
use crate::util::hex::hex_field;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean earth radius used for great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn from_micro_degrees(latitude: i32, longitude: i32) -> Self {
        Self::new(
            f64::from(latitude) / 1_000_000.0,
            f64::from(longitude) / 1_000_000.0,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    /// The 0/0 point devices report before the first fix
    pub fn is_origin(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Haversine distance in kilometres
    pub fn kilometers_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}/{:.5}", self.latitude, self.longitude)
    }
}

/// Unscaled report values as read from the wire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReport {
    pub sequence: u8,
    pub latitude: i32,
    pub longitude: i32,
    pub fix_time: u32,
    pub speed: u32,
    pub heading: u32,
    pub altitude: u32,
    pub reason: u32,
    pub status: u32,
    pub geofence: u8,
    pub digitals: u32,
    pub digital_changes: Option<u8>,
    pub adc1: u32,
    pub adc2: Option<u32>,
    pub battery: u8,
    pub ext_power: u32,
    pub max_speed: u32,
    pub accelerometer: Vec<u8>,
    pub journey_distance: u32,
    pub idle_time: u32,
    pub signal_quality: Option<u8>,
    pub odometer: Option<u32>,
}

impl RawReport {
    /// Read one report starting at `offset`.
    ///
    /// The report, including its start/stop extension, must end before the
    /// trailing checksum. Returns the report and the number of bytes it spans.
    pub fn read(
        layout: &ReportLayout,
        packet: &[u8],
        offset: usize,
    ) -> Result<(Self, usize), AstraError> {
        let end = packet.len().saturating_sub(CHECKSUM_LEN);
        let available = end.saturating_sub(offset);
        if layout.basic_len > available {
            return Err(AstraError::MalformedReport {
                offset,
                needed: layout.basic_len,
                available,
            });
        }

        let mut reader = FieldReader::new(packet, offset, layout.basic_len)?;
        let mut raw = RawReport::default();
        for field in layout.fields {
            let width = field.width();
            match *field {
                Field::Sequence => raw.sequence = reader.read_uint(width, Endian::Big)? as u8,
                Field::Latitude => raw.latitude = reader.read_int(width, Endian::Big)?,
                Field::Longitude => raw.longitude = reader.read_int(width, Endian::Big)?,
                Field::FixTime => raw.fix_time = reader.read_uint(width, Endian::Big)?,
                Field::Speed => raw.speed = reader.read_uint(width, Endian::Big)?,
                Field::Heading => raw.heading = reader.read_uint(width, Endian::Big)?,
                Field::Altitude => raw.altitude = reader.read_uint(width, Endian::Big)?,
                Field::Reason { .. } => raw.reason = reader.read_uint(width, Endian::Big)?,
                Field::Status { .. } => raw.status = reader.read_uint(width, Endian::Big)?,
                Field::Geofence => raw.geofence = reader.read_uint(width, Endian::Big)? as u8,
                Field::Digitals { endian, .. } => raw.digitals = reader.read_uint(width, endian)?,
                Field::DigitalChanges => {
                    raw.digital_changes = Some(reader.read_uint(width, Endian::Big)? as u8)
                }
                Field::Adc1 => raw.adc1 = reader.read_uint(width, Endian::Big)?,
                Field::Adc2 => raw.adc2 = Some(reader.read_uint(width, Endian::Big)?),
                Field::Battery => raw.battery = reader.read_uint(width, Endian::Big)? as u8,
                Field::ExternalPower => raw.ext_power = reader.read_uint(width, Endian::Big)?,
                Field::MaxSpeed => raw.max_speed = reader.read_uint(width, Endian::Big)?,
                Field::Accelerometer { samples } => raw.accelerometer = reader.read_bytes(samples)?,
                Field::JourneyDistance => {
                    raw.journey_distance = reader.read_uint(width, Endian::Big)?
                }
                Field::IdleTime => raw.idle_time = reader.read_uint(width, Endian::Big)?,
                Field::SignalQuality => {
                    raw.signal_quality = Some(reader.read_uint(width, Endian::Big)? as u8)
                }
            }
        }

        let extra_data = StatusFlags::from_raw(raw.status).has_extra_data();
        let report_len = layout.report_len(extra_data);
        if report_len > available {
            return Err(AstraError::MalformedReport {
                offset,
                needed: report_len,
                available,
            });
        }

        if extra_data {
            if let Some(odometer_offset) = layout.odometer_offset {
                let mut reader = FieldReader::new(packet, offset + odometer_offset, 3)?;
                raw.odometer = Some(reader.read_uint(3, Endian::Big)?);
            }
        }

        Ok((raw, report_len))
    }

    pub fn reason_flags(&self) -> ReasonFlags {
        ReasonFlags::from_raw(self.reason)
    }

    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::from_raw(self.status)
    }

    pub fn ext_power_volts(&self) -> f64 {
        f64::from(self.ext_power) / 5.0
    }

    pub fn max_speed_kph(&self) -> u32 {
        self.max_speed * 2
    }
}

/// One decoded telemetry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReport {
    pub variant: ProtocolVariant,
    pub sequence: u8,
    /// Unix seconds
    pub fix_time: i64,
    pub point: GeoPoint,
    pub speed_kph: f64,
    pub heading_deg: f64,
    pub altitude_m: f64,
    pub distance_km: f64,
    pub idle_time_s: u32,
    /// Lifetime odometer, 0 when the report does not carry one
    pub odometer_km: f64,
    pub reason: ReasonFlags,
    pub status: StatusFlags,
    pub geofence: u8,
    pub digitals: u32,
    pub digital_changes: Option<u8>,
    pub adc1_volts: f64,
    pub adc2_volts: Option<f64>,
    pub battery_percent: u8,
    pub ext_power_volts: f64,
    pub max_speed_kph: u32,
    pub accelerometer: Vec<u8>,
    pub signal_quality: Option<SignalQuality>,
    pub status_code: StatusCode,
    pub raw_data: Option<String>,
}

impl NormalizedReport {
    /// Scale and classify a raw report.
    pub fn from_raw(layout: &ReportLayout, raw: &RawReport, include_raw_data: bool) -> Self {
        let reason = raw.reason_flags();
        let status = raw.status_flags();
        let ext_power_volts = raw.ext_power_volts();

        Self {
            variant: layout.variant,
            sequence: raw.sequence,
            fix_time: i64::from(raw.fix_time) + GPS_EPOCH_OFFSET,
            point: GeoPoint::from_micro_degrees(raw.latitude, raw.longitude),
            speed_kph: f64::from(raw.speed) * 2.0,
            heading_deg: f64::from(raw.heading) * 2.0,
            altitude_m: f64::from(raw.altitude) * 20.0,
            distance_km: f64::from(raw.journey_distance) / 10.0,
            idle_time_s: raw.idle_time,
            odometer_km: raw.odometer.map_or(0.0, f64::from),
            reason,
            status,
            geofence: raw.geofence,
            digitals: raw.digitals,
            digital_changes: raw.digital_changes,
            adc1_volts: layout.adc1_scale.volts(raw.adc1),
            adc2_volts: layout.adc2_scale.zip(raw.adc2).map(|(scale, adc)| scale.volts(adc)),
            battery_percent: raw.battery,
            ext_power_volts,
            max_speed_kph: raw.max_speed_kph(),
            accelerometer: raw.accelerometer.clone(),
            signal_quality: raw.signal_quality.map(SignalQuality::from_byte),
            status_code: classify(reason, status, ext_power_volts, raw.geofence),
            raw_data: include_raw_data.then(|| diagnostic_string(layout, raw)),
        }
    }

    /// Fix time as a UTC timestamp
    pub fn fix_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.fix_time, 0)
    }

    pub fn geofence_event(&self) -> GeofenceEvent {
        GeofenceEvent::from_byte(self.geofence)
    }

    pub fn reports_to_follow(&self) -> bool {
        self.status.reports_to_follow()
    }
}

/// Voltage text as `12.4` in `[1e-3, 1e7)`, otherwise `7.8125E-6`.
fn volts_text(volts: f64) -> String {
    if volts == 0.0 || !volts.is_finite() || (1e-3..1e7).contains(&volts.abs()) {
        return format!("{volts:?}");
    }
    let sci = format!("{volts:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

/// Render the auxiliary raw fields as `R=..;S=..;P=..` for auditing.
///
/// Hex fields are padded to the wire width of the field. Fields the variant
/// does not carry are left out.
pub fn diagnostic_string(layout: &ReportLayout, raw: &RawReport) -> String {
    let reason_bits = layout.field_bits(|f| matches!(f, Field::Reason { .. }));
    let status_bits = layout.field_bits(|f| matches!(f, Field::Status { .. }));
    let digital_bits = layout.field_bits(|f| matches!(f, Field::Digitals { .. }));

    let mut parts = vec![
        format!("R={}", hex_field(raw.reason, reason_bits)),
        format!("S={}", hex_field(raw.status, status_bits)),
        format!("P={}V", volts_text(raw.ext_power_volts())),
        format!("B={}%", raw.battery),
    ];

    let mut digitals = format!("D={}", hex_field(raw.digitals, digital_bits));
    if let Some(changes) = raw.digital_changes {
        digitals.push(',');
        digitals.push_str(&hex_field(u32::from(changes), 8));
    }
    parts.push(digitals);

    parts.push(format!("A1={}V", volts_text(layout.adc1_scale.volts(raw.adc1))));
    if let Some((scale, adc2)) = layout.adc2_scale.zip(raw.adc2) {
        parts.push(format!("A2={}V", volts_text(scale.volts(adc2))));
    }
    parts.push(format!("M={}km/h", raw.max_speed_kph()));

    for (axis, pair) in ["X", "Y", "Z"].iter().zip(raw.accelerometer.chunks(2)) {
        let samples: Vec<String> = pair.iter().map(u8::to_string).collect();
        parts.push(format!("{axis}={}", samples.join(",")));
    }

    parts.push(format!("I={}s", raw.idle_time));
    if let Some(quality) = raw.signal_quality {
        parts.push(format!("Q={}", hex_field(u32::from(quality), 8)));
    }
    parts.push(format!("G={}", hex_field(u32::from(raw.geofence), 8)));

    parts.join(";")
}
