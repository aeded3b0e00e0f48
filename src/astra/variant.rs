//! # Protocol Variants
//!
//! Protocols C, K and M share one packet skeleton and differ only in the layout
//! of their reports. Each variant is described by a static [`ReportLayout`]:
//! the ordered list of report fields with their widths, the report lengths,
//! the optional odometer offset and the ADC scalings. The decoder walks the
//! layout instead of carrying one parsing routine per protocol.
//!
//! | Field | C | K | M |
//! |---|---|---|---|
//! | Basic report length | 33 | 38 | 41 |
//! | Start/stop report length | - | 50 | 53 |
//! | Reason / status width | 2 / 1 | 3 / 2 | 3 / 2 |
//! | Digital I/O | 1 + changes | 1 | 3, little-endian |
//! | ADC2 | yes | no | yes |
//! | Accelerometer samples | 2 | 6 | 6 |
//! | Odometer | - | +45 | +48 |

use crate::constants::*;
use crate::util::field_reader::Endian;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Astra protocol selected by the leading packet byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVariant {
    C,
    K,
    M,
}

impl ProtocolVariant {
    /// All supported variants
    pub const ALL: [ProtocolVariant; 3] = [ProtocolVariant::C, ProtocolVariant::K, ProtocolVariant::M];

    /// Map a leading packet byte to its variant.
    pub fn from_identifier(identifier: u8) -> Option<Self> {
        match identifier {
            PROTOCOL_C => Some(ProtocolVariant::C),
            PROTOCOL_K => Some(ProtocolVariant::K),
            PROTOCOL_M => Some(ProtocolVariant::M),
            _ => None,
        }
    }

    pub fn identifier(self) -> u8 {
        match self {
            ProtocolVariant::C => PROTOCOL_C,
            ProtocolVariant::K => PROTOCOL_K,
            ProtocolVariant::M => PROTOCOL_M,
        }
    }

    /// Report layout for this variant
    pub fn layout(self) -> &'static ReportLayout {
        match self {
            ProtocolVariant::C => &PROTOCOL_C_LAYOUT,
            ProtocolVariant::K => &PROTOCOL_K_LAYOUT,
            ProtocolVariant::M => &PROTOCOL_M_LAYOUT,
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Protocol {}", char::from(self.identifier()))
    }
}

/// Conversion from a raw ADC byte to volts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdcScale {
    /// `raw / 128 / 1000` (Protocol C, 0.0078125 step)
    Binary128,
    /// `raw * millivolts / 1000`
    Millivolts(u32),
}

impl AdcScale {
    pub fn volts(self, raw: u32) -> f64 {
        match self {
            AdcScale::Binary128 => f64::from(raw) / 128.0 / 1000.0,
            AdcScale::Millivolts(step) => f64::from(raw) * f64::from(step) / 1000.0,
        }
    }
}

/// One field of a report, in wire order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Sequence,
    Latitude,
    Longitude,
    FixTime,
    Speed,
    Heading,
    Altitude,
    Reason { width: usize },
    Status { width: usize },
    Geofence,
    Digitals { width: usize, endian: Endian },
    DigitalChanges,
    Adc1,
    Adc2,
    Battery,
    ExternalPower,
    MaxSpeed,
    Accelerometer { samples: usize },
    JourneyDistance,
    IdleTime,
    SignalQuality,
}

impl Field {
    /// Bytes occupied on the wire
    pub const fn width(&self) -> usize {
        match self {
            Field::Latitude | Field::Longitude | Field::FixTime => 4,
            Field::JourneyDistance | Field::IdleTime => 2,
            Field::Reason { width } | Field::Status { width } | Field::Digitals { width, .. } => {
                *width
            }
            Field::Accelerometer { samples } => *samples,
            _ => 1,
        }
    }
}

/// Static description of a variant's reports
#[derive(Debug)]
pub struct ReportLayout {
    pub variant: ProtocolVariant,
    /// Length of a report without the start/stop extension
    pub basic_len: usize,
    /// Length of a report carrying extra data, if the variant has one
    pub start_stop_len: Option<usize>,
    /// Offset of the 3-byte lifetime odometer inside a start/stop report
    pub odometer_offset: Option<usize>,
    pub adc1_scale: AdcScale,
    pub adc2_scale: Option<AdcScale>,
    pub fields: &'static [Field],
}

impl ReportLayout {
    /// Report length given whether the extra data status bit is set.
    pub fn report_len(&self, extra_data: bool) -> usize {
        match (extra_data, self.start_stop_len) {
            (true, Some(len)) => len,
            _ => self.basic_len,
        }
    }

    /// Sum of the widths of the fixed fields
    #[cfg(test)]
    fn fields_len(&self) -> usize {
        self.fields.iter().map(Field::width).sum()
    }

    /// Width in bits of the given field kind, 0 if absent
    pub fn field_bits(&self, matches: fn(&Field) -> bool) -> u32 {
        self.fields
            .iter()
            .find(|f| matches(f))
            .map_or(0, |f| (f.width() * 8) as u32)
    }
}

static PROTOCOL_C_LAYOUT: ReportLayout = ReportLayout {
    variant: ProtocolVariant::C,
    basic_len: PROTOCOL_C_BASIC_LEN,
    start_stop_len: None,
    odometer_offset: None,
    adc1_scale: AdcScale::Binary128,
    adc2_scale: Some(AdcScale::Binary128),
    fields: &[
        Field::Sequence,
        Field::Latitude,
        Field::Longitude,
        Field::FixTime,
        Field::Speed,
        Field::Heading,
        Field::Altitude,
        Field::Reason { width: 2 },
        Field::Status { width: 1 },
        Field::Geofence,
        Field::Digitals {
            width: 1,
            endian: Endian::Big,
        },
        Field::DigitalChanges,
        Field::Adc2,
        Field::Adc1,
        Field::Battery,
        Field::ExternalPower,
        Field::MaxSpeed,
        Field::Accelerometer { samples: 2 },
        Field::JourneyDistance,
        Field::IdleTime,
    ],
};

static PROTOCOL_K_LAYOUT: ReportLayout = ReportLayout {
    variant: ProtocolVariant::K,
    basic_len: PROTOCOL_K_BASIC_LEN,
    start_stop_len: Some(PROTOCOL_K_START_STOP_LEN),
    odometer_offset: Some(PROTOCOL_K_ODOMETER_OFFSET),
    adc1_scale: AdcScale::Millivolts(20),
    adc2_scale: None,
    fields: &[
        Field::Sequence,
        Field::Latitude,
        Field::Longitude,
        Field::FixTime,
        Field::Speed,
        Field::Heading,
        Field::Reason { width: 3 },
        Field::Status { width: 2 },
        Field::Digitals {
            width: 1,
            endian: Endian::Big,
        },
        Field::Adc1,
        Field::Battery,
        Field::ExternalPower,
        Field::MaxSpeed,
        Field::Accelerometer { samples: 6 },
        Field::JourneyDistance,
        Field::IdleTime,
        Field::Altitude,
        Field::SignalQuality,
        Field::Geofence,
    ],
};

static PROTOCOL_M_LAYOUT: ReportLayout = ReportLayout {
    variant: ProtocolVariant::M,
    basic_len: PROTOCOL_M_BASIC_LEN,
    start_stop_len: Some(PROTOCOL_M_START_STOP_LEN),
    odometer_offset: Some(PROTOCOL_M_ODOMETER_OFFSET),
    adc1_scale: AdcScale::Millivolts(20),
    adc2_scale: Some(AdcScale::Millivolts(59)),
    fields: &[
        Field::Sequence,
        Field::Latitude,
        Field::Longitude,
        Field::FixTime,
        Field::Speed,
        Field::Heading,
        Field::Reason { width: 3 },
        Field::Status { width: 2 },
        // Digitals #1 is the least significant byte
        Field::Digitals {
            width: 3,
            endian: Endian::Little,
        },
        Field::Adc1,
        Field::Adc2,
        Field::Battery,
        Field::ExternalPower,
        Field::MaxSpeed,
        Field::Accelerometer { samples: 6 },
        Field::JourneyDistance,
        Field::IdleTime,
        Field::Altitude,
        Field::SignalQuality,
        Field::Geofence,
    ],
};
