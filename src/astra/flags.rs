//! # Report Flags
//!
//! Reason and status bitmasks carried by every report, plus the two packed
//! single-byte fields (geofence and signal quality).
//!
//! Protocol C transmits a 16-bit reason and an 8-bit status; K and M widen
//! these to 24 and 16 bits. The same bit assignments hold for all three, so a
//! C report simply never sets the upper bits.

use crate::constants::{GEOFENCE_ENTERED, GEOFENCE_INDEX_MASK};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Why the device produced a report
    ///
    /// Several bits may be set at once. Classification picks one of them by
    /// a fixed priority, see [`crate::astra::status::classify`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ReasonFlags: u32 {
        const TIME_ELAPSED = 0x0000_0001;
        const DIST_TRAVELLED = 0x0000_0002;
        const POS_ON_DEMAND = 0x0000_0004;
        const GEO_FENCE = 0x0000_0008;
        const PANIC_SWITCH = 0x0000_0010;
        const EXT_INPUT = 0x0000_0020;
        const JOURNEY_START = 0x0000_0040;
        const JOURNEY_STOP = 0x0000_0080;
        const HEADING_CHANGE = 0x0000_0100;
        const LOW_BATTERY = 0x0000_0200;
        const EXT_POWER_EVENT = 0x0000_0400;
        const IDLING_START = 0x0000_0800;
        const IDLING_END = 0x0000_1000;
        const IDLING_ONGOING = 0x0000_2000;
        const POWER_ON = 0x0000_4000;
        const SPEED_OVER_THRESHOLD = 0x0000_8000;
        const TOWING_ALARM = 0x0001_0000;
        const UNAUTHORISED_DRIVER = 0x0002_0000;
        const COLLISION = 0x0004_0000;
        const ACCEL_MAX = 0x0008_0000;
        const CORNERING_MAX = 0x0010_0000;
        const DECEL_MAX = 0x0020_0000;
        const GPS_REACQUIRED = 0x0040_0000;
        const CANBUS_EVENT = 0x0080_0000;
    }
}

bitflags! {
    /// Device state at the time of the report
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StatusFlags: u16 {
        const IGNITION_ON = 0x0001;
        /// Another report follows in the same packet
        const REPORTS_TO_FOLLOW = 0x0010;
        /// Start/stop report carrying the lifetime odometer (K and M only)
        const EXTRA_DATA = 0x0100;
    }
}

impl ReasonFlags {
    /// Keep every raw bit, including ones without a name.
    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }
}

impl StatusFlags {
    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain((raw & 0xFFFF) as u16)
    }

    pub fn reports_to_follow(self) -> bool {
        self.contains(StatusFlags::REPORTS_TO_FOLLOW)
    }

    pub fn has_extra_data(self) -> bool {
        self.contains(StatusFlags::EXTRA_DATA)
    }

    pub fn ignition_on(self) -> bool {
        self.contains(StatusFlags::IGNITION_ON)
    }
}

/// Geofence crossing packed in one byte: bit 7 entry/exit, bits 0-6 index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeofenceEvent {
    pub entered: bool,
    pub index: u8,
}

impl GeofenceEvent {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            entered: byte & GEOFENCE_ENTERED != 0,
            index: byte & GEOFENCE_INDEX_MASK,
        }
    }
}

/// GSM signal strength (0-15, high nibble) and satellites in use (low nibble)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalQuality {
    pub gsm: u8,
    pub satellites: u8,
}

impl SignalQuality {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            gsm: byte >> 4,
            satellites: byte & 0x0F,
        }
    }
}
