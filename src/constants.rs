//! Astra Protocol Constants
//!
//! This module defines constants used by the Astra Telematics Protocol C, K and M
//! packet formats.

/// Protocol C identifier byte ('C')
pub const PROTOCOL_C: u8 = 0x43;

/// Protocol K identifier byte ('K')
pub const PROTOCOL_K: u8 = 0x4B;

/// Protocol M identifier byte ('M')
pub const PROTOCOL_M: u8 = 0x4D;

// ----------------------------------------------------------------------------
// Report lengths
// ----------------------------------------------------------------------------

pub const PROTOCOL_C_BASIC_LEN: usize = 33;
pub const PROTOCOL_K_BASIC_LEN: usize = 38;
pub const PROTOCOL_K_START_STOP_LEN: usize = 50;
pub const PROTOCOL_M_BASIC_LEN: usize = 41;
pub const PROTOCOL_M_START_STOP_LEN: usize = 53;

/// Lifetime odometer offset within a Protocol K start/stop report
pub const PROTOCOL_K_ODOMETER_OFFSET: usize = 45;

/// Lifetime odometer offset within a Protocol M start/stop report
pub const PROTOCOL_M_ODOMETER_OFFSET: usize = 48;

// ----------------------------------------------------------------------------
// Packet framing
// ----------------------------------------------------------------------------

/// Bytes needed to read the identifier and the length field
pub const MIN_PACKET_LENGTH: usize = 3;

pub const MAX_PACKET_LENGTH: usize = 1024;

/// Offset of the big-endian total length field
pub const PACKET_LENGTH_OFFSET: usize = 1;

/// Offset of the device identity block (TAC + serial)
pub const DEVICE_ID_OFFSET: usize = 3;

/// 4-byte type allocation code + 3-byte serial
pub const DEVICE_ID_LEN: usize = 7;

/// Offset of the first report
pub const FIRST_REPORT_OFFSET: usize = DEVICE_ID_OFFSET + DEVICE_ID_LEN;

/// Trailing CRC-16
pub const CHECKSUM_LEN: usize = 2;

/// Smallest packet the decoder can accept: header, identity block and checksum
pub const MIN_DECODE_LENGTH: usize = FIRST_REPORT_OFFSET + CHECKSUM_LEN;

/// Acknowledgement written back to the device after a successful decode
pub const ACK: u8 = 0x06;

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

/// Seconds between 1970-01-01 and the GPS epoch 1980-01-06
pub const GPS_EPOCH_OFFSET: i64 = 315_964_800;

/// External power above this voltage is reported as power-on
pub const EXT_POWER_ON_VOLTS: f64 = 7.0;

/// Geofence byte bit set on entry, clear on exit
pub const GEOFENCE_ENTERED: u8 = 0x80;

pub const GEOFENCE_INDEX_MASK: u8 = 0x7F;
