//! Astra Telematics binary tracker protocols C, K and M.
//!
//! - [`framer`] sizes a packet from its first three bytes
//! - [`checksum`] verifies the trailing CRC-16
//! - [`decoder`] reads the device identity and the chained reports
//! - [`variant`] describes the per-protocol report layouts
//! - [`status`] classifies each report into one event code

pub mod checksum;
pub mod decoder;
pub mod flags;
pub mod framer;
pub mod report;
pub mod status;
pub mod variant;

pub use checksum::{crc16, packet_checksum, verify_packet};
pub use decoder::{DecodedPacket, PacketDecoder};
pub use flags::{GeofenceEvent, ReasonFlags, SignalQuality, StatusFlags};
pub use framer::{packet_length, PacketLength, StreamFramer};
pub use report::{GeoPoint, NormalizedReport, RawReport};
pub use status::{classify, StatusCode};
pub use variant::{ProtocolVariant, ReportLayout};
