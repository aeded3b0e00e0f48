//! # astra-rs - Decoder for Astra Telematics GPS Tracker Packets
//!
//! The astra-rs crate decodes the binary report packets sent by Astra
//! Telematics vehicle trackers (Protocols C, K and M) into normalized
//! location events.
//!
//! ## Features
//!
//! - Size packets from their first three bytes for the transport layer
//! - Verify the trailing CRC-16 of every packet
//! - Resolve the sending device from its TAC and serial through a pluggable directory
//! - Decode chained reports with per-protocol field widths and unit scaling
//! - Classify every report into exactly one status code by a fixed priority
//! - Emit events to a pluggable sink and acknowledge the packet with `0x06`
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use astra_rs::{
//!     DeviceRecord, HandlerConfig, InMemoryDeviceDirectory, MemoryEventSink, PacketLength,
//!     TrackSession,
//! };
//!
//! let directory = InMemoryDeviceDirectory::with_devices([DeviceRecord::new(
//!     "fleet",
//!     "van-1",
//!     "astra_353951081234567",
//! )]);
//! let mut session = TrackSession::new(
//!     Arc::new(HandlerConfig::default()),
//!     Arc::new(directory),
//!     Arc::new(MemoryEventSink::new()),
//! );
//!
//! // The transport first asks how many bytes the packet needs
//! match session.packet_length(&[b'K', 0x00, 0x32]).unwrap() {
//!     PacketLength::Complete { length, .. } => assert_eq!(length, 50),
//!     PacketLength::NeedMoreData => unreachable!(),
//! }
//! ```

pub mod astra;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod logging;
pub mod session;
pub mod util;

pub use crate::error::AstraError;
pub use crate::logging::{init_logger, log_info};

// Protocol types
pub use astra::{
    classify, crc16, packet_length, verify_packet, DecodedPacket, GeoPoint, NormalizedReport,
    PacketDecoder, PacketLength, ProtocolVariant, ReasonFlags, StatusCode, StatusFlags,
    StreamFramer,
};

// Collaborators and session
pub use config::HandlerConfig;
pub use device::{
    DeviceDirectory, DeviceRecord, EventSink, InMemoryDeviceDirectory, MemoryEventSink,
    TrackEvent,
};
pub use session::{HandledPacket, SessionStats, TrackSession};

/// Decode a complete packet without a session.
///
/// Identifies the variant from the first byte, then checks, resolves and
/// decodes the packet. Nothing is emitted.
pub fn decode_packet(
    packet: &[u8],
    config: &HandlerConfig,
    directory: &dyn DeviceDirectory,
) -> Result<DecodedPacket, AstraError> {
    let variant = match packet_length(packet)? {
        PacketLength::Complete { variant, .. } => variant,
        PacketLength::NeedMoreData => {
            return Err(AstraError::IncompleteHeader {
                available: packet.len(),
            })
        }
    };
    PacketDecoder::new(config, directory).decode(variant, packet)
}
