//! # Track Session
//!
//! One [`TrackSession`] per device connection. The transport calls it twice per
//! packet: [`TrackSession::packet_length`] with the first bytes to learn how
//! much to buffer, then [`TrackSession::handle_packet`] with the complete
//! packet and the variant returned by the first call.
//!
//! Reports are emitted only after the whole packet decoded. If the sink
//! rejects an event, emission stops and no acknowledgement is returned, so the
//! device sends the packet again.

use crate::astra::decoder::PacketDecoder;
use crate::astra::framer::{self, PacketLength};
use crate::astra::report::NormalizedReport;
use crate::astra::variant::ProtocolVariant;
use crate::config::HandlerConfig;
use crate::device::{DeviceDirectory, DeviceRecord, EventSink, TrackEvent};
use crate::error::AstraError;
use crate::log_warn_throttled;
use crate::util::logging::{log_packet_hex, LogThrottle};
use bytes::Bytes;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Per-session counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub packets_received: u64,
    pub packets_decoded: u64,
    pub checksum_errors: u64,
    pub unknown_devices: u64,
    pub malformed_packets: u64,
    pub framing_errors: u64,
    pub events_saved: u64,
}

/// Outcome of a successfully handled packet
#[derive(Debug, Clone, PartialEq)]
pub struct HandledPacket {
    pub variant: ProtocolVariant,
    pub modem_id: String,
    pub device: DeviceRecord,
    pub reports: Vec<NormalizedReport>,
    /// Bytes to write back to the device
    pub ack: Option<Bytes>,
}

pub struct TrackSession {
    config: Arc<HandlerConfig>,
    directory: Arc<dyn DeviceDirectory>,
    sink: Arc<dyn EventSink>,
    stats: SessionStats,
    /// Throttle for decode failure warnings
    error_throttle: LogThrottle,
}

impl TrackSession {
    pub fn new(
        config: Arc<HandlerConfig>,
        directory: Arc<dyn DeviceDirectory>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            directory,
            sink,
            stats: SessionStats::default(),
            error_throttle: LogThrottle::new(1000, 5), // 5 warnings per second
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    /// Framing step: how long is the packet that starts with `header`?
    pub fn packet_length(&mut self, header: &[u8]) -> Result<PacketLength, AstraError> {
        match framer::packet_length(header) {
            Ok(length) => Ok(length),
            Err(e) => {
                self.stats.framing_errors += 1;
                log_warn_throttled!(self.error_throttle, "Framing failed: {e}");
                Err(e)
            }
        }
    }

    /// Decode step for a complete packet framed as `variant`.
    pub fn handle_packet(
        &mut self,
        variant: ProtocolVariant,
        packet: &[u8],
    ) -> Result<HandledPacket, AstraError> {
        self.stats.packets_received += 1;
        self.process(variant, packet)
    }

    /// Frame and decode a buffer holding exactly one packet.
    pub fn handle_raw(&mut self, packet: &[u8]) -> Result<HandledPacket, AstraError> {
        self.stats.packets_received += 1;
        if packet.is_empty() {
            return Err(self.reject(AstraError::IncompleteHeader { available: 0 }));
        }
        let variant = match self.packet_length(packet)? {
            PacketLength::Complete { variant, .. } => variant,
            PacketLength::NeedMoreData => {
                return Err(self.reject(AstraError::IncompleteHeader {
                    available: packet.len(),
                }))
            }
        };
        self.process(variant, packet)
    }

    fn process(
        &mut self,
        variant: ProtocolVariant,
        packet: &[u8],
    ) -> Result<HandledPacket, AstraError> {
        if packet.is_empty() {
            warn!("Empty packet received");
            return Err(self.reject(AstraError::IncompleteHeader { available: 0 }));
        }
        if self.config.debug_mode {
            log_packet_hex("Recv", packet);
        }

        let decoder = PacketDecoder::new(&self.config, self.directory.as_ref());
        let decoded = match decoder.decode(variant, packet) {
            Ok(decoded) => decoded,
            Err(e) => return Err(self.reject(e)),
        };

        if self.config.insert_events {
            self.emit_all(&decoded.device, &decoded.reports)?;
        } else {
            for report in &decoded.reports {
                info!("Event: {} (not stored)", report.status_code);
            }
        }

        self.stats.packets_decoded += 1;
        let ack = Some(decoded.ack());
        Ok(HandledPacket {
            variant: decoded.variant,
            modem_id: decoded.modem_id,
            device: decoded.device,
            reports: decoded.reports,
            ack,
        })
    }

    fn emit_all(
        &mut self,
        device: &DeviceRecord,
        reports: &[NormalizedReport],
    ) -> Result<(), AstraError> {
        for report in reports {
            let event = TrackEvent::new(device, report);
            info!("Event: {}", report.status_code);
            if let Err(e) = self.sink.emit(&event) {
                warn!(
                    "Event store failed for {}/{} at {}: {e}",
                    device.account_id, device.device_id, event.fix_time
                );
                return Err(match e {
                    AstraError::EmitFailed(message) => AstraError::EmitFailed(message),
                    other => AstraError::EmitFailed(other.to_string()),
                });
            }
            self.stats.events_saved += 1;
        }

        let odometer_km = reports
            .iter()
            .rev()
            .map(|r| r.odometer_km)
            .find(|km| *km > 0.0)
            .unwrap_or(device.last_odometer_km);
        if let Some(point) = reports
            .iter()
            .rev()
            .map(|r| r.point)
            .find(|p| p.is_valid() && !p.is_origin())
        {
            debug!("{}: last odometer {odometer_km:?} km at {point}", device.unique_id);
            self.directory
                .record_position(&device.unique_id, odometer_km, point);
        }
        Ok(())
    }

    /// Count a decode failure and pass it back.
    fn reject(&mut self, error: AstraError) -> AstraError {
        match &error {
            AstraError::ChecksumMismatch { .. } => self.stats.checksum_errors += 1,
            AstraError::DeviceNotFound { .. } | AstraError::DeviceInactive { .. } => {
                self.stats.unknown_devices += 1
            }
            AstraError::MalformedReport { .. } | AstraError::Field(_) => {
                self.stats.malformed_packets += 1
            }
            AstraError::LengthMismatch { .. } | AstraError::VariantMismatch { .. } => {
                self.stats.framing_errors += 1
            }
            e if e.is_framing() => self.stats.framing_errors += 1,
            _ => {}
        }
        log_warn_throttled!(self.error_throttle, "Packet rejected: {error}");
        error
    }
}
