//! # Device Directory and Event Sink
//!
//! The decoder does not own device records or event storage. It resolves the
//! sending device through a [`DeviceDirectory`] and hands every decoded report
//! to an [`EventSink`]. Both are traits so a server can plug in its own
//! persistence; [`InMemoryDeviceDirectory`] and [`MemoryEventSink`] back the
//! CLI and the tests.

use crate::astra::report::{GeoPoint, NormalizedReport};
use crate::astra::status::StatusCode;
use crate::error::AstraError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Prefix entry that stands for the bare modem id
pub const BARE_MODEM_ID: &str = "*";

/// A known tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub account_id: String,
    pub device_id: String,
    /// Prefixed modem id the device is registered under, e.g. `astra_35395108123456`
    pub unique_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub last_odometer_km: f64,
    #[serde(default)]
    pub last_point: Option<GeoPoint>,
}

fn default_active() -> bool {
    true
}

impl DeviceRecord {
    pub fn new(account_id: &str, device_id: &str, unique_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            device_id: device_id.to_string(),
            unique_id: unique_id.to_string(),
            active: true,
            last_odometer_km: 0.0,
            last_point: None,
        }
    }
}

/// Event handed to the sink, one per report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub account_id: String,
    pub device_id: String,
    pub fix_time: i64,
    pub status_code: StatusCode,
    pub point: GeoPoint,
    pub speed_kph: f64,
    pub heading_deg: f64,
    pub altitude_m: f64,
    pub distance_km: f64,
    pub odometer_km: f64,
    pub raw_data: String,
}

impl TrackEvent {
    pub fn new(device: &DeviceRecord, report: &NormalizedReport) -> Self {
        Self {
            account_id: device.account_id.clone(),
            device_id: device.device_id.clone(),
            fix_time: report.fix_time,
            status_code: report.status_code,
            point: report.point,
            speed_kph: report.speed_kph,
            heading_deg: report.heading_deg,
            altitude_m: report.altitude_m,
            distance_km: report.distance_km,
            odometer_km: report.odometer_km,
            raw_data: report.raw_data.clone().unwrap_or_default(),
        }
    }

    /// Storage key: `(account, device, fix time, status code)`
    pub fn key(&self) -> (&str, &str, i64, u16) {
        (
            &self.account_id,
            &self.device_id,
            self.fix_time,
            self.status_code.code(),
        )
    }
}

/// Device lookup
pub trait DeviceDirectory: Send + Sync {
    /// Find a device by its full unique id.
    fn lookup(&self, unique_id: &str) -> Option<DeviceRecord>;

    /// First device matching any candidate id, in order.
    fn resolve(&self, candidate_ids: &[String]) -> Option<DeviceRecord> {
        candidate_ids.iter().find_map(|id| self.lookup(id))
    }

    /// Remember the latest odometer and position after events were stored.
    fn record_position(&self, _unique_id: &str, _odometer_km: f64, _point: GeoPoint) {}
}

/// Event persistence
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &TrackEvent) -> Result<(), AstraError>;
}

/// Candidate unique ids for a modem id, one per configured prefix.
///
/// With no prefixes configured the bare modem id is the only candidate.
pub fn candidate_ids(prefixes: &[String], modem_id: &str) -> Vec<String> {
    if prefixes.is_empty() {
        return vec![modem_id.to_string()];
    }
    prefixes
        .iter()
        .map(|prefix| {
            if prefix == BARE_MODEM_ID {
                modem_id.to_string()
            } else {
                format!("{prefix}{modem_id}")
            }
        })
        .collect()
}

/// Resolve the sending device, rejecting unknown and inactive ones.
pub fn resolve_device(
    directory: &dyn DeviceDirectory,
    prefixes: &[String],
    modem_id: &str,
) -> Result<DeviceRecord, AstraError> {
    let candidates = candidate_ids(prefixes, modem_id);
    let device = directory
        .resolve(&candidates)
        .ok_or_else(|| AstraError::DeviceNotFound {
            modem_id: modem_id.to_string(),
            prefixes: prefixes.to_vec(),
        })?;

    if !device.active {
        return Err(AstraError::DeviceInactive {
            account_id: device.account_id,
            device_id: device.device_id,
        });
    }
    Ok(device)
}

/// Device directory held in memory
#[derive(Default, Clone)]
pub struct InMemoryDeviceDirectory {
    inner: Arc<RwLock<HashMap<String, DeviceRecord>>>,
}

impl InMemoryDeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: impl IntoIterator<Item = DeviceRecord>) -> Self {
        let directory = Self::new();
        for device in devices {
            directory.insert(device);
        }
        directory
    }

    /// Add or replace a device, keyed by its unique id.
    pub fn insert(&self, device: DeviceRecord) {
        if let Ok(mut inner) = self.inner.write() {
            inner.insert(device.unique_id.clone(), device);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeviceDirectory for InMemoryDeviceDirectory {
    fn lookup(&self, unique_id: &str) -> Option<DeviceRecord> {
        self.inner.read().ok()?.get(unique_id).cloned()
    }

    fn record_position(&self, unique_id: &str, odometer_km: f64, point: GeoPoint) {
        if let Ok(mut inner) = self.inner.write() {
            if let Some(device) = inner.get_mut(unique_id) {
                device.last_odometer_km = odometer_km;
                device.last_point = Some(point);
            }
        }
    }
}

/// Event sink collecting events in memory
#[derive(Default, Clone)]
pub struct MemoryEventSink {
    events: Arc<Mutex<Vec<TrackEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored events, in emission order
    pub fn events(&self) -> Vec<TrackEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &TrackEvent) -> Result<(), AstraError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| AstraError::EmitFailed("event store lock poisoned".to_string()))?;
        events.push(event.clone());
        Ok(())
    }
}
