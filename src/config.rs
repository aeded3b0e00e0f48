//! # Handler Configuration
//!
//! Process-wide settings for the packet handler, loaded once at startup and
//! shared read-only between sessions.
//!
//! ```json
//! {
//!   "unique_id_prefixes": ["astra_", "imei_"],
//!   "minimum_speed_kph": 3.0,
//!   "estimate_odometer": true
//! }
//! ```
//!
//! Missing keys take their defaults.

use crate::error::AstraError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default device unique-id prefixes, tried in order
pub const DEFAULT_UNIQUE_ID_PREFIXES: [&str; 2] = ["astra_", "imei_"];

/// Reports slower than this are treated as stationary unless configured
pub const DEFAULT_MINIMUM_SPEED_KPH: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Prefixes prepended to the modem id during device lookup.
    /// `*` stands for the bare modem id.
    pub unique_id_prefixes: Vec<String>,
    /// Reports slower than this are stored with zero speed and heading
    pub minimum_speed_kph: f64,
    /// Fill in missing odometer readings from the distance travelled
    pub estimate_odometer: bool,
    pub debug_mode: bool,
    /// Emit decoded events to the sink; when false reports are only returned
    pub insert_events: bool,
    /// Attach the `R=..;S=..` diagnostic string to each report
    pub include_raw_data: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            unique_id_prefixes: DEFAULT_UNIQUE_ID_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            minimum_speed_kph: DEFAULT_MINIMUM_SPEED_KPH,
            estimate_odometer: false,
            debug_mode: false,
            insert_events: true,
            include_raw_data: true,
        }
    }
}

impl HandlerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AstraError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AstraError::Config(format!("invalid handler config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AstraError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), AstraError> {
        if !self.minimum_speed_kph.is_finite() || self.minimum_speed_kph < 0.0 {
            return Err(AstraError::Config(format!(
                "minimum_speed_kph must be a non-negative number, got {}",
                self.minimum_speed_kph
            )));
        }
        if self.unique_id_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(AstraError::Config(
                "unique_id_prefixes must not contain blank entries".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HandlerConfig::default();
        assert_eq!(config.unique_id_prefixes, vec!["astra_", "imei_"]);
        assert_eq!(config.minimum_speed_kph, 5.0);
        assert!(!config.estimate_odometer);
        assert!(config.insert_events);
        assert!(config.include_raw_data);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = HandlerConfig::from_json_str(r#"{"minimum_speed_kph": 4.5}"#).unwrap();
        assert_eq!(config.minimum_speed_kph, 4.5);
        assert_eq!(config.unique_id_prefixes.len(), 2);
    }

    #[test]
    fn test_rejects_negative_speed() {
        let err = HandlerConfig::from_json_str(r#"{"minimum_speed_kph": -1.0}"#).unwrap_err();
        assert!(matches!(err, AstraError::Config(_)));
    }

    #[test]
    fn test_rejects_blank_prefix() {
        assert!(HandlerConfig::from_json_str(r#"{"unique_id_prefixes": [" "]}"#).is_err());
        assert!(HandlerConfig::from_json_str("not json").is_err());
    }
}
