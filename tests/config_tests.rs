//! Loading the handler configuration from JSON files

use astra_rs::{AstraError, HandlerConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"{
            "unique_id_prefixes": ["astra_", "*"],
            "minimum_speed_kph": 3.5,
            "estimate_odometer": true,
            "debug_mode": true,
            "insert_events": false,
            "include_raw_data": false
        }"#,
    );
    let config = HandlerConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.unique_id_prefixes, vec!["astra_", "*"]);
    assert_eq!(config.minimum_speed_kph, 3.5);
    assert!(config.estimate_odometer);
    assert!(config.debug_mode);
    assert!(!config.insert_events);
    assert!(!config.include_raw_data);
}

#[test]
fn test_empty_object_is_default() {
    let file = write_config("{}");
    let config = HandlerConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config, HandlerConfig::default());
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = HandlerConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, AstraError::Io(_)));
}

#[test]
fn test_invalid_values_rejected() {
    let file = write_config(r#"{"minimum_speed_kph": -2}"#);
    assert!(matches!(
        HandlerConfig::from_json_file(file.path()),
        Err(AstraError::Config(_))
    ));
}

/// Serialized config loads back unchanged
#[test]
fn test_serialized_config_reloads() {
    let config = HandlerConfig {
        unique_id_prefixes: vec!["imei_".to_string()],
        minimum_speed_kph: 1.0,
        ..HandlerConfig::default()
    };
    let file = write_config(&serde_json::to_string(&config).unwrap());
    assert_eq!(HandlerConfig::from_json_file(file.path()).unwrap(), config);
}
