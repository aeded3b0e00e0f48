//! # Utility Modules
//!
//! Common helpers used throughout the astra-rs crate: the fixed-width field
//! cursor, hex encoding/decoding, and logging patterns.

pub mod field_reader;
pub mod hex;
pub mod logging;

pub use field_reader::{Endian, FieldReader, FieldReaderError};
pub use hex::{encode_hex_upper, format_hex_compact, hex_field, parse_hex_lenient, pretty_hex};
pub use logging::{log_packet_hex, LogThrottle};
