//! # Hex Encoding/Decoding Utilities
//!
//! This module provides the hex helpers used for packet dumps, CLI input and
//! the fixed-width hex fields of the report diagnostic string.
//!
//! ## Usage
//!
//! ```rust
//! use astra_rs::util::hex::{encode_hex_upper, hex_field, parse_hex_lenient};
//!
//! let data = [0x4B, 0x00, 0x31];
//! assert_eq!(encode_hex_upper(&data), "4B0031");
//! assert_eq!(parse_hex_lenient("4b 00 31").unwrap(), data);
//! assert_eq!(hex_field(0x42, 16), "0042");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to uppercase hex string
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Parse hex string that may contain spaces or other separators
///
/// Strips all non-hex characters and an optional `0x` prefix.
pub fn parse_hex_lenient(input: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = input
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    let hex_chars: String = trimmed.chars().filter(|c| c.is_ascii_hexdigit()).collect();

    if hex_chars.is_empty() {
        return Err(HexError::EmptyString);
    }

    if hex_chars.len() % 2 != 0 {
        return Err(HexError::OddLength(hex_chars.len()));
    }

    hex::decode(&hex_chars).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "4b 00 31" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format `value` as uppercase hex, zero padded to `bits / 4` digits.
///
/// Values wider than the field are printed in full.
pub fn hex_field(value: u32, bits: u32) -> String {
    let digits = (bits as usize).div_ceil(4).max(1);
    format!("{:0width$X}", value, width = digits)
}

/// Pretty-print hex data with offsets and an ASCII column
pub fn pretty_hex(data: &[u8], bytes_per_line: usize) -> String {
    if data.is_empty() || bytes_per_line == 0 {
        return String::new();
    }

    data.chunks(bytes_per_line)
        .enumerate()
        .map(|(i, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!(
                "{:04x}: {:<width$} |{}|",
                i * bytes_per_line,
                hex.join(" "),
                ascii,
                width = bytes_per_line * 3 - 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_upper() {
        assert_eq!(encode_hex_upper(&[0xAB, 0xCD, 0xEF]), "ABCDEF");
    }

    #[test]
    fn test_parse_with_whitespace() {
        assert_eq!(parse_hex_lenient("4B 00 31").unwrap(), vec![0x4B, 0x00, 0x31]);
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(parse_hex_lenient("0x4b-00:31").unwrap(), vec![0x4B, 0x00, 0x31]);
        assert_eq!(parse_hex_lenient(""), Err(HexError::EmptyString));
        assert_eq!(parse_hex_lenient("4b0"), Err(HexError::OddLength(3)));
    }

    #[test]
    fn test_hex_field_widths() {
        assert_eq!(hex_field(0x02, 16), "0002");
        assert_eq!(hex_field(0x10, 8), "10");
        assert_eq!(hex_field(0x000100, 24), "000100");
        assert_eq!(hex_field(0x1FF, 8), "1FF");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_hex_compact(&[0x4B, 0x00, 0x31]), "4b 00 31");
    }

    #[test]
    fn test_pretty_hex() {
        let pretty = pretty_hex(b"K\x00\x31abc", 4);
        let lines: Vec<&str> = pretty.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0000: 4b 00 31 61"));
        assert!(lines[0].ends_with("|K.1a|"));
        assert!(lines[1].starts_with("0004: 62 63"));
    }

    #[test]
    fn test_errors() {
        assert!(parse_hex_lenient("   ").is_err());
        assert!(parse_hex_lenient("1").is_err());
        assert_eq!(parse_hex_lenient("GG"), Err(HexError::EmptyString));
    }
}
