//! # FieldReader - Fixed-Width Integer Cursor
//!
//! This module provides a cursor over a window of a packet buffer that decodes
//! fixed-width unsigned and signed integer fields, big-endian by default.
//!
//! ## Features
//!
//! - 1 to 4 byte unsigned and signed reads, plus a widened 64-bit unsigned read
//! - Caller-selected byte order per read
//! - The window is fixed at construction: reading past it is an error, never a default
//!
//! ## Usage
//!
//! ```rust
//! use astra_rs::util::field_reader::{Endian, FieldReader};
//!
//! let data = [0x4B, 0x00, 0x31, 0xFF, 0x02, 0x01];
//! let mut reader = FieldReader::new(&data, 1, 5).unwrap();
//! assert_eq!(reader.read_uint(2, Endian::Big).unwrap(), 0x31);
//! assert_eq!(reader.read_int(1, Endian::Big).unwrap(), -1);
//! assert_eq!(reader.read_uint(2, Endian::Little).unwrap(), 0x0102);
//! assert!(reader.read_uint(1, Endian::Big).is_err());
//! ```

use nom::number::complete::{
    be_i16, be_i24, be_i32, be_u16, be_u24, be_u32, i8 as nom_i8, le_i16, le_i24, le_i32,
    le_u16, le_u24, le_u32, u8 as nom_u8,
};
use nom::IResult;
use thiserror::Error;

/// Errors that can occur during FieldReader operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldReaderError {
    #[error("Read out of range: offset {offset} + {width} bytes exceeds window end {end}")]
    OutOfRange {
        offset: usize,
        width: usize,
        end: usize,
    },

    #[error("Unsupported field width: {0} bytes")]
    UnsupportedWidth(usize),

    #[error("Field decode failed at offset {0}")]
    Decode(usize),
}

/// Byte order of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

/// Cursor over `buffer[offset..offset + len]`
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    buffer: &'a [u8],
    position: usize,
    end: usize,
}

impl<'a> FieldReader<'a> {
    /// Create a reader over `len` bytes starting at `offset`.
    ///
    /// Fails if the window does not lie inside `buffer`.
    pub fn new(buffer: &'a [u8], offset: usize, len: usize) -> Result<Self, FieldReaderError> {
        let end = offset.checked_add(len).ok_or(FieldReaderError::OutOfRange {
            offset,
            width: len,
            end: buffer.len(),
        })?;
        if end > buffer.len() {
            return Err(FieldReaderError::OutOfRange {
                offset,
                width: len,
                end: buffer.len(),
            });
        }
        Ok(Self {
            buffer,
            position: offset,
            end,
        })
    }

    /// Bytes left in the window
    pub fn remaining(&self) -> usize {
        self.end - self.position
    }

    fn take(&mut self, width: usize) -> Result<&'a [u8], FieldReaderError> {
        if width > self.remaining() {
            return Err(FieldReaderError::OutOfRange {
                offset: self.position,
                width,
                end: self.end,
            });
        }
        let start = self.position;
        self.position += width;
        Ok(&self.buffer[start..start + width])
    }

    /// Read `width` (1-4) bytes as an unsigned integer.
    pub fn read_uint(&mut self, width: usize, endian: Endian) -> Result<u32, FieldReaderError> {
        if !(1..=4).contains(&width) {
            return Err(FieldReaderError::UnsupportedWidth(width));
        }
        let at = self.position;
        let input = self.take(width)?;
        let parsed: IResult<&[u8], u32> = match (width, endian) {
            (1, _) => nom_u8(input).map(|(i, v)| (i, u32::from(v))),
            (2, Endian::Big) => be_u16(input).map(|(i, v)| (i, u32::from(v))),
            (2, Endian::Little) => le_u16(input).map(|(i, v)| (i, u32::from(v))),
            (3, Endian::Big) => be_u24(input),
            (3, Endian::Little) => le_u24(input),
            (4, Endian::Big) => be_u32(input),
            _ => le_u32(input),
        };
        parsed
            .map(|(_, value)| value)
            .map_err(|_| FieldReaderError::Decode(at))
    }

    /// Read `width` (1-4) bytes as a two's complement signed integer.
    pub fn read_int(&mut self, width: usize, endian: Endian) -> Result<i32, FieldReaderError> {
        if !(1..=4).contains(&width) {
            return Err(FieldReaderError::UnsupportedWidth(width));
        }
        let at = self.position;
        let input = self.take(width)?;
        let parsed: IResult<&[u8], i32> = match (width, endian) {
            (1, _) => nom_i8(input).map(|(i, v)| (i, i32::from(v))),
            (2, Endian::Big) => be_i16(input).map(|(i, v)| (i, i32::from(v))),
            (2, Endian::Little) => le_i16(input).map(|(i, v)| (i, i32::from(v))),
            (3, Endian::Big) => be_i24(input),
            (3, Endian::Little) => le_i24(input),
            (4, Endian::Big) => be_i32(input),
            _ => le_i32(input),
        };
        parsed
            .map(|(_, value)| value)
            .map_err(|_| FieldReaderError::Decode(at))
    }

    /// Read `width` (1-4) bytes as an unsigned integer widened to 64 bits.
    pub fn read_ulong(&mut self, width: usize, endian: Endian) -> Result<u64, FieldReaderError> {
        self.read_uint(width, endian).map(u64::from)
    }

    /// Read `count` single-byte unsigned samples.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, FieldReaderError> {
        self.take(count).map(<[u8]>::to_vec)
    }
}
