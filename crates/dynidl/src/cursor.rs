// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors over CDR payloads.
//!
//! Alignment is computed relative to the payload origin (the first byte
//! after any encapsulation header), never the absolute buffer start. The
//! write cursor grows its buffer; the read cursor is bounds-checked and
//! fails with [`CdrError::Underflow`] on over-read.

use crate::cdr::{CdrError, CdrResult};

/// Payload byte order, chosen once per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Generate write methods for primitive types (eliminates code duplication)
///
/// Each generated method:
/// 1. Aligns to the primitive's natural width (clamped to `max_align`)
/// 2. Converts the value to bytes in the selected byte order
/// 3. Appends the bytes, growing the buffer as needed
macro_rules! impl_write {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self, value: $type) {
            self.align($size);
            let bytes = match self.endianness {
                Endianness::Little => value.to_le_bytes(),
                Endianness::Big => value.to_be_bytes(),
            };
            self.buf.extend_from_slice(&bytes);
        }
    };
}

/// Generate read methods for primitive types (eliminates code duplication)
///
/// Each generated method:
/// 1. Aligns to the primitive's natural width (clamped to `max_align`)
/// 2. Checks buffer bounds (returns `CdrError::Underflow` on overflow)
/// 3. Converts the bytes in the selected byte order and advances the offset
macro_rules! impl_read {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> CdrResult<$type> {
            self.align($size);
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.take($size)?);
            Ok(match self.endianness {
                Endianness::Little => <$type>::from_le_bytes(bytes),
                Endianness::Big => <$type>::from_be_bytes(bytes),
            })
        }
    };
}

/// Growable write cursor.
pub struct CdrWriter {
    buf: Vec<u8>,
    origin: usize,
    endianness: Endianness,
    max_align: usize,
}

impl CdrWriter {
    pub fn new(endianness: Endianness, max_align: usize) -> Self {
        Self {
            buf: Vec::with_capacity(64),
            origin: 0,
            endianness,
            max_align,
        }
    }

    /// Mark the current position as the payload origin. Called after the
    /// encapsulation header so alignment restarts at the first payload byte.
    pub fn mark_payload_start(&mut self) {
        self.origin = self.buf.len();
    }

    /// Offset relative to the payload origin.
    pub fn position(&self) -> usize {
        self.buf.len() - self.origin
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Insert zero padding up to the next multiple of `alignment` relative
    /// to the payload origin. XCDR2 clamps 8-byte alignment to 4.
    pub fn align(&mut self, alignment: usize) {
        let alignment = alignment.min(self.max_align);
        if alignment <= 1 {
            return;
        }
        let pos = self.position();
        let padding = (alignment - (pos % alignment)) % alignment;
        self.buf.extend(std::iter::repeat_n(0u8, padding));
    }

    impl_write!(write_u8, u8, 1);
    impl_write!(write_u16, u16, 2);
    impl_write!(write_u32, u32, 4);
    impl_write!(write_u64, u64, 8);
    impl_write!(write_i8, i8, 1);
    impl_write!(write_i16, i16, 2);
    impl_write!(write_i32, i32, 4);
    impl_write!(write_i64, i64, 8);
    impl_write!(write_f32, f32, 4);
    impl_write!(write_f64, f64, 8);

    /// Append raw bytes without alignment.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked read cursor.
pub struct CdrReader<'a> {
    buf: &'a [u8],
    offset: usize,
    endianness: Endianness,
    max_align: usize,
}

impl<'a> CdrReader<'a> {
    /// `buf` must start at the payload origin (header already stripped).
    pub fn new(buf: &'a [u8], endianness: Endianness, max_align: usize) -> Self {
        Self {
            buf,
            offset: 0,
            endianness,
            max_align,
        }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Skip padding up to the next multiple of `alignment` relative to the
    /// payload origin. Skipping may land past the end; the following read
    /// reports the underflow.
    pub fn align(&mut self, alignment: usize) {
        let alignment = alignment.min(self.max_align);
        if alignment <= 1 {
            return;
        }
        self.offset = (self.offset + alignment - 1) & !(alignment - 1);
    }

    fn take(&mut self, len: usize) -> CdrResult<&'a [u8]> {
        if self.offset + len > self.buf.len() {
            return Err(CdrError::Underflow {
                need: len,
                have: self.remaining(),
            });
        }
        let slice = &self.buf[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    impl_read!(read_u8, u8, 1);
    impl_read!(read_u16, u16, 2);
    impl_read!(read_u32, u32, 4);
    impl_read!(read_u64, u64, 8);
    impl_read!(read_i8, i8, 1);
    impl_read!(read_i16, i16, 2);
    impl_read!(read_i32, i32, 4);
    impl_read!(read_i64, i64, 8);
    impl_read!(read_f32, f32, 4);
    impl_read!(read_f64, f64, 8);

    /// Read raw bytes without alignment.
    pub fn read_bytes(&mut self, len: usize) -> CdrResult<&'a [u8]> {
        self.take(len)
    }
}
