// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS serialized-payload encapsulation header.
//!
//! Layout: `[0x00, representation-id, 0x00, 0x00]`. Bit 0 of the
//! representation id selects little-endian; the upper bits select the CDR
//! profile. Bytes 2-3 are the (reserved) options field.

use crate::cdr::{CdrError, CdrResult};
use crate::cursor::Endianness;

pub const HEADER_LEN: usize = 4;

pub const CDR_BE: u8 = 0x00;
pub const CDR_LE: u8 = 0x01;
pub const CDR2_BE: u8 = 0x06;
pub const CDR2_LE: u8 = 0x07;

/// CDR serialization profile. Only the plain/final layouts are supported;
/// parameter-list forms are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CdrProfile {
    /// Classic CDR (XCDR1 plain).
    #[default]
    Cdr1,
    /// XCDR2 plain ("final" extensibility subset).
    Xcdr2,
}

impl CdrProfile {
    /// Maximum effective alignment: XCDR2 aligns 8-byte primitives to 4.
    pub fn max_align(self) -> usize {
        match self {
            Self::Cdr1 => 8,
            Self::Xcdr2 => 4,
        }
    }

    pub fn representation_id(self, endianness: Endianness) -> u8 {
        match (self, endianness) {
            (Self::Cdr1, Endianness::Big) => CDR_BE,
            (Self::Cdr1, Endianness::Little) => CDR_LE,
            (Self::Xcdr2, Endianness::Big) => CDR2_BE,
            (Self::Xcdr2, Endianness::Little) => CDR2_LE,
        }
    }
}

/// Build the 4-byte encapsulation header.
pub fn header(profile: CdrProfile, endianness: Endianness) -> [u8; HEADER_LEN] {
    [0x00, profile.representation_id(endianness), 0x00, 0x00]
}

/// Parse an encapsulation header, recovering profile and byte order.
pub fn parse_header(bytes: &[u8]) -> CdrResult<(CdrProfile, Endianness)> {
    if bytes.len() < HEADER_LEN {
        return Err(CdrError::Underflow {
            need: HEADER_LEN,
            have: bytes.len(),
        });
    }
    let (profile, endianness) = match bytes[1] {
        CDR_BE => (CdrProfile::Cdr1, Endianness::Big),
        CDR_LE => (CdrProfile::Cdr1, Endianness::Little),
        CDR2_BE => (CdrProfile::Xcdr2, Endianness::Big),
        CDR2_LE => (CdrProfile::Xcdr2, Endianness::Little),
        other => {
            return Err(CdrError::Malformed(format!(
                "unknown representation identifier 0x{:02x}",
                other
            )))
        }
    };
    Ok((profile, endianness))
}
