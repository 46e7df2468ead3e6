//! VAB sound bank header decoding.
//!
//! A VAB is split on disc into a header part (`.VH`, program and tone
//! attributes) and a body part (`.VB`, ADPCM waveforms). Only the header
//! carries sizes.

use binrw::{BinRead, BinWrite};

use crate::error::{Error, Result};
use crate::read_at;

/// Bytes before the program attribute table
pub const HEADER_SIZE: usize = 32;

/// Program attributes are always present for 128 programs
pub const PROGRAM_SLOTS: usize = 128;
pub const PROGRAM_ATTR_SIZE: usize = 16;

/// Each used program carries 16 tone attributes
pub const TONES_PER_PROGRAM: usize = 16;
pub const TONE_ATTR_SIZE: usize = 32;

/// Waveform address table
pub const VAG_TABLE_SIZE: usize = 512;

#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little, magic = b"pBAV")]
pub struct VabHeader {
    pub version: u32,
    pub id: u32,

    /// Header plus body
    pub total_size: u32,
    pub reserved0: u16,
    pub program_count: u16,
    pub tone_count: u16,
    pub vag_count: u16,
    pub master_volume: u8,
    pub master_pan: u8,
    pub bank_attr1: u8,
    pub bank_attr2: u8,
    pub reserved1: u32,
}

impl VabHeader {
    /// Length of the `.VH` part
    pub fn header_size(&self) -> usize {
        HEADER_SIZE
            + PROGRAM_SLOTS * PROGRAM_ATTR_SIZE
            + self.program_count as usize * TONES_PER_PROGRAM * TONE_ATTR_SIZE
            + VAG_TABLE_SIZE
    }

    /// Length of the `.VB` part, `None` when the header claims less than itself
    pub fn body_size(&self) -> Option<usize> {
        (self.total_size as usize).checked_sub(self.header_size())
    }
}

/// Lengths of the header and body parts of the VAB at `offset`
pub fn split_sizes(data: &[u8], offset: usize) -> Result<(usize, usize)> {
    let header: VabHeader = read_at(data, offset)?;
    let header_size = header.header_size();
    let body_size = header.body_size().ok_or(Error::OutOfBounds {
        format: "VAB",
        offset,
        length: header_size,
        available: header.total_size as usize,
    })?;

    Ok((header_size, body_size))
}
