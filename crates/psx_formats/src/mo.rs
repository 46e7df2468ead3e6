//! Morph animation (MO / MIM) headers.

use binrw::{BinRead, BinWrite};

use crate::error::{Error, Result};
use crate::read_at;
use crate::sniff::u32_at;

/// Leading offsets of an MO or MIM file, all relative to its start
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct MoHeader {
    /// Total file length, header included
    pub size: u32,
    pub animation_count: u32,
    pub tmd_offset: u32,
    pub morph_table_offset: u32,
    pub animation_table_offset: u32,
    pub first_animation_offset: u32,
}

impl MoHeader {
    /// Number of morph targets, derived from the gap between the table and
    /// the first target it points at
    pub fn target_count(&self, data: &[u8], offset: usize) -> Result<u32> {
        let table = offset + self.morph_table_offset as usize;
        let first = u32_at(data, table).ok_or(Error::OutOfBounds {
            format: "MO",
            offset,
            length: table + 4 - offset,
            available: data.len().saturating_sub(offset),
        })?;

        Ok((first.wrapping_sub(self.morph_table_offset).wrapping_add(3) & !3) / 4)
    }
}

/// Declared length of the MO or MIM at `offset`
pub fn file_size(data: &[u8], offset: usize) -> Result<usize> {
    let header: MoHeader = read_at(data, offset)?;
    Ok(header.size as usize)
}
