//! TIM image headers and length decoding.

use binrw::{BinRead, BinWrite};
use derive_more::Display;

use crate::error::{Error, Result};
use crate::read_at;

/// TIM file header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little, magic = 0x10u32)]
pub struct TimHeader {
    pub flags: u32,
}

impl TimHeader {
    pub fn pixel_mode(&self) -> PixelMode {
        match self.flags & 7 {
            0 => PixelMode::Clut4Bit,
            1 => PixelMode::Clut8Bit,
            2 => PixelMode::Direct15Bit,
            3 => PixelMode::Direct24Bit,
            _ => PixelMode::Mixed,
        }
    }

    /// Whether a palette block precedes the pixel block
    pub fn has_clut(&self) -> bool {
        matches!(self.pixel_mode(), PixelMode::Clut4Bit | PixelMode::Clut8Bit)
    }
}

#[derive(Display, Debug, Copy, Clone, PartialEq, Eq)]
pub enum PixelMode {
    #[display("4-bit CLUT")]
    Clut4Bit,
    #[display("8-bit CLUT")]
    Clut8Bit,
    #[display("15-bit direct")]
    Direct15Bit,
    #[display("24-bit direct")]
    Direct24Bit,
    #[display("mixed")]
    Mixed,
}

/// Header of a palette or pixel block. `length` includes this header.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct BlockHeader {
    pub length: u32,
    pub x: u16,
    pub y: u16,
    pub height: u16,
    pub width: u16,
}

/// Exact length of the TIM starting at `offset`
pub fn file_size(data: &[u8], offset: usize) -> Result<usize> {
    let header: TimHeader = read_at(data, offset)?;

    let first: BlockHeader = read_at(data, offset + 8)?;
    let mut length = 8 + first.length as usize;

    if header.has_clut() {
        let second: BlockHeader = read_at(data, offset + length)?;
        length += second.length as usize;
    }

    if offset + length > data.len() {
        return Err(Error::OutOfBounds {
            format: "TIM",
            offset,
            length,
            available: data.len().saturating_sub(offset),
        });
    }

    Ok(length)
}
