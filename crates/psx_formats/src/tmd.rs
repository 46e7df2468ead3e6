//! TMD model headers and length decoding.

use binrw::{BinRead, BinWrite};
use tracing::trace;

use crate::error::{Error, Result};
use crate::read_at;
use crate::sniff::TMD_TAG;

/// Size of [`TmdHeader`] on disc, including the tag word
pub const HEADER_SIZE: usize = 12;

/// Size of one [`TmdObject`] entry on disc
pub const OBJECT_SIZE: usize = 28;

/// TMD file header
///
/// The tag word `0x41` is followed by the flags word. A flags value of `0`
/// means every pointer in the file is an offset from the object table.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little, magic = 0x41u32)]
pub struct TmdHeader {
    pub flags: u32,
    pub object_count: u32,
}

/// Entry of the object table that directly follows the header
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct TmdObject {
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub normal_offset: u32,
    pub normal_count: u32,

    /// Offset of the primitive list, relative to the start of the object table
    pub primitive_offset: u32,
    pub primitive_count: u32,
    pub scale: i32,
}

/// Leading word of every primitive packet
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct PrimitiveHeader {
    pub olen: u8,

    /// Packet body length in words
    pub ilen: u8,
    pub flag: u8,
    pub mode: u8,
}

impl PrimitiveHeader {
    pub const fn packet_len(&self) -> usize {
        4 + 4 * self.ilen as usize
    }
}

/// Exact length of the TMD starting at `offset`.
///
/// The primitive list of the last object is walked packet by packet; the
/// file ends where that list ends.
pub fn file_size(data: &[u8], offset: usize) -> Result<usize> {
    if crate::sniff::u32_at(data, offset) != Some(TMD_TAG) {
        return Err(Error::SignatureMismatch {
            format: "TMD",
            offset,
        });
    }

    let header: TmdHeader = read_at(data, offset)?;
    if header.flags != 0 {
        return Err(Error::AbsoluteAddresses(offset));
    }
    if header.object_count == 0 {
        return Err(Error::NoObjects(offset));
    }

    let table = offset + HEADER_SIZE;
    let last = (header.object_count as usize - 1)
        .checked_mul(OBJECT_SIZE)
        .and_then(|o| o.checked_add(table))
        .ok_or_else(|| out_of_bounds(data, offset, usize::MAX))?;
    let object: TmdObject = read_at(data, last)?;

    let mut cursor = table
        .checked_add(object.primitive_offset as usize)
        .ok_or_else(|| out_of_bounds(data, offset, usize::MAX))?;
    for _ in 0..object.primitive_count {
        let primitive: PrimitiveHeader = read_at(data, cursor)?;
        cursor += primitive.packet_len();
    }

    if cursor > data.len() {
        return Err(out_of_bounds(data, offset, cursor - offset));
    }

    trace!(offset, length = cursor - offset, "sized TMD");
    Ok(cursor - offset)
}

fn out_of_bounds(data: &[u8], offset: usize, length: usize) -> Error {
    Error::OutOfBounds {
        format: "TMD",
        offset,
        length,
        available: data.len().saturating_sub(offset),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Result;

    #[rustfmt::skip]
    fn two_triangles() -> Vec<u8> {
        vec![
            0x41, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            // object table
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x1C, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // primitives
            0x04, 0x01, 0x00, 0x20, 0xAA, 0xBB, 0xCC, 0xDD,
            0x04, 0x01, 0x00, 0x20, 0x11, 0x22, 0x33, 0x44,
        ]
    }

    #[test]
    fn read_header() -> Result<()> {
        let header: TmdHeader = read_at(&two_triangles(), 0)?;
        assert_eq!(
            header,
            TmdHeader {
                flags: 0,
                object_count: 1
            }
        );
        Ok(())
    }

    #[test]
    fn size_walks_primitives() -> Result<()> {
        let data = two_triangles();
        assert_eq!(file_size(&data, 0)?, 56);
        Ok(())
    }

    #[test]
    fn size_at_offset_ignores_trailing_data() -> Result<()> {
        let mut data = vec![0xEE; 4];
        data.extend(two_triangles());
        data.extend([0xFF; 9]);
        assert_eq!(file_size(&data, 4)?, 56);
        Ok(())
    }

    #[test]
    fn truncated_primitive_list() {
        let data = two_triangles();
        assert!(file_size(&data[..50], 0).is_err());
    }

    #[test]
    fn absolute_addresses_rejected() {
        let mut data = two_triangles();
        data[4] = 1;
        assert!(matches!(
            file_size(&data, 0),
            Err(Error::AbsoluteAddresses(0))
        ));
    }
}
