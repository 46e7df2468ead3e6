//! Signature sniffing and length decoding for the PlayStation data formats
//! found inside game disc containers.
//!
//! Containers without a length table ("size-less" MIX files) are split by
//! recognising each member's signature and asking the member's own header how
//! long it is. This crate answers both questions.
//!
//! ## Formats
//!
//! | Format | Signature                      | Length                                             |
//! |--------|--------------------------------|----------------------------------------------------|
//! | TMD    | `41 00 00 00`, flags `0`       | 12 + primitive offset + Σ (4 + 4 × ilen)           |
//! | TIM    | `10 00 00 00`, flags `1..=15`  | 8 + first block (+ second block for CLUT modes)    |
//! | VH     | `pBAV`                         | 32 + 128 × 16 + programs × 16 × 32 + 512           |
//! | VB     | sixteen zero bytes             | VH total size − VH length                          |
//! | MO/MIM | word at 8 points at a TMD tag  | word at 0                                          |
//! | SEQ    | `pQES`                         | not encoded                                        |
//! | EXE    | `PS-X EXE`                     | not needed                                         |
//!
//! All multi-byte values are little endian.
//!
//! ### TMD
//!
//! | Offset | Field        | Description                                 |
//! |--------|--------------|---------------------------------------------|
//! | 0x00   | Tag          | 4 bytes: `0x41`                             |
//! | 0x04   | Flags        | 4 bytes: `0` when pointers are offsets      |
//! | 0x08   | Object count | 4 bytes                                     |
//! | 0x0C   | Objects      | 28 bytes each, primitive offset at +0x10    |
//!
//! Primitive offsets are relative to the object table. Each primitive packet
//! starts with `olen, ilen, flag, mode` and is `4 + 4 × ilen` bytes long.
//!
//! ### TIM
//!
//! | Offset | Field        | Description                                 |
//! |--------|--------------|---------------------------------------------|
//! | 0x00   | Tag          | 4 bytes: `0x10`                             |
//! | 0x04   | Flags        | 4 bytes: pixel mode in the low three bits   |
//! | 0x08   | Block        | `length, x, y, h, w`; `length` covers itself|
//!
//! Pixel modes `0` and `1` carry a palette block before the pixel block.

use std::io::Cursor;

use binrw::BinRead;

pub mod error;
pub mod mo;
pub mod sniff;
pub mod tim;
pub mod tmd;
pub mod vab;

pub use sniff::{sniff, Signature};

/// Read a little endian structure at `offset`, failing if it runs past the end
pub fn read_at<T>(data: &[u8], offset: usize) -> error::Result<T>
where
    T: BinRead,
    for<'a> T::Args<'a>: Default,
{
    let mut cursor = Cursor::new(data);
    cursor.set_position(offset as u64);
    Ok(T::read_le(&mut cursor)?)
}
