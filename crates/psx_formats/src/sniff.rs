//! Signature predicates for PlayStation data.
//!
//! Every predicate is total: a buffer that is too short to hold the bytes a
//! check needs is simply not a match. Nothing here allocates or errors.

use byteorder::{ByteOrder, LittleEndian};
use derive_more::Display;

/// Tag word of a TMD model
pub const TMD_TAG: u32 = 0x41;

/// Tag word of a TIM image
pub const TIM_TAG: u32 = 0x10;

/// "pBAV" read as a little endian word
pub const VH_TAG: u32 = 0x5641_4270;

/// "pQES" as it appears on disc
pub const SEQ_MAGIC: &[u8; 4] = b"pQES";

/// Executable header magic
pub const EXE_MAGIC: &[u8; 8] = b"PS-X EXE";

pub(crate) fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset.checked_add(4)?)
        .map(LittleEndian::read_u32)
}

fn u32_at_u32(data: &[u8], offset: u32) -> Option<u32> {
    u32_at(data, usize::try_from(offset).ok()?)
}

fn starts_with(data: &[u8], bytes: &[u8]) -> bool {
    data.get(..bytes.len()) == Some(bytes)
}

/// TMD tag followed by a zero flags word (offsets, not absolute addresses)
pub fn is_tmd(data: &[u8]) -> bool {
    u32_at(data, 0) == Some(TMD_TAG) && u32_at(data, 4) == Some(0)
}

/// TIM tag, a flags byte in `1..=15` and three zero bytes after it
pub fn is_tim(data: &[u8]) -> bool {
    u32_at(data, 0) == Some(TIM_TAG)
        && matches!(data.get(4), Some(1..=15))
        && data.get(5..8) == Some(&[0, 0, 0][..])
}

/// A TIM header repeated twice. Only meaningful once [`is_tim`] has failed.
pub fn is_rtim(data: &[u8]) -> bool {
    match (data.get(0..8), data.get(8..16)) {
        (Some(first), Some(second)) => first == second && first[4..8] != first[0..4],
        _ => false,
    }
}

/// Four zero bytes followed by a `0x12` or `0x10` word
pub fn is_rtmd(data: &[u8]) -> bool {
    u32_at(data, 0) == Some(0) && matches!(u32_at(data, 4), Some(0x12 | 0x10))
}

/// The word at 8 points at a TMD tag
pub fn is_mo(data: &[u8]) -> bool {
    u32_at(data, 8)
        .and_then(|offset| usize::try_from(offset).ok())
        .and_then(|offset| data.get(offset))
        == Some(&(TMD_TAG as u8))
}

/// Morph animation list with 16-bit frame counts.
///
/// Shares its layout with MO, so the animation table is used to tell them
/// apart.
pub fn is_mim(data: &[u8]) -> bool {
    if !is_mo(data) {
        return false;
    }

    let Some(anim_count) = u32_at(data, 4) else {
        return false;
    };

    match anim_count {
        0 => true,
        1 => {
            let target_vertices = u32_at(data, 0x0C)
                .and_then(|table| u32_at_u32(data, table))
                .and_then(|target| u32_at_u32(data, target.checked_add(8)?));
            // 12 byte TMD header plus the vertex pointer of the first object
            let mesh_vertices =
                u32_at(data, 8).and_then(|tmd| u32_at_u32(data, tmd.checked_add(16)?));

            target_vertices.is_some() && target_vertices == mesh_vertices
        }
        _ => u32_at(data, 0x14)
            .and_then(|anim| u32_at_u32(data, anim))
            .is_some_and(|frames| frames > 0xFFFF),
    }
}

/// VAB header, "pBAV"
pub fn is_vh(data: &[u8]) -> bool {
    u32_at(data, 0) == Some(VH_TAG)
}

/// VAB body, sixteen zero bytes
pub fn is_vb(data: &[u8]) -> bool {
    data.get(..16).is_some_and(|head| head.iter().all(|b| *b == 0))
}

/// SEQ sequence, "pQES"
pub fn is_seq(data: &[u8]) -> bool {
    starts_with(data, SEQ_MAGIC)
}

/// Executable, "PS-X EXE"
pub fn is_psx_exe(data: &[u8]) -> bool {
    starts_with(data, EXE_MAGIC)
}

pub fn is_map_tile(data: &[u8]) -> bool {
    starts_with(data, &[0x00, 0xFA, 0x00, 0x00])
}

pub fn is_map_database(data: &[u8]) -> bool {
    starts_with(data, &[0xC0, 0x32, 0x00, 0x00])
}

/// Table of pointers whose high bytes are `0x80`
pub fn is_map_script(data: &[u8]) -> bool {
    let Some(head) = data.get(..0x20) else {
        return false;
    };

    head[0x03] == 0x80
        && head[0x07] == head[0x0B]
        && head[0x0B] == head[0x0F]
        && head[0x13] == head[0x17]
        && head[0x17] == head[0x1B]
        && head[0x1B] == head[0x1F]
}

/// Game database of the first title
pub fn is_kf1_game_database(data: &[u8]) -> bool {
    starts_with(data, &[0xA4, 0x01, 0x00, 0x00, 0xA4, 0x01, 0x00, 0x00])
}

/// Game database of the second title
pub fn is_kf2_game_database(data: &[u8]) -> bool {
    const WEAPON: [u8; 6] = [0x40, 0x10, 0xFF, 0x00, 0x00, 0x00];

    data.get(4..10) == Some(&WEAPON[..])
        && data.get(20..28) == Some(&[0u8; 8][..])
        && data.get(28..34) == Some(&WEAPON[..])
}

/// Best guess at what a buffer holds
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    #[display("PS-X executable")]
    Executable,
    #[display("TMD model")]
    Tmd,
    #[display("TIM image")]
    Tim,
    #[display("doubled TIM image")]
    Rtim,
    #[display("RTMD model")]
    Rtmd,
    #[display("MIM animation")]
    Mim,
    #[display("MO animation")]
    Mo,
    #[display("map tiles")]
    MapTile,
    #[display("map database")]
    MapDatabase,
    #[display("map script")]
    MapScript,
    #[display("game database")]
    GameDatabase,
    #[display("unknown")]
    Unknown,
}

impl Signature {
    /// Extension used when a buffer is written out on its own
    pub const fn extension(&self) -> &'static str {
        match self {
            Signature::Executable => "exe",
            Signature::Tmd => "tmd",
            Signature::Tim => "tim",
            Signature::Rtim => "rtim",
            Signature::Rtmd => "rtmd",
            Signature::Mim => "mim",
            Signature::Mo => "mo",
            Signature::MapTile => "maptile",
            Signature::MapDatabase => "mapdb",
            Signature::MapScript => "mapscript",
            Signature::GameDatabase => "gamedb",
            Signature::Unknown => "data",
        }
    }
}

/// Classify a buffer. Checks run in a fixed order and the first hit wins.
pub fn sniff(data: &[u8]) -> Signature {
    if is_psx_exe(data) {
        Signature::Executable
    } else if is_tmd(data) {
        Signature::Tmd
    } else if is_tim(data) {
        Signature::Tim
    } else if is_rtim(data) {
        Signature::Rtim
    } else if is_rtmd(data) {
        Signature::Rtmd
    } else if is_mim(data) {
        Signature::Mim
    } else if is_mo(data) {
        Signature::Mo
    } else if is_map_tile(data) {
        Signature::MapTile
    } else if is_map_database(data) {
        Signature::MapDatabase
    } else if is_map_script(data) {
        Signature::MapScript
    } else if is_kf1_game_database(data) || is_kf2_game_database(data) {
        Signature::GameDatabase
    } else {
        Signature::Unknown
    }
}
