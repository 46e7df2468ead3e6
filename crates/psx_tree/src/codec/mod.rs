//! Splitting container files into members and joining them back.
//!
//! Decoding is a one shot pass over a container's bytes that yields its
//! members in on-disc order plus whatever layout state is needed to write them
//! back ([`ContainerKind`]). Encoding is the inverse and never looks at the
//! members' contents beyond their length, except for the checksum that sector
//! indexed members carry.

mod mix;
mod morph;
mod sector;

use psx_formats::sniff;
use tracing::instrument;

use crate::error::Result;
use crate::types::{DataType, FileFormat};

pub use sector::{padded_len, SectorIndexTable, SECTOR_SIZE};

/// One member produced by decoding a container
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub data: Vec<u8>,
    pub payload: DataType,
}

impl Member {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        let payload = guess_payload(&data);
        Self { data, payload }
    }

    pub(crate) fn with_payload(data: Vec<u8>, payload: DataType) -> Self {
        Self { data, payload }
    }
}

/// Layout of a decoded container.
///
/// `tail` holds bytes after the last member that could not be attributed to
/// one (padding, or data behind a sentinel). It is written back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerKind {
    /// `u32` length before every member, a zero length ends the list
    MixSized { tail: Vec<u8> },
    /// Members back to back, lengths come from their own headers
    MixSizeless { tail: Vec<u8> },
    /// `u16` sector index table in the first sector
    SectorIndexed(SectorIndexTable),
    /// `u32` count, then members whose first word is their own length
    MorphList { tail: Vec<u8> },
}

impl ContainerKind {
    pub fn format(&self) -> FileFormat {
        match self {
            ContainerKind::MixSized { .. } | ContainerKind::MixSizeless { .. } => FileFormat::Mix,
            ContainerKind::SectorIndexed(_) => FileFormat::T,
            ContainerKind::MorphList { .. } => FileFormat::MimList,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::MixSized { .. } => "sized MIX",
            ContainerKind::MixSizeless { .. } => "size-less MIX",
            ContainerKind::SectorIndexed(_) => "T",
            ContainerKind::MorphList { .. } => "MIM list",
        }
    }

    /// Serialize `members` in this layout
    #[instrument(skip_all, err, fields(kind = self.name(), members = members.len()))]
    pub fn encode(&self, members: &[&[u8]]) -> Result<Vec<u8>> {
        match self {
            ContainerKind::MixSized { tail } => mix::encode_sized(members, tail),
            ContainerKind::MixSizeless { tail } => Ok(mix::encode_sizeless(members, tail)),
            ContainerKind::SectorIndexed(table) => sector::encode(table, members),
            ContainerKind::MorphList { tail } => morph::encode(members, tail),
        }
    }
}

/// Split `data` according to `format`.
///
/// Returns `None` for formats that are not containers.
#[instrument(skip(data), err, fields(size = data.len()))]
pub fn decode(
    name: &str,
    format: FileFormat,
    data: &[u8],
) -> Result<Option<(ContainerKind, Vec<Member>)>> {
    let decoded = match format {
        FileFormat::Mix if mix::is_sizeless(data) => {
            let (members, tail) = mix::decode_sizeless(name, data)?;
            (ContainerKind::MixSizeless { tail }, members)
        }
        FileFormat::Mix => {
            let (members, tail) = mix::decode_sized(data)?;
            (ContainerKind::MixSized { tail }, members)
        }
        FileFormat::T => {
            let (table, members) = sector::decode(data)?;
            (ContainerKind::SectorIndexed(table), members)
        }
        FileFormat::MimList => {
            let (members, tail) = morph::decode(data)?;
            (ContainerKind::MorphList { tail }, members)
        }
        FileFormat::Folder | FileFormat::Raw | FileFormat::Root => return Ok(None),
    };

    Ok(Some(decoded))
}

fn guess_payload(data: &[u8]) -> DataType {
    if sniff::is_tim(data) {
        DataType::Texture
    } else if sniff::is_tmd(data) || sniff::is_mim(data) {
        DataType::Model
    } else if sniff::is_vh(data) {
        DataType::SoundBankHeader
    } else if sniff::is_seq(data) {
        DataType::MusicSequence
    } else {
        DataType::Unknown
    }
}
