use std::io::{Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::{debug, trace};

use super::Member;
use crate::checksum;
use crate::error::{Error, Result};

pub const SECTOR_SIZE: usize = 2048;

/// `len` rounded up to a whole number of sectors
pub const fn padded_len(len: usize) -> usize {
    len.div_ceil(SECTOR_SIZE) * SECTOR_SIZE
}

/// Nominal to true member mapping of a T file.
///
/// The on-disc table may list the same sector several times. Every listed
/// slot is a nominal index; every distinct consecutive offset is one true
/// member. The last offset is the terminal and only bounds the last member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorIndexTable {
    nominal: Vec<usize>,
    offsets: Vec<usize>,
}

impl SectorIndexTable {
    /// Build a table from raw sector entries, folding consecutive duplicates
    pub fn from_sectors(entries: &[u16]) -> Self {
        let mut nominal = Vec::with_capacity(entries.len());
        let mut offsets: Vec<usize> = Vec::new();

        for sector in entries {
            let offset = *sector as usize * SECTOR_SIZE;
            if offsets.last() != Some(&offset) {
                offsets.push(offset);
            }
            nominal.push(offsets.len() - 1);
        }

        Self { nominal, offsets }
    }

    /// True member a nominal index refers to. The terminal has no member.
    pub fn true_index(&self, nominal: usize) -> Option<usize> {
        self.nominal
            .get(nominal)
            .copied()
            .filter(|index| *index < self.member_count())
    }

    /// Number of slots in the table, terminal included
    pub fn nominal_count(&self) -> usize {
        self.nominal.len()
    }

    pub fn member_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// `(nominal, true)` pairs in table order
    pub fn mapping(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nominal.iter().copied().enumerate()
    }

    /// Byte offsets of every member plus the terminal
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
}

pub(super) fn decode(data: &[u8]) -> Result<(SectorIndexTable, Vec<Member>)> {
    let mut cursor = Cursor::new(data);
    let count = cursor.read_u16::<LittleEndian>()?;

    let mut entries = Vec::with_capacity(count as usize + 1);
    let mut terminated = true;
    for _ in 0..=count {
        match cursor.read_u16::<LittleEndian>() {
            Ok(0) | Err(_) => {
                terminated = false;
                break;
            }
            Ok(sector) => entries.push(sector),
        }
    }

    let mut table = SectorIndexTable::from_sectors(&entries);
    if !terminated && table.offsets.last().is_some_and(|last| *last < data.len()) {
        // table ended early, the data itself bounds the last member
        debug!(entries = entries.len(), count, "short T index, bounding by data");
        table.offsets.push(data.len());
        table.nominal.push(table.offsets.len() - 1);
    }

    let mut members = Vec::with_capacity(table.member_count());
    for pair in table.offsets.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end > data.len() || end < start {
            return Err(Error::TruncatedMember {
                offset: start,
                length: end.saturating_sub(start),
                available: data.len().saturating_sub(start),
            });
        }
        members.push(Member::new(data[start..end].to_vec()));
    }

    trace!(
        nominal = table.nominal_count(),
        members = members.len(),
        "decoded T"
    );
    Ok((table, members))
}

pub(super) fn encode(table: &SectorIndexTable, members: &[&[u8]]) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut sectors = Vec::with_capacity(members.len() + 1);
    let mut next = 1usize;

    for member in members {
        sectors.push(sector_number(next)?);

        let mut copy = member.to_vec();
        checksum::recalculate(&mut copy);
        copy.resize(padded_len(copy.len()), 0);

        next += copy.len() / SECTOR_SIZE;
        body.extend(copy);
    }
    sectors.push(sector_number(next)?);

    let expanded = table
        .nominal
        .iter()
        .enumerate()
        .map(|(nominal, index)| {
            sectors
                .get(*index)
                .copied()
                .ok_or(Error::MissingNominalIndex {
                    nominal,
                    index: *index,
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let table_len = 2 + expanded.len() * 2;
    if table_len > SECTOR_SIZE {
        return Err(Error::SectorTableOverflow(table_len));
    }

    let mut out = Vec::with_capacity(SECTOR_SIZE + body.len());
    let count = expanded.len().saturating_sub(1);
    out.write_u16::<LittleEndian>(count as u16)?;
    for sector in &expanded {
        out.write_u16::<LittleEndian>(*sector)?;
    }
    out.resize(SECTOR_SIZE, 0);
    out.write_all(&body)?;

    Ok(out)
}

fn sector_number(sector: usize) -> Result<u16> {
    u16::try_from(sector).map_err(|_| Error::SectorOutOfRange(sector))
}
