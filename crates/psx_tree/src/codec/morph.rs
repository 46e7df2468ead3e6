use std::io::{Cursor, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::Member;
use crate::error::{Error, Result};
use crate::types::DataType;

pub(super) fn decode(data: &[u8]) -> Result<(Vec<Member>, Vec<u8>)> {
    let mut cursor = Cursor::new(data);
    let count = cursor.read_u32::<LittleEndian>()?;

    let mut members = Vec::new();
    for _ in 0..count {
        let offset = cursor.position() as usize;
        let length = cursor.read_u32::<LittleEndian>()? as usize;

        let end = offset
            .checked_add(length)
            .filter(|end| length >= 4 && *end <= data.len())
            .ok_or(Error::TruncatedMember {
                offset,
                length,
                available: data.len() - offset,
            })?;

        members.push(Member::with_payload(
            data[offset..end].to_vec(),
            DataType::Model,
        ));
        cursor.set_position(end as u64);
    }

    let rest = &data[cursor.position() as usize..];
    Ok((members, rest.to_vec()))
}

pub(super) fn encode(members: &[&[u8]], tail: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let count = u32::try_from(members.len())
        .map_err(|_| Error::CustomError("too many members".into()))?;
    out.write_u32::<LittleEndian>(count)?;

    for member in members {
        let offset = out.len();
        if member.len() < 4 {
            return Err(Error::TruncatedMember {
                offset,
                length: member.len(),
                available: member.len(),
            });
        }
        let length = u32::try_from(member.len())
            .map_err(|_| Error::CustomError(format!("member at {offset:#X} is too large")))?;

        out.write_all(member)?;
        LittleEndian::write_u32(&mut out[offset..offset + 4], length);
    }
    out.write_all(tail)?;

    Ok(out)
}
