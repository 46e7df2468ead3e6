use std::io::{Cursor, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use psx_formats::{mo, read_at, sniff, tim, tmd, vab};
use tracing::{debug, error, warn};

use super::Member;
use crate::error::{Error, Result};
use crate::types::DataType;

/// Remainders this short cannot hold a recognisable header
const MIN_MEMBER: usize = 8;

/// MIX files that open with a self-describing member carry no length prefixes
pub(super) fn is_sizeless(data: &[u8]) -> bool {
    sniff::is_tim(data) || sniff::is_tmd(data) || sniff::is_vh(data) || is_mim_member(data)
}

pub(super) fn decode_sized(data: &[u8]) -> Result<(Vec<Member>, Vec<u8>)> {
    let mut cursor = Cursor::new(data);
    let mut members = Vec::new();

    loop {
        let offset = cursor.position() as usize;
        let rest = &data[offset..];
        if rest.len() < 4 {
            return Ok((members, rest.to_vec()));
        }

        let length = cursor.read_u32::<LittleEndian>()? as usize;
        if length == 0 {
            // padding up to the end of the enclosing sector
            debug!(offset, "zero length ends sized MIX");
            return Ok((members, rest.to_vec()));
        }

        let start = offset + 4;
        let end = start
            .checked_add(length)
            .filter(|end| *end <= data.len())
            .ok_or(Error::TruncatedMember {
                offset,
                length,
                available: data.len() - start,
            })?;

        members.push(Member::new(data[start..end].to_vec()));
        cursor.set_position(end as u64);
    }
}

pub(super) fn decode_sizeless(name: &str, data: &[u8]) -> Result<(Vec<Member>, Vec<u8>)> {
    let mut members = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let rest = &data[offset..];
        if rest.len() <= MIN_MEMBER {
            return Ok((members, rest.to_vec()));
        }

        let (length, payload) = if sniff::is_tim(rest) {
            (tim::file_size(data, offset)?, DataType::Texture)
        } else if sniff::is_tmd(rest) {
            (tmd::file_size(data, offset)?, DataType::Model)
        } else if is_mim_member(rest) {
            let header: mo::MoHeader = read_at(data, offset)?;
            debug!(
                offset,
                animations = header.animation_count,
                targets = ?header.target_count(data, offset).ok(),
                "animation list"
            );
            (mo::file_size(data, offset)?, DataType::Model)
        } else if sniff::is_vh(rest) {
            let (header, body) = vab::split_sizes(data, offset)?;
            if header == 0 {
                return Err(Error::EmptySoundBank {
                    offset,
                    part: "header",
                });
            }
            if body == 0 {
                return Err(Error::EmptySoundBank {
                    offset,
                    part: "body",
                });
            }

            push(
                &mut members,
                data,
                offset,
                header,
                DataType::SoundBankHeader,
            )?;
            offset += header;
            if !data.get(offset..).is_some_and(sniff::is_vb) {
                warn!(
                    container = name,
                    offset, "sound bank body does not open with a silent block"
                );
            }
            (body, DataType::SoundBankBody)
        } else if sniff::is_seq(rest) {
            error!(
                container = name,
                offset, "SEQ found in size-less MIX, no further members will be split"
            );
            return Ok((members, rest.to_vec()));
        } else if rest.iter().all(|b| *b == 0) {
            return Ok((members, rest.to_vec()));
        } else {
            return Err(Error::UnsplittableMember {
                container: name.to_string(),
                offset,
            });
        };

        if length == 0 {
            return Err(Error::UnsplittableMember {
                container: name.to_string(),
                offset,
            });
        }

        push(&mut members, data, offset, length, payload)?;
        offset += length;
    }

    Ok((members, Vec::new()))
}

/// MIM check on a window of the member's own declared length
fn is_mim_member(rest: &[u8]) -> bool {
    let Some(declared) = rest.get(..4).map(LittleEndian::read_u32) else {
        return false;
    };
    let declared = declared as usize;

    sniff::is_mim(&rest[..declared.min(rest.len())])
}

fn push(
    members: &mut Vec<Member>,
    data: &[u8],
    offset: usize,
    length: usize,
    payload: DataType,
) -> Result<()> {
    let end = offset
        .checked_add(length)
        .filter(|end| *end <= data.len())
        .ok_or(Error::TruncatedMember {
            offset,
            length,
            available: data.len() - offset,
        })?;

    debug!(offset, length, %payload, "split member");
    members.push(Member::with_payload(data[offset..end].to_vec(), payload));
    Ok(())
}

pub(super) fn encode_sized(members: &[&[u8]], tail: &[u8]) -> Result<Vec<u8>> {
    let total = members.iter().map(|m| m.len() + 4).sum::<usize>() + tail.len();
    let mut out = Vec::with_capacity(total);

    for (index, member) in members.iter().enumerate() {
        if member.is_empty() {
            warn!(index, "empty member will end the MIX when read back");
        }
        let length = u32::try_from(member.len())
            .map_err(|_| Error::CustomError(format!("member {index} is too large")))?;
        out.write_u32::<LittleEndian>(length)?;
        out.write_all(member)?;
    }
    out.write_all(tail)?;

    Ok(out)
}

pub(super) fn encode_sizeless(members: &[&[u8]], tail: &[u8]) -> Vec<u8> {
    let mut out = members.concat();
    out.extend_from_slice(tail);
    out
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::*;
    use crate::error::Result;

    #[rustfmt::skip]
    fn tmd_then_tim() -> Vec<u8> {
        vec![
            // TMD, one object, two primitives
            0x41, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x1C, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x04, 0x01, 0x00, 0x20, 0xAA, 0xBB, 0xCC, 0xDD,
            0x04, 0x01, 0x00, 0x20, 0x11, 0x22, 0x33, 0x44,
            // TIM, 15-bit direct
            0x10, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x02, 0x00,
            0xFF, 0x7F, 0xFF, 0x7F,
        ]
    }

    #[rustfmt::skip]
    fn animation_list(size: u8) -> Vec<u8> {
        let mut data = vec![
            size, 0x00, 0x00, 0x00,
            // two animations
            0x02, 0x00, 0x00, 0x00,
            // mesh, morph table, animation table, first animation
            0x30, 0x00, 0x00, 0x00,
            0x18, 0x00, 0x00, 0x00,
            0x20, 0x00, 0x00, 0x00,
            0x24, 0x00, 0x00, 0x00,
            // morph table, two targets
            0x20, 0x00, 0x00, 0x00,
            0x28, 0x00, 0x00, 0x00,
            // animation table
            0x24, 0x00, 0x00, 0x00,
            // 16-bit frame count with a non zero high half
            0x03, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // mesh
            0x41, 0x00, 0x00, 0x00,
        ];
        data.resize(0x40, 0);
        data
    }

    /// TIM, animation list, TIM
    fn image_around_animation(size: u8) -> Vec<u8> {
        let image = tmd_then_tim()[56..].to_vec();
        [image.clone(), animation_list(size), image].concat()
    }

    #[test]
    fn sized_stops_at_zero_length() -> Result<()> {
        #[rustfmt::skip]
        let data = vec![
            0x02, 0x00, 0x00, 0x00, 0xAA, 0xBB,
            0x03, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let (members, tail) = decode_sized(&data)?;
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].data, vec![0xAA, 0xBB]);
        assert_eq!(members[1].data, vec![0x01, 0x02, 0x03]);
        assert_eq!(tail, vec![0x00; 6]);

        let slices = members.iter().map(|m| m.data.as_slice()).collect::<Vec<_>>();
        assert_eq!(encode_sized(&slices, &tail)?, data);
        Ok(())
    }

    #[test]
    fn sized_rejects_overrun() {
        let data = vec![0x10, 0x00, 0x00, 0x00, 0xAA];
        assert!(matches!(
            decode_sized(&data),
            Err(Error::TruncatedMember { offset: 0, .. })
        ));
    }

    #[test]
    fn sizeless_mesh_then_image() -> Result<()> {
        let data = tmd_then_tim();
        assert!(is_sizeless(&data));

        let (members, tail) = decode_sizeless("TEST.MIX", &data)?;
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].data.len(), 56);
        assert_eq!(members[0].payload, DataType::Model);
        assert_eq!(members[1].data.len(), 24);
        assert_eq!(members[1].payload, DataType::Texture);
        assert!(tail.is_empty());
        Ok(())
    }

    #[test]
    fn sizeless_is_deterministic() -> Result<()> {
        let data = tmd_then_tim();
        assert_eq!(
            decode_sizeless("TEST.MIX", &data)?,
            decode_sizeless("TEST.MIX", &data)?
        );
        Ok(())
    }

    #[test]
    fn sizeless_keeps_padding() -> Result<()> {
        let mut data = tmd_then_tim();
        data.extend([0u8; 40]);

        let (members, tail) = decode_sizeless("TEST.MIX", &data)?;
        assert_eq!(members.len(), 2);
        assert_eq!(tail.len(), 40);

        let slices = members.iter().map(|m| m.data.as_slice()).collect::<Vec<_>>();
        assert_eq!(encode_sizeless(&slices, &tail), data);
        Ok(())
    }

    #[traced_test]
    #[test]
    fn sizeless_stops_at_sequence() -> Result<()> {
        let mut data = tmd_then_tim();
        data.extend(b"pQES\x00\x00\x00\x01\x01\xE0\x00\x07\xA1\x20");

        let (members, tail) = decode_sizeless("TEST.MIX", &data)?;
        assert_eq!(members.len(), 2);
        assert_eq!(&tail[..4], b"pQES");
        assert!(logs_contain("SEQ found"));
        Ok(())
    }

    #[traced_test]
    #[test]
    fn sizeless_animation_list_member() -> Result<()> {
        let data = image_around_animation(0x40);

        let (members, tail) = decode_sizeless("ANIM.MIX", &data)?;
        let lengths = members.iter().map(|m| m.data.len()).collect::<Vec<_>>();
        assert_eq!(lengths, vec![24, 64, 24]);
        assert_eq!(members[1].payload, DataType::Model);
        assert_eq!(members[1].data, animation_list(0x40));
        assert!(tail.is_empty());
        assert!(logs_contain("animation list"));

        let slices = members.iter().map(|m| m.data.as_slice()).collect::<Vec<_>>();
        assert_eq!(encode_sizeless(&slices, &tail), data);
        Ok(())
    }

    #[test]
    fn animation_list_checked_within_declared_size() {
        // the declared size stops short of the mesh tag
        let data = image_around_animation(0x30);

        assert!(matches!(
            decode_sizeless("ANIM.MIX", &data),
            Err(Error::UnsplittableMember { offset: 24, .. })
        ));
    }

    #[test]
    fn animation_list_opens_sizeless_mix() -> Result<()> {
        let mut data = animation_list(0x40);
        data.extend_from_slice(&tmd_then_tim()[56..]);
        assert!(is_sizeless(&data));
        assert!(!is_sizeless(&animation_list(0x30)));

        let (members, tail) = decode_sizeless("ANIM.MIX", &data)?;
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].payload, DataType::Model);
        assert_eq!(members[1].payload, DataType::Texture);
        assert!(tail.is_empty());
        Ok(())
    }

    #[test]
    fn sizeless_unknown_member_is_fatal() {
        let mut data = tmd_then_tim();
        data.extend([0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x01]);

        let err = decode_sizeless("TEST.MIX", &data).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsplittableMember { offset: 80, .. }
        ));
        assert!(err.is_fatal());
    }

    #[traced_test]
    #[test]
    fn sizeless_splits_sound_bank() -> Result<()> {
        let header_size = 32 + 128 * 16 + 16 * 32 + 512;
        let mut data = b"pBAV".to_vec();
        data.extend([0x07, 0x00, 0x00, 0x00]);
        data.extend([0x00; 4]);
        data.extend(((header_size + 64) as u32).to_le_bytes());
        data.extend([0x00, 0x00, 0x01, 0x00]);
        data.resize(header_size + 64, 0);

        let (members, tail) = decode_sizeless("SOUND.MIX", &data)?;
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].data.len(), header_size);
        assert_eq!(members[0].payload, DataType::SoundBankHeader);
        assert_eq!(members[1].data.len(), 64);
        assert_eq!(members[1].payload, DataType::SoundBankBody);
        assert!(tail.is_empty());
        assert!(!logs_contain("silent block"));
        Ok(())
    }

    #[traced_test]
    #[test]
    fn sizeless_flags_noisy_sound_body() -> Result<()> {
        let header_size = 32 + 128 * 16 + 16 * 32 + 512;
        let mut data = b"pBAV".to_vec();
        data.extend([0x07, 0x00, 0x00, 0x00]);
        data.extend([0x00; 4]);
        data.extend(((header_size + 64) as u32).to_le_bytes());
        data.extend([0x00, 0x00, 0x01, 0x00]);
        data.resize(header_size + 64, 0);
        data[header_size + 2] = 0x7F;

        let (members, _) = decode_sizeless("SOUND.MIX", &data)?;
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].data[2], 0x7F);
        assert!(logs_contain("silent block"));
        Ok(())
    }

    #[test]
    fn sizeless_empty_sound_bank_body() {
        let header_size = 32 + 128 * 16 + 512;
        let mut data = b"pBAV".to_vec();
        data.extend([0x07, 0x00, 0x00, 0x00]);
        data.extend([0x00; 4]);
        data.extend((header_size as u32).to_le_bytes());
        data.resize(header_size + 16, 0);

        assert!(matches!(
            decode_sizeless("SOUND.MIX", &data),
            Err(Error::EmptySoundBank { part: "body", .. })
        ));
    }
}
