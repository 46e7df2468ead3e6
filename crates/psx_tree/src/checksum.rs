//! Trailing checksum word carried by every member of a sector indexed
//! container.
//!
//! The last little endian word of a member holds the wrapping sum of every
//! word before it, seeded with [`CHECKSUM_SEED`].

use byteorder::{ByteOrder, LittleEndian};

pub const CHECKSUM_SEED: u32 = 0x1234_5678;

/// Checksum of `data` as it should be stored in its last word.
///
/// Returns `None` when `data` is shorter than one word. A trailing partial
/// word is not part of the sum.
pub fn compute(data: &[u8]) -> Option<u32> {
    let words = data.len() / 4;
    if words == 0 {
        return None;
    }

    Some(
        data[..(words - 1) * 4]
            .chunks_exact(4)
            .map(LittleEndian::read_u32)
            .fold(CHECKSUM_SEED, u32::wrapping_add),
    )
}

/// Overwrite the last word of `data` with its checksum
pub fn recalculate(data: &mut [u8]) {
    if let Some(sum) = compute(data) {
        let last = (data.len() / 4 - 1) * 4;
        LittleEndian::write_u32(&mut data[last..last + 4], sum);
    }
}

/// Whether the stored checksum matches the contents
pub fn verify(data: &[u8]) -> bool {
    let words = data.len() / 4;
    match compute(data) {
        Some(sum) => LittleEndian::read_u32(&data[(words - 1) * 4..words * 4]) == sum,
        None => true,
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn single_word_is_the_seed() {
        let mut data = vec![0u8; 4];
        recalculate(&mut data);
        assert_eq!(data, CHECKSUM_SEED.to_le_bytes());
    }

    #[test]
    fn sums_all_but_last_word() {
        #[rustfmt::skip]
        let mut data = vec![
            0x01, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            0xFF, 0xFF, 0xFF, 0xFF,
        ];
        recalculate(&mut data);

        assert_eq!(
            LittleEndian::read_u32(&data[8..]),
            CHECKSUM_SEED.wrapping_add(3)
        );
        assert_eq!(&data[..8], &[1, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn wraps_on_overflow() {
        let mut data = [0xFFu8; 8].to_vec();
        data.extend([0u8; 4]);
        recalculate(&mut data);

        let expected = CHECKSUM_SEED
            .wrapping_add(0xFFFF_FFFF)
            .wrapping_add(0xFFFF_FFFF);
        assert_eq!(LittleEndian::read_u32(&data[8..]), expected);
    }

    #[test]
    fn idempotent() {
        let mut data: Vec<u8> = (0..64u8).collect();
        recalculate(&mut data);
        let once = data.clone();
        recalculate(&mut data);

        assert_eq!(data, once);
        assert!(verify(&data));
    }

    #[test]
    fn short_buffers_untouched() {
        let mut data = vec![1, 2, 3];
        recalculate(&mut data);
        assert_eq!(data, vec![1, 2, 3]);
        assert_eq!(compute(&data), None);
    }
}
