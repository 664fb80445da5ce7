// vim: tw=80

//! Fletcher-2: two parallel two-accumulator chains over 64-bit words
//!
//! Kept for compatibility with data written by older pools.  Because the
//! additions are mod 2^64, corruption in the high bits of a word can go
//! unnoticed; new data should prefer Fletcher-4.

use byteorder::{ByteOrder, NativeEndian};

use super::Checksum;

/// Checksum `buf` reading 64-bit words in host order.
///
/// The buffer length must be a multiple of 16 bytes.
pub fn fletcher_2_native(buf: &[u8]) -> Checksum {
    assert_eq!(buf.len() % 16, 0,
        "buffer length must be a multiple of 16 bytes");
    let (mut a0, mut a1, mut b0, mut b1) = (0u64, 0u64, 0u64, 0u64);
    for pair in buf.chunks_exact(16) {
        a0 = a0.wrapping_add(NativeEndian::read_u64(&pair[..8]));
        a1 = a1.wrapping_add(NativeEndian::read_u64(&pair[8..]));
        b0 = b0.wrapping_add(a0);
        b1 = b1.wrapping_add(a1);
    }
    Checksum([a0, a1, b0, b1])
}

/// Like [`fletcher_2_native`], but byte-reverse each word first
pub fn fletcher_2_byteswap(buf: &[u8]) -> Checksum {
    assert_eq!(buf.len() % 16, 0,
        "buffer length must be a multiple of 16 bytes");
    let (mut a0, mut a1, mut b0, mut b1) = (0u64, 0u64, 0u64, 0u64);
    for pair in buf.chunks_exact(16) {
        a0 = a0.wrapping_add(NativeEndian::read_u64(&pair[..8]).swap_bytes());
        a1 = a1.wrapping_add(NativeEndian::read_u64(&pair[8..]).swap_bytes());
        b0 = b0.wrapping_add(a0);
        b1 = b1.wrapping_add(a1);
    }
    Checksum([a0, a1, b0, b1])
}

// LCOV_EXCL_START
#[cfg(test)]
mod t {
    use pretty_assertions::assert_eq;
    use super::*;

    fn words_to_buf(words: &[u64]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_ne_bytes()).collect()
    }

    #[test]
    fn empty() {
        assert_eq!(fletcher_2_native(&[]), Checksum::default());
        assert_eq!(fletcher_2_byteswap(&[]), Checksum::default());
    }

    /// Two 16-byte pairs of `[1, 2]`
    #[test]
    fn two_pairs() {
        let buf = words_to_buf(&[1, 2, 1, 2]);
        assert_eq!(fletcher_2_native(&buf), Checksum::new(2, 4, 3, 6));
    }

    #[test]
    fn accumulators_wrap() {
        let buf = words_to_buf(&[u64::MAX, u64::MAX, 2, 3]);
        let cksum = fletcher_2_native(&buf);
        assert_eq!(cksum.0[0], 1);
        assert_eq!(cksum.0[1], 2);
        assert_eq!(cksum.0[2], 0);
        assert_eq!(cksum.0[3], 1);
    }

    /// Byte-reversing the buffer's words is the same as using the byteswap
    /// variant.
    #[test]
    fn byteswap_duality() {
        let buf = words_to_buf(&[0x0102_0304_0506_0708, 0x1122_3344_5566_7788,
                                 0xdead_beef_0000_ffff, 7]);
        let swapped = buf.chunks_exact(8)
            .flat_map(|w| w.iter().rev().copied())
            .collect::<Vec<_>>();
        assert_eq!(fletcher_2_native(&swapped), fletcher_2_byteswap(&buf));
        assert_eq!(fletcher_2_byteswap(&swapped), fletcher_2_native(&buf));
    }

    #[test]
    #[should_panic(expected = "multiple of 16")]
    fn bad_length() {
        fletcher_2_native(&[0u8; 24]);
    }
}
// LCOV_EXCL_STOP
