//! Bit helpers for 32-bit prefix keys

use crate::types::MAX_PREFIX_LEN;

#[inline]
pub fn mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else if prefix_len >= MAX_PREFIX_LEN {
        !0u32
    } else {
        !(!0u32 >> prefix_len)
    }
}

// Canonicalise a key: zero host bits beyond `plen`.
#[inline(always)]
pub fn canonical(addr: u32, plen: u8) -> u32 {
    addr & mask(plen)
}

/// Bit `index` of `addr`, counting from the most significant bit.
#[inline]
pub fn get_bit(addr: u32, index: u8) -> u8 {
    debug_assert!(index < MAX_PREFIX_LEN);
    ((addr >> (31 - index)) & 1) as u8
}

pub fn common_prefix_len(a: u32, b: u32, max_len: u8) -> u8 {
    if max_len == 0 {
        return 0;
    }
    let m = mask(max_len);
    let diff = (a & m) ^ (b & m);
    if diff == 0 {
        return max_len.min(MAX_PREFIX_LEN);
    }
    (diff.leading_zeros() as u8).min(max_len)
}

/// Number of addresses covered by one block of length `plen`.
///
/// Returned as u64 so that `/0` yields exactly 2^32.
#[inline]
pub fn block_size(plen: u8) -> u64 {
    debug_assert!(plen <= MAX_PREFIX_LEN);
    1u64 << (MAX_PREFIX_LEN - plen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_edges() {
        assert_eq!(mask(0), 0);
        assert_eq!(mask(1), 0x8000_0000);
        assert_eq!(mask(24), 0xFFFF_FF00);
        assert_eq!(mask(32), 0xFFFF_FFFF);
    }

    #[test]
    fn bits_are_msb_first() {
        let addr = 0b1010_0000_0000_0000_0000_0000_0000_0001u32;
        assert_eq!(get_bit(addr, 0), 1);
        assert_eq!(get_bit(addr, 1), 0);
        assert_eq!(get_bit(addr, 2), 1);
        assert_eq!(get_bit(addr, 31), 1);
    }

    #[test]
    fn common_prefix() {
        assert_eq!(common_prefix_len(0x0A00_0000, 0x0A00_0000, 32), 32);
        assert_eq!(common_prefix_len(0x0A00_0000, 0x0B00_0000, 32), 7);
        assert_eq!(common_prefix_len(0x0A00_0000, 0x0B00_0000, 4), 4);
        assert_eq!(common_prefix_len(0x0000_0000, 0x8000_0000, 0), 0);
    }

    #[test]
    fn block_sizes() {
        assert_eq!(block_size(32), 1);
        assert_eq!(block_size(24), 256);
        assert_eq!(block_size(0), 1u64 << 32);
    }
}
