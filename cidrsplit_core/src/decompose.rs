//! Splitting a seed CIDR into equal-length sub-blocks.
//!
//! A parent of length `p` split at target length `t` yields `2^(t-p)` blocks
//! of `2^(32-t)` addresses each, starting at the parent's network address and
//! walking upward without gaps. Offsets are computed in u64 so that the single
//! `/0` block never needs a `2^32` step to be represented in 32 bits.

use crate::errors::DecomposeError;
use crate::helpers::block_size;
use crate::types::{BlockRecord, Prefix, PrefixIndex, MAX_PREFIX_LEN};
use log::{debug, info};
use metrics::counter;

/// Lazy sequence of `(Prefix, BlockRecord)` pairs tiling one parent block.
#[derive(Debug, Clone)]
pub struct SubBlocks {
    parent: String,
    base: u32,
    target: u8,
    step: u64,
    next: u64,
    count: u64,
}

impl SubBlocks {
    /// Total number of blocks the parent splits into.
    pub fn total(&self) -> u64 {
        self.count
    }

    pub fn target(&self) -> u8 {
        self.target
    }
}

impl Iterator for SubBlocks {
    type Item = (Prefix, BlockRecord);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        // never exceeds the parent's last address, so it fits in u32
        let addr = (self.base as u64 + self.next * self.step) as u32;
        self.next += 1;

        let prefix = Prefix::from_raw(addr, self.target);
        let record = BlockRecord::new(self.parent.clone(), prefix.to_string());
        Some((prefix, record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.count - self.next).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

impl ExactSizeIterator for SubBlocks {}

/// Validate `parent` and `target` and return the blocks without touching any
/// index.
pub fn sub_blocks(parent: &str, target: u8) -> Result<SubBlocks, DecomposeError> {
    let net = Prefix::parse_cidr(parent).map_err(|_| DecomposeError::InvalidCidr {
        cidr: parent.to_string(),
    })?;

    if target > MAX_PREFIX_LEN || target < net.len() {
        return Err(DecomposeError::InvalidTargetLength {
            cidr: parent.to_string(),
            parent_len: net.len(),
            target,
        });
    }

    Ok(SubBlocks {
        parent: parent.to_string(),
        base: net.addr(),
        target,
        step: block_size(target),
        next: 0,
        count: 1u64 << (target - net.len()),
    })
}

/// Split `parent` into `/target` blocks and register each one in `index`.
///
/// Returns the emitted prefixes in increasing address order; the matching
/// records are owned by the index from here on. For the `(Prefix,
/// BlockRecord)` pairs themselves, without an index, use [`sub_blocks`].
pub fn decompose(
    index: &mut PrefixIndex,
    parent: &str,
    target: u8,
) -> Result<Vec<Prefix>, DecomposeError> {
    let blocks = sub_blocks(parent, target)?;
    info!(
        "[SPLIT] adding CIDR: {} ({} blocks of /{})",
        parent,
        blocks.total(),
        target
    );

    let mut emitted = Vec::with_capacity(blocks.len());
    for (prefix, record) in blocks {
        debug!("[SPLIT] {} -> {}", parent, record.block);
        index.insert(prefix, record);
        emitted.push(prefix);
    }
    counter!("cidrsplit_blocks_total").increment(emitted.len() as u64);
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_length_yields_parent() {
        let blocks: Vec<_> = sub_blocks("10.0.0.0/8", 8).unwrap().collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].0.to_string(), "10.0.0.0/8");
        assert_eq!(blocks[0].1, BlockRecord::new("10.0.0.0/8", "10.0.0.0/8"));
    }

    #[test]
    fn whole_space_is_one_block() {
        let mut blocks = sub_blocks("0.0.0.0/0", 0).unwrap();
        assert_eq!(blocks.len(), 1);
        let (p, r) = blocks.next().unwrap();
        assert_eq!(p, Prefix::root());
        assert_eq!(r.block, "0.0.0.0/0");
        assert!(blocks.next().is_none());
    }

    #[test]
    fn top_of_space_does_not_wrap() {
        let blocks: Vec<_> = sub_blocks("255.255.255.0/24", 25).unwrap().collect();
        let rendered: Vec<_> = blocks.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(rendered, ["255.255.255.0/25", "255.255.255.128/25"]);
    }

    #[test]
    fn parent_string_is_kept_verbatim() {
        // host bits are ignored for the walk but the label is untouched
        let blocks: Vec<_> = sub_blocks("192.168.1.7/23", 24).unwrap().collect();
        assert_eq!(blocks[0].1.parent, "192.168.1.7/23");
        assert_eq!(blocks[0].1.block, "192.168.0.0/24");
        assert_eq!(blocks[1].1.block, "192.168.1.0/24");
    }

    #[test]
    fn decompose_matches_sub_blocks() {
        let mut index = PrefixIndex::new();
        let emitted = decompose(&mut index, "200.198.64.0/18", 24).unwrap();
        let pairs: Vec<_> = sub_blocks("200.198.64.0/18", 24).unwrap().collect();
        assert_eq!(emitted.len(), 64);
        for (prefix, (expected, record)) in emitted.iter().zip(&pairs) {
            assert_eq!(prefix, expected);
            assert_eq!(index.get(prefix), Some(record));
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            sub_blocks("10.0.0.0", 24).unwrap_err(),
            DecomposeError::InvalidCidr {
                cidr: "10.0.0.0".into()
            }
        );
        assert!(matches!(
            sub_blocks("nonsense/8", 24),
            Err(DecomposeError::InvalidCidr { .. })
        ));
        assert_eq!(
            sub_blocks("10.0.0.0/16", 8).unwrap_err(),
            DecomposeError::InvalidTargetLength {
                cidr: "10.0.0.0/16".into(),
                parent_len: 16,
                target: 8
            }
        );
        assert!(matches!(
            sub_blocks("10.0.0.0/16", 33),
            Err(DecomposeError::InvalidTargetLength { target: 33, .. })
        ));
    }
}
