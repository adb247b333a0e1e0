//! Data structures for the prefix index

use crate::errors::PrefixError;
use crate::helpers::{block_size, canonical, common_prefix_len, get_bit};
use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Offset of a node inside the trie arena.
pub type Offset = u32;

/// The root always lives at offset 0, so 0 doubles as "no child".
pub const ROOT: Offset = 0;

pub const MAX_PREFIX_LEN: u8 = 32;

/// An IPv4 network address plus the number of significant leading bits.
///
/// Host bits beyond `len` are always zero. Ordering is by address, then by
/// length, so a covering prefix sorts before the prefixes it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix {
    addr: u32,
    len: u8,
}

impl Prefix {
    /// Build a prefix, masking off any host bits past `len`.
    pub fn new(addr: u32, len: u8) -> Result<Self, PrefixError> {
        if len > MAX_PREFIX_LEN {
            return Err(PrefixError::InvalidLength(len));
        }
        Ok(Self::from_raw(addr, len))
    }

    pub(crate) fn from_raw(addr: u32, len: u8) -> Self {
        debug_assert!(len <= MAX_PREFIX_LEN);
        Prefix {
            addr: canonical(addr, len),
            len,
        }
    }

    /// A `/32` for a single host.
    pub fn host(addr: Ipv4Addr) -> Self {
        Prefix {
            addr: u32::from(addr),
            len: MAX_PREFIX_LEN,
        }
    }

    /// The empty prefix, covering the whole address space.
    pub fn root() -> Self {
        Prefix { addr: 0, len: 0 }
    }

    /// Parse a strict `a.b.c.d/n` literal.
    pub fn parse_cidr(s: &str) -> Result<Self, PrefixError> {
        s.parse::<Ipv4Net>()
            .map(Prefix::from)
            .map_err(|_| PrefixError::Parse(s.to_string()))
    }

    /// Parse either a CIDR literal or a bare address (taken as `/32`).
    pub fn parse_token(s: &str) -> Result<Self, PrefixError> {
        if let Ok(net) = s.parse::<Ipv4Net>() {
            Ok(Prefix::from(net))
        } else if let Ok(ip) = s.parse::<Ipv4Addr>() {
            Ok(Prefix::host(ip))
        } else {
            Err(PrefixError::Parse(s.to_string()))
        }
    }

    pub fn addr(&self) -> u32 {
        self.addr
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.addr)
    }

    /// Number of addresses in the block (2^32 for `/0`).
    pub fn size(&self) -> u64 {
        block_size(self.len)
    }

    pub fn first(&self) -> u32 {
        self.addr
    }

    /// Last address of the block, inclusive.
    pub fn last(&self) -> u32 {
        (self.addr as u64 + self.size() - 1) as u32
    }

    /// Bit `index` of the network address, most significant first.
    pub fn bit(&self, index: u8) -> u8 {
        get_bit(self.addr, index)
    }

    /// True when `other` lies entirely inside this block (or equals it).
    pub fn contains(&self, other: &Prefix) -> bool {
        other.len >= self.len && common_prefix_len(self.addr, other.addr, self.len) == self.len
    }

    /// The covering prefix of length `len` (no-op when `len >= self.len()`).
    pub fn truncate(&self, len: u8) -> Self {
        Self::from_raw(self.addr, len.min(self.len))
    }
}

impl From<Ipv4Net> for Prefix {
    fn from(net: Ipv4Net) -> Self {
        Self::from_raw(u32::from(net.network()), net.prefix_len())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.len)
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prefix::parse_token(s)
    }
}

/// What the index stores for each decomposed sub-block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    /// The seed CIDR exactly as it was given to the decomposer.
    pub parent: String,
    /// Canonical rendering of the sub-block itself.
    pub block: String,
    pub hits: u64,
}

impl BlockRecord {
    pub fn new(parent: impl Into<String>, block: impl Into<String>) -> Self {
        BlockRecord {
            parent: parent.into(),
            block: block.into(),
            hits: 0,
        }
    }

    #[inline]
    pub fn hit(&mut self) {
        self.hits += 1;
    }
}

/// Node in the trie arena. A node at depth `d` stands for the first `d` bits
/// of every path running through it.
#[derive(Debug, Clone)]
pub struct Node<V> {
    pub left: Offset,  // next bit 0
    pub right: Offset, // next bit 1
    pub value: Option<V>,
}

impl<V> Node<V> {
    pub(crate) fn empty() -> Self {
        Node {
            left: ROOT,
            right: ROOT,
            value: None,
        }
    }

    #[inline]
    pub(crate) fn child(&self, bit: u8) -> Offset {
        if bit == 0 {
            self.left
        } else {
            self.right
        }
    }
}

/// Binary trie over 32-bit addresses, one level per bit.
///
/// Nodes are kept in a flat arena and reference each other by [`Offset`];
/// nothing is ever removed.
#[derive(Debug, Clone)]
pub struct PrefixTrie<V> {
    pub(crate) nodes: Vec<Node<V>>,
    pub(crate) len: usize,
}

/// The index the decomposer populates.
pub type PrefixIndex = PrefixTrie<BlockRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_masks_host_bits() {
        let p = Prefix::new(0xC0A8_0501, 24).unwrap();
        assert_eq!(p.addr(), 0xC0A8_0500);
        assert_eq!(p.to_string(), "192.168.5.0/24");
        assert_eq!(Prefix::new(0, 33), Err(PrefixError::InvalidLength(33)));
    }

    #[test]
    fn parse_token_forms() {
        assert_eq!(
            "10.0.0.0/24".parse::<Prefix>().unwrap(),
            Prefix::new(0x0A00_0000, 24).unwrap()
        );
        let bare: Prefix = "10.0.0.7".parse().unwrap();
        assert_eq!(bare.len(), 32);
        assert_eq!(bare.addr(), 0x0A00_0007);
        // host bits in a CIDR literal are dropped
        assert_eq!(
            Prefix::parse_token("192.168.5.1/24").unwrap().to_string(),
            "192.168.5.0/24"
        );
        assert!(Prefix::parse_token("10.0.0.0/33").is_err());
        assert!(Prefix::parse_token("300.1.1.1").is_err());
        assert!(Prefix::parse_token("2001:db8::/32").is_err());
        assert!(Prefix::parse_token("").is_err());
    }

    #[test]
    fn parse_cidr_requires_length() {
        assert!(Prefix::parse_cidr("10.0.0.1").is_err());
        assert_eq!(Prefix::parse_cidr("0.0.0.0/0").unwrap(), Prefix::root());
    }

    #[test]
    fn ranges() {
        let all = Prefix::root();
        assert_eq!(all.size(), 1u64 << 32);
        assert_eq!(all.first(), 0);
        assert_eq!(all.last(), u32::MAX);

        let p = Prefix::parse_cidr("192.168.0.0/16").unwrap();
        assert_eq!(p.last(), 0xC0A8_FFFF);
        assert!(p.contains(&Prefix::parse_cidr("192.168.5.0/24").unwrap()));
        assert!(p.contains(&p));
        assert!(!p.contains(&Prefix::parse_cidr("192.0.0.0/8").unwrap()));
        assert!(!p.contains(&Prefix::parse_cidr("192.169.0.0/24").unwrap()));
        assert!(all.contains(&p));
    }

    #[test]
    fn ordering_puts_cover_first() {
        let mut v = vec![
            Prefix::parse_cidr("10.0.1.0/24").unwrap(),
            Prefix::parse_cidr("10.0.0.0/24").unwrap(),
            Prefix::parse_cidr("10.0.0.0/16").unwrap(),
        ];
        v.sort();
        let rendered: Vec<_> = v.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, ["10.0.0.0/16", "10.0.0.0/24", "10.0.1.0/24"]);
    }

    #[test]
    fn ipnet_round_trip() {
        let net: Ipv4Net = "172.16.3.9/12".parse().unwrap();
        let p = Prefix::from(net);
        assert_eq!(p.to_string(), "172.16.0.0/12");
        assert_eq!(p.to_string().parse::<Ipv4Net>().unwrap(), net.trunc());
    }

    #[test]
    fn record_counter() {
        let mut r = BlockRecord::new("10.0.0.0/8", "10.0.0.0/8");
        assert_eq!(r.hits, 0);
        r.hit();
        r.hit();
        assert_eq!(r.hits, 2);
    }
}
