pub mod decompose;
pub mod errors;
pub mod helpers;
pub mod telemetry;
pub mod types;

pub use crate::decompose::{decompose, sub_blocks, SubBlocks};
pub use crate::errors::{DecomposeError, ErrorCode, LookupError, PrefixError};
pub use crate::types::{BlockRecord, Prefix, PrefixIndex, PrefixTrie};

use crate::types::{Node, Offset, MAX_PREFIX_LEN, ROOT};
use log::{debug, trace};
use metrics::counter;
use once_cell::sync::OnceCell;

/// Install a fallback `env_logger` unless the host already set a logger up.
pub fn ensure_logging() {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_init(|| {
        // Fallback: simple env_logger with timestamps off.
        let _ = env_logger::builder()
            .format_timestamp(None)
            .is_test(std::env::var("RUST_TEST_THREADS").is_ok())
            .try_init();
    });
}

impl<V> PrefixTrie<V> {
    /// Create an empty trie holding only the root node.
    pub fn new() -> Self {
        ensure_logging();
        Self {
            nodes: vec![Node::empty()],
            len: 0,
        }
    }

    /// Number of stored prefixes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of arena nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Attach `value` to `prefix`, creating the path as needed.
    ///
    /// Returns the value previously stored at exactly this prefix, if any;
    /// the new value always wins.
    ///
    /// # Panics
    ///
    /// If the arena would need more than `u32::MAX` nodes (roughly a full
    /// `/32` split of a `/1` or larger).
    pub fn insert(&mut self, prefix: Prefix, value: V) -> Option<V> {
        counter!("cidrsplit_inserts_total").increment(1);
        trace!("[INSERT] prefix={}", prefix);

        let mut current = ROOT;
        for depth in 0..prefix.len() {
            let bit = prefix.bit(depth);
            let next = self.nodes[current as usize].child(bit);
            current = if next == ROOT {
                let fresh = self.alloc_node();
                let node = &mut self.nodes[current as usize];
                if bit == 0 {
                    node.left = fresh;
                } else {
                    node.right = fresh;
                }
                fresh
            } else {
                next
            };
        }

        let displaced = self.nodes[current as usize].value.replace(value);
        if displaced.is_some() {
            debug!("[INSERT] {} already present, record replaced", prefix);
        } else {
            self.len += 1;
        }
        displaced
    }

    /// Insert every `(prefix, value)` pair in order.
    pub fn bulk_insert<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (Prefix, V)>,
    {
        for (prefix, value) in items {
            self.insert(prefix, value);
        }
    }

    /// Exact match: same bits, same length.
    pub fn get(&self, prefix: &Prefix) -> Option<&V> {
        let off = self.find(prefix)?;
        self.nodes[off as usize].value.as_ref()
    }

    pub fn get_mut(&mut self, prefix: &Prefix) -> Option<&mut V> {
        let off = self.find(prefix)?;
        self.nodes[off as usize].value.as_mut()
    }

    /// Parse `token` as an address or CIDR and return the record stored at
    /// exactly that prefix.
    ///
    /// A bare address is a `/32` and only hits a `/32` entry. There is no
    /// fallback to a covering block; use [`longest_match`](Self::longest_match)
    /// for that. `line` is only carried into the error.
    pub fn lookup(&mut self, token: &str, line: usize) -> Result<Option<&mut V>, LookupError> {
        counter!("cidrsplit_lookups_total").increment(1);
        let prefix = match Prefix::parse_token(token) {
            Ok(p) => p,
            Err(e) => {
                counter!("cidrsplit_lookup_errors_total").increment(1);
                debug!("[LOOKUP] {:?} rejected at line {}: {}", token, line, e);
                return Err(LookupError::MalformedInput {
                    token: token.to_string(),
                    line,
                });
            }
        };

        let hit = self
            .find(&prefix)
            .filter(|&off| self.nodes[off as usize].value.is_some());
        match hit {
            Some(off) => {
                counter!("cidrsplit_lookup_hits_total").increment(1);
                trace!("[LOOKUP] {} hit", prefix);
                Ok(self.nodes[off as usize].value.as_mut())
            }
            None => {
                counter!("cidrsplit_lookup_misses_total").increment(1);
                trace!("[LOOKUP] {} miss", prefix);
                Ok(None)
            }
        }
    }

    /// The most specific stored prefix that contains `prefix`.
    pub fn longest_match(&self, prefix: &Prefix) -> Option<(Prefix, &V)> {
        let mut best = self.nodes[ROOT as usize]
            .value
            .as_ref()
            .map(|v| (0u8, v));
        let mut current = ROOT;
        for depth in 0..prefix.len() {
            let next = self.nodes[current as usize].child(prefix.bit(depth));
            if next == ROOT {
                break;
            }
            current = next;
            if let Some(v) = self.nodes[current as usize].value.as_ref() {
                best = Some((depth + 1, v));
            }
        }
        best.map(|(len, v)| (prefix.truncate(len), v))
    }

    /// All stored prefixes in address order; a covering prefix comes before
    /// anything it contains.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            trie: self,
            stack: vec![(ROOT, 0, 0)],
        }
    }

    /// Mutable access to every stored value, in arena order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.nodes.iter_mut().filter_map(|n| n.value.as_mut())
    }

    // Walk exactly `prefix.len()` bits; None as soon as a child is missing.
    fn find(&self, prefix: &Prefix) -> Option<Offset> {
        let mut current = ROOT;
        for depth in 0..prefix.len() {
            let next = self.nodes[current as usize].child(prefix.bit(depth));
            if next == ROOT {
                return None;
            }
            current = next;
        }
        Some(current)
    }

    fn alloc_node(&mut self) -> Offset {
        let off = arena_offset(self.nodes.len())
            .expect("trie arena exhausted: more than u32::MAX nodes");
        self.nodes.push(Node::empty());
        off
    }
}

/// Offset the next arena slot gets, or None once offsets no longer fit.
fn arena_offset(slot: usize) -> Option<Offset> {
    Offset::try_from(slot).ok()
}

impl<V> Default for PrefixTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first, left-before-right walk yielding `(prefix, value)` pairs.
pub struct Iter<'a, V> {
    trie: &'a PrefixTrie<V>,
    stack: Vec<(Offset, u32, u8)>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((off, addr, depth)) = self.stack.pop() {
            let node = &self.trie.nodes[off as usize];
            if depth < MAX_PREFIX_LEN {
                if node.right != ROOT {
                    let bit = 1u32 << (31 - depth);
                    self.stack.push((node.right, addr | bit, depth + 1));
                }
                if node.left != ROOT {
                    self.stack.push((node.left, addr, depth + 1));
                }
            }
            if let Some(v) = node.value.as_ref() {
                return Some((Prefix::from_raw(addr, depth), v));
            }
        }
        None
    }
}

impl<'a, V> IntoIterator for &'a PrefixTrie<V> {
    type Item = (Prefix, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
