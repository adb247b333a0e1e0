//! Final summary: totals, then one line per block.

use crate::tally::Tally;
use cidrsplit_core::PrefixIndex;
use std::io::{self, Write};

/// Totals first, then the block listing.
pub fn write_report<W: Write>(
    out: &mut W,
    index: &PrefixIndex,
    tally: &Tally,
    hits_only: bool,
) -> io::Result<()> {
    write_totals(out, tally)?;
    write_blocks(out, index, hits_only)
}

pub fn write_totals<W: Write>(out: &mut W, tally: &Tally) -> io::Result<()> {
    writeln!(out)?;
    for (name, value) in [
        ("lineCount", tally.lines),
        ("addrCount", tally.addrs),
        ("errCount", tally.errors),
        ("missCount", tally.misses),
        ("defaultCount", tally.defaults),
    ] {
        writeln!(out, "{:<17}= {}", name, value)?;
    }
    Ok(())
}

/// Every block as `parent block = hits`, sorted as text.
pub fn write_blocks<W: Write>(out: &mut W, index: &PrefixIndex, hits_only: bool) -> io::Result<()> {
    let mut lines: Vec<String> = index
        .iter()
        .filter(|(_, r)| !hits_only || r.hits != 0)
        .map(|(_, r)| format!("{:<16} {:<16} = {}", r.parent, r.block, r.hits))
        .collect();
    lines.sort();

    writeln!(out)?;
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
