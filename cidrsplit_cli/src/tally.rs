//! Feeding an input stream through the index and counting outcomes.

use crate::tokenize::{is_comment, tokens, trim_line};
use cidrsplit_core::PrefixIndex;
use log::{error, info};
use std::io::{BufRead, Write};

/// Counted separately and never looked up.
pub const DEFAULT_ROUTE: &str = "0.0.0.0/0";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub lines: usize,
    pub addrs: usize,
    pub errors: usize,
    pub misses: usize,
    pub defaults: usize,
}

/// Read `input` to the end, bumping the hit counter of every exactly-matched
/// block. Misses and malformed tokens are reported on `out` and skipped.
///
/// Lines that are not valid UTF-8 are decoded lossily and their tokens
/// counted as errors. Only a failed read ends the run early; what was
/// counted so far is still returned.
pub fn run<R: BufRead, W: Write>(
    index: &mut PrefixIndex,
    mut input: R,
    out: &mut W,
) -> std::io::Result<Tally> {
    let mut tally = Tally::default();
    let mut buf = Vec::new();

    info!("reading subnets - begin");
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!("read failed after line {}: {}", tally.lines, e);
                writeln!(out, "error: {} line={}", e, tally.lines)?;
                break;
            }
        }
        tally.lines += 1;

        // bytes that are not UTF-8 end up in a token that fails to parse
        let text = String::from_utf8_lossy(&buf);
        let line = trim_line(&text);
        if is_comment(line) {
            continue;
        }

        for token in tokens(line) {
            tally.addrs += 1;

            if token == DEFAULT_ROUTE {
                tally.defaults += 1;
                continue;
            }

            match index.lookup(token, tally.lines) {
                Ok(Some(record)) => record.hit(),
                Ok(None) => {
                    tally.misses += 1;
                    writeln!(out, "{} MISS line={}", token, tally.lines)?;
                }
                Err(e) => {
                    tally.errors += 1;
                    writeln!(out, "{} ERROR: {} line={}", token, e, e.line())?;
                }
            }
        }
    }
    info!("reading subnets - done");
    Ok(tally)
}
