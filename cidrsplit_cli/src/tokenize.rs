//! Splitting input lines into candidate address tokens.

#[inline]
pub fn is_delimiter(c: char) -> bool {
    matches!(c, '|' | '"' | 'e' | ';' | '-' | ',') || c.is_whitespace()
}

/// Non-empty tokens of `line`, in order.
pub fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_delimiter).filter(|t| !t.is_empty())
}

/// Comment lines start with `#` (after trimming).
pub fn is_comment(line: &str) -> bool {
    line.starts_with('#')
}

/// Strip line terminators and surrounding spaces, nothing else.
pub fn trim_line(raw: &str) -> &str {
    raw.trim_matches(|c| matches!(c, '\r' | '\n' | ' '))
}
