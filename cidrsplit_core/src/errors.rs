//! Error types and stable error codes for cidrsplit

use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    InvalidPrefixLength,
    InvalidCidr,
    InvalidTargetLength,
    MalformedInput,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidPrefixLength => "Invalid prefix length",
            ErrorCode::InvalidCidr => "Invalid CIDR",
            ErrorCode::InvalidTargetLength => "Invalid target length",
            ErrorCode::MalformedInput => "Malformed input",
        }
    }
}

/// Failure to build a [`Prefix`](crate::types::Prefix) from raw parts or text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    #[error("prefix length /{0} exceeds /32")]
    InvalidLength(u8),
    #[error("not an IPv4 address or CIDR: {0:?}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecomposeError {
    #[error("invalid CIDR {cidr:?}")]
    InvalidCidr { cidr: String },
    #[error("target length /{target} is invalid for {cidr} (parent is /{parent_len}, maximum is /32)")]
    InvalidTargetLength {
        cidr: String,
        parent_len: u8,
        target: u8,
    },
}

impl DecomposeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DecomposeError::InvalidCidr { .. } => ErrorCode::InvalidCidr,
            DecomposeError::InvalidTargetLength { .. } => ErrorCode::InvalidTargetLength,
        }
    }
}

/// A lookup token that is neither a dotted-quad address nor a CIDR literal.
///
/// `line` is whatever input position the caller passed in; the index itself
/// has no notion of lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("malformed input {token:?}")]
    MalformedInput { token: String, line: usize },
}

impl LookupError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LookupError::MalformedInput { .. } => ErrorCode::MalformedInput,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            LookupError::MalformedInput { token, .. } => token,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            LookupError::MalformedInput { line, .. } => *line,
        }
    }
}
