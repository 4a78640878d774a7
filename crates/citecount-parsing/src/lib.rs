use std::borrow::Borrow;
use std::fmt;

pub mod aggregator;
pub mod matcher;
pub mod normalizer;

pub use aggregator::{
    Accumulator, DecodeError, DecodeMode, ScanStats, aggregate_bytes, aggregate_text, decode,
};
pub use matcher::{CITATION_RE, find_citations};
pub use normalizer::{Normalized, normalize, normalize_citation};

/// Canonical form of a U.S. Reports citation, e.g. `410 U.S.` or `410 U.S. 113`.
///
/// Two raw matches that normalize to the same key are the same logical
/// citation within a document. Equality is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CitationKey(String);

impl CitationKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build a key by joining tokens with single spaces.
    pub fn from_tokens(tokens: &[&str]) -> Self {
        Self(tokens.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CitationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CitationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CitationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CitationKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
