use std::borrow::Cow;
use std::collections::HashMap;

use thiserror::Error;

use crate::CitationKey;
use crate::matcher::find_citations;
use crate::normalizer::{Normalized, normalize};

/// How raw document bytes are turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Reject content that is not valid UTF-8.
    #[default]
    Strict,
    /// Replace invalid sequences with U+FFFD and keep going.
    Lossy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("content is not valid UTF-8 (invalid byte at offset {valid_up_to})")]
pub struct DecodeError {
    pub valid_up_to: usize,
}

/// Counters collected while scanning one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines: usize,
    /// Raw matches seen. Always equals the sum of all counts.
    pub matches: usize,
    /// Matches credited to a longer existing key.
    pub merged: usize,
    /// Matches cut down to volume + reporter.
    pub clamped: usize,
}

/// Per-document tally of citation keys.
///
/// Keys keep their first-insertion order. That order drives the prefix
/// tie-break in [`normalize`] and the order of [`Accumulator::into_counts`].
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    entries: Vec<(CitationKey, usize)>,
    index: HashMap<CitationKey, usize>,
    stats: ScanStats,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, key: &str) -> Option<usize> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CitationKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CitationKey, usize)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }

    /// First key, in insertion order, that starts with `prefix`.
    pub fn find_prefixed(&self, prefix: &str) -> Option<&CitationKey> {
        self.keys().find(|key| key.as_str().starts_with(prefix))
    }

    /// Credit one raw match to its normalized key.
    pub fn record(&mut self, citation: Normalized) {
        self.stats.matches += 1;
        if citation.merged {
            self.stats.merged += 1;
        }
        if citation.clamped {
            self.stats.clamped += 1;
        }

        match self.index.get(citation.key.as_str()) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(citation.key.clone(), self.entries.len());
                self.entries.push((citation.key, 1));
            }
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn into_counts(self) -> Vec<(CitationKey, usize)> {
        self.entries
    }
}

/// Decode raw bytes according to `mode`.
pub fn decode(bytes: &[u8], mode: DecodeMode) -> Result<Cow<'_, str>, DecodeError> {
    match mode {
        DecodeMode::Strict => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| DecodeError {
                valid_up_to: e.valid_up_to(),
            }),
        DecodeMode::Lossy => Ok(String::from_utf8_lossy(bytes)),
    }
}

/// Count the citations of one document's text, line by line.
pub fn aggregate_text(text: &str) -> Accumulator {
    let mut acc = Accumulator::new();
    for line in text.lines() {
        acc.stats.lines += 1;
        for raw in find_citations(line) {
            let citation = normalize(raw, &acc);
            acc.record(citation);
        }
    }
    acc
}

/// Decode and count. Undecodable content yields no accumulator at all.
pub fn aggregate_bytes(bytes: &[u8], mode: DecodeMode) -> Result<Accumulator, DecodeError> {
    let text = decode(bytes, mode)?;
    Ok(aggregate_text(&text))
}
