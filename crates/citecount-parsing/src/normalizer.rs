//! Turn raw citation matches into canonical keys.
//!
//! Repeat mentions are often abbreviated (`410 U.S., at 153` after a first
//! `410 U.S. 113`). A short key that is a prefix of a key already counted in
//! the same document is credited to that longer key.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::CitationKey;
use crate::aggregator::Accumulator;

static REPORTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"U\.[ ]?S\.?").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(\d+\)\s*$").unwrap());

/// Outcome of normalizing one raw match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub key: CitationKey,
    /// A `, <page>` segment followed the core. Never part of the key.
    pub has_pincite: bool,
    /// The key was taken from an existing, longer key in the accumulator.
    pub merged: bool,
    /// The core had more than three tokens and was cut to volume + reporter.
    pub clamped: bool,
}

/// Normalize a raw match against the document's accumulator.
///
/// The accumulator is only read. Steps:
/// 1. every reporter spelling becomes `U.S.`
/// 2. a trailing ` (year)` is dropped, then the text is split on the first
///    comma into the core and the pincite
/// 3. `at` is stripped from the core and the core is split on whitespace
/// 4. more than three tokens: the key is the first two tokens
/// 5. otherwise the tokens are joined, and the first existing key (in
///    insertion order) starting with that join is used instead, if any
pub fn normalize(raw: &str, acc: &Accumulator) -> Normalized {
    let reporter_fixed = REPORTER_RE.replace_all(raw, "U.S. ");
    let without_year = YEAR_RE.replace(&reporter_fixed, "");

    let (core, pincite) = match without_year.split_once(',') {
        Some((core, pincite)) => (core, Some(pincite)),
        None => (without_year.as_ref(), None),
    };
    let has_pincite = pincite.is_some_and(|p| p.bytes().any(|b| b.is_ascii_digit()));

    let core = core.replace("at", "");
    let tokens: Vec<&str> = core.split_whitespace().collect();

    if tokens.len() > 3 {
        return Normalized {
            key: CitationKey::from_tokens(&tokens[..2]),
            has_pincite,
            merged: false,
            clamped: true,
        };
    }

    let tentative = tokens.join(" ");
    if !tentative.is_empty()
        && let Some(existing) = acc.find_prefixed(&tentative)
    {
        return Normalized {
            merged: existing.as_str() != tentative,
            key: existing.clone(),
            has_pincite,
            clamped: false,
        };
    }

    Normalized {
        key: CitationKey::new(tentative),
        has_pincite,
        merged: false,
        clamped: false,
    }
}

/// Normalize a raw match and return only the key to credit.
pub fn normalize_citation(raw: &str, acc: &Accumulator) -> CitationKey {
    normalize(raw, acc).key
}
