use once_cell::sync::Lazy;
use regex::Regex;

/// U.S. Reports citation pattern.
///
/// Groups: volume (0–599), reporter (`U.S.`, `U. S.`, `U.S`), optional comma
/// and `at`, page, optional `, pincite`, optional ` (year)`. There is no
/// word boundary: a volume may start inside a longer run of digits or letters,
/// so `1410 U.S. 5` yields `410 U.S. 5`.
pub static CITATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([0-9]|[1-9][0-9]|[1-5][0-9][0-9]) (U\.[ ]?S\.?)[ ]?(,)?[ ]?(at)?[ ]?([0-9]+)(, ([0-9]+))?( \(([0-9]+)\))?",
    )
    .unwrap()
});

/// Find every raw citation in a single line, left to right.
///
/// Matches never overlap: scanning resumes after the end of each match.
/// The substrings are returned exactly as they appear in the line.
pub fn find_citations(line: &str) -> Vec<&str> {
    CITATION_RE.find_iter(line).map(|m| m.as_str()).collect()
}
