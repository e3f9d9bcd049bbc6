//! Request multiset construction.
//!
//! Turns raw name strings (one per requested copy) into a `RequestMultiset`.
//! Invalid entries (non-numeric in numeric mode, or names that are not a
//! single file name) are dropped and counted, never rejected.

use tracing::debug;

use crate::model::{is_all_digits, ItemKey, RequestMultiset};

/// Result of building a multiset from raw entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    pub requests: RequestMultiset,
    /// Non-empty entries dropped because they were not purely numeric, or
    /// were paths rather than plain file names
    pub dropped: usize,
}

/// Build a request multiset from raw names.
///
/// Each entry is trimmed and empty entries are ignored. Entries that would
/// resolve outside a directory (`a/b`, `../x`, absolute paths) are dropped
/// and counted. With `numeric_only`
/// set, non-numeric entries are dropped (and counted) and numeric entries are
/// canonicalized so `"007"` and `"7"` collapse to one key.
pub fn build<I, S>(raw_names: I, numeric_only: bool) -> BuildResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = BuildResult::default();

    for raw in raw_names {
        let Some(key) = ItemKey::new(raw.as_ref()) else {
            continue;
        };

        if !key.is_plain_file_name() {
            debug!(entry = key.as_str(), "dropping entry that is not a plain file name");
            result.dropped += 1;
            continue;
        }

        if numeric_only {
            if !is_all_digits(key.as_str()) {
                debug!(entry = key.as_str(), "dropping non-numeric entry");
                result.dropped += 1;
                continue;
            }
            let canonical = key
                .canonical_digits()
                .and_then(ItemKey::new)
                .unwrap_or(key);
            result.requests.add(canonical);
        } else {
            result.requests.add(key);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_duplicates() {
        let result = build(["1", "2", "1"], false);
        assert_eq!(result.requests.count("1"), 2);
        assert_eq!(result.requests.count("2"), 1);
        assert_eq!(result.dropped, 0);
    }

    #[test]
    fn test_trims_and_skips_empty_entries() {
        let result = build(["  a  ", "", "   ", "a\r", "b\n"], false);
        assert_eq!(result.requests.count("a"), 2);
        assert_eq!(result.requests.count("b"), 1);
        assert_eq!(result.requests.total_copies(), 3);
        assert_eq!(result.dropped, 0);
    }

    #[test]
    fn test_numeric_only_drops_and_counts_non_numeric() {
        let result = build(["12", "abc", "1a", "", "13"], true);
        assert_eq!(result.requests.len(), 2);
        assert_eq!(result.dropped, 2);
    }

    #[test]
    fn test_drops_path_like_entries() {
        let result = build(["/tmp/outside/x", "../escaped/y", "a/b", "..", "ok"], false);
        assert_eq!(result.requests.len(), 1);
        assert_eq!(result.requests.count("ok"), 1);
        assert_eq!(result.dropped, 4);

        let numeric = build(["../1", "2"], true);
        assert_eq!(numeric.requests.count("2"), 1);
        assert_eq!(numeric.dropped, 1);
    }

    #[test]
    fn test_numeric_only_collapses_leading_zeros() {
        let result = build(["007", "7", "0007", "000"], true);
        assert_eq!(result.requests.count("7"), 3);
        assert_eq!(result.requests.count("0"), 1);
        assert_eq!(result.requests.count("007"), 0);
    }

    #[test]
    fn test_without_numeric_only_keeps_zero_padding() {
        let result = build(["007", "7"], false);
        assert_eq!(result.requests.count("007"), 1);
        assert_eq!(result.requests.count("7"), 1);
    }

    #[test]
    fn test_total_matches_surviving_lines() {
        let lines = ["1", " 2 ", "x", "", "3", "3", "y1"];
        let plain = build(lines, false);
        let non_empty = lines.iter().filter(|l| !l.trim().is_empty()).count() as u64;
        assert_eq!(plain.requests.total_copies(), non_empty);

        let numeric = build(lines, true);
        let numeric_lines = lines
            .iter()
            .filter(|l| is_all_digits(l.trim()))
            .count() as u64;
        assert_eq!(numeric.requests.total_copies(), numeric_lines);
        assert_eq!(numeric.dropped as u64, non_empty - numeric_lines);
    }
}
