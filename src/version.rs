use std::cmp::Ordering;

/// Parsed form of a version string: optional dotted numeric parts plus a
/// trailing suffix. Parsing is deterministic and never fails; unparseable
/// numeric segments leave `numeric_parts` absent entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    pub original: String,
    pub numeric_parts: Option<Vec<u64>>,
    pub suffix: String,
}

impl ParsedVersion {
    pub fn parse(version: &str) -> Self {
        let trimmed = version.strip_prefix('v').unwrap_or(version);

        let (numeric_segment, suffix) = match trimmed.find(['-', '+']) {
            Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
            None => (trimmed, ""),
        };

        ParsedVersion {
            original: version.to_string(),
            numeric_parts: Self::parse_numeric(numeric_segment),
            suffix: suffix.to_string(),
        }
    }

    fn parse_numeric(segment: &str) -> Option<Vec<u64>> {
        let mut numbers = Vec::new();

        for part in segment.split('.') {
            match part.parse::<u64>() {
                Ok(num) => numbers.push(num),
                Err(_) => return None,
            }
        }

        Some(numbers)
    }
}

/// Totally orders two version strings.
///
/// Identical strings compare equal. When either side has no numeric parts
/// the full original strings compare lexicographically, keeping the order
/// total for non-numeric schemes. Otherwise numeric parts compare pairwise
/// with the shorter side zero-padded (`1.2` equals `1.2.0`), and equal
/// numerics fall through to the suffix: an empty suffix ranks after any
/// non-empty one (a release outranks its pre-releases), and two non-empty
/// suffixes compare lexicographically.
pub fn compare(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let va = ParsedVersion::parse(a);
    let vb = ParsedVersion::parse(b);

    let (pa, pb) = match (&va.numeric_parts, &vb.numeric_parts) {
        (Some(pa), Some(pb)) => (pa, pb),
        _ => return va.original.cmp(&vb.original),
    };

    let len = pa.len().max(pb.len());
    for i in 0..len {
        let x = pa.get(i).copied().unwrap_or(0);
        let y = pb.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    match (va.suffix.is_empty(), vb.suffix.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => va.suffix.cmp(&vb.suffix),
    }
}

/// True when `latest` is strictly newer than `current`.
pub fn should_update(current: &str, latest: &str) -> bool {
    compare(current, latest) == Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_compare_equal() {
        for v in ["1.0.0", "v2.3", "1.0.0-rc1", "abc", "", "not.a.version"] {
            assert_eq!(compare(v, v), Ordering::Equal, "compare({v:?}, {v:?})");
        }
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert_eq!(compare("1.9.0", "1.10.0"), Ordering::Less);
        assert_eq!(compare("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare("2.0", "10.0"), Ordering::Less);
    }

    #[test]
    fn test_missing_trailing_parts_are_zero() {
        assert_eq!(compare("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare("1.2.0.0", "1.2"), Ordering::Equal);
        assert_eq!(compare("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn test_release_outranks_pre_release() {
        assert_eq!(compare("1.0.0-rc1", "1.0.0"), Ordering::Less);
        assert_eq!(compare("1.0.0", "1.0.0-rc1"), Ordering::Greater);
        assert_eq!(compare("1.0.0+build5", "1.0.0"), Ordering::Less);
    }

    #[test]
    fn test_non_empty_suffixes_compare_lexicographically() {
        assert_eq!(compare("1.0.0-rc1", "1.0.0-rc2"), Ordering::Less);
        assert_eq!(compare("1.0.0-beta", "1.0.0-rc1"), Ordering::Less);
        // Date-style tags order by their suffix once the year matches.
        assert_eq!(compare("2024-01-05", "2024-02-01"), Ordering::Less);
    }

    #[test]
    fn test_lexicographic_fallback_when_unparseable() {
        assert_eq!(compare("abc", "abd"), Ordering::Less);
        assert_eq!(compare("2024.abc", "2024.abd"), Ordering::Less);
        // One parseable side still falls back on the raw strings.
        assert_eq!(compare("1.2.3", "unknown"), Ordering::Less);
    }

    #[test]
    fn test_leading_v_is_stripped_for_parsing() {
        assert_eq!(compare("v1.2.3", "1.2.4"), Ordering::Less);
        assert_eq!(compare("v1.2.3", "v1.2.2"), Ordering::Greater);
    }

    #[test]
    fn test_parse_leaves_numeric_parts_absent_when_any_component_fails() {
        let parsed = ParsedVersion::parse("1.2.x");
        assert_eq!(parsed.numeric_parts, None);

        let parsed = ParsedVersion::parse("1..2");
        assert_eq!(parsed.numeric_parts, None);
    }

    #[test]
    fn test_parse_splits_suffix_at_first_delimiter() {
        let parsed = ParsedVersion::parse("1.2.3-alpha.1");
        assert_eq!(parsed.numeric_parts, Some(vec![1, 2, 3]));
        assert_eq!(parsed.suffix, "alpha.1");

        let parsed = ParsedVersion::parse("1.2.3+20240105-hotfix");
        assert_eq!(parsed.suffix, "20240105-hotfix");
    }

    #[test]
    fn test_should_update() {
        assert!(should_update("1.2.0", "1.3.0"));
        assert!(!should_update("1.3.0", "1.2.0"));
        assert!(!should_update("1.2.0", "1.2.0"));
        assert!(!should_update("1.2", "1.2.0"));
    }
}
