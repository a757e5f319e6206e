//! Version-aware ordering for affected-version strings.
//!
//! Versions are compared segment by segment on `.`. Each segment is split
//! into a leading run of digits and a suffix (`0rc1` → `0`, `rc1`):
//! - digit runs compare numerically, of any length
//! - on equal numbers, a bare segment outranks one with a suffix (`8.0` > `8.0beta`)
//! - a segment without digits ranks below one with digits
//! - a version that runs out of segments first is the lower one (`2.0` < `2.0.1`)

use std::cmp::Ordering;

/// Compare two version strings, oldest first.
///
/// Strings that differ only in zero padding (`2.0` / `2.00`) compare equal;
/// use [`VersionKey`] when a total order is needed.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(x), Some(y)) => match compare_segment(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// Map key ordering versions with [`compare_versions`], falling back to
/// byte order so that only identical strings are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionKey<'a>(pub &'a str);

impl Ord for VersionKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(self.0, other.0).then_with(|| self.0.cmp(other.0))
    }
}

impl PartialOrd for VersionKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compare_segment(x: &str, y: &str) -> Ordering {
    let (x_num, x_rest) = split_numeric(x);
    let (y_num, y_rest) = split_numeric(y);

    let by_number = match (x_num, y_num) {
        (Some(a), Some(b)) => compare_digits(a, b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };

    by_number.then_with(|| match (x_rest.is_empty(), y_rest.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x_rest.cmp(y_rest),
    })
}

/// Split a segment into its leading digits (if any) and the remainder.
fn split_numeric(segment: &str) -> (Option<&str>, &str) {
    let end = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());
    if end == 0 {
        (None, segment)
    } else {
        (Some(&segment[..end]), &segment[end..])
    }
}

/// Compare two ASCII digit runs numerically without parsing.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_numerically_not_lexically() {
        let mut versions = vec!["2.0", "10.0", "1.5", "2.0.1"];
        versions.sort_by_key(|v| std::cmp::Reverse(VersionKey(*v)));
        assert_eq!(versions, vec!["10.0", "2.0.1", "2.0", "1.5"]);
    }

    #[test]
    fn shorter_version_ranks_lower() {
        assert_eq!(compare_versions("2.0", "2.0.1"), Ordering::Less);
        assert_eq!(compare_versions("7.0.0", "7.0"), Ordering::Greater);
    }

    #[test]
    fn suffix_ranks_below_bare_number() {
        assert_eq!(compare_versions("8.0beta", "8.0"), Ordering::Less);
        assert_eq!(compare_versions("8.0rc1", "8.0beta"), Ordering::Greater);
        assert_eq!(compare_versions("8.0.0", "8.0.x"), Ordering::Greater);
    }

    #[test]
    fn zero_padding_is_numerically_equal_but_keys_differ() {
        assert_eq!(compare_versions("2.00", "2.0"), Ordering::Equal);
        assert_ne!(VersionKey("2.00").cmp(&VersionKey("2.0")), Ordering::Equal);
    }

    #[test]
    fn long_digit_runs_do_not_overflow() {
        assert_eq!(
            compare_versions("1.99999999999999999999999", "1.100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn version_key_in_btree_orders_descending_on_rev() {
        let mut map = std::collections::BTreeMap::new();
        for v in ["6.0.2", "7.0.0", "5.0.16", "6.0.10"] {
            map.insert(VersionKey(v), ());
        }
        let desc: Vec<&str> = map.keys().rev().map(|k| k.0).collect();
        assert_eq!(desc, vec!["7.0.0", "6.0.10", "6.0.2", "5.0.16"]);
    }
}
