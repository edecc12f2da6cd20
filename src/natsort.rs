//! Numeric-aware ("natural") string ordering.
//!
//! A string is split at digit-run boundaries into alternating text and
//! number segments, always starting with a (possibly empty) text segment:
//! `"4.10"` becomes `["", 4, ".", 10, ""]`. Keys compare segment by segment,
//! numbers by value and text lexically, so `"4.9" < "4.10"` and
//! `"4.1" < "4.1.1" < "4.2"`.
//!
//! Because every key alternates text/number from the same starting kind,
//! two keys never put a number and a text segment at the same position.

use std::cmp::Ordering;

/// One run of a [`NaturalKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A run of non-digit characters (may be empty).
    Text(&'a str),
    /// A run of ASCII digits with leading zeros removed (`"0"` stays `"0"`).
    Number(&'a str),
}

impl Ord for Segment<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => {
                // Equal-length digit strings order lexically; no overflow on long runs.
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key for a string under natural ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey<'a>(Vec<Segment<'a>>);

impl<'a> NaturalKey<'a> {
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.0
    }
}

/// Builds the natural sort key for `s`.
pub fn natural_key(s: &str) -> NaturalKey<'_> {
    let mut segments = Vec::new();
    let bytes = s.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            segments.push(Segment::Text(&s[start..i]));
            let digits_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            segments.push(Segment::Number(strip_leading_zeros(&s[digits_start..i])));
            start = i;
        } else {
            i += 1;
        }
    }
    segments.push(Segment::Text(&s[start..]));

    NaturalKey(segments)
}

fn strip_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        &digits[digits.len() - 1..]
    } else {
        trimmed
    }
}

/// Compares two strings under natural ordering.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// Sorts `values` in place under natural ordering (stable).
pub fn sort_natural(values: &mut [String]) {
    values.sort_by(|a, b| natural_cmp(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(input: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        sort_natural(&mut v);
        v
    }

    #[test]
    fn key_alternates_text_and_numbers() {
        let key = natural_key("4.10");
        assert_eq!(
            key.segments(),
            &[
                Segment::Text(""),
                Segment::Number("4"),
                Segment::Text("."),
                Segment::Number("10"),
                Segment::Text(""),
            ]
        );
    }

    #[test]
    fn digit_runs_compare_numerically() {
        assert_eq!(natural_cmp("4.9", "4.10"), Ordering::Less);
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("10", "10.1"), Ordering::Less);
        assert_eq!(natural_cmp("10.1", "10.2"), Ordering::Less);
        assert_eq!(natural_cmp("2.1", "10.1"), Ordering::Less);
    }

    #[test]
    fn prefixes_sort_before_their_children() {
        assert_eq!(
            sorted(&["4.2", "4.1.1", "4.1", "10", "2", "4.10", "4.9"]),
            vec!["2", "4.1", "4.1.1", "4.2", "4.9", "4.10", "10"]
        );
    }

    #[test]
    fn leading_zeros_compare_by_value() {
        assert_eq!(natural_cmp("007", "7"), Ordering::Equal);
        assert_eq!(natural_cmp("0", "00"), Ordering::Equal);
        assert_eq!(natural_cmp("09", "10"), Ordering::Less);
    }

    #[test]
    fn long_digit_runs_do_not_overflow() {
        let big = "123456789012345678901234567890";
        let bigger = "123456789012345678901234567891";
        assert_eq!(natural_cmp(big, bigger), Ordering::Less);
        assert_eq!(natural_cmp("99", big), Ordering::Less);
    }

    #[test]
    fn text_segments_compare_lexically() {
        assert_eq!(natural_cmp("AC-2", "AC-10"), Ordering::Less);
        assert_eq!(natural_cmp("AC-2", "IR-1"), Ordering::Less);
        assert_eq!(natural_cmp("", "1"), Ordering::Less);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        assert_eq!(sorted(&["01", "1", "001"]), vec!["01", "1", "001"]);
    }
}
