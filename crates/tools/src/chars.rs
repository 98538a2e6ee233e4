//! Character-offset helpers for UTF-8 strings.
//!
//! DOM character data is addressed by Unicode scalar offsets, while Rust strings
//! are indexed by byte. Every helper here takes character offsets and clamps
//! out-of-range values to the end of the string, so callers validate bounds
//! before they get here.

/// Number of Unicode scalar values in `s`.
#[inline]
pub fn char_len(s: &str) -> usize {
    if s.is_ascii() {
        return s.len();
    }
    s.chars().count()
}

/// Byte index of the character at `char_offset`, or `s.len()` past the end.
///
/// # Examples
///
/// ```
/// use tools::byte_offset;
///
/// let s = "a€b"; // '€' is 3 bytes
/// assert_eq!(byte_offset(s, 0), 0);
/// assert_eq!(byte_offset(s, 1), 1);
/// assert_eq!(byte_offset(s, 2), 4);
/// assert_eq!(byte_offset(s, 9), 5);
/// ```
#[inline]
pub fn byte_offset(s: &str, char_offset: usize) -> usize {
    if s.is_ascii() {
        return char_offset.min(s.len());
    }
    s.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

/// Substring between two character offsets (`start..end`).
pub fn slice_chars(s: &str, start: usize, end: usize) -> &str {
    let end = end.max(start);
    let from = byte_offset(s, start);
    let to = byte_offset(s, end);
    &s[from..to]
}

/// Split `s` at a character offset.
pub fn split_chars(s: &str, at: usize) -> (&str, &str) {
    s.split_at(byte_offset(s, at))
}

/// Remove `count` characters starting at `start`, in place.
pub fn delete_chars(s: &mut String, start: usize, count: usize) {
    let from = byte_offset(s, start);
    let to = byte_offset(s, start.saturating_add(count));
    s.replace_range(from..to, "");
}

/// Insert `data` before the character at `at`, in place.
pub fn insert_chars(s: &mut String, at: usize, data: &str) {
    let idx = byte_offset(s, at);
    s.insert_str(idx, data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_len_counts_scalars_not_bytes() {
        assert_eq!(char_len("abc"), 3);
        assert_eq!(char_len("café"), 4);
        assert_eq!(char_len("😊x"), 2);
    }

    #[test]
    fn slice_chars_handles_multibyte() {
        assert_eq!(slice_chars("naïve", 1, 4), "aïv");
        assert_eq!(slice_chars("naïve", 3, 99), "ve");
        assert_eq!(slice_chars("naïve", 4, 2), "");
    }

    #[test]
    fn split_chars_at_boundaries() {
        assert_eq!(split_chars("a€b", 0), ("", "a€b"));
        assert_eq!(split_chars("a€b", 2), ("a€", "b"));
        assert_eq!(split_chars("a€b", 3), ("a€b", ""));
    }

    #[test]
    fn delete_and_insert_in_place() {
        let mut s = String::from("héllo");
        delete_chars(&mut s, 1, 3);
        assert_eq!(s, "ho");
        insert_chars(&mut s, 1, "ëll");
        assert_eq!(s, "hëllo");
        delete_chars(&mut s, 4, 10);
        assert_eq!(s, "hëll");
    }
}
