/// Returns true if the byte is an ASCII word character, i.e. `[0-9A-Za-z_]`.
///
/// ```
/// use ib_unicode::ascii::is_word_byte;
///
/// assert!(is_word_byte(b'_'));
/// assert!(!is_word_byte(b'-'));
/// assert!(!is_word_byte(0xCE));
/// ```
#[inline]
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Search for the first occurrence of a byte in a haystack.
///
/// ```
/// use ib_unicode::ascii::find_byte;
///
/// assert_eq!(find_byte(b"the quick brown fox", b'q'), Some(4));
/// assert_eq!(find_byte(b"the quick brown fox", b'z'), None);
/// ```
#[inline]
pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    #[cfg(not(feature = "perf-find"))]
    return haystack.iter().position(|&b| b == needle);
    #[cfg(feature = "perf-find")]
    memchr::memchr(needle, haystack)
}

/// Search for the first occurrence of two possible bytes in a haystack.
///
/// This returns the index corresponding to the first occurrence of one of the
/// needle bytes in `haystack`, or `None` if one is not found. If an index is
/// returned, it is guaranteed to be less than `haystack.len()`.
///
/// While this is semantically the same as something like
/// `haystack.iter().position(|&b| b == needle1 || b == needle2)`, this routine
/// will attempt to use highly optimized vector operations that can be an order
/// of magnitude faster (or more).
///
/// # Example
///
/// This shows how to find the first position of one of two possible bytes in a
/// haystack.
///
/// ```
/// use ib_unicode::ascii::find_byte2;
///
/// let haystack = b"the quick brown fox";
/// assert_eq!(find_byte2(haystack, b'k', b'q'), Some(4));
/// ```
#[inline]
pub fn find_byte2(haystack: &[u8], needle1: u8, needle2: u8) -> Option<usize> {
    #[cfg(not(feature = "perf-find"))]
    return haystack.iter().position(|&b| b == needle1 || b == needle2);
    #[cfg(feature = "perf-find")]
    // sse2/avx2 (128) on x86_64
    memchr::memchr2(needle1, needle2, haystack)
}

/// Like [`find_byte2`], but with three needles.
///
/// ```
/// use ib_unicode::ascii::find_byte3;
///
/// assert_eq!(find_byte3(b"the quick brown fox", b'x', b'b', b'w'), Some(10));
/// ```
#[inline]
pub fn find_byte3(haystack: &[u8], needle1: u8, needle2: u8, needle3: u8) -> Option<usize> {
    #[cfg(not(feature = "perf-find"))]
    return haystack
        .iter()
        .position(|&b| b == needle1 || b == needle2 || b == needle3);
    #[cfg(feature = "perf-find")]
    memchr::memchr3(needle1, needle2, needle3, haystack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find() {
        let hay = b"12345678901234567890aA";
        assert_eq!(find_byte(hay, b'A'), Some(21));
        assert_eq!(find_byte2(hay, b'A', b'a'), Some(20));
        assert_eq!(find_byte3(hay, b'x', b'y', b'0'), Some(9));
        assert_eq!(find_byte3(b"", b'x', b'y', b'0'), None);
    }

    #[test]
    fn word() {
        let words = (0..=u8::MAX).filter(|&b| is_word_byte(b)).count();
        assert_eq!(words, 10 + 26 * 2 + 1);
    }
}
