//! UTF-8 helpers for byte haystacks that are usually, but not necessarily, valid UTF-8.
//!
//! Invalid sequences are never an error here: decoding reports `None` together with the
//! number of bytes making up the maximal invalid prefix, so callers can always make progress.

/// Decodes the first scalar value in `bytes`.
///
/// Returns the decoded `char` (or `None` if `bytes` starts with an invalid sequence) and
/// the number of bytes consumed. The length is 0 only if `bytes` is empty.
///
/// ```
/// use ib_unicode::utf8::decode;
///
/// assert_eq!(decode("☃x".as_bytes()), (Some('☃'), 3));
/// assert_eq!(decode(b"\xFFx"), (None, 1));
/// assert_eq!(decode(b""), (None, 0));
/// ```
#[inline]
pub fn decode(bytes: &[u8]) -> (Option<char>, usize) {
    if let Some(&b) = bytes.first() {
        if b < 0x80 {
            return (Some(b as char), 1);
        }
    }
    bstr::decode_utf8(bytes)
}

/// Decodes the last scalar value in `bytes`.
///
/// ```
/// use ib_unicode::utf8::decode_last;
///
/// assert_eq!(decode_last("x☃".as_bytes()), (Some('☃'), 3));
/// assert_eq!(decode_last(b"x\xE2\x98"), (None, 2));
/// ```
#[inline]
pub fn decode_last(bytes: &[u8]) -> (Option<char>, usize) {
    if let Some(&b) = bytes.last() {
        if b < 0x80 {
            return (Some(b as char), 1);
        }
    }
    bstr::decode_last_utf8(bytes)
}

/// Returns true if `at` does not split a UTF-8 encoded scalar value.
///
/// Both ends of the slice are boundaries. Offsets past the end are not. A continuation byte
/// is only a non-boundary inside a valid multi-byte sequence.
///
/// ```
/// use ib_unicode::utf8::is_char_boundary;
///
/// let s = "a☃".as_bytes();
/// assert!(is_char_boundary(s, 1));
/// assert!(!is_char_boundary(s, 2));
/// assert!(is_char_boundary(s, 4));
/// assert!(!is_char_boundary(s, 5));
///
/// assert!(is_char_boundary(b"\x80a", 0));
/// assert!(is_char_boundary(b"\x80\x80", 1));
/// ```
#[inline]
pub fn is_char_boundary(bytes: &[u8], at: usize) -> bool {
    match bytes.get(at) {
        // Not a continuation byte
        Some(&b) if (b as i8) >= -0x40 => true,
        Some(_) => {
            // A valid sequence starts at most 3 bytes back
            !(at.saturating_sub(3)..at).any(|i| match decode(&bytes[i..]) {
                (Some(_), len) => i + len > at,
                (None, _) => false,
            })
        }
        None => at == bytes.len(),
    }
}

/// Returns the offset just past the scalar value (or invalid byte sequence) starting at
/// `at`. Always greater than `at`, even at or past the end of `bytes`.
///
/// ```
/// use ib_unicode::utf8::next_char_boundary;
///
/// let s = "☃a".as_bytes();
/// assert_eq!(next_char_boundary(s, 0), 3);
/// assert_eq!(next_char_boundary(s, 3), 4);
/// assert_eq!(next_char_boundary(s, 4), 5);
/// ```
#[inline]
pub fn next_char_boundary(bytes: &[u8], at: usize) -> usize {
    match bytes.get(at..) {
        Some(rest) => at + decode(rest).1.max(1),
        None => at + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_invalid() {
        // Truncated 3-byte sequence followed by ASCII
        assert_eq!(decode(b"\xE2\x98a"), (None, 2));
        assert_eq!(decode_last(b"a\xE2\x98"), (None, 2));
        assert_eq!(decode_last(b""), (None, 0));
    }

    #[test]
    fn boundaries() {
        let s = "δx".as_bytes();
        let bounds: Vec<usize> = (0..=s.len()).filter(|&i| is_char_boundary(s, i)).collect();
        assert_eq!(bounds, vec![0, 2, 3]);
        assert_eq!(next_char_boundary(b"\xFF\xFF", 0), 1);
    }

    #[test]
    fn boundaries_invalid() {
        // Only the valid `δ` can be split
        let s = b"\x80a\xE2\x98b\xCE\xB4";
        let bounds: Vec<usize> = (0..=s.len()).filter(|&i| is_char_boundary(s, i)).collect();
        assert_eq!(bounds, vec![0, 1, 2, 3, 4, 5, 7]);
        assert!(is_char_boundary(b"\x80", 0));
        assert!(is_char_boundary(b"\x80", 1));
    }
}
