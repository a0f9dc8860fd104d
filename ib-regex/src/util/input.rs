use bon::Builder;

/// The parameters of a search: a haystack, where to start, and how to stop.
///
/// Look-behind assertions (`^`, `\b`, ...) always see the whole haystack, also before
/// `start`:
///
/// ```
/// use ib_regex::{Input, Regex};
///
/// let re = Regex::new(r"\bbar").unwrap();
/// assert!(re.find(Input::builder(b"foobar").start(3).build()).is_none());
/// assert!(re.find(Input::builder(b"foo bar").start(3).build()).is_some());
///
/// // Anchored searches only match at `start`
/// let re = Regex::new(r"[0-9]+").unwrap();
/// let input = Input::builder(b"a123").start(0).anchored(true).build();
/// assert!(re.find(input).is_none());
/// ```
#[derive(Builder, Clone, Copy, Debug)]
pub struct Input<'h> {
    #[builder(start_fn)]
    haystack: &'h [u8],
    /// Byte offset to start searching at.
    #[builder(default)]
    start: usize,
    /// Only report a match starting at `start`.
    #[builder(default)]
    anchored: bool,
    /// Stop at the first match found instead of the leftmost-first one.
    ///
    /// The reported end (and spans) may then differ from a normal search, but whether
    /// there is a match does not.
    #[builder(default)]
    earliest: bool,
}

impl<'h> Input<'h> {
    #[inline]
    pub fn new<H: ?Sized + AsRef<[u8]>>(haystack: &'h H) -> Self {
        Self {
            haystack: haystack.as_ref(),
            start: 0,
            anchored: false,
            earliest: false,
        }
    }

    #[inline]
    pub fn haystack(&self) -> &'h [u8] {
        self.haystack
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    #[inline]
    pub fn is_earliest(&self) -> bool {
        self.earliest
    }

    #[inline]
    pub(crate) fn set_start(&mut self, start: usize) {
        self.start = start;
    }
}

impl<'h, H: ?Sized + AsRef<[u8]>> From<&'h H> for Input<'h> {
    #[inline]
    fn from(haystack: &'h H) -> Self {
        Input::new(haystack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let input = Input::builder(b"abc").start(1).earliest(true).build();
        assert_eq!(input.haystack(), b"abc");
        assert_eq!(input.start(), 1);
        assert!(!input.is_anchored());
        assert!(input.is_earliest());

        let input: Input = b"xyz".into();
        assert_eq!(input.start(), 0);
        assert_eq!(Input::new(&vec![1u8, 2]).haystack(), &[1, 2]);
    }
}
