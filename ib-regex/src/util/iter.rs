/*!
Iteration over all non-overlapping matches in a haystack.

Each search starts where the previous match ended. After an empty match, the next search
starts one scalar value later (one byte if UTF-8 mode is disabled), so iteration always
makes progress. An empty match that ends where the previous match ended is skipped:

```
use ib_regex::Regex;

let re = Regex::new(r"a*").unwrap();
let ranges: Vec<_> = re.find_iter("baaab").map(|m| m.range()).collect();
// No empty match at 4, right after `aaa`
assert_eq!(ranges, vec![0..0, 1..4, 5..5]);
```
*/
use ib_unicode::utf8;
use regex_automata::util::pool::PoolGuard;

use crate::{
    error::MatchError,
    nfa::pikevm::Cache,
    regex::{CachePoolFn, Regex},
    util::{captures::Captures, input::Input, matches::Match},
};

/// A low level iterator that can report either matches or captures at each step.
///
/// Unlike [`CapturesMatches`], one [`Captures`] can be reused for every match:
///
/// ```
/// use ib_regex::{Regex, Span};
///
/// let re = Regex::new(r"(\w)\w*").unwrap();
/// let mut caps = re.create_captures();
/// let mut searcher = re.searcher("ab cd");
/// let mut firsts = Vec::new();
/// while searcher.next_captures(&mut caps).unwrap().is_some() {
///     firsts.push(caps.get(1).unwrap());
/// }
/// assert_eq!(firsts, vec![Span::from(0..1), Span::from(3..4)]);
/// ```
#[derive(Debug)]
pub struct Searcher<'r, 'h> {
    re: &'r Regex,
    cache: PoolGuard<'r, Cache, CachePoolFn>,
    haystack: &'h [u8],
    next_start: usize,
    last_match_end: Option<usize>,
    done: bool,
}

impl<'r, 'h> Searcher<'r, 'h> {
    pub(crate) fn new(re: &'r Regex, haystack: &'h [u8]) -> Self {
        Self {
            re,
            cache: re.pool().get(),
            haystack,
            next_start: 0,
            last_match_end: None,
            done: false,
        }
    }

    pub fn haystack(&self) -> &'h [u8] {
        self.haystack
    }

    /// The next match. Never fails.
    pub fn next_match(&mut self) -> Result<Option<Match>, MatchError> {
        let mut slots = [None; 2];
        self.advance(&mut slots)
    }

    /// The next match, with the spans of all groups in `caps`. `caps` is cleared once there
    /// are no more matches.
    pub fn next_captures(&mut self, caps: &mut Captures) -> Result<Option<Match>, MatchError> {
        if !caps.is_for(self.re.program().group_info()) {
            return Err(MatchError::CapturesMismatch);
        }
        let m = self.advance(caps.slots_mut())?;
        if m.is_none() {
            caps.clear();
        }
        Ok(m)
    }

    fn advance(&mut self, slots: &mut [Option<usize>]) -> Result<Option<Match>, MatchError> {
        loop {
            if self.done || self.next_start > self.haystack.len() {
                self.done = true;
                return Ok(None);
            }
            let mut input = Input::new(self.haystack);
            input.set_start(self.next_start);
            let Some(end) = self.re.search_unchecked(&mut self.cache, &input, slots) else {
                self.done = true;
                return Ok(None);
            };
            let m = Match::new(slots[0].unwrap_or(end), end);

            self.next_start = if m.is_empty() {
                self.step(end)
            } else {
                end
            };
            if m.is_empty() && self.last_match_end == Some(end) {
                continue;
            }
            self.last_match_end = Some(end);
            return Ok(Some(m));
        }
    }

    fn step(&self, at: usize) -> usize {
        if self.re.program().is_utf8() {
            utf8::next_char_boundary(self.haystack, at)
        } else {
            at + 1
        }
    }
}

/// An iterator over all non-overlapping matches, created by
/// [`Regex::find_iter`](crate::Regex::find_iter).
#[derive(Debug)]
pub struct FindMatches<'r, 'h>(Searcher<'r, 'h>);

impl<'r, 'h> FindMatches<'r, 'h> {
    pub(crate) fn new(searcher: Searcher<'r, 'h>) -> Self {
        Self(searcher)
    }
}

impl Iterator for FindMatches<'_, '_> {
    type Item = Match;

    #[inline]
    fn next(&mut self) -> Option<Match> {
        self.0.next_match().unwrap_or_else(|err| panic!("{err}"))
    }
}

impl core::iter::FusedIterator for FindMatches<'_, '_> {}

/// An iterator over the [`Captures`] of all non-overlapping matches, created by
/// [`Regex::captures_iter`](crate::Regex::captures_iter).
#[derive(Debug)]
pub struct CapturesMatches<'r, 'h>(Searcher<'r, 'h>);

impl<'r, 'h> CapturesMatches<'r, 'h> {
    pub(crate) fn new(searcher: Searcher<'r, 'h>) -> Self {
        Self(searcher)
    }
}

impl Iterator for CapturesMatches<'_, '_> {
    type Item = Captures;

    #[inline]
    fn next(&mut self) -> Option<Captures> {
        let mut caps = self.0.re.create_captures();
        self.0
            .next_captures(&mut caps)
            .unwrap_or_else(|err| panic!("{err}"))?;
        Some(caps)
    }
}

impl core::iter::FusedIterator for CapturesMatches<'_, '_> {}

#[cfg(test)]
mod tests {
    use crate::{nfa::compile, Regex, Span};

    fn ranges(pattern: &str, haystack: &str) -> Vec<(usize, usize)> {
        Regex::new(pattern)
            .unwrap()
            .find_iter(haystack)
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    #[test]
    fn empty_matches() {
        assert_eq!(ranges(r"\b", "ab"), vec![(0, 0), (2, 2)]);
        assert_eq!(ranges("", "abc"), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert_eq!(ranges("", "☃"), vec![(0, 0), (3, 3)]);
        assert_eq!(ranges("a*", "aab"), vec![(0, 2), (3, 3)]);
        assert_eq!(ranges("x*", ""), vec![(0, 0)]);
    }

    #[test]
    fn empty_matches_bytes() {
        let re = Regex::builder()
            .configure(compile::Config::new().utf8(false))
            .build("")
            .unwrap();
        let ranges: Vec<_> = re.find_iter("☃").map(|m| m.start()).collect();
        assert_eq!(ranges, vec![0, 1, 2, 3]);
    }

    #[test]
    fn non_overlapping() {
        assert_eq!(ranges("aa", "aaaaa"), vec![(0, 2), (2, 4)]);
        assert_eq!(ranges(r"\w+", "abc xyz"), vec![(0, 3), (4, 7)]);
        assert_eq!(ranges("z", "abc"), vec![]);
    }

    #[test]
    fn captures() {
        let re = Regex::new(r"\w+(\w)").unwrap();
        let all: Vec<_> = re.captures_iter("abc xyz").collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].get_match().unwrap().range(), 0..3);
        assert_eq!(all[1].get(1), Some(Span::from(6..7)));
    }

    #[test]
    fn captures_mismatch() {
        let (a, b) = (Regex::new("a").unwrap(), Regex::new("a").unwrap());
        let mut caps = b.create_captures();
        let err = a.searcher("a").next_captures(&mut caps).unwrap_err();
        assert_eq!(err, crate::MatchError::CapturesMismatch);
    }

    #[test]
    fn exhausted() {
        let re = Regex::new("a").unwrap();
        let mut searcher = re.searcher("a");
        assert!(searcher.next_match().unwrap().is_some());
        assert_eq!(searcher.next_match().unwrap(), None);
        assert_eq!(searcher.next_match().unwrap(), None);
    }
}
