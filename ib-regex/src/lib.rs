/*!
A Unicode-aware regular expression engine: a pattern parser, a Thompson NFA compiler and a
Pike VM, with leftmost-first matches, capture groups and non-overlapping iteration.

## Features
- Syntax compatible with a large subset of the [`regex`](https://docs.rs/regex/) crate,
  including Unicode classes, class set operations, inline flags and named groups. See
  [`syntax`] for details.
- Unicode case insensitivity, Unicode word boundaries and `\p{..}` classes, all optional.
- Search time linear in the haystack length, whatever the pattern.
- Byte haystacks: `&str` and `&[u8]`, valid UTF-8 or not. Offsets are byte offsets.
- A handle-based API ([`Regex`], [`Captures`], [`Searcher`](util::iter::Searcher)) that
  can be shared between threads.

## Usage
```
use ib_regex::{Regex, Span};

let re = Regex::new(r"(?P<year>\d{4})-(?P<month>\d{2})").unwrap();
assert!(re.is_match("on 2010-03"));

let mut caps = re.create_captures();
assert!(re.captures_at("on 2010-03", 0, &mut caps));
assert_eq!(caps.get_group_by_name("month"), Some(Span::from(8..10)));

let years: Vec<_> = re
    .captures_iter("2010-03 2024-11")
    .filter_map(|caps| caps.get_group_by_name("year"))
    .map(|span| span.range())
    .collect();
assert_eq!(years, vec![0..4, 8..12]);
```

Errors report what went wrong and where:
```
use ib_regex::{ErrorKind, Regex};

let err = Regex::new("a{2,1}").unwrap_err();
assert_eq!(err.kind(), &ErrorKind::InvalidRepeatRange);
assert_eq!(err.offset(), Some(1));
```

## Architecture
A pattern is parsed into a [`syntax::Ast`], compiled into an [`nfa::Program`] and executed by
the [`nfa::pikevm::PikeVM`]. Each layer can be used on its own.
*/
//! ## Performance
//! The following `Cargo.toml` settings are recommended if best performance is desired:
//! ```toml
//! [profile.release]
//! lto = "fat"
//! codegen-units = 1
//! ```
//!
//! ## Crate features
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]

pub mod error;
pub mod nfa;
mod regex;
pub mod syntax;
pub mod util;

pub use error::{Error, ErrorKind, MatchError};
pub use regex::{Builder, Regex};
pub use util::{
    captures::Captures,
    input::Input,
    matches::{Match, Span},
};

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERNS: &[&str] = &[
        "a",
        "abc|abd",
        "a|ab",
        "ab|a",
        "a*",
        "a+?",
        "a{2,3}",
        "a{2,}?",
        "(a|b)*c",
        "(a*)(b*)",
        "(?:foo|foobar)bar",
        r"\d+",
        r"[a-c]+[^a-c]",
        r"\w+@\w+\.com",
        r"\bfoo\b",
        r"\B",
        "^abc",
        "abc$",
        "(?m)^a",
        "(?m)b$",
        "(?i)straße",
        "(?s).+",
        ".+",
        r"[\p{Greek}]+",
        r"(?-u:\w)+",
        "(?P<x>x)|(?<y>y)",
        "(a?){5}a{5}",
        "",
        r"\b|a",
    ];

    const HAYSTACKS: &[&str] = &[
        "",
        "a",
        "aaab",
        "abd abc",
        "foobarbar foobar",
        "x1 23 456",
        "bob@mail.com, eve@x.org",
        "foo foobar barfoo foo",
        "abc\nabc\nb",
        "STRASSE Straße",
        "line1\nline2",
        "αβγ δ abc",
        "xy yx",
        "aaaaa aaaaaaaaa",
        "☃ ab\u{10FFFF}",
    ];

    #[test]
    fn same_matches_as_regex_crate() {
        for pattern in PATTERNS {
            let re = Regex::new(pattern).unwrap();
            let expected = ::regex::Regex::new(pattern).unwrap();
            for haystack in HAYSTACKS {
                let ours: Vec<_> = re.find_iter(haystack).map(|m| m.range()).collect();
                let theirs: Vec<_> = expected.find_iter(haystack).map(|m| m.range()).collect();
                assert_eq!(ours, theirs, "pattern {pattern:?} haystack {haystack:?}");
            }
        }
    }

    #[test]
    fn same_captures_as_regex_crate() {
        for pattern in PATTERNS {
            let re = Regex::new(pattern).unwrap();
            let expected = ::regex::Regex::new(pattern).unwrap();
            assert_eq!(re.captures_len(), expected.captures_len(), "{pattern:?}");
            for haystack in HAYSTACKS {
                let ours: Vec<Vec<_>> = re
                    .captures_iter(haystack)
                    .map(|caps| caps.iter().map(|span| span.map(|s| s.range())).collect())
                    .collect();
                let theirs: Vec<Vec<_>> = expected
                    .captures_iter(haystack)
                    .map(|caps| caps.iter().map(|m| m.map(|m| m.range())).collect())
                    .collect();
                assert_eq!(ours, theirs, "pattern {pattern:?} haystack {haystack:?}");
            }
        }
    }

    /// Without UTF-8 mode, empty matches advance one byte at a time like `regex::bytes`.
    #[test]
    fn same_empty_matches_as_regex_bytes() {
        for pattern in ["", "a*", r"\B", r"\b|a"] {
            let re = Regex::builder()
                .configure(nfa::compile::Config::new().utf8(false))
                .build(pattern)
                .unwrap();
            let expected = ::regex::bytes::Regex::new(pattern).unwrap();
            for haystack in HAYSTACKS {
                let ours: Vec<_> = re.find_iter(haystack).map(|m| m.range()).collect();
                let theirs: Vec<_> = expected
                    .find_iter(haystack.as_bytes())
                    .map(|m| m.range())
                    .collect();
                assert_eq!(ours, theirs, "pattern {pattern:?} haystack {haystack:?}");
            }
        }
    }
}
