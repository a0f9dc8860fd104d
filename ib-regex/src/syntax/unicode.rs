//! Unicode table lookups.
//!
//! The tables (general categories, scripts, binary properties, Perl classes and simple case
//! folding) come from [`regex_syntax`]. Only the data is borrowed: property names are looked
//! up by handing `regex_syntax` a minimal `\p{..}` pattern and reading back the class.
//!
//! Without the `unicode` feature, every lookup fails and case folding is ASCII-only.
use super::class::Class;
#[cfg(feature = "unicode")]
use super::class::{ClassKind, ClassRange};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Perl {
    Digit,
    Space,
    Word,
}

/// Looks up a Unicode property class such as `Greek`, `L`, `Script=Han` or `sc:Latin`.
#[cfg(feature = "unicode")]
pub(crate) fn property(name: &str) -> Option<Class> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' ' | '=' | ':' | '!' | '.'));
    if !valid {
        return None;
    }
    lookup(&format!(r"\p{{{name}}}"))
}

#[cfg(not(feature = "unicode"))]
pub(crate) fn property(_name: &str) -> Option<Class> {
    None
}

/// The Unicode-aware `\d`, `\s` or `\w` class.
#[cfg(feature = "unicode")]
pub(crate) fn perl(kind: Perl) -> Option<Class> {
    use std::sync::OnceLock;

    static DIGIT: OnceLock<Option<Class>> = OnceLock::new();
    static SPACE: OnceLock<Option<Class>> = OnceLock::new();
    static WORD: OnceLock<Option<Class>> = OnceLock::new();

    let (cell, pattern) = match kind {
        Perl::Digit => (&DIGIT, r"\d"),
        Perl::Space => (&SPACE, r"\s"),
        Perl::Word => (&WORD, r"\w"),
    };
    cell.get_or_init(|| lookup(pattern)).clone()
}

#[cfg(not(feature = "unicode"))]
pub(crate) fn perl(_kind: Perl) -> Option<Class> {
    None
}

#[cfg(feature = "unicode")]
fn lookup(pattern: &str) -> Option<Class> {
    use regex_syntax::hir::{self, HirKind};

    let hir = regex_syntax::ParserBuilder::new()
        .unicode(true)
        .build()
        .parse(pattern)
        .ok()?;
    match hir.kind() {
        HirKind::Class(hir::Class::Unicode(class)) => Some(Class::new(
            ClassKind::Unicode,
            class
                .ranges()
                .iter()
                .map(|r| ClassRange::new(r.start() as u32, r.end() as u32)),
        )),
        // Single code point properties are simplified to literals
        HirKind::Literal(hir::Literal(bytes)) => {
            let s = core::str::from_utf8(bytes).ok()?;
            Some(Class::new(
                ClassKind::Unicode,
                s.chars().map(|c| ClassRange::single(c as u32)),
            ))
        }
        _ => None,
    }
}

/// Closes a Unicode class under simple case folding.
#[cfg(feature = "unicode")]
pub(crate) fn simple_fold(class: &mut Class) {
    use regex_syntax::hir::{ClassUnicode, ClassUnicodeRange};

    let mut unicode = ClassUnicode::new(class.ranges().iter().filter_map(|r| {
        Some(ClassUnicodeRange::new(
            char::from_u32(r.start)?,
            char::from_u32(r.end)?,
        ))
    }));
    match unicode.try_case_fold_simple() {
        Ok(()) => {
            *class = Class::new(
                ClassKind::Unicode,
                unicode
                    .ranges()
                    .iter()
                    .map(|r| ClassRange::new(r.start() as u32, r.end() as u32)),
            )
        }
        Err(_) => class.ascii_case_fold(),
    }
}

#[cfg(not(feature = "unicode"))]
pub(crate) fn simple_fold(class: &mut Class) {
    class.ascii_case_fold()
}

/// Whether `c` is a Unicode word character, i.e. a member of `\w`.
///
/// Falls back to ASCII word characters without the `unicode` feature.
#[inline]
pub fn is_word_char(c: char) -> bool {
    if c.is_ascii() {
        return ib_unicode::ascii::is_word_byte(c as u8);
    }
    #[cfg(feature = "unicode")]
    return regex_syntax::try_is_word_character(c).unwrap_or(false);
    #[cfg(not(feature = "unicode"))]
    false
}

#[cfg(all(test, feature = "unicode"))]
mod tests {
    use super::*;

    #[test]
    fn properties() {
        let so = property("So").unwrap();
        assert!(so.contains('☃' as u32));
        assert!(!so.contains('a' as u32));

        let greek = property("Greek").unwrap();
        assert!(greek.contains('δ' as u32));
        assert!(property("Script=Greek").unwrap() == greek);

        assert_eq!(property("NotAProperty"), None);
        assert_eq!(property("L}|.*"), None);
        assert_eq!(property(""), None);
    }

    #[test]
    fn perl_classes() {
        let digit = perl(Perl::Digit).unwrap();
        assert!(digit.contains('٣' as u32));
        let word = perl(Perl::Word).unwrap();
        assert!(word.contains('δ' as u32));
        assert!(!word.contains(' ' as u32));
        assert!(is_word_char('é'));
        assert!(!is_word_char('☃'));
    }

    #[test]
    fn fold() {
        let mut class = Class::from_char(ClassKind::Unicode, 'k' as u32);
        simple_fold(&mut class);
        // k, K and KELVIN SIGN
        assert_eq!(class.ranges().len(), 3);
        assert!(class.contains('\u{212A}' as u32));
    }
}
