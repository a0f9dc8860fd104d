use std::collections::HashSet;

use bitflags::bitflags;

use super::{
    ast::{Ast, Capture, Group, Literal, Look},
    class::{Class, ClassKind, ClassRange},
    unicode::{self, Perl},
    Config,
};
use crate::error::{Error, ErrorKind};

type Result<T> = core::result::Result<T, Error>;

bitflags! {
    /// Inline flags in effect at a point of the pattern.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct Flags: u8 {
        /// `i`
        const CASE_INSENSITIVE = 1 << 0;
        /// `m`
        const MULTI_LINE = 1 << 1;
        /// `s`
        const DOT_MATCHES_NEW_LINE = 1 << 2;
        /// `U`
        const SWAP_GREED = 1 << 3;
        /// `u`
        const UNICODE = 1 << 4;
        /// `x`
        const IGNORE_WHITESPACE = 1 << 5;
    }
}

impl Flags {
    pub(crate) fn from_config(config: &Config) -> Self {
        let mut flags = Flags::empty();
        flags.set(Flags::CASE_INSENSITIVE, config.case_insensitive);
        flags.set(Flags::MULTI_LINE, config.multi_line);
        flags.set(Flags::DOT_MATCHES_NEW_LINE, config.dot_matches_new_line);
        flags.set(Flags::SWAP_GREED, config.swap_greed);
        flags.set(Flags::UNICODE, config.unicode);
        flags.set(Flags::IGNORE_WHITESPACE, config.ignore_whitespace);
        flags
    }

    fn from_letter(c: char) -> Option<Self> {
        Some(match c {
            'i' => Flags::CASE_INSENSITIVE,
            'm' => Flags::MULTI_LINE,
            's' => Flags::DOT_MATCHES_NEW_LINE,
            'U' => Flags::SWAP_GREED,
            'u' => Flags::UNICODE,
            'x' => Flags::IGNORE_WHITESPACE,
            _ => return None,
        })
    }

    fn class_kind(self) -> ClassKind {
        if self.contains(Flags::UNICODE) {
            ClassKind::Unicode
        } else {
            ClassKind::Bytes
        }
    }
}

/// The result of an escape sequence.
enum Primitive {
    Literal(Literal),
    Class(Class),
    Look(Look),
}

/// One member of a bracketed class, before ranges are resolved.
enum ClassItem {
    Char(u32),
    Class(Class),
}

pub(crate) struct Parser<'p> {
    pattern: &'p str,
    pos: usize,
    depth: u32,
    nest_limit: u32,
    captures: u32,
    names: HashSet<&'p str>,
}

impl<'p> Parser<'p> {
    pub(crate) fn new(pattern: &'p str, config: &Config) -> Self {
        Self {
            pattern,
            pos: 0,
            depth: 0,
            nest_limit: config.nest_limit,
            captures: 0,
            names: HashSet::new(),
        }
    }

    pub(crate) fn parse(mut self, mut flags: Flags) -> Result<Ast> {
        let ast = self.parse_alternation(&mut flags)?;
        // Only `)` can stop the top level alternation early
        if self.peek().is_some() {
            return Err(Error::new(ErrorKind::UnopenedParenthesis, self.pos));
        }
        Ok(ast)
    }

    fn rest(&self) -> &'p str {
        &self.pattern[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Skips whitespace and `#` comments in verbose mode.
    fn skip_whitespace(&mut self, flags: Flags) {
        if !flags.contains(Flags::IGNORE_WHITESPACE) {
            return;
        }
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                match self.rest().find('\n') {
                    Some(i) => self.pos += i + 1,
                    None => self.pos = self.pattern.len(),
                }
            } else {
                break;
            }
        }
    }

    fn enter(&mut self, open: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > self.nest_limit {
            return Err(Error::new(
                ErrorKind::NestLimitExceeded(self.nest_limit),
                open,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// `flags` is shared by all branches so that a directive like `(?i)` also applies to
    /// the following branches of the same group.
    fn parse_alternation(&mut self, flags: &mut Flags) -> Result<Ast> {
        let mut branches = vec![self.parse_concat(flags)?];
        while self.eat('|') {
            branches.push(self.parse_concat(flags)?);
        }
        Ok(Ast::alternate(branches))
    }

    fn parse_concat(&mut self, flags: &mut Flags) -> Result<Ast> {
        let mut items: Vec<Ast> = Vec::new();
        // Whether the last item can take a repetition operator, and how many it already has
        let mut repeatable = false;
        let mut stacked = 0;
        loop {
            self.skip_whitespace(*flags);
            let Some(c) = self.peek() else { break };
            match c {
                '|' | ')' => break,
                '*' | '+' | '?' | '{' => {
                    let start = self.pos;
                    if !repeatable {
                        return Err(Error::new(ErrorKind::RepetitionMissing, start));
                    }
                    stacked += 1;
                    if self.depth + stacked > self.nest_limit {
                        return Err(Error::new(
                            ErrorKind::NestLimitExceeded(self.nest_limit),
                            start,
                        ));
                    }
                    let (min, max) = match c {
                        '*' => {
                            self.bump();
                            (0, None)
                        }
                        '+' => {
                            self.bump();
                            (1, None)
                        }
                        '?' => {
                            self.bump();
                            (0, Some(1))
                        }
                        _ => self.parse_counted(*flags)?,
                    };
                    let lazy = self.eat('?');
                    let greedy = lazy == flags.contains(Flags::SWAP_GREED);
                    if let Some(sub) = items.pop() {
                        items.push(Ast::repeat(sub, min, max, greedy));
                    }
                }
                '(' => {
                    stacked = 0;
                    match self.parse_group(flags)? {
                        Some(group) => {
                            items.push(group);
                            repeatable = true;
                        }
                        // A flag directive is not an expression
                        None => repeatable = false,
                    }
                }
                _ => {
                    stacked = 0;
                    items.push(self.parse_atom(*flags)?);
                    repeatable = true;
                }
            }
        }
        Ok(Ast::concat(items))
    }

    /// `{n}`, `{n,}` or `{n,m}`.
    fn parse_counted(&mut self, flags: Flags) -> Result<(u32, Option<u32>)> {
        let start = self.pos;
        let invalid = || Error::new(ErrorKind::InvalidRepeatRange, start);
        self.bump();
        self.skip_whitespace(flags);
        let min = self.parse_decimal().ok_or_else(invalid)?;
        self.skip_whitespace(flags);
        let max = if self.eat(',') {
            self.skip_whitespace(flags);
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                Some(self.parse_decimal().ok_or_else(invalid)?)
            } else {
                None
            }
        } else {
            Some(min)
        };
        self.skip_whitespace(flags);
        if !self.eat('}') {
            return Err(invalid());
        }
        if max.is_some_and(|max| max < min) {
            return Err(invalid());
        }
        Ok((min, max))
    }

    fn parse_decimal(&mut self) -> Option<u32> {
        let digits = self
            .rest()
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return None;
        }
        let value = self.rest()[..digits].parse().ok()?;
        self.pos += digits;
        Some(value)
    }

    fn parse_atom(&mut self, flags: Flags) -> Result<Ast> {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(Ast::Empty);
        };
        Ok(match c {
            '.' => Ast::Class(dot(flags)),
            '^' => Ast::Look(if flags.contains(Flags::MULTI_LINE) {
                Look::StartLine
            } else {
                Look::Start
            }),
            '$' => Ast::Look(if flags.contains(Flags::MULTI_LINE) {
                Look::EndLine
            } else {
                Look::End
            }),
            '[' => {
                self.pos = start;
                Ast::Class(self.parse_class(flags)?)
            }
            '\\' => {
                self.pos = start;
                match self.parse_escape(flags, false)? {
                    Primitive::Literal(lit) => literal(lit, flags),
                    Primitive::Class(class) => Ast::Class(class),
                    Primitive::Look(look) => Ast::Look(look),
                }
            }
            c => literal(Literal::Char(c), flags),
        })
    }

    /// Returns `None` for a flag directive such as `(?i)`, after applying it to `flags`.
    fn parse_group(&mut self, flags: &mut Flags) -> Result<Option<Ast>> {
        let open = self.pos;
        self.bump();
        self.enter(open)?;

        let mut inner = *flags;
        let capture = if self.eat_str("?P<")
            || (!self.rest().starts_with("?<=")
                && !self.rest().starts_with("?<!")
                && self.eat_str("?<"))
        {
            // Indices follow opening parenthesis order
            self.captures += 1;
            let index = self.captures;
            let name = self.parse_capture_name()?;
            Some(Capture {
                index,
                name: Some(name.into()),
            })
        } else if self.eat('?') {
            if self.rest().starts_with(|c| c == '=' || c == '!')
                || self.rest().starts_with("<=")
                || self.rest().starts_with("<!")
            {
                return Err(Error::new(ErrorKind::UnsupportedGroup, open));
            }
            let (new_flags, directive) = self.parse_flags(*flags, open)?;
            if directive {
                *flags = new_flags;
                self.leave();
                return Ok(None);
            }
            inner = new_flags;
            None
        } else {
            self.captures += 1;
            Some(Capture {
                index: self.captures,
                name: None,
            })
        };

        let sub = self.parse_alternation(&mut inner)?;
        if !self.eat(')') {
            return Err(Error::new(ErrorKind::UnclosedParenthesis, open));
        }
        self.leave();
        Ok(Some(Ast::Group(Group {
            sub: Box::new(sub),
            capture,
        })))
    }

    fn parse_capture_name(&mut self) -> Result<&'p str> {
        let start = self.pos;
        let invalid = Error::new(ErrorKind::InvalidCaptureName, start);
        let Some(len) = self.rest().find('>') else {
            return Err(invalid);
        };
        let name = &self.rest()[..len];
        let mut chars = name.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c == '_' || c.is_alphabetic())
            && chars.all(|c| matches!(c, '_' | '.' | '[' | ']') || c.is_alphanumeric());
        if !valid {
            return Err(invalid);
        }
        if !self.names.insert(name) {
            return Err(Error::new(ErrorKind::DuplicateCaptureName, start));
        }
        self.pos += len + 1;
        Ok(name)
    }

    /// Parses the flags of `(?flags)` or `(?flags:`, after the `?`.
    ///
    /// Returns the new flags and whether this is a directive (closed by `)`).
    fn parse_flags(&mut self, mut flags: Flags, open: usize) -> Result<(Flags, bool)> {
        let mut empty = true;
        // Position of `-` while no flag follows it yet
        let mut dangling: Option<usize> = None;
        let mut negate = false;
        let mut seen = Flags::empty();
        loop {
            let at = self.pos;
            match self.bump() {
                None => return Err(Error::new(ErrorKind::UnclosedParenthesis, open)),
                Some(end @ (':' | ')')) => {
                    if let Some(dash) = dangling {
                        return Err(Error::new(ErrorKind::UnrecognizedFlag, dash));
                    }
                    if end == ')' && empty {
                        return Err(Error::new(ErrorKind::UnrecognizedFlag, at));
                    }
                    return Ok((flags, end == ')'));
                }
                Some('-') => {
                    if negate {
                        return Err(Error::new(ErrorKind::UnrecognizedFlag, at));
                    }
                    negate = true;
                    dangling = Some(at);
                }
                Some(c) => {
                    let flag = Flags::from_letter(c)
                        .ok_or_else(|| Error::new(ErrorKind::UnrecognizedFlag, at))?;
                    // Each flag at most once per group, negated or not
                    if seen.contains(flag) {
                        return Err(Error::new(ErrorKind::UnrecognizedFlag, at));
                    }
                    seen |= flag;
                    flags.set(flag, !negate);
                    empty = false;
                    dangling = None;
                }
            }
        }
    }

    fn parse_escape(&mut self, flags: Flags, in_class: bool) -> Result<Primitive> {
        let start = self.pos;
        self.bump();
        let Some(c) = self.bump() else {
            return Err(Error::new(ErrorKind::TrailingBackslash, start));
        };
        let lit = |c: char| Ok(Primitive::Literal(Literal::Char(c)));
        match c {
            'a' => lit('\x07'),
            'f' => lit('\x0C'),
            't' => lit('\t'),
            'n' => lit('\n'),
            'r' => lit('\r'),
            'v' => lit('\x0B'),
            'x' | 'u' | 'U' => self.parse_hex(c, start, flags).map(Primitive::Literal),
            'd' | 's' | 'w' | 'D' | 'S' | 'W' => {
                self.perl_class(c, start, flags).map(Primitive::Class)
            }
            'p' | 'P' => self
                .unicode_class(c == 'P', start, flags)
                .map(Primitive::Class),
            'A' | 'z' | 'b' | 'B' if !in_class => {
                let unicode = flags.contains(Flags::UNICODE);
                Ok(Primitive::Look(match (c, unicode) {
                    ('A', _) => Look::Start,
                    ('z', _) => Look::End,
                    ('b', true) => Look::WordUnicode,
                    ('b', false) => Look::WordAscii,
                    (_, true) => Look::WordUnicodeNegate,
                    (_, false) => Look::WordAsciiNegate,
                }))
            }
            '0'..='9' => Err(Error::new(ErrorKind::UnsupportedBackreference, start)),
            c if is_escapable(c) => lit(c),
            _ => Err(Error::new(ErrorKind::InvalidEscape, start)),
        }
    }

    /// `\xHH`, `\uHHHH`, `\UHHHHHHHH` or the braced `\x{H..}` forms.
    fn parse_hex(&mut self, kind: char, start: usize, flags: Flags) -> Result<Literal> {
        let invalid = || Error::new(ErrorKind::InvalidEscape, start);
        let hex_len = |s: &str| s.bytes().take_while(u8::is_ascii_hexdigit).count();
        let value = if self.eat('{') {
            let len = hex_len(self.rest());
            if len == 0 || len > 8 {
                return Err(invalid());
            }
            let value = u32::from_str_radix(&self.rest()[..len], 16).map_err(|_| invalid())?;
            self.pos += len;
            if !self.eat('}') {
                return Err(invalid());
            }
            value
        } else {
            let digits = match kind {
                'x' => 2,
                'u' => 4,
                _ => 8,
            };
            if hex_len(self.rest()) < digits {
                return Err(invalid());
            }
            let value =
                u32::from_str_radix(&self.rest()[..digits], 16).map_err(|_| invalid())?;
            self.pos += digits;
            value
        };
        if !flags.contains(Flags::UNICODE) && (0x80..=0xFF).contains(&value) {
            return Ok(Literal::Byte(value as u8));
        }
        char::from_u32(value).map(Literal::Char).ok_or_else(invalid)
    }

    fn perl_class(&self, c: char, start: usize, flags: Flags) -> Result<Class> {
        let perl = match c.to_ascii_lowercase() {
            'd' => Perl::Digit,
            's' => Perl::Space,
            _ => Perl::Word,
        };
        let mut class = if flags.contains(Flags::UNICODE) {
            unicode::perl(perl)
                .ok_or_else(|| Error::new(ErrorKind::UnsupportedUnicodePropertyName, start))?
        } else {
            let kind = ClassKind::Bytes;
            match perl {
                Perl::Digit => Class::ascii(kind, &[(b'0', b'9')]),
                Perl::Space => Class::ascii(kind, &[(b'\t', b'\r'), (b' ', b' ')]),
                Perl::Word => Class::ascii(kind, WORD),
            }
        };
        if c.is_ascii_uppercase() {
            class.negate();
        }
        Ok(class)
    }

    /// `\pX`, `\p{Name}` and the negated `\P` forms.
    fn unicode_class(&mut self, negated: bool, start: usize, flags: Flags) -> Result<Class> {
        if !flags.contains(Flags::UNICODE) {
            return Err(Error::new(ErrorKind::UnicodeNotAllowed, start));
        }
        let name = if self.eat('{') {
            let Some(len) = self.rest().find('}') else {
                return Err(Error::new(ErrorKind::InvalidEscape, start));
            };
            let name = &self.rest()[..len];
            self.pos += len + 1;
            name
        } else {
            let name_start = self.pos;
            if self.bump().is_none() {
                return Err(Error::new(ErrorKind::InvalidEscape, start));
            }
            &self.pattern[name_start..self.pos]
        };
        let mut class = unicode::property(name)
            .ok_or_else(|| Error::new(ErrorKind::UnsupportedUnicodePropertyName, start))?;
        if flags.contains(Flags::CASE_INSENSITIVE) {
            class.case_fold_simple();
        }
        if negated {
            class.negate();
        }
        Ok(class)
    }

    fn parse_class(&mut self, flags: Flags) -> Result<Class> {
        let open = self.pos;
        self.bump();
        self.enter(open)?;
        let negated = self.eat('^');
        let mut class = self.parse_class_union(flags, open, true)?;
        loop {
            self.skip_whitespace(flags);
            if self.eat_str("&&") {
                let rhs = self.parse_class_union(flags, open, false)?;
                class.intersect(&rhs);
            } else if self.eat_str("--") {
                let rhs = self.parse_class_union(flags, open, false)?;
                class.difference(&rhs);
            } else if self.eat_str("~~") {
                let rhs = self.parse_class_union(flags, open, false)?;
                class.symmetric_difference(&rhs);
            } else if self.eat(']') {
                break;
            } else {
                return Err(Error::new(ErrorKind::UnclosedCharacterClass, open));
            }
        }
        // Fold before negating, so that `(?i)[^k]` excludes the Kelvin sign too
        if flags.contains(Flags::CASE_INSENSITIVE) {
            class.case_fold_simple();
        }
        if negated {
            class.negate();
        }
        self.leave();
        Ok(class)
    }

    /// Parses class items up to the closing `]` or the next set operator.
    fn parse_class_union(&mut self, flags: Flags, open: usize, mut first: bool) -> Result<Class> {
        let mut set = Class::empty(flags.class_kind());
        loop {
            self.skip_whitespace(flags);
            let Some(c) = self.peek() else {
                return Err(Error::new(ErrorKind::UnclosedCharacterClass, open));
            };
            // A leading `]` is a literal
            if !first
                && (c == ']'
                    || ["&&", "--", "~~"]
                        .iter()
                        .any(|op| self.rest().starts_with(op)))
            {
                break;
            }
            first = false;

            if c == '[' {
                match self.parse_posix_class(flags) {
                    Some(posix) => set.union(&posix),
                    None => {
                        let nested = self.parse_class(flags)?;
                        set.union(&nested);
                    }
                }
                continue;
            }

            let item_start = self.pos;
            match self.parse_class_item(flags, open)? {
                ClassItem::Class(class) => set.union(&class),
                ClassItem::Char(lo) => {
                    if self.peek() != Some('-') || self.rest().starts_with("--") {
                        set.push(ClassRange::single(lo));
                        continue;
                    }
                    self.bump();
                    self.skip_whitespace(flags);
                    if self.peek() == Some(']') {
                        // Trailing `-` is a literal
                        set.push(ClassRange::single(lo));
                        set.push(ClassRange::single('-' as u32));
                        continue;
                    }
                    let hi = match self.parse_class_item(flags, open)? {
                        ClassItem::Char(hi) if hi >= lo => hi,
                        _ => return Err(Error::new(ErrorKind::InvalidClassRange, item_start)),
                    };
                    set.push(ClassRange::new(lo, hi));
                }
            }
        }
        Ok(set)
    }

    fn parse_class_item(&mut self, flags: Flags, open: usize) -> Result<ClassItem> {
        let start = self.pos;
        let cp = match self.peek() {
            None => return Err(Error::new(ErrorKind::UnclosedCharacterClass, open)),
            Some('\\') => match self.parse_escape(flags, true)? {
                Primitive::Literal(Literal::Char(c)) => c as u32,
                Primitive::Literal(Literal::Byte(b)) => return Ok(ClassItem::Char(b as u32)),
                Primitive::Class(class) => return Ok(ClassItem::Class(class)),
                Primitive::Look(_) => return Err(Error::new(ErrorKind::InvalidEscape, start)),
            },
            Some(c) => {
                self.bump();
                c as u32
            }
        };
        if !flags.contains(Flags::UNICODE) && cp > 0x7F {
            return Err(Error::new(ErrorKind::UnicodeNotAllowed, start));
        }
        Ok(ClassItem::Char(cp))
    }

    /// `[:alpha:]` or `[:^alpha:]`. Returns `None` without consuming anything if the
    /// input is not a known ASCII class, in which case `[` starts a nested class.
    fn parse_posix_class(&mut self, flags: Flags) -> Option<Class> {
        let rest = self.rest().strip_prefix("[:")?;
        let end = rest.find(":]")?;
        let name = &rest[..end];
        let (negated, name) = match name.strip_prefix('^') {
            Some(name) => (true, name),
            None => (false, name),
        };
        let ranges: &[(u8, u8)] = match name {
            "alnum" => &[(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')],
            "alpha" => &[(b'A', b'Z'), (b'a', b'z')],
            "ascii" => &[(0x00, 0x7F)],
            "blank" => &[(b'\t', b'\t'), (b' ', b' ')],
            "cntrl" => &[(0x00, 0x1F), (0x7F, 0x7F)],
            "digit" => &[(b'0', b'9')],
            "graph" => &[(b'!', b'~')],
            "lower" => &[(b'a', b'z')],
            "print" => &[(b' ', b'~')],
            "punct" => &[(b'!', b'/'), (b':', b'@'), (b'[', b'`'), (b'{', b'~')],
            "space" => &[(b'\t', b'\r'), (b' ', b' ')],
            "upper" => &[(b'A', b'Z')],
            "word" => WORD,
            "xdigit" => &[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')],
            _ => return None,
        };
        self.pos += 2 + end + 2;
        let mut class = Class::ascii(flags.class_kind(), ranges);
        if negated {
            class.negate();
        }
        Some(class)
    }
}

const WORD: &[(u8, u8)] = &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')];

/// Matches in regex-syntax: ASCII non-alphanumerics except `<` and `>`.
fn is_escapable(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_alphanumeric() && c != '<' && c != '>'
}

fn dot(flags: Flags) -> Class {
    let kind = flags.class_kind();
    let mut class = Class::full(kind);
    if !flags.contains(Flags::DOT_MATCHES_NEW_LINE) {
        class.difference(&Class::from_char(kind, '\n' as u32));
    }
    class
}

/// Applies case folding to a literal, turning it into a class if it has other cases.
fn literal(lit: Literal, flags: Flags) -> Ast {
    if !flags.contains(Flags::CASE_INSENSITIVE) {
        return Ast::Literal(lit);
    }
    let class = match lit {
        Literal::Char(c) if flags.contains(Flags::UNICODE) => {
            let mut class = Class::from_char(ClassKind::Unicode, c as u32);
            class.case_fold_simple();
            class
        }
        Literal::Char(c) if c.is_ascii() => {
            let mut class = Class::from_char(ClassKind::Unicode, c as u32);
            class.ascii_case_fold();
            class
        }
        Literal::Char(_) => return Ast::Literal(lit),
        Literal::Byte(b) => {
            let mut class = Class::from_char(ClassKind::Bytes, b as u32);
            class.ascii_case_fold();
            class
        }
    };
    if class.single().is_some() {
        Ast::Literal(lit)
    } else {
        Ast::Class(class)
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax::{ast::Repeat, parse, parse_with};

    use super::*;

    fn err(pattern: &str) -> (ErrorKind, Option<usize>) {
        let e = parse(pattern).unwrap_err();
        (e.kind().clone(), e.offset())
    }

    fn lit(c: char) -> Ast {
        Ast::Literal(Literal::Char(c))
    }

    fn class(ranges: &[(char, char)]) -> Ast {
        Ast::Class(Class::new(
            ClassKind::Unicode,
            ranges
                .iter()
                .map(|&(a, b)| ClassRange::new(a as u32, b as u32)),
        ))
    }

    fn capture(index: u32, name: Option<&str>, sub: Ast) -> Ast {
        Ast::Group(Group {
            sub: Box::new(sub),
            capture: Some(Capture {
                index,
                name: name.map(Into::into),
            }),
        })
    }

    #[test]
    fn precedence() {
        assert_eq!(
            parse("ab|c*").unwrap(),
            Ast::Alternate(vec![
                Ast::Concat(vec![lit('a'), lit('b')]),
                Ast::repeat(lit('c'), 0, None, true),
            ])
        );
        assert_eq!(parse("").unwrap(), Ast::Empty);
        assert_eq!(
            parse("a|").unwrap(),
            Ast::Alternate(vec![lit('a'), Ast::Empty])
        );
    }

    #[test]
    fn repetitions() {
        let rep = |min, max, greedy| Ast::repeat(lit('a'), min, max, greedy);
        assert_eq!(parse("a+?").unwrap(), rep(1, None, false));
        assert_eq!(parse("a??").unwrap(), rep(0, Some(1), false));
        assert_eq!(parse("a{3}").unwrap(), rep(3, Some(3), true));
        assert_eq!(parse("a{3,}").unwrap(), rep(3, None, true));
        assert_eq!(parse("a{2,5}?").unwrap(), rep(2, Some(5), false));
        assert_eq!(parse("(?U)a*").unwrap(), rep(0, None, false));
        assert_eq!(parse("(?U)a*?").unwrap(), rep(0, None, true));
        assert_eq!(parse("(?x)a { 1 , 2 }").unwrap(), rep(1, Some(2), true));
        assert!(matches!(
            parse("a**").unwrap(),
            Ast::Repeat(Repeat { sub, .. }) if matches!(*sub, Ast::Repeat(_))
        ));

        assert_eq!(err("a{2,1}"), (ErrorKind::InvalidRepeatRange, Some(1)));
        assert_eq!(err("a{"), (ErrorKind::InvalidRepeatRange, Some(1)));
        assert_eq!(err("a{1,2"), (ErrorKind::InvalidRepeatRange, Some(1)));
        assert_eq!(err("a{99999999999}"), (ErrorKind::InvalidRepeatRange, Some(1)));
        assert_eq!(err("*"), (ErrorKind::RepetitionMissing, Some(0)));
        assert_eq!(err("a|+"), (ErrorKind::RepetitionMissing, Some(2)));
        assert_eq!(err("(?i)*"), (ErrorKind::RepetitionMissing, Some(4)));
        assert_eq!(err("{1}"), (ErrorKind::RepetitionMissing, Some(0)));
    }

    #[test]
    fn groups() {
        assert_eq!(
            parse("(a)(?:b)(?P<n>c)(?<m>d)").unwrap(),
            Ast::Concat(vec![
                capture(1, None, lit('a')),
                Ast::Group(Group {
                    sub: Box::new(lit('b')),
                    capture: None
                }),
                capture(2, Some("n"), lit('c')),
                capture(3, Some("m"), lit('d')),
            ])
        );
        // Opening parenthesis order
        assert_eq!(
            parse("((a)b)").unwrap(),
            capture(1, None, Ast::Concat(vec![capture(2, None, lit('a')), lit('b')]))
        );

        assert_eq!(err("("), (ErrorKind::UnclosedParenthesis, Some(0)));
        assert_eq!(err("a(b(c)"), (ErrorKind::UnclosedParenthesis, Some(1)));
        assert_eq!(err("a)"), (ErrorKind::UnopenedParenthesis, Some(1)));
        assert_eq!(err("(?P<n>a)(?P<n>b)"), (ErrorKind::DuplicateCaptureName, Some(12)));
        assert_eq!(err("(?P<>a)"), (ErrorKind::InvalidCaptureName, Some(4)));
        assert_eq!(err("(?P<1a>a)"), (ErrorKind::InvalidCaptureName, Some(4)));
        assert_eq!(err("(?P<a"), (ErrorKind::InvalidCaptureName, Some(4)));
        assert_eq!(err("(?=a)"), (ErrorKind::UnsupportedGroup, Some(0)));
        assert_eq!(err("(?<!a)"), (ErrorKind::UnsupportedGroup, Some(0)));
        assert_eq!(err("(?q)"), (ErrorKind::UnrecognizedFlag, Some(2)));
        assert_eq!(err("(?i-)"), (ErrorKind::UnrecognizedFlag, Some(3)));
        assert_eq!(err("(?)"), (ErrorKind::UnrecognizedFlag, Some(2)));
        assert_eq!(err("(?ii)"), (ErrorKind::UnrecognizedFlag, Some(3)));
        assert_eq!(err("(?i-i:a)"), (ErrorKind::UnrecognizedFlag, Some(4)));
        // Separate groups may repeat a flag
        assert!(parse("(?i)(?-i:a)(?i)b").is_ok());
    }

    #[test]
    fn flags_scope() {
        let ci_b = class(&[('B', 'B'), ('b', 'b')]);
        // Directive applies to the rest of the group, including later branches
        assert_eq!(
            parse("a(?i)b|b").unwrap(),
            Ast::Alternate(vec![Ast::Concat(vec![lit('a'), ci_b.clone()]), ci_b.clone()])
        );
        // But not beyond the enclosing group
        assert_eq!(
            parse("(?:(?i)b)b").unwrap(),
            Ast::Concat(vec![
                Ast::Group(Group {
                    sub: Box::new(ci_b.clone()),
                    capture: None
                }),
                lit('b')
            ])
        );
        assert_eq!(
            parse("(?i:b)b").unwrap(),
            Ast::Concat(vec![
                Ast::Group(Group {
                    sub: Box::new(ci_b.clone()),
                    capture: None
                }),
                lit('b')
            ])
        );
        assert_eq!(parse("(?i)(?-i)b").unwrap(), lit('b'));
        assert_eq!(
            parse_with("b", &Config::new().case_insensitive(true)).unwrap(),
            ci_b
        );
        // Literals without other cases stay literals
        assert_eq!(parse("(?i)1").unwrap(), lit('1'));
    }

    #[test]
    fn verbose() {
        assert_eq!(
            parse("(?x) a # comment\n b").unwrap(),
            Ast::Concat(vec![lit('a'), lit('b')])
        );
        assert_eq!(parse(r"(?x)\ ").unwrap(), lit(' '));
        assert_eq!(parse("(?x)[a b]").unwrap(), class(&[('a', 'b')]));
    }

    #[test]
    fn escapes() {
        assert_eq!(parse(r"\n").unwrap(), lit('\n'));
        assert_eq!(parse(r"\x41").unwrap(), lit('A'));
        assert_eq!(parse(r"\x{2603}").unwrap(), lit('☃'));
        assert_eq!(parse(r"☃").unwrap(), lit('☃'));
        assert_eq!(parse(r"\U0001F4A9").unwrap(), lit('💩'));
        assert_eq!(parse(r"\.").unwrap(), lit('.'));
        assert_eq!(parse(r"\xFF").unwrap(), lit('ÿ'));
        assert_eq!(
            parse(r"(?-u)\xFF").unwrap(),
            Ast::Literal(Literal::Byte(0xFF))
        );
        assert_eq!(parse(r"\A\z").unwrap(), Ast::Concat(vec![Ast::Look(Look::Start), Ast::Look(Look::End)]));
        assert_eq!(parse(r"(?-u)\B").unwrap(), Ast::Look(Look::WordAsciiNegate));
        assert_eq!(parse("(?m)^$").unwrap(), Ast::Concat(vec![Ast::Look(Look::StartLine), Ast::Look(Look::EndLine)]));

        assert_eq!(err(r"a\"), (ErrorKind::TrailingBackslash, Some(1)));
        assert_eq!(err(r"\q"), (ErrorKind::InvalidEscape, Some(0)));
        assert_eq!(err(r"\<"), (ErrorKind::InvalidEscape, Some(0)));
        assert_eq!(err(r"\x{110000}"), (ErrorKind::InvalidEscape, Some(0)));
        assert_eq!(err(r"\x{D800}"), (ErrorKind::InvalidEscape, Some(0)));
        assert_eq!(err(r"\xG0"), (ErrorKind::InvalidEscape, Some(0)));
        assert_eq!(err(r"(a)\1"), (ErrorKind::UnsupportedBackreference, Some(3)));
        assert_eq!(err(r"(?-u)\pL"), (ErrorKind::UnicodeNotAllowed, Some(5)));
    }

    #[test]
    fn classes() {
        assert_eq!(parse("[a-cx]").unwrap(), class(&[('a', 'c'), ('x', 'x')]));
        assert_eq!(parse("[]a]").unwrap(), class(&[(']', ']'), ('a', 'a')]));
        assert_eq!(parse("[-a]").unwrap(), class(&[('-', '-'), ('a', 'a')]));
        assert_eq!(parse("[a-]").unwrap(), class(&[('-', '-'), ('a', 'a')]));
        assert_eq!(parse("[a^]").unwrap(), class(&[('^', '^'), ('a', 'a')]));
        assert_eq!(parse(r"[\[\]]").unwrap(), class(&[('[', '['), (']', ']')]));
        assert_eq!(parse("[x[^xyz]]").unwrap(), {
            let mut c = Class::new(ClassKind::Unicode, [ClassRange::new('x' as u32, 'z' as u32)]);
            c.negate();
            c.push(ClassRange::single('x' as u32));
            Ast::Class(c)
        });
        assert_eq!(parse("[a-y&&xyz]").unwrap(), class(&[('x', 'y')]));
        assert_eq!(parse("[0-9&&[^4]]").unwrap(), class(&[('0', '3'), ('5', '9')]));
        assert_eq!(parse("[0-9--4]").unwrap(), class(&[('0', '3'), ('5', '9')]));
        assert_eq!(parse("[a-g~~b-h]").unwrap(), class(&[('a', 'a'), ('h', 'h')]));
        assert_eq!(parse("[a&&b]").unwrap(), class(&[]));
        assert_eq!(parse("[[:digit:][:upper:]]").unwrap(), class(&[('0', '9'), ('A', 'Z')]));
        assert_eq!(parse("[[:^alpha:]&&[:ascii:]]").unwrap(), class(&[('\0', '@'), ('[', '`'), ('{', '\x7F')]));
        assert_eq!(parse(r"[\x41-\x43]").unwrap(), class(&[('A', 'C')]));
        assert_eq!(parse("(?i)[a-b]").unwrap(), class(&[('A', 'B'), ('a', 'b')]));

        assert!(matches!(parse("[^a]").unwrap(), Ast::Class(c) if c.contains('b' as u32) && !c.contains('a' as u32)));
        assert!(matches!(parse("(?-u)[^a]").unwrap(), Ast::Class(c) if c.kind() == ClassKind::Bytes && c.contains(0xFF)));

        assert_eq!(err("[a"), (ErrorKind::UnclosedCharacterClass, Some(0)));
        // Reported at the innermost class
        assert_eq!(err("[[]"), (ErrorKind::UnclosedCharacterClass, Some(1)));
        assert_eq!(err("[^]"), (ErrorKind::UnclosedCharacterClass, Some(0)));
        assert_eq!(err("x[z-a]"), (ErrorKind::InvalidClassRange, Some(2)));
        assert_eq!(err(r"[a-\d]"), (ErrorKind::InvalidClassRange, Some(1)));
        assert_eq!(err(r"[\b]"), (ErrorKind::InvalidEscape, Some(1)));
        assert_eq!(err("(?-u)[é]"), (ErrorKind::UnicodeNotAllowed, Some(6)));
    }

    #[test]
    fn dot() {
        let Ast::Class(dot) = parse(".").unwrap() else { panic!() };
        assert!(!dot.contains('\n' as u32));
        assert!(dot.contains('☃' as u32));
        let Ast::Class(dot) = parse("(?s).").unwrap() else { panic!() };
        assert!(dot.contains('\n' as u32));
        let Ast::Class(dot) = parse("(?-u).").unwrap() else { panic!() };
        assert_eq!(dot.kind(), ClassKind::Bytes);
        assert!(dot.contains(0xFF));
    }

    #[cfg(feature = "unicode")]
    #[test]
    fn unicode_classes() {
        let Ast::Class(so) = parse(r"\p{So}").unwrap() else { panic!() };
        assert!(so.contains('☃' as u32));
        let Ast::Class(not_so) = parse(r"\P{So}").unwrap() else { panic!() };
        assert!(!not_so.contains('☃' as u32));
        assert!(not_so.contains('a' as u32));
        let Ast::Class(letters) = parse(r"\pL").unwrap() else { panic!() };
        assert!(letters.contains('δ' as u32));
    }

    #[cfg(feature = "unicode")]
    #[test]
    fn unicode_errors() {
        assert_eq!(
            err(r"\p{Foo}"),
            (ErrorKind::UnsupportedUnicodePropertyName, Some(0))
        );
        assert_eq!(err(r"a\p{L"), (ErrorKind::InvalidEscape, Some(1)));
        let Ast::Class(ci) = parse(r"(?i)k").unwrap() else { panic!() };
        assert!(ci.contains('\u{212A}' as u32));
        let Ast::Class(negated) = parse(r"(?i)[^k]").unwrap() else { panic!() };
        assert!(!negated.contains('\u{212A}' as u32));
        assert!(!negated.contains('K' as u32));
    }

    #[test]
    fn nest_limit() {
        let config = Config::new().nest_limit(3);
        assert!(parse_with("(((a)))", &config).is_ok());
        assert_eq!(
            parse_with("((((a))))", &config).unwrap_err().kind(),
            &ErrorKind::NestLimitExceeded(3)
        );
        assert_eq!(
            parse_with("a****", &config).unwrap_err().kind(),
            &ErrorKind::NestLimitExceeded(3)
        );
        assert_eq!(
            parse_with("[[[[a]]]]", &config).unwrap_err().kind(),
            &ErrorKind::NestLimitExceeded(3)
        );
    }
}
