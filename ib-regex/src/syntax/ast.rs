use super::class::Class;

/// The abstract syntax of a parsed pattern.
///
/// All flags have already been applied: case-insensitive literals are classes, `.` is a
/// class, Perl and Unicode classes are expanded, and negated classes are complemented.
/// So compiling an `Ast` needs no further context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ast {
    /// Matches the empty string.
    Empty,
    Literal(Literal),
    Class(Class),
    /// A zero-width assertion.
    Look(Look),
    Repeat(Repeat),
    Group(Group),
    Concat(Vec<Ast>),
    /// Branches in priority order.
    Alternate(Vec<Ast>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Literal {
    /// A Unicode scalar value, matched as its UTF-8 encoding.
    Char(char),
    /// A raw byte. Only produced with the `u` flag disabled, e.g. `(?-u:\xFF)`.
    Byte(u8),
}

/// Zero-width assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Look {
    /// `\A`, or `^` without the `m` flag.
    Start,
    /// `\z`, or `$` without the `m` flag.
    End,
    /// `^` with the `m` flag. Matches at the start and after every `\n`.
    StartLine,
    /// `$` with the `m` flag. Matches at the end and before every `\n`.
    EndLine,
    /// `\b` with the `u` flag.
    WordUnicode,
    /// `\B` with the `u` flag.
    WordUnicodeNegate,
    /// `\b` without the `u` flag.
    WordAscii,
    /// `\B` without the `u` flag.
    WordAsciiNegate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repeat {
    pub sub: Box<Ast>,
    pub min: u32,
    /// `None` if unbounded.
    pub max: Option<u32>,
    pub greedy: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub sub: Box<Ast>,
    /// `None` for non-capturing groups.
    pub capture: Option<Capture>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    /// Group index, starting at 1 in opening parenthesis order.
    pub index: u32,
    pub name: Option<Box<str>>,
}

impl Ast {
    /// Concatenation that flattens nested concatenations and unwraps single items.
    pub fn concat(items: Vec<Ast>) -> Ast {
        let mut items: Vec<Ast> = items
            .into_iter()
            .flat_map(|item| match item {
                Ast::Concat(items) => items,
                Ast::Empty => Vec::new(),
                item => vec![item],
            })
            .collect();
        match items.len() {
            0 => Ast::Empty,
            1 => items.pop().unwrap_or(Ast::Empty),
            _ => Ast::Concat(items),
        }
    }

    /// Alternation that unwraps a single branch.
    pub fn alternate(mut branches: Vec<Ast>) -> Ast {
        match branches.len() {
            0 => Ast::Empty,
            1 => branches.pop().unwrap_or(Ast::Empty),
            _ => Ast::Alternate(branches),
        }
    }

    pub fn repeat(sub: Ast, min: u32, max: Option<u32>, greedy: bool) -> Ast {
        Ast::Repeat(Repeat {
            sub: Box::new(sub),
            min,
            max,
            greedy,
        })
    }

    /// Whether this expression can match the empty string.
    pub fn is_nullable(&self) -> bool {
        match self {
            Ast::Empty | Ast::Look(_) => true,
            Ast::Literal(_) | Ast::Class(_) => false,
            Ast::Repeat(rep) => rep.min == 0 || rep.sub.is_nullable(),
            Ast::Group(group) => group.sub.is_nullable(),
            Ast::Concat(items) => items.iter().all(Ast::is_nullable),
            Ast::Alternate(branches) => branches.iter().any(Ast::is_nullable),
        }
    }

    /// Calls `f` on every capture group in opening parenthesis order.
    pub fn visit_captures<'a>(&'a self, f: &mut impl FnMut(&'a Capture)) {
        match self {
            Ast::Empty | Ast::Literal(_) | Ast::Class(_) | Ast::Look(_) => (),
            Ast::Repeat(rep) => rep.sub.visit_captures(f),
            Ast::Group(group) => {
                if let Some(capture) = &group.capture {
                    f(capture);
                }
                group.sub.visit_captures(f)
            }
            Ast::Concat(items) | Ast::Alternate(items) => {
                items.iter().for_each(|item| item.visit_captures(f))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_flatten() {
        let a = Ast::Literal(Literal::Char('a'));
        let b = Ast::Literal(Literal::Char('b'));
        assert_eq!(Ast::concat(vec![]), Ast::Empty);
        assert_eq!(Ast::concat(vec![a.clone()]), a);
        assert_eq!(
            Ast::concat(vec![
                a.clone(),
                Ast::Concat(vec![b.clone(), a.clone()]),
                Ast::Empty
            ]),
            Ast::Concat(vec![a.clone(), b, a])
        );
    }

    #[test]
    fn nullable() {
        let a = Ast::Literal(Literal::Char('a'));
        assert!(!a.is_nullable());
        assert!(Ast::repeat(a.clone(), 0, None, true).is_nullable());
        assert!(!Ast::repeat(a.clone(), 1, None, true).is_nullable());
        assert!(Ast::Alternate(vec![a.clone(), Ast::Empty]).is_nullable());
        assert!(Ast::Concat(vec![Ast::Look(Look::WordUnicode), Ast::Empty]).is_nullable());
    }
}
