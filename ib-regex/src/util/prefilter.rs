//! First byte prefilters.
//!
//! A prefilter lets a search skip haystack positions where no match can start. It is only
//! built when every match consumes at least one byte, so skipping never misses an empty
//! match.
use ib_unicode::ascii::{find_byte, find_byte2, find_byte3};

use crate::nfa::{Inst, InstPtr};

/// The bytes a match can start with.
#[derive(Clone, PartialEq, Eq)]
pub enum Prefilter {
    Byte1(u8),
    Byte2(u8, u8),
    Byte3(u8, u8, u8),
    /// Any byte in the table.
    Set(Box<[bool; 256]>),
}

impl Prefilter {
    /// Walks the epsilon closure of `start`. Returns `None` if a `Match` is reachable
    /// without consuming input, or if every byte can start a match.
    pub(crate) fn from_program(insts: &[Inst], start: InstPtr) -> Option<Self> {
        let mut set = Box::new([false; 256]);
        let mut visited = vec![false; insts.len()];
        let mut stack = vec![start];
        while let Some(pc) = stack.pop() {
            if core::mem::replace(&mut visited[pc], true) {
                continue;
            }
            match insts[pc] {
                Inst::Match => return None,
                Inst::Fail => (),
                Inst::Save { next, .. } | Inst::Jump { next } | Inst::Assert { next, .. } => {
                    stack.push(next)
                }
                Inst::Split { first, second } => stack.extend([second, first]),
                Inst::ByteRange { start, end, .. } => {
                    set[start as usize..=end as usize].fill(true)
                }
            }
        }

        let bytes: Vec<u8> = (0..=u8::MAX).filter(|&b| set[b as usize]).collect();
        match *bytes.as_slice() {
            [a] => Some(Prefilter::Byte1(a)),
            [a, b] => Some(Prefilter::Byte2(a, b)),
            [a, b, c] => Some(Prefilter::Byte3(a, b, c)),
            _ if bytes.len() == 256 => None,
            _ => Some(Prefilter::Set(set)),
        }
    }

    /// The first candidate position at or after `at`.
    #[inline]
    pub fn find(&self, haystack: &[u8], at: usize) -> Option<usize> {
        let rest = haystack.get(at..)?;
        let i = match *self {
            Prefilter::Byte1(a) => find_byte(rest, a),
            Prefilter::Byte2(a, b) => find_byte2(rest, a, b),
            Prefilter::Byte3(a, b, c) => find_byte3(rest, a, b, c),
            Prefilter::Set(ref set) => rest.iter().position(|&b| set[b as usize]),
        }?;
        Some(at + i)
    }
}

impl core::fmt::Debug for Prefilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Prefilter::Byte1(a) => write!(f, "Byte1({})", a.escape_ascii()),
            Prefilter::Byte2(a, b) => write!(f, "Byte2({}, {})", a.escape_ascii(), b.escape_ascii()),
            Prefilter::Byte3(a, b, c) => write!(
                f,
                "Byte3({}, {}, {})",
                a.escape_ascii(),
                b.escape_ascii(),
                c.escape_ascii()
            ),
            Prefilter::Set(set) => write!(f, "Set({})", set.iter().filter(|&&b| b).count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find() {
        let hay = b"xxaxxbxxc";
        assert_eq!(Prefilter::Byte1(b'b').find(hay, 0), Some(5));
        assert_eq!(Prefilter::Byte2(b'c', b'b').find(hay, 6), Some(8));
        assert_eq!(Prefilter::Byte3(b'a', b'b', b'c').find(hay, 3), Some(5));
        assert_eq!(Prefilter::Byte1(b'a').find(hay, 3), None);
        assert_eq!(Prefilter::Byte1(b'a').find(hay, 100), None);

        let mut set = Box::new([false; 256]);
        set[b'x' as usize] = true;
        assert_eq!(Prefilter::Set(set).find(hay, 2), Some(3));
    }
}
