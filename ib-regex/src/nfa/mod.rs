/*!
Thompson NFA programs, their compiler and the Pike VM that executes them.

A [`Program`] is a sequence of [`Inst`]ructions for a small virtual machine. Each
instruction says what to do and where to go next. Most instructions are epsilon
transitions that consume nothing: [`Split`](Inst::Split) forks execution into two
threads, [`Save`](Inst::Save) records the current position in a capture slot,
[`Assert`](Inst::Assert) checks a zero-width [`Look`]. Only [`ByteRange`](Inst::ByteRange)
consumes input, one byte at a time, so a program always matches UTF-8 encoded haystacks
byte by byte even when the pattern is Unicode-aware.

Programs are immutable once compiled and can be shared between threads.

```
use ib_regex::nfa::{compile::Compiler, Inst};

let ast = ib_regex::syntax::parse("a|b").unwrap();
let program = Compiler::default().compile(&ast).unwrap();
assert!(matches!(program.insts()[program.start()], Inst::Save { slot: 0, .. }));
assert_eq!(program.group_info().group_len(), 1);
```
*/
use core::fmt::{self, Debug};
use std::{collections::HashMap, sync::Arc};

use crate::{syntax::{Ast, Look}, util::prefilter::Prefilter};

pub mod compile;
pub mod pikevm;

/// An index into [`Program::insts`].
pub type InstPtr = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inst {
    /// The thread has found a match.
    Match,
    /// Records the current position in `slot`.
    Save { slot: usize, next: InstPtr },
    /// Forks into two threads. `first` has the higher priority.
    Split { first: InstPtr, second: InstPtr },
    Jump { next: InstPtr },
    /// Consumes one byte in `start..=end`.
    ByteRange { start: u8, end: u8, next: InstPtr },
    /// Continues only if `look` holds at the current position.
    Assert { look: Look, next: InstPtr },
    /// Kills the thread.
    Fail,
}

/// A compiled pattern.
#[derive(Clone)]
pub struct Program {
    pub(crate) insts: Vec<Inst>,
    pub(crate) start: InstPtr,
    pub(crate) group_info: Arc<GroupInfo>,
    pub(crate) utf8: bool,
    pub(crate) prefilter: Option<Prefilter>,
}

impl Program {
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    pub fn start(&self) -> InstPtr {
        self.start
    }

    /// The number of capture slots, i.e. twice the number of groups including group 0.
    pub fn slot_len(&self) -> usize {
        self.group_info.slot_len()
    }

    pub fn group_info(&self) -> &Arc<GroupInfo> {
        &self.group_info
    }

    /// Whether match offsets are kept on UTF-8 char boundaries.
    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    /// The bytes a match can start with, if a match can never be empty.
    pub fn prefilter(&self) -> Option<&Prefilter> {
        self.prefilter.as_ref()
    }
}

impl Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program(")?;
        for (pc, inst) in self.insts.iter().enumerate() {
            let marker = if pc == self.start { '^' } else { ' ' };
            write!(f, "{marker}{pc:06}: ")?;
            match *inst {
                Inst::Match => writeln!(f, "MATCH")?,
                Inst::Save { slot, next } => writeln!(f, "save({slot}) => {next}")?,
                Inst::Split { first, second } => writeln!(f, "split({first}, {second})")?,
                Inst::Jump { next } => writeln!(f, "jump => {next}")?,
                Inst::ByteRange { start, end, next } if start == end => {
                    writeln!(f, "{} => {next}", start.escape_ascii())?
                }
                Inst::ByteRange { start, end, next } => {
                    writeln!(f, "{}-{} => {next}", start.escape_ascii(), end.escape_ascii())?
                }
                Inst::Assert { look, next } => writeln!(f, "{look:?} => {next}")?,
                Inst::Fail => writeln!(f, "FAIL")?,
            }
        }
        writeln!(f, "groups: {}", self.group_info.group_len())?;
        write!(f, ")")
    }
}

/// Capture group names, shared by a [`Program`] and every
/// [`Captures`](crate::Captures) created for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupInfo {
    /// Indexed by group index. Group 0 is never named.
    names: Vec<Option<Arc<str>>>,
    name_to_index: HashMap<Arc<str>, usize>,
}

impl GroupInfo {
    pub(crate) fn new(ast: &Ast) -> Self {
        let mut info = GroupInfo {
            names: vec![None],
            name_to_index: HashMap::new(),
        };
        ast.visit_captures(&mut |capture| {
            let index = capture.index as usize;
            if info.names.len() <= index {
                info.names.resize(index + 1, None);
            }
            if let Some(name) = &capture.name {
                let name: Arc<str> = Arc::from(&**name);
                info.name_to_index.insert(name.clone(), index);
                info.names[index] = Some(name);
            }
        });
        info
    }

    /// The number of groups, including the implicit group 0.
    pub fn group_len(&self) -> usize {
        self.names.len()
    }

    pub fn slot_len(&self) -> usize {
        self.group_len() * 2
    }

    pub fn to_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn to_name(&self, index: usize) -> Option<&str> {
        self.names.get(index)?.as_deref()
    }

    /// Names by group index, `None` for unnamed groups.
    pub fn names(&self) -> impl ExactSizeIterator<Item = Option<&str>> + '_ {
        self.names.iter().map(|name| name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax;

    #[test]
    fn group_info() {
        let ast = syntax::parse(r"(a)(?P<x>b)(?:c)(?<y>(d))").unwrap();
        let info = GroupInfo::new(&ast);
        assert_eq!(info.group_len(), 5);
        assert_eq!(info.slot_len(), 10);
        assert_eq!(info.to_index("x"), Some(2));
        assert_eq!(info.to_index("y"), Some(3));
        assert_eq!(info.to_index("z"), None);
        assert_eq!(info.to_name(3), Some("y"));
        assert_eq!(info.to_name(4), None);
        assert_eq!(
            info.names().collect::<Vec<_>>(),
            vec![None, None, Some("x"), Some("y"), None]
        );
    }

    #[test]
    fn send_sync() {
        fn assert<T: Send + Sync>() {}
        assert::<Program>();
        assert::<GroupInfo>();
    }
}
