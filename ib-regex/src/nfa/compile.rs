//! Thompson construction of a [`Program`] from an [`Ast`].
use std::sync::Arc;

use regex_syntax::utf8::{Utf8Range, Utf8Sequences};

use super::{GroupInfo, Inst, InstPtr, Program};
use crate::{
    error::{Error, ErrorKind},
    syntax::{
        ast::{Literal, Repeat},
        class::{Class, ClassKind},
        Ast,
    },
    util::prefilter::Prefilter,
};

/// Compiler limits and match semantics.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    size_limit: usize,
    captures_limit: usize,
    utf8: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size_limit: 500_000,
            captures_limit: 10_000,
            utf8: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// The maximum number of instructions in a compiled program. 500 000 by default.
    ///
    /// Counted repetitions are unrolled, so `(a{100}){100}` already needs over 10 000
    /// instructions.
    pub fn size_limit(mut self, limit: usize) -> Self {
        self.size_limit = limit;
        self
    }

    /// The maximum number of capture groups, not counting the implicit group 0.
    /// 10 000 by default.
    pub fn captures_limit(mut self, limit: usize) -> Self {
        self.captures_limit = limit;
        self
    }

    /// UTF-8 mode. Enabled by default.
    ///
    /// When enabled, a match never ends inside a UTF-8 encoded scalar value, search start
    /// offsets must be char boundaries, and iteration steps over a whole scalar value after
    /// an empty match. Disable it to search haystacks that are not UTF-8 by byte.
    pub fn utf8(mut self, yes: bool) -> Self {
        self.utf8 = yes;
        self
    }

    pub fn get_size_limit(&self) -> usize {
        self.size_limit
    }

    pub fn get_captures_limit(&self) -> usize {
        self.captures_limit
    }

    pub fn get_utf8(&self) -> bool {
        self.utf8
    }
}

/// Compiles an [`Ast`] into a [`Program`].
///
/// ```
/// use ib_regex::{nfa::compile::{Compiler, Config}, syntax};
///
/// let ast = syntax::parse(r"(\w+)@(\w+)").unwrap();
/// let program = Compiler::new(Config::new()).compile(&ast).unwrap();
/// assert_eq!(program.slot_len(), 6);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    config: Config,
}

impl Compiler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn compile(&self, ast: &Ast) -> Result<Program, Error> {
        let group_info = GroupInfo::new(ast);
        if group_info.group_len() - 1 > self.config.captures_limit {
            return Err(Error::limit(ErrorKind::TooManyCaptures(
                self.config.captures_limit,
            )));
        }

        let mut builder = Builder {
            insts: Vec::new(),
            size_limit: self.config.size_limit,
        };
        let start = builder.emit(Inst::Save { slot: 0, next: HOLE })?;
        let body = builder.c(ast)?;
        builder.patch(Hole::Next(start), body.entry);
        let end = builder.emit(Inst::Save { slot: 1, next: HOLE })?;
        builder.fill(body.holes, end);
        let accept = builder.emit(Inst::Match)?;
        builder.patch(Hole::Next(end), accept);

        let insts = builder.insts;
        let prefilter = Prefilter::from_program(&insts, start);
        tracing::debug!(
            insts = insts.len(),
            groups = group_info.group_len(),
            prefilter = ?prefilter,
            "compiled regex"
        );
        Ok(Program {
            insts,
            start,
            group_info: Arc::new(group_info),
            utf8: self.config.utf8,
            prefilter,
        })
    }
}

/// Placeholder for a transition that is not known yet.
const HOLE: InstPtr = InstPtr::MAX;

/// A transition waiting to be patched.
#[derive(Clone, Copy, Debug)]
enum Hole {
    Next(InstPtr),
    SplitFirst(InstPtr),
    SplitSecond(InstPtr),
}

/// A compiled fragment: where it starts and the transitions leaving it.
#[derive(Debug)]
struct Patch {
    entry: InstPtr,
    holes: Vec<Hole>,
}

struct Builder {
    insts: Vec<Inst>,
    size_limit: usize,
}

impl Builder {
    fn emit(&mut self, inst: Inst) -> Result<InstPtr, Error> {
        if self.insts.len() >= self.size_limit {
            return Err(Error::limit(ErrorKind::ProgramTooLarge(self.size_limit)));
        }
        self.insts.push(inst);
        Ok(self.insts.len() - 1)
    }

    fn patch(&mut self, hole: Hole, target: InstPtr) {
        match hole {
            Hole::Next(pc) => match &mut self.insts[pc] {
                Inst::Save { next, .. }
                | Inst::Jump { next }
                | Inst::ByteRange { next, .. }
                | Inst::Assert { next, .. } => *next = target,
                inst => unreachable!("no next transition: {inst:?}"),
            },
            Hole::SplitFirst(pc) => match &mut self.insts[pc] {
                Inst::Split { first, .. } => *first = target,
                inst => unreachable!("not a split: {inst:?}"),
            },
            Hole::SplitSecond(pc) => match &mut self.insts[pc] {
                Inst::Split { second, .. } => *second = target,
                inst => unreachable!("not a split: {inst:?}"),
            },
        }
    }

    fn fill(&mut self, holes: Vec<Hole>, target: InstPtr) {
        for hole in holes {
            self.patch(hole, target);
        }
    }

    fn c(&mut self, ast: &Ast) -> Result<Patch, Error> {
        match ast {
            Ast::Empty => self.c_empty(),
            Ast::Literal(Literal::Char(c)) => {
                let mut buf = [0; 4];
                self.c_bytes(c.encode_utf8(&mut buf).as_bytes())
            }
            Ast::Literal(Literal::Byte(b)) => self.c_bytes(&[*b]),
            Ast::Class(class) => self.c_class(class),
            Ast::Look(look) => {
                let pc = self.emit(Inst::Assert {
                    look: *look,
                    next: HOLE,
                })?;
                Ok(Patch {
                    entry: pc,
                    holes: vec![Hole::Next(pc)],
                })
            }
            Ast::Repeat(rep) => self.c_repeat(rep),
            Ast::Group(group) => match &group.capture {
                None => self.c(&group.sub),
                Some(capture) => {
                    let slot = capture.index as usize * 2;
                    let open = self.emit(Inst::Save { slot, next: HOLE })?;
                    let sub = self.c(&group.sub)?;
                    self.patch(Hole::Next(open), sub.entry);
                    let close = self.emit(Inst::Save {
                        slot: slot + 1,
                        next: HOLE,
                    })?;
                    self.fill(sub.holes, close);
                    Ok(Patch {
                        entry: open,
                        holes: vec![Hole::Next(close)],
                    })
                }
            },
            Ast::Concat(items) => self.c_concat(items),
            Ast::Alternate(branches) => self.c_alternate(branches),
        }
    }

    fn c_empty(&mut self) -> Result<Patch, Error> {
        let pc = self.emit(Inst::Jump { next: HOLE })?;
        Ok(Patch {
            entry: pc,
            holes: vec![Hole::Next(pc)],
        })
    }

    fn c_bytes(&mut self, bytes: &[u8]) -> Result<Patch, Error> {
        let mut entry = None;
        let mut prev: Option<InstPtr> = None;
        for &b in bytes {
            let pc = self.emit(Inst::ByteRange {
                start: b,
                end: b,
                next: HOLE,
            })?;
            match prev {
                Some(prev) => self.patch(Hole::Next(prev), pc),
                None => entry = Some(pc),
            }
            prev = Some(pc);
        }
        match (entry, prev) {
            (Some(entry), Some(last)) => Ok(Patch {
                entry,
                holes: vec![Hole::Next(last)],
            }),
            _ => self.c_empty(),
        }
    }

    fn c_class(&mut self, class: &Class) -> Result<Patch, Error> {
        if class.is_empty() {
            let pc = self.emit(Inst::Fail)?;
            return Ok(Patch {
                entry: pc,
                holes: Vec::new(),
            });
        }
        if class.kind() == ClassKind::Bytes || class.is_ascii() {
            let mut holes = Vec::new();
            let mut entries = Vec::with_capacity(class.ranges().len());
            for r in class.ranges() {
                let pc = self.emit(Inst::ByteRange {
                    start: r.start as u8,
                    end: r.end as u8,
                    next: HOLE,
                })?;
                holes.push(Hole::Next(pc));
                entries.push(pc);
            }
            let entry = self.c_split_chain(&entries)?;
            return Ok(Patch { entry, holes });
        }

        let mut trie = Utf8Trie::new();
        for r in class.ranges() {
            // Unicode class endpoints are never surrogates
            let (Some(start), Some(end)) = (char::from_u32(r.start), char::from_u32(r.end)) else {
                continue;
            };
            for seq in Utf8Sequences::new(start, end) {
                trie.insert(seq.as_slice());
            }
        }
        let mut holes = Vec::new();
        let entry = self.c_trie_node(&trie, Utf8Trie::ROOT, &mut holes)?;
        Ok(Patch { entry, holes })
    }

    fn c_trie_node(
        &mut self,
        trie: &Utf8Trie,
        node: usize,
        holes: &mut Vec<Hole>,
    ) -> Result<InstPtr, Error> {
        let mut entries = Vec::with_capacity(trie.nodes[node].len());
        for &(range, child) in &trie.nodes[node] {
            let pc = self.emit(Inst::ByteRange {
                start: range.start,
                end: range.end,
                next: HOLE,
            })?;
            match child {
                Some(child) => {
                    let next = self.c_trie_node(trie, child, holes)?;
                    self.patch(Hole::Next(pc), next);
                }
                None => holes.push(Hole::Next(pc)),
            }
            entries.push(pc);
        }
        self.c_split_chain(&entries)
    }

    /// Alternation of already compiled entries, in priority order.
    fn c_split_chain(&mut self, entries: &[InstPtr]) -> Result<InstPtr, Error> {
        let Some((&last, rest)) = entries.split_last() else {
            return self.emit(Inst::Fail);
        };
        let mut next = last;
        for &entry in rest.iter().rev() {
            next = self.emit(Inst::Split {
                first: entry,
                second: next,
            })?;
        }
        Ok(next)
    }

    fn c_concat<'a>(&mut self, items: impl IntoIterator<Item = &'a Ast>) -> Result<Patch, Error> {
        let mut items = items.into_iter();
        let Some(first) = items.next() else {
            return self.c_empty();
        };
        let Patch { entry, mut holes } = self.c(first)?;
        for item in items {
            let next = self.c(item)?;
            self.fill(holes, next.entry);
            holes = next.holes;
        }
        Ok(Patch { entry, holes })
    }

    fn c_alternate(&mut self, branches: &[Ast]) -> Result<Patch, Error> {
        let Some((last, rest)) = branches.split_last() else {
            return self.c_empty();
        };
        let mut holes = Vec::new();
        let mut entry = None;
        let mut pending: Option<Hole> = None;
        for branch in rest {
            let split = self.emit(Inst::Split {
                first: HOLE,
                second: HOLE,
            })?;
            match pending {
                Some(hole) => self.patch(hole, split),
                None => entry = Some(split),
            }
            let sub = self.c(branch)?;
            self.patch(Hole::SplitFirst(split), sub.entry);
            holes.extend(sub.holes);
            pending = Some(Hole::SplitSecond(split));
        }
        let sub = self.c(last)?;
        holes.extend(sub.holes);
        match pending {
            Some(hole) => self.patch(hole, sub.entry),
            None => entry = Some(sub.entry),
        }
        Ok(Patch {
            entry: entry.unwrap_or(sub.entry),
            holes,
        })
    }

    fn c_repeat(&mut self, rep: &Repeat) -> Result<Patch, Error> {
        let Repeat {
            sub,
            min,
            max,
            greedy,
        } = rep;
        let (min, greedy) = (*min, *greedy);
        match *max {
            // A body that only matches the empty string is never looped
            None if matches_only_empty(sub) && min == 0 => self.c_question(sub, greedy),
            None if matches_only_empty(sub) => self.c(sub),
            None => match min {
                0 => self.c_star(sub, greedy),
                1 => self.c_plus(sub, greedy),
                _ => {
                    let prefix = self.c_exactly(sub, min - 1)?;
                    let plus = self.c_plus(sub, greedy)?;
                    self.fill(prefix.holes, plus.entry);
                    Ok(Patch {
                        entry: prefix.entry,
                        holes: plus.holes,
                    })
                }
            },
            Some(max) if max == min => self.c_exactly(sub, min),
            Some(1) => self.c_question(sub, greedy),
            Some(max) => self.c_bounded(sub, min, max, greedy),
        }
    }

    fn c_exactly(&mut self, sub: &Ast, n: u32) -> Result<Patch, Error> {
        self.c_concat(core::iter::repeat(sub).take(n as usize))
    }

    /// Splits to `preferred` first if greedy, and returns the hole for the other branch.
    fn prefer(&mut self, split: InstPtr, preferred: InstPtr, greedy: bool) -> Hole {
        if greedy {
            self.patch(Hole::SplitFirst(split), preferred);
            Hole::SplitSecond(split)
        } else {
            self.patch(Hole::SplitSecond(split), preferred);
            Hole::SplitFirst(split)
        }
    }

    fn c_question(&mut self, sub: &Ast, greedy: bool) -> Result<Patch, Error> {
        let split = self.emit(Inst::Split {
            first: HOLE,
            second: HOLE,
        })?;
        let Patch { entry, mut holes } = self.c(sub)?;
        holes.push(self.prefer(split, entry, greedy));
        Ok(Patch {
            entry: split,
            holes,
        })
    }

    fn c_plus(&mut self, sub: &Ast, greedy: bool) -> Result<Patch, Error> {
        let body = self.c(sub)?;
        let split = self.emit(Inst::Split {
            first: HOLE,
            second: HOLE,
        })?;
        self.fill(body.holes, split);
        let exit = self.prefer(split, body.entry, greedy);
        Ok(Patch {
            entry: body.entry,
            holes: vec![exit],
        })
    }

    fn c_star(&mut self, sub: &Ast, greedy: bool) -> Result<Patch, Error> {
        let split = self.emit(Inst::Split {
            first: HOLE,
            second: HOLE,
        })?;
        if sub.is_nullable() {
            // (?:e+)? so that an empty iteration can only happen once
            let Patch { entry, mut holes } = self.c_plus(sub, greedy)?;
            holes.push(self.prefer(split, entry, greedy));
            return Ok(Patch {
                entry: split,
                holes,
            });
        }
        let body = self.c(sub)?;
        self.fill(body.holes, split);
        let exit = self.prefer(split, body.entry, greedy);
        Ok(Patch {
            entry: split,
            holes: vec![exit],
        })
    }

    /// `min` mandatory copies, then `max - min` optional copies that all exit to a common end.
    fn c_bounded(&mut self, sub: &Ast, min: u32, max: u32, greedy: bool) -> Result<Patch, Error> {
        let prefix = if min == 0 {
            self.c_empty()?
        } else {
            self.c_exactly(sub, min)?
        };
        let end = self.emit(Inst::Jump { next: HOLE })?;
        let mut holes = prefix.holes;
        for _ in min..max {
            let split = self.emit(Inst::Split {
                first: HOLE,
                second: HOLE,
            })?;
            self.fill(holes, split);
            let body = self.c(sub)?;
            let exit = self.prefer(split, body.entry, greedy);
            self.patch(exit, end);
            holes = body.holes;
        }
        self.fill(holes, end);
        Ok(Patch {
            entry: prefix.entry,
            holes: vec![Hole::Next(end)],
        })
    }
}

/// Whether `ast` can match nothing but the empty string.
fn matches_only_empty(ast: &Ast) -> bool {
    match ast {
        Ast::Empty | Ast::Look(_) => true,
        Ast::Literal(_) | Ast::Class(_) => false,
        Ast::Repeat(rep) => rep.max == Some(0) || matches_only_empty(&rep.sub),
        Ast::Group(group) => matches_only_empty(&group.sub),
        Ast::Concat(items) | Ast::Alternate(items) => items.iter().all(matches_only_empty),
    }
}

/// UTF-8 sequences of a class merged by common prefix.
struct Utf8Trie {
    /// Edges of each node in ascending order. `None` ends a sequence.
    nodes: Vec<Vec<(Utf8Range, Option<usize>)>>,
}

impl Utf8Trie {
    const ROOT: usize = 0;

    fn new() -> Self {
        Self {
            nodes: vec![Vec::new()],
        }
    }

    /// Sequences must be inserted in ascending order.
    fn insert(&mut self, seq: &[Utf8Range]) {
        let mut node = Self::ROOT;
        for (i, &range) in seq.iter().enumerate() {
            if i + 1 == seq.len() {
                self.nodes[node].push((range, None));
                break;
            }
            match self.nodes[node].last() {
                Some(&(last, Some(child))) if last == range => node = child,
                _ => {
                    let child = self.nodes.len();
                    self.nodes.push(Vec::new());
                    self.nodes[node].push((range, Some(child)));
                    node = child;
                }
            }
        }
    }
}
