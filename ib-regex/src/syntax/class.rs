//! Character class sets.
//!
//! A [`Class`] is always kept canonical: its ranges are sorted, non-overlapping and
//! non-adjacent, and a Unicode class never contains a surrogate code point. Two classes
//! matching the same set therefore compare equal.
use core::mem;

use itertools::Itertools;

const SURROGATE_START: u32 = 0xD800;
const SURROGATE_END: u32 = 0xDFFF;

/// The domain of a class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKind {
    /// Unicode scalar values, matched as their UTF-8 encodings.
    Unicode,
    /// Raw bytes `0x00..=0xFF`.
    Bytes,
}

impl ClassKind {
    pub fn max(self) -> u32 {
        match self {
            ClassKind::Unicode => char::MAX as u32,
            ClassKind::Bytes => u8::MAX as u32,
        }
    }
}

/// An inclusive range of code points (or bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassRange {
    pub start: u32,
    pub end: u32,
}

impl ClassRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn single(cp: u32) -> Self {
        Self { start: cp, end: cp }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    kind: ClassKind,
    ranges: Vec<ClassRange>,
}

impl Class {
    pub fn new(kind: ClassKind, ranges: impl IntoIterator<Item = ClassRange>) -> Self {
        let mut class = Self {
            kind,
            ranges: ranges.into_iter().collect(),
        };
        class.canonicalize();
        class
    }

    pub fn empty(kind: ClassKind) -> Self {
        Self {
            kind,
            ranges: Vec::new(),
        }
    }

    /// Every value of the domain.
    pub fn full(kind: ClassKind) -> Self {
        Self::new(kind, [ClassRange::new(0, kind.max())])
    }

    pub fn from_char(kind: ClassKind, cp: u32) -> Self {
        Self::new(kind, [ClassRange::single(cp)])
    }

    /// ASCII-only class from `(start, end)` byte pairs.
    pub(crate) fn ascii(kind: ClassKind, ranges: &[(u8, u8)]) -> Self {
        Self::new(
            kind,
            ranges
                .iter()
                .map(|&(start, end)| ClassRange::new(start as u32, end as u32)),
        )
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn ranges(&self) -> &[ClassRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether every member of this class is ASCII.
    pub fn is_ascii(&self) -> bool {
        self.ranges.last().map_or(true, |r| r.end <= 0x7F)
    }

    /// The only member of this class, if it has exactly one.
    pub fn single(&self) -> Option<u32> {
        match self.ranges.as_slice() {
            [r] if r.start == r.end => Some(r.start),
            _ => None,
        }
    }

    pub fn contains(&self, cp: u32) -> bool {
        self.ranges
            .binary_search_by(|r| {
                if r.end < cp {
                    core::cmp::Ordering::Less
                } else if r.start > cp {
                    core::cmp::Ordering::Greater
                } else {
                    core::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn push(&mut self, range: ClassRange) {
        self.ranges.push(range);
        self.canonicalize();
    }

    pub fn union(&mut self, other: &Class) {
        self.ranges.extend_from_slice(&other.ranges);
        self.canonicalize();
    }

    pub fn intersect(&mut self, other: &Class) {
        let (a, b) = (&self.ranges, &other.ranges);
        let mut ranges = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let start = a[i].start.max(b[j].start);
            let end = a[i].end.min(b[j].end);
            if start <= end {
                ranges.push(ClassRange { start, end });
            }
            if a[i].end < b[j].end {
                i += 1;
            } else {
                j += 1;
            }
        }
        self.ranges = ranges;
    }

    pub fn difference(&mut self, other: &Class) {
        let mut complement = Class::new(self.kind, other.ranges.iter().copied());
        complement.negate();
        self.intersect(&complement);
    }

    pub fn symmetric_difference(&mut self, other: &Class) {
        let mut both = self.clone();
        both.intersect(other);
        self.union(other);
        self.difference(&both);
    }

    /// Complement within the domain. Unicode classes never gain surrogates.
    pub fn negate(&mut self) {
        let max = self.kind.max();
        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0;
        for r in &self.ranges {
            if r.start > next {
                ranges.push(ClassRange::new(next, r.start - 1));
            }
            next = r.end + 1;
        }
        if next <= max {
            ranges.push(ClassRange::new(next, max));
        }
        self.ranges = ranges;
        self.canonicalize();
    }

    /// Closes the class under simple case folding.
    ///
    /// Bytes classes only fold ASCII letters. Unicode classes use the Unicode simple case
    /// folding tables if the `unicode` feature is enabled, or ASCII folding otherwise.
    pub fn case_fold_simple(&mut self) {
        match self.kind {
            ClassKind::Unicode => super::unicode::simple_fold(self),
            ClassKind::Bytes => self.ascii_case_fold(),
        }
    }

    pub(crate) fn ascii_case_fold(&mut self) {
        let mut folded = Vec::new();
        for r in &self.ranges {
            for (lo, hi, delta) in [(b'a', b'z', -32i32), (b'A', b'Z', 32)] {
                let start = r.start.max(lo as u32);
                let end = r.end.min(hi as u32);
                if start <= end {
                    folded.push(ClassRange::new(
                        (start as i32 + delta) as u32,
                        (end as i32 + delta) as u32,
                    ));
                }
            }
        }
        if !folded.is_empty() {
            self.ranges.extend(folded);
            self.canonicalize();
        }
    }

    fn canonicalize(&mut self) {
        let max = self.kind.max();
        let mut ranges = Vec::with_capacity(self.ranges.len());
        for r in mem::take(&mut self.ranges) {
            if r.start > max {
                continue;
            }
            let end = r.end.min(max);
            if self.kind == ClassKind::Unicode
                && r.start <= SURROGATE_END
                && end >= SURROGATE_START
            {
                if r.start < SURROGATE_START {
                    ranges.push(ClassRange::new(r.start, SURROGATE_START - 1));
                }
                if end > SURROGATE_END {
                    ranges.push(ClassRange::new(SURROGATE_END + 1, end));
                }
            } else {
                ranges.push(ClassRange::new(r.start, end));
            }
        }
        ranges.sort_unstable();
        self.ranges = ranges
            .into_iter()
            .coalesce(|a, b| {
                if b.start <= a.end.saturating_add(1) {
                    Ok(ClassRange::new(a.start, a.end.max(b.end)))
                } else {
                    Err((a, b))
                }
            })
            .collect();
    }
}
