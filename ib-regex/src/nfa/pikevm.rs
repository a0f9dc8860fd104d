/*!
A Pike VM: a breadth-first simulation of a [`Program`] that also tracks capture slots.

All live threads advance over the haystack in lock step, one byte at a time. The threads
at a position are kept in priority order, and at most one thread per instruction survives
at each position: the one with the highest priority, since any lower priority thread in
the same instruction can only reproduce its future with a worse priority. This bounds
a search to `O(program size * haystack length)` time regardless of the pattern.

Searching needs mutable scratch space, a [`Cache`], which can be reused across searches
to avoid allocating.

```
use ib_regex::{nfa::{compile::Compiler, pikevm::PikeVM}, syntax, Input};

let program = Compiler::default().compile(&syntax::parse(r"[a-z]+(\d)").unwrap()).unwrap();
let vm = PikeVM::new(program);
let mut cache = vm.create_cache();
let mut slots = [None; 4];
let end = vm.search_slots(&mut cache, &Input::new("12 ab3"), &mut slots);
assert_eq!(end, Some(6));
assert_eq!(slots, [Some(3), Some(6), Some(5), Some(6)]);
```
*/
use std::sync::Arc;

use ib_unicode::{ascii::is_word_byte, utf8};

use super::{Inst, InstPtr, Program};
use crate::{
    syntax::{unicode::is_word_char, Look},
    util::{input::Input, matches::Match},
};

#[derive(Clone, Debug)]
pub struct PikeVM {
    program: Arc<Program>,
}

impl PikeVM {
    pub fn new(program: Program) -> Self {
        Self {
            program: Arc::new(program),
        }
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn create_cache(&self) -> Cache {
        Cache::new(&self.program)
    }

    /// The leftmost-first match. `input` is not validated, see
    /// [`Regex::try_find`](crate::Regex::try_find) for a checked search.
    pub fn find(&self, cache: &mut Cache, input: &Input) -> Option<Match> {
        let mut slots = [None; 2];
        let end = self.search_slots(cache, input, &mut slots)?;
        Some(Match::new(slots[0].unwrap_or(end), end))
    }

    /// Searches for the leftmost-first match and returns its end offset.
    ///
    /// As many capture slots as fit in `slots` are filled in; slot `2i` and `2i + 1` are the
    /// start and end of group `i`. On no match, `slots` is unspecified.
    ///
    /// A search with [`Input::is_earliest`] stops at the first match state reached, so the
    /// returned end may differ from the leftmost-first one.
    pub fn search_slots(
        &self,
        cache: &mut Cache,
        input: &Input,
        slots: &mut [Option<usize>],
    ) -> Option<usize> {
        let program = &*self.program;
        let active = slots.len().min(program.slot_len());
        cache.setup_search(program, active);
        let slots = &mut slots[..active];
        slots.fill(None);

        let haystack = input.haystack();
        let start = input.start();
        if start > haystack.len() {
            return None;
        }
        let (anchored, earliest) = (input.is_anchored(), input.is_earliest());
        let prefilter = if anchored { None } else { program.prefilter() };
        tracing::trace!(start, anchored, earliest, len = haystack.len(), "pikevm search");

        let Cache { stack, curr, next } = cache;
        let mut matched = None;
        let mut at = start;
        while at <= haystack.len() {
            if curr.set.is_empty() {
                if matched.is_some() || (anchored && at > start) {
                    break;
                }
                if let Some(prefilter) = prefilter {
                    match prefilter.find(haystack, at) {
                        Some(i) => {
                            if i > at {
                                tracing::trace!(from = at, to = i, "prefilter skip");
                            }
                            at = i;
                        }
                        None => break,
                    }
                }
            }
            if matched.is_none() && (!anchored || at == start) {
                // The lowest priority thread, seeded after the surviving ones
                let empty = next.slot_table.all_absent();
                self.epsilon_closure(stack, empty, curr, haystack, at, program.start);
            }
            if self.nexts(stack, curr, next, haystack, at, slots) {
                matched = Some(at);
                if earliest {
                    break;
                }
            }
            core::mem::swap(curr, next);
            next.set.clear();
            at += 1;
        }
        matched
    }

    /// Steps every thread in `curr` over the byte at `at` into `next`, in priority order.
    ///
    /// Returns true if a thread matched. Threads with a lower priority than the matching one
    /// are dropped.
    fn nexts(
        &self,
        stack: &mut Vec<Frame>,
        curr: &mut ActiveStates,
        next: &mut ActiveStates,
        haystack: &[u8],
        at: usize,
        slots: &mut [Option<usize>],
    ) -> bool {
        let program = &*self.program;
        let ActiveStates {
            ref set,
            ref mut slot_table,
        } = *curr;
        for &pc in set.iter() {
            match program.insts[pc] {
                Inst::ByteRange { start, end, next: to } => {
                    if let Some(&b) = haystack.get(at) {
                        if start <= b && b <= end {
                            let thread = slot_table.for_state(pc);
                            self.epsilon_closure(stack, thread, next, haystack, at + 1, to);
                        }
                    }
                }
                Inst::Match => {
                    if program.utf8 && !utf8::is_char_boundary(haystack, at) {
                        continue;
                    }
                    slots.copy_from_slice(slot_table.for_state(pc));
                    return true;
                }
                _ => (),
            }
        }
        false
    }

    /// Adds the threads reachable from `pc` without consuming input to `next`.
    ///
    /// `thread` holds the slots of the thread being followed. It is modified while
    /// exploring, but restored before returning.
    fn epsilon_closure(
        &self,
        stack: &mut Vec<Frame>,
        thread: &mut [Option<usize>],
        next: &mut ActiveStates,
        haystack: &[u8],
        at: usize,
        pc: InstPtr,
    ) {
        stack.push(Frame::Explore(pc));
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::RestoreCapture { slot, offset } => thread[slot] = offset,
                Frame::Explore(pc) => self.explore(stack, thread, next, haystack, at, pc),
            }
        }
    }

    fn explore(
        &self,
        stack: &mut Vec<Frame>,
        thread: &mut [Option<usize>],
        next: &mut ActiveStates,
        haystack: &[u8],
        at: usize,
        mut pc: InstPtr,
    ) {
        let insts = &self.program.insts;
        loop {
            if !next.set.insert(pc) {
                return;
            }
            match insts[pc] {
                Inst::ByteRange { .. } | Inst::Match => {
                    next.slot_table.for_state(pc).copy_from_slice(thread);
                    return;
                }
                Inst::Fail => return,
                Inst::Jump { next } => pc = next,
                Inst::Split { first, second } => {
                    stack.push(Frame::Explore(second));
                    pc = first;
                }
                Inst::Assert { look, next } => {
                    if !is_look_match(look, haystack, at) {
                        return;
                    }
                    pc = next;
                }
                Inst::Save { slot, next } => {
                    if let Some(value) = thread.get_mut(slot) {
                        stack.push(Frame::RestoreCapture {
                            slot,
                            offset: *value,
                        });
                        *value = Some(at);
                    }
                    pc = next;
                }
            }
        }
    }
}

/// Whether `look` holds between `haystack[..at]` and `haystack[at..]`.
pub fn is_look_match(look: Look, haystack: &[u8], at: usize) -> bool {
    match look {
        Look::Start => at == 0,
        Look::End => at == haystack.len(),
        Look::StartLine => at == 0 || haystack.get(at - 1) == Some(&b'\n'),
        Look::EndLine => at == haystack.len() || haystack.get(at) == Some(&b'\n'),
        Look::WordAscii => is_word_byte_before(haystack, at) != is_word_byte_after(haystack, at),
        Look::WordAsciiNegate => {
            is_word_byte_before(haystack, at) == is_word_byte_after(haystack, at)
        }
        Look::WordUnicode => is_word_char_before(haystack, at) != is_word_char_after(haystack, at),
        Look::WordUnicodeNegate => {
            is_word_char_before(haystack, at) == is_word_char_after(haystack, at)
        }
    }
}

fn is_word_byte_before(haystack: &[u8], at: usize) -> bool {
    at > 0 && haystack.get(at - 1).is_some_and(|&b| is_word_byte(b))
}

fn is_word_byte_after(haystack: &[u8], at: usize) -> bool {
    haystack.get(at).is_some_and(|&b| is_word_byte(b))
}

/// Invalid UTF-8 is never a word character.
fn is_word_char_before(haystack: &[u8], at: usize) -> bool {
    let Some(before) = haystack.get(..at) else {
        return false;
    };
    utf8::decode_last(before).0.is_some_and(is_word_char)
}

fn is_word_char_after(haystack: &[u8], at: usize) -> bool {
    let Some(after) = haystack.get(at..) else {
        return false;
    };
    utf8::decode(after).0.is_some_and(is_word_char)
}

/// Scratch space for [`PikeVM`] searches.
///
/// A cache sizes itself to the program it is used with, but resizing allocates, so keep
/// one cache per program.
#[derive(Clone, Debug)]
pub struct Cache {
    stack: Vec<Frame>,
    curr: ActiveStates,
    next: ActiveStates,
}

impl Cache {
    pub fn new(program: &Program) -> Self {
        Self {
            stack: Vec::new(),
            curr: ActiveStates::new(program),
            next: ActiveStates::new(program),
        }
    }

    fn setup_search(&mut self, program: &Program, active_slots: usize) {
        self.stack.clear();
        self.curr.setup_search(program, active_slots);
        self.next.setup_search(program, active_slots);
    }

    /// Heap memory used, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.stack.capacity() * core::mem::size_of::<Frame>()
            + self.curr.memory_usage()
            + self.next.memory_usage()
    }
}

#[derive(Clone, Copy, Debug)]
enum Frame {
    Explore(InstPtr),
    RestoreCapture { slot: usize, offset: Option<usize> },
}

#[derive(Clone, Debug)]
struct ActiveStates {
    set: SparseSet,
    slot_table: SlotTable,
}

impl ActiveStates {
    fn new(program: &Program) -> Self {
        let mut states = Self {
            set: SparseSet::new(0),
            slot_table: SlotTable::default(),
        };
        states.setup_search(program, program.slot_len());
        states
    }

    fn setup_search(&mut self, program: &Program, active_slots: usize) {
        // An earliest search may have stopped with threads still alive
        self.set.resize(program.insts.len());
        self.set.clear();
        self.slot_table
            .reset(program.insts.len(), program.slot_len(), active_slots);
    }

    fn memory_usage(&self) -> usize {
        self.set.memory_usage() + self.slot_table.memory_usage()
    }
}

/// Capture slots of each thread, indexed by the instruction the thread is at.
#[derive(Clone, Debug, Default)]
struct SlotTable {
    table: Vec<Option<usize>>,
    slots_per_state: usize,
    /// The slots actually tracked by the current search.
    active: usize,
}

impl SlotTable {
    fn reset(&mut self, states: usize, slots_per_state: usize, active: usize) {
        self.slots_per_state = slots_per_state;
        self.active = active.min(slots_per_state);
        // One extra row of scratch slots, always absent between closures
        let len = (states + 1) * slots_per_state;
        if self.table.len() != len {
            self.table.clear();
            self.table.resize(len, None);
        } else {
            self.table[len - slots_per_state..].fill(None);
        }
    }

    fn for_state(&mut self, pc: InstPtr) -> &mut [Option<usize>] {
        let i = pc * self.slots_per_state;
        &mut self.table[i..i + self.active]
    }

    fn all_absent(&mut self) -> &mut [Option<usize>] {
        let i = self.table.len() - self.slots_per_state;
        let slots = &mut self.table[i..i + self.active];
        debug_assert!(slots.iter().all(Option::is_none));
        slots
    }

    fn memory_usage(&self) -> usize {
        self.table.capacity() * core::mem::size_of::<Option<usize>>()
    }
}

/// An insertion ordered set of instruction pointers with constant time clearing.
#[derive(Clone, Debug)]
struct SparseSet {
    len: usize,
    dense: Vec<InstPtr>,
    sparse: Vec<usize>,
}

impl SparseSet {
    fn new(capacity: usize) -> Self {
        let mut set = Self {
            len: 0,
            dense: Vec::new(),
            sparse: Vec::new(),
        };
        set.resize(capacity);
        set
    }

    fn resize(&mut self, capacity: usize) {
        if self.dense.len() != capacity {
            self.clear();
            self.dense.resize(capacity, 0);
            self.sparse.resize(capacity, 0);
        }
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn contains(&self, id: InstPtr) -> bool {
        let i = self.sparse[id];
        i < self.len && self.dense[i] == id
    }

    /// Returns false if `id` was already present.
    fn insert(&mut self, id: InstPtr) -> bool {
        if self.contains(id) {
            return false;
        }
        self.dense[self.len] = id;
        self.sparse[id] = self.len;
        self.len += 1;
        true
    }

    fn clear(&mut self) {
        self.len = 0;
    }

    fn iter(&self) -> core::slice::Iter<'_, InstPtr> {
        self.dense[..self.len].iter()
    }

    fn memory_usage(&self) -> usize {
        (self.dense.capacity() + self.sparse.capacity()) * core::mem::size_of::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{nfa::compile::Compiler, syntax};

    fn vm(pattern: &str) -> PikeVM {
        PikeVM::new(
            Compiler::default()
                .compile(&syntax::parse(pattern).unwrap())
                .unwrap(),
        )
    }

    fn find(pattern: &str, haystack: &str) -> Option<(usize, usize)> {
        let vm = vm(pattern);
        let m = vm.find(&mut vm.create_cache(), &Input::new(haystack))?;
        Some((m.start(), m.end()))
    }

    fn slots(pattern: &str, haystack: &str) -> Vec<Option<usize>> {
        let vm = vm(pattern);
        let mut slots = vec![None; vm.program().slot_len()];
        vm.search_slots(&mut vm.create_cache(), &Input::new(haystack), &mut slots);
        slots
    }

    #[test]
    fn leftmost_first() {
        assert_eq!(find("a+", "xaaay"), Some((1, 4)));
        assert_eq!(find("a+?", "xaaay"), Some((1, 2)));
        assert_eq!(find("sam|samwise", "samwise"), Some((0, 3)));
        assert_eq!(find("samwise|sam", "samwise"), Some((0, 7)));
        assert_eq!(find("b|abc", "abc"), Some((0, 3)));
        assert_eq!(find("x", "abc"), None);
        assert_eq!(find("", ""), Some((0, 0)));
        assert_eq!(find("a*", "bbb"), Some((0, 0)));
    }

    #[test]
    fn captures() {
        assert_eq!(
            slots(r"(a)|(b)", "b"),
            vec![Some(0), Some(1), None, None, Some(0), Some(1)]
        );
        // The last iteration wins
        assert_eq!(slots(r"(\w)+", "abc"), vec![Some(0), Some(3), Some(2), Some(3)]);
        assert_eq!(
            slots(r"(a*)*", "b"),
            vec![Some(0), Some(0), Some(0), Some(0)]
        );
        assert_eq!(
            slots(r"(a*)+$", "aa"),
            vec![Some(0), Some(2), Some(0), Some(2)]
        );
    }

    #[test]
    fn looks() {
        assert_eq!(find(r"\bfoo\b", "a foo b"), Some((2, 5)));
        assert_eq!(find(r"\Bo", "foo"), Some((1, 2)));
        assert_eq!(find(r"(?m)^b$", "a\nb\nc"), Some((2, 3)));
        assert_eq!(find(r"^b", "a\nb"), None);
        assert_eq!(find(r"a$", "a\n"), None);
        assert_eq!(find(r"\bδ", "aδ δ"), Some((4, 6)));
        assert_eq!(find(r"(?-u:\b)x", "δx"), Some((2, 3)));
    }

    #[test]
    fn unicode() {
        assert_eq!(find(r"\p{So}$", "snowman: ☃"), Some((9, 12)));
        assert_eq!(find(r".", "☃"), Some((0, 3)));
        assert_eq!(find(r"(?i)δ", "Δ"), Some((0, 2)));
        // Matches never end inside a scalar value
        assert_eq!(find(r"(?-u:\x98)|$", "☃"), Some((3, 3)));
    }

    #[test]
    fn anchored_and_earliest() {
        let vm = vm("[0-9]+");
        let mut cache = vm.create_cache();
        let input = Input::builder(b"a123").anchored(true).build();
        assert_eq!(vm.find(&mut cache, &input), None);
        let input = Input::builder(b"a123").start(1).anchored(true).build();
        assert_eq!(vm.find(&mut cache, &input), Some(Match::new(1, 4)));
        let input = Input::builder(b"a123").earliest(true).build();
        assert_eq!(vm.find(&mut cache, &input), Some(Match::new(1, 2)));
        let input = Input::builder(b"a123").start(5).build();
        assert_eq!(vm.find(&mut cache, &input), None);
    }

    #[test]
    fn look_behind_before_start() {
        let vm = vm(r"^a");
        let input = Input::builder(b"aa").start(1).build();
        assert_eq!(vm.find(&mut vm.create_cache(), &input), None);
    }

    #[test]
    fn pathological() {
        let n = 30;
        let pattern = format!("(?:a?){{{n}}}a{{{n}}}");
        let haystack = "a".repeat(n);
        assert_eq!(find(&pattern, &haystack), Some((0, n)));
    }

    #[test]
    fn cache_reuse_across_programs() {
        let (a, b) = (vm("a"), vm("(b)(c)(d)"));
        let mut cache = a.create_cache();
        assert_eq!(a.find(&mut cache, &Input::new("xa")), Some(Match::new(1, 2)));
        assert_eq!(b.find(&mut cache, &Input::new("bcd")), Some(Match::new(0, 3)));
        assert!(cache.memory_usage() > 0);
    }

    #[test]
    fn cache_reuse_after_earliest() {
        let vm = vm("(a+)");
        let mut cache = vm.create_cache();
        let input = Input::builder(b"aaaa").earliest(true).build();
        assert_eq!(vm.find(&mut cache, &input), Some(Match::new(0, 1)));
        // Threads left alive by the earliest stop must not leak into the next search
        assert_eq!(vm.find(&mut cache, &Input::new("zzzzzz")), None);
        let mut slots = vec![None; 4];
        assert_eq!(vm.search_slots(&mut cache, &Input::new("zaz"), &mut slots), Some(2));
        assert_eq!(slots, vec![Some(1), Some(2), Some(1), Some(2)]);
    }

    #[test]
    fn invalid_utf8() {
        // A lone continuation byte is a scalar value of its own
        let empty = vm("");
        let mut cache = empty.create_cache();
        assert_eq!(empty.find(&mut cache, &Input::new(b"\x80")), Some(Match::new(0, 0)));
        let a = vm("a");
        assert_eq!(a.find(&mut cache, &Input::new(b"\x80a")), Some(Match::new(1, 2)));
        assert_eq!(a.find(&mut cache, &Input::new(b"\xE2\x98a")), Some(Match::new(2, 3)));
    }

    #[test]
    fn sparse_set() {
        let mut set = SparseSet::new(4);
        assert!(set.insert(2));
        assert!(set.insert(0));
        assert!(!set.insert(2));
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![2, 0]);
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(2));
    }
}
