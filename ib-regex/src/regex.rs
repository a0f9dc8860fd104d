use std::{
    panic::{RefUnwindSafe, UnwindSafe},
    sync::Arc,
};

use bon::bon;
use ib_unicode::utf8;
use regex_automata::util::pool::Pool;

use crate::{
    error::{Error, MatchError},
    nfa::{
        compile::{self, Compiler},
        pikevm::{Cache, PikeVM},
        Program,
    },
    syntax::{self, Ast},
    util::{
        captures::Captures,
        input::Input,
        iter::{CapturesMatches, FindMatches, Searcher},
        matches::Match,
    },
};

/// A compiled regular expression for searching byte haystacks.
///
/// Searches report the leftmost-first match: the match that starts at the smallest offset,
/// and among those, the one an ordered backtracking search would find first. All searching
/// is done with an implicit `(?s:.)*?` at the beginning of the pattern; use a search with
/// [`Input::builder`] and `anchored(true)`, or `^`/`\A`, to anchor it.
///
/// Haystacks are bytes, so both `&str` and `&[u8]` can be searched. Offsets are always byte
/// offsets into the haystack.
///
/// # Overview
///
/// * [`Regex::new`] compiles a regex with the default configuration. [`Regex::builder`]
///   permits a non-default one, e.g. case insensitive matching or a smaller size limit.
/// * [`Regex::is_match`] reports whether a match exists.
/// * [`Regex::find`] reports the offsets of the leftmost-first match.
///   [`Regex::find_iter`] iterates over all non-overlapping matches.
/// * [`Regex::captures`] reports the offsets of every capture group of a match.
///   [`Regex::captures_iter`] iterates over them.
///
/// # Example
///
/// ```
/// use ib_regex::Regex;
///
/// let re = Regex::new(r"(?u)\p{So}$").unwrap();
/// let m = re.find("snowman: ☃").unwrap();
/// assert_eq!((m.start(), m.end()), (9, 12));
///
/// let re = Regex::new(r"(?u).(.*(?P<snowman>\p{So}))$").unwrap();
/// let mut caps = re.create_captures();
/// assert!(re.captures_at("snowman: ☃", 0, &mut caps));
/// let index = re.capture_index("snowman").unwrap();
/// assert_eq!(index, 2);
/// assert_eq!(caps.get(index).unwrap().range(), 9..12);
/// ```
///
/// # Synchronization and cloning
///
/// Searching needs mutable scratch space, a [`Cache`]. A `Regex` keeps a pool of caches to
/// make the convenience routines usable from many threads at once. If you want to avoid
/// the pool, use the `try_*` routines with your own cache from [`Regex::create_cache`].
///
/// Cloning a `Regex` is cheap: the compiled program is shared, but the clone gets its own
/// cache pool.
pub struct Regex {
    vm: PikeVM,
    /// Kept outside the shared program so that each clone gets its own pool, and with it
    /// the pool's fast path for the owning thread.
    pool: CachePool,
}

pub(crate) type CachePoolFn = Box<dyn Fn() -> Cache + Send + Sync + UnwindSafe + RefUnwindSafe>;

pub(crate) type CachePool = Pool<Cache, CachePoolFn>;

fn new_pool(vm: &PikeVM) -> CachePool {
    let program = vm.program().clone();
    Pool::new(Box::new(move || Cache::new(&program)))
}

#[bon]
impl Regex {
    /// Compiles a pattern with the default configuration.
    ///
    /// ```
    /// use ib_regex::{ErrorKind, Regex};
    ///
    /// assert!(Regex::new(r"\w+@\w+").is_ok());
    /// assert_eq!(Regex::new("a{2,1}").unwrap_err().kind(), &ErrorKind::InvalidRepeatRange);
    /// ```
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::builder().build(pattern)
    }

    /// Compiles a pattern given as bytes. It must be valid UTF-8.
    pub fn from_bytes(pattern: &[u8]) -> Result<Self, Error> {
        Self::builder().build_bytes(pattern)
    }

    /// Return a builder for configuring the construction of a `Regex`.
    ///
    /// ```
    /// use ib_regex::{nfa::compile, syntax, Regex};
    ///
    /// let re = Regex::builder()
    ///     .syntax(syntax::Config::new().case_insensitive(true))
    ///     .configure(compile::Config::new().size_limit(1000))
    ///     .build(r"δ")
    ///     .unwrap();
    /// assert_eq!(re.find("Δ").unwrap().range(), 0..2);
    /// ```
    #[builder(builder_type = Builder, finish_fn(name = build_from_ast, doc {
    /// Builds a `Regex` from an already parsed [`Ast`].
    ///
    /// Any options set with [`Builder::syntax`] are ignored, since they only apply when
    /// parsing a pattern.
    ///
    /// ```
    /// use ib_regex::{syntax::{ast::Literal, Ast}, Regex};
    ///
    /// let ast = Ast::concat(vec![
    ///     Ast::Literal(Literal::Char('a')),
    ///     Ast::repeat(Ast::Literal(Literal::Char('b')), 1, None, true),
    /// ]);
    /// let re = Regex::builder().build_from_ast(ast).unwrap();
    /// assert_eq!(re.find("xabbb").unwrap().range(), 1..5);
    /// ```
    }))]
    pub fn builder(
        #[builder(field)] syntax: syntax::Config,
        #[builder(finish_fn)] ast: Ast,
        /// Compiler limits and UTF-8 mode.
        #[builder(default)]
        configure: compile::Config,
    ) -> Result<Self, Error> {
        _ = syntax;
        let program = Compiler::new(configure).compile(&ast)?;
        let vm = PikeVM::new(program);
        let pool = new_pool(&vm);
        Ok(Self { vm, pool })
    }
}

impl<S: builder::State> Builder<S> {
    /// Configure the syntax options used when parsing a pattern.
    ///
    /// These options only apply to [`Builder::build`] and [`Builder::build_bytes`].
    pub fn syntax(mut self, syntax: syntax::Config) -> Self {
        self.syntax = syntax;
        self
    }

    /// Builds a `Regex` from a pattern string.
    pub fn build(self, pattern: &str) -> Result<Regex, Error>
    where
        S: builder::IsComplete,
    {
        let ast = syntax::parse_with(pattern, &self.syntax)?;
        self.build_from_ast(ast)
    }

    /// Builds a `Regex` from a pattern that must be valid UTF-8.
    ///
    /// ```
    /// use ib_regex::{ErrorKind, Regex};
    ///
    /// let err = Regex::builder().build_bytes(b"ab\xFF").unwrap_err();
    /// assert_eq!(err.kind(), &ErrorKind::InvalidUtf8);
    /// assert_eq!(err.offset(), Some(2));
    /// ```
    pub fn build_bytes(self, pattern: &[u8]) -> Result<Regex, Error>
    where
        S: builder::IsComplete,
    {
        let ast = syntax::parse_bytes_with(pattern, &self.syntax)?;
        self.build_from_ast(ast)
    }
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        Regex {
            vm: self.vm.clone(),
            pool: new_pool(&self.vm),
        }
    }
}

impl core::fmt::Debug for Regex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Regex")
            .field("program", self.vm.program())
            .finish_non_exhaustive()
    }
}

/// High level convenience routines for using a regex to search a haystack.
///
/// These panic on invalid input, e.g. a start offset past the end of the haystack. See
/// the `try_*` routines for fallible versions.
impl Regex {
    /// Returns true if and only if this regex matches the given haystack.
    ///
    /// This routine may stop at the first match state it sees, since later input cannot
    /// change the answer.
    ///
    /// ```
    /// use ib_regex::Regex;
    ///
    /// let re = Regex::new("foo[0-9]+bar").unwrap();
    /// assert!(re.is_match("foo12345bar"));
    /// assert!(!re.is_match("foobar"));
    /// ```
    #[inline]
    pub fn is_match<'h, I: Into<Input<'h>>>(&self, input: I) -> bool {
        let mut guard = self.pool.get();
        self.try_is_match(&mut guard, input)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Like [`Regex::is_match`], but starts searching at byte offset `start`.
    ///
    /// Assertions still see the haystack before `start`:
    ///
    /// ```
    /// use ib_regex::Regex;
    ///
    /// let re = Regex::new(r"^b").unwrap();
    /// assert!(!re.is_match_at("ab", 1));
    /// ```
    #[inline]
    pub fn is_match_at<H: ?Sized + AsRef<[u8]>>(&self, haystack: &H, start: usize) -> bool {
        self.is_match(Input::builder(haystack.as_ref()).start(start).build())
    }

    /// Executes a leftmost-first search and returns the match, if one exists.
    ///
    /// ```
    /// use ib_regex::{Match, Regex};
    ///
    /// let re = Regex::new("foo[0-9]+").unwrap();
    /// assert_eq!(re.find("xfoo12345"), Some(Match::new(1, 9)));
    /// ```
    #[inline]
    pub fn find<'h, I: Into<Input<'h>>>(&self, input: I) -> Option<Match> {
        let mut guard = self.pool.get();
        self.try_find(&mut guard, input)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    #[inline]
    pub fn find_at<H: ?Sized + AsRef<[u8]>>(&self, haystack: &H, start: usize) -> Option<Match> {
        self.find(Input::builder(haystack.as_ref()).start(start).build())
    }

    /// Executes a leftmost-first search and writes the spans of capture groups that
    /// participated in the match into `caps`. Returns whether a match was found; if not,
    /// [`Captures::is_match`] is false.
    ///
    /// ```
    /// use ib_regex::{Regex, Span};
    ///
    /// let re = Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").unwrap();
    /// let mut caps = re.create_captures();
    ///
    /// assert_eq!(re.captures("2010-03-14", &mut caps), Ok(true));
    /// assert_eq!(caps.get(1), Some(Span::from(0..4)));
    /// assert_eq!(caps.get(2), Some(Span::from(5..7)));
    /// assert_eq!(caps.get(3), Some(Span::from(8..10)));
    /// ```
    #[inline]
    pub fn captures<'h, I: Into<Input<'h>>>(
        &self,
        input: I,
        caps: &mut Captures,
    ) -> Result<bool, MatchError> {
        let mut guard = self.pool.get();
        self.try_captures(&mut guard, input, caps)
    }

    /// Like [`Regex::captures`] with a start offset, but panics on misuse.
    #[inline]
    pub fn captures_at<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
        start: usize,
        caps: &mut Captures,
    ) -> bool {
        self.captures(Input::builder(haystack.as_ref()).start(start).build(), caps)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Returns an iterator over all non-overlapping leftmost-first matches.
    ///
    /// ```
    /// use ib_regex::{Match, Regex};
    ///
    /// let re = Regex::new("foo[0-9]+").unwrap();
    /// let matches: Vec<Match> = re.find_iter("foo1 foo12 foo123").collect();
    /// assert_eq!(matches, vec![Match::new(0, 4), Match::new(5, 10), Match::new(11, 17)]);
    /// ```
    #[inline]
    pub fn find_iter<'r, 'h, H: ?Sized + AsRef<[u8]>>(
        &'r self,
        haystack: &'h H,
    ) -> FindMatches<'r, 'h> {
        FindMatches::new(self.searcher(haystack))
    }

    /// Returns an iterator over the captures of all non-overlapping matches.
    ///
    /// This allocates a new [`Captures`] for every match. See [`Regex::searcher`] to reuse
    /// one instead.
    ///
    /// ```
    /// use ib_regex::{Regex, Span};
    ///
    /// let re = Regex::new("foo(?P<numbers>[0-9]+)").unwrap();
    /// let numbers: Vec<Span> = re
    ///     .captures_iter("foo1 foo12 foo123")
    ///     .filter_map(|caps| caps.get_group_by_name("numbers"))
    ///     .collect();
    /// assert_eq!(numbers, vec![Span::from(3..4), Span::from(8..10), Span::from(14..17)]);
    /// ```
    #[inline]
    pub fn captures_iter<'r, 'h, H: ?Sized + AsRef<[u8]>>(
        &'r self,
        haystack: &'h H,
    ) -> CapturesMatches<'r, 'h> {
        CapturesMatches::new(self.searcher(haystack))
    }

    /// A low level iterator over all non-overlapping matches. See [`Searcher`].
    #[inline]
    pub fn searcher<'r, 'h, H: ?Sized + AsRef<[u8]>>(&'r self, haystack: &'h H) -> Searcher<'r, 'h> {
        Searcher::new(self, haystack.as_ref())
    }
}

/// Lower level search routines with an explicit [`Cache`].
impl Regex {
    pub fn create_cache(&self) -> Cache {
        self.vm.create_cache()
    }

    /// A [`Captures`] with room for every group of this regex.
    pub fn create_captures(&self) -> Captures {
        Captures::new(self.program().group_info().clone())
    }

    /// ```
    /// use ib_regex::{Input, MatchError, Regex};
    ///
    /// let re = Regex::new("a").unwrap();
    /// let mut cache = re.create_cache();
    /// assert_eq!(re.try_is_match(&mut cache, "ba"), Ok(true));
    /// assert_eq!(
    ///     re.try_is_match(&mut cache, Input::builder("☃".as_bytes()).start(1).build()),
    ///     Err(MatchError::NotCharBoundary { start: 1 })
    /// );
    /// ```
    pub fn try_is_match<'h, I: Into<Input<'h>>>(
        &self,
        cache: &mut Cache,
        input: I,
    ) -> Result<bool, MatchError> {
        let input = input.into();
        self.validate(&input)?;
        let input = Input::builder(input.haystack())
            .start(input.start())
            .anchored(input.is_anchored())
            .earliest(true)
            .build();
        Ok(self.vm.search_slots(cache, &input, &mut []).is_some())
    }

    /// ```
    /// use ib_regex::{MatchError, Regex};
    ///
    /// let re = Regex::new("a").unwrap();
    /// let mut cache = re.create_cache();
    /// assert_eq!(
    ///     re.try_find(&mut cache, ib_regex::Input::builder(b"a").start(2).build()),
    ///     Err(MatchError::InvalidStart { start: 2, len: 1 })
    /// );
    /// ```
    pub fn try_find<'h, I: Into<Input<'h>>>(
        &self,
        cache: &mut Cache,
        input: I,
    ) -> Result<Option<Match>, MatchError> {
        let input = input.into();
        self.validate(&input)?;
        Ok(self.vm.find(cache, &input))
    }

    pub fn try_captures<'h, I: Into<Input<'h>>>(
        &self,
        cache: &mut Cache,
        input: I,
        caps: &mut Captures,
    ) -> Result<bool, MatchError> {
        if !caps.is_for(self.program().group_info()) {
            return Err(MatchError::CapturesMismatch);
        }
        let input = input.into();
        self.validate(&input)?;
        let found = self
            .vm
            .search_slots(cache, &input, caps.slots_mut())
            .is_some();
        if !found {
            caps.clear();
        }
        Ok(found)
    }

    fn validate(&self, input: &Input) -> Result<(), MatchError> {
        let (haystack, start) = (input.haystack(), input.start());
        if start > haystack.len() {
            return Err(MatchError::InvalidStart {
                start,
                len: haystack.len(),
            });
        }
        if self.program().is_utf8() && !utf8::is_char_boundary(haystack, start) {
            return Err(MatchError::NotCharBoundary { start });
        }
        Ok(())
    }

    pub(crate) fn search_unchecked(
        &self,
        cache: &mut Cache,
        input: &Input,
        slots: &mut [Option<usize>],
    ) -> Option<usize> {
        self.vm.search_slots(cache, input, slots)
    }

    pub(crate) fn pool(&self) -> &CachePool {
        &self.pool
    }
}

/// Introspection.
impl Regex {
    pub fn program(&self) -> &Arc<Program> {
        self.vm.program()
    }

    pub fn pikevm(&self) -> &PikeVM {
        &self.vm
    }

    /// The number of capture groups, including the implicit group 0.
    ///
    /// ```
    /// use ib_regex::Regex;
    ///
    /// assert_eq!(Regex::new("a").unwrap().captures_len(), 1);
    /// assert_eq!(Regex::new("(a)(?:b)(?<c>c)").unwrap().captures_len(), 3);
    /// ```
    pub fn captures_len(&self) -> usize {
        self.program().group_info().group_len()
    }

    /// The index of the group named `name`.
    pub fn capture_index(&self, name: &str) -> Option<usize> {
        self.program().group_info().to_index(name)
    }

    /// Group names in index order, `None` for unnamed groups (including group 0).
    ///
    /// ```
    /// use ib_regex::Regex;
    ///
    /// let re = Regex::new(r"(?P<y>\d+)-(\d+)").unwrap();
    /// let names: Vec<_> = re.capture_names().collect();
    /// assert_eq!(names, vec![None, Some("y"), None]);
    /// ```
    pub fn capture_names(&self) -> impl ExactSizeIterator<Item = Option<&str>> + '_ {
        self.program().group_info().names()
    }
}
