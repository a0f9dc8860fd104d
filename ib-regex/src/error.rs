use core::fmt;

/// An error that occurred while parsing a pattern or compiling it into a [`Program`](crate::nfa::Program).
///
/// Syntax errors carry the byte offset in the pattern where the defect was detected.
/// Resource limit errors (see [`Error::is_resource_limit`]) have no offset, since no single
/// position in the pattern is responsible for them.
///
/// The [`Display`](fmt::Display) output is stable enough to show to users, e.g.
///
/// ```
/// use ib_regex::Regex;
///
/// let err = Regex::new("(").unwrap_err();
/// assert!(err.to_string().contains("Unclosed parenthesis"));
/// assert_eq!(err.offset(), Some(0));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    offset: Option<usize>,
}

/// The kind of a pattern [`Error`].
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An opening `(` without a matching `)`.
    UnclosedParenthesis,
    /// A closing `)` without a matching `(`.
    UnopenedParenthesis,
    /// An opening `[` without a matching `]`.
    UnclosedCharacterClass,
    /// A class range whose start is greater than its end, or whose end points are not literals.
    InvalidClassRange,
    /// An unrecognized escape sequence, or an escape that is not allowed at its position.
    InvalidEscape,
    /// A malformed counted repetition, or one where `min > max` (e.g. `{3,1}`).
    InvalidRepeatRange,
    /// A repetition operator with nothing to repeat (e.g. `*a`).
    RepetitionMissing,
    /// Two capture groups with the same name.
    DuplicateCaptureName,
    /// An empty or malformed capture group name.
    InvalidCaptureName,
    /// A `\p{..}` class, or a Unicode-aware Perl class, that is unknown or unavailable.
    UnsupportedUnicodePropertyName,
    /// A Unicode construct used while the `u` flag is disabled.
    UnicodeNotAllowed,
    /// An unknown inline flag, or a dangling `-` in a flag group.
    UnrecognizedFlag,
    /// Look-around groups such as `(?=..)` and `(?<!..)`.
    UnsupportedGroup,
    /// `\1` and other back-references.
    UnsupportedBackreference,
    /// A pattern that ends with a single `\`.
    TrailingBackslash,
    /// Groups or classes nested deeper than the given limit.
    NestLimitExceeded(u32),
    /// A byte pattern that is not valid UTF-8.
    InvalidUtf8,
    /// More capture groups than the given limit, excluding the implicit group 0.
    TooManyCaptures(usize),
    /// A compiled program with more instructions than the given limit.
    ProgramTooLarge(usize),
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset: Some(offset),
        }
    }

    pub(crate) fn limit(kind: ErrorKind) -> Self {
        Self { kind, offset: None }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Byte offset in the pattern where the error was detected.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Whether this error was caused by a configured limit rather than by the pattern's syntax.
    ///
    /// ```
    /// use ib_regex::{nfa::compile, Regex};
    ///
    /// let err = Regex::builder()
    ///     .configure(compile::Config::new().size_limit(10))
    ///     .build("a{100}")
    ///     .unwrap_err();
    /// assert!(err.is_resource_limit());
    /// ```
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::TooManyCaptures(_) | ErrorKind::ProgramTooLarge(_)
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ErrorKind::*;
        match self {
            UnclosedParenthesis => f.write_str("Unclosed parenthesis"),
            UnopenedParenthesis => f.write_str("Unopened parenthesis"),
            UnclosedCharacterClass => f.write_str("Unclosed character class"),
            InvalidClassRange => f.write_str("Invalid character class range"),
            InvalidEscape => f.write_str("Invalid escape sequence"),
            InvalidRepeatRange => f.write_str("Invalid repetition range"),
            RepetitionMissing => f.write_str("Repetition operator missing expression"),
            DuplicateCaptureName => f.write_str("Duplicate capture group name"),
            InvalidCaptureName => f.write_str("Invalid capture group name"),
            UnsupportedUnicodePropertyName => {
                f.write_str("Unsupported Unicode property name")
            }
            UnicodeNotAllowed => f.write_str("Unicode not allowed here"),
            UnrecognizedFlag => f.write_str("Unrecognized flag"),
            UnsupportedGroup => f.write_str("Look-around is not supported"),
            UnsupportedBackreference => f.write_str("Backreferences are not supported"),
            TrailingBackslash => f.write_str("Trailing backslash"),
            NestLimitExceeded(limit) => write!(f, "Nest limit of {limit} exceeded"),
            InvalidUtf8 => f.write_str("Pattern is not valid UTF-8"),
            TooManyCaptures(limit) => {
                write!(f, "Too many capture groups (limit is {limit})")
            }
            ProgramTooLarge(limit) => {
                write!(f, "Compiled program exceeds size limit of {limit} instructions")
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "regex parse error at offset {}: {}", offset, self.kind),
            None => write!(f, "regex compile error: {}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

/// An error caused by misusing a search API, as opposed to a failure to find a match.
///
/// The convenience routines on [`Regex`](crate::Regex) panic with this error. The `try_*`
/// routines return it.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchError {
    /// The start offset is greater than the haystack length.
    InvalidStart { start: usize, len: usize },
    /// The start offset splits a UTF-8 encoded scalar value while UTF-8 mode is enabled.
    NotCharBoundary { start: usize },
    /// The [`Captures`](crate::Captures) were created for a different regex.
    CapturesMismatch,
    /// A capture group index that does not exist in the regex.
    InvalidGroupIndex { index: usize, len: usize },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MatchError::InvalidStart { start, len } => write!(
                f,
                "search start offset {start} is beyond the haystack length {len}"
            ),
            MatchError::NotCharBoundary { start } => write!(
                f,
                "search start offset {start} is not on a UTF-8 char boundary"
            ),
            MatchError::CapturesMismatch => {
                f.write_str("captures were created for a different regex")
            }
            MatchError::InvalidGroupIndex { index, len } => write!(
                f,
                "capture group index {index} is out of range (the regex has {len} groups)"
            ),
        }
    }
}

impl std::error::Error for MatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = Error::new(ErrorKind::UnclosedParenthesis, 3);
        assert_eq!(
            err.to_string(),
            "regex parse error at offset 3: Unclosed parenthesis"
        );
        assert!(!err.is_resource_limit());

        let err = Error::limit(ErrorKind::TooManyCaptures(2));
        assert_eq!(err.offset(), None);
        assert!(err.is_resource_limit());
        assert!(!err.to_string().contains('\0'));
    }
}
