/*!
The pattern syntax, and the parser turning patterns into an [`Ast`].

The supported syntax is a subset of the [`regex`](https://docs.rs/regex/) crate's. Everything
documented below is supported. Look-around, back-references and half word boundaries
(`\<`, `\b{start}` and friends) are not.

### Matching one character

<pre class="rust">
.             any character except new line (includes new line with s flag)
[0-9]         any ASCII digit
\d            digit (\p{Nd})
\D            not digit
\pX           Unicode character class identified by a one-letter name
\p{Greek}     Unicode character class (general category, script or binary property)
\PX           Negated Unicode character class identified by a one-letter name
\P{Greek}     negated Unicode character class (general category, script or binary property)
</pre>

### Character classes

<pre class="rust">
[xyz]         A character class matching either x, y or z (union).
[^xyz]        A character class matching any character except x, y and z.
[a-z]         A character class matching any character in range a-z.
[[:alpha:]]   ASCII character class ([A-Za-z])
[[:^alpha:]]  Negated ASCII character class ([^A-Za-z])
[x[^xyz]]     Nested/grouping character class (matching any character except y and z)
[a-y&&xyz]    Intersection (matching x or y)
[0-9&&[^4]]   Subtraction using intersection and negation (matching 0-9 except 4)
[0-9--4]      Direct subtraction (matching 0-9 except 4)
[a-g~~b-h]    Symmetric difference (matching `a` and `h` only)
[\[\]]        Escaping in character classes (matching [ or ])
[a&&b]        An empty character class matching nothing
</pre>

<div class="warning">

Escaping:
- `[]]` is valid and matches `]`, but `[[]` is invalid and will cause an
  [`UnclosedCharacterClass`](crate::ErrorKind::UnclosedCharacterClass) error (because classes are allowed to nest).
- `[-]`, `[a-]` and `[-a]` are valid and can match `-`.
- `[a^]` is valid and can match `^`, but `[^]` is not.
</div>

Precedence in character classes, from most binding to least:

1. Ranges: `[a-cd]` == `[[a-c]d]`
2. Union: `[ab&&bc]` == `[[ab]&&[bc]]`
3. Intersection, difference, symmetric difference. All three have equivalent
precedence, and are evaluated in left-to-right order.
4. Negation: `[^a-z&&b]` == `[^[a-z&&b]]`.

### Composites

<pre class="rust">
xy    concatenation (x followed by y)
x|y   alternation (x or y, prefer x)
</pre>

```
use ib_regex::Regex;

let haystack = "samwise";
// 'samwise' comes first, so it is preferred even though 'sam' matches earlier.
let re = Regex::new(r"samwise|sam").unwrap();
assert_eq!(re.find(haystack).unwrap().range(), 0..7);
// 'sam' is a prefix of 'samwise', so 'samwise' can never match here.
let re = Regex::new(r"sam|samwise").unwrap();
assert_eq!(re.find(haystack).unwrap().range(), 0..3);
```

### Repetitions

<pre class="rust">
x*        zero or more of x (greedy)
x+        one or more of x (greedy)
x?        zero or one of x (greedy)
x*?       zero or more of x (ungreedy/lazy)
x+?       one or more of x (ungreedy/lazy)
x??       zero or one of x (ungreedy/lazy)
x{n,m}    at least n x and at most m x (greedy)
x{n,}     at least n x (greedy)
x{n}      exactly n x
x{n,m}?   at least n x and at most m x (ungreedy/lazy)
x{n,}?    at least n x (ungreedy/lazy)
x{n}?     exactly n x
</pre>

### Empty matches

<pre class="rust">
^               the beginning of a haystack (or start-of-line with multi-line mode)
$               the end of a haystack (or end-of-line with multi-line mode)
\A              only the beginning of a haystack (even with multi-line mode enabled)
\z              only the end of a haystack (even with multi-line mode enabled)
\b              a Unicode word boundary (\w on one side and \W, \A, or \z on other)
\B              not a Unicode word boundary
</pre>

The empty regex is valid and matches the empty string. An empty match never splits a
codepoint while iterating, since the search advances by one codepoint after each empty match:

```
use ib_regex::Regex;

let re = Regex::new(r"").unwrap();
let ranges: Vec<_> = re.find_iter("💩").map(|m| m.range()).collect();
assert_eq!(ranges, vec![0..0, 4..4]);
```

### Grouping and flags

<pre class="rust">
(exp)          numbered capture group (indexed by opening parenthesis)
(?P&lt;name&gt;exp)  named (also numbered) capture group
(?&lt;name&gt;exp)   named (also numbered) capture group
(?:exp)        non-capturing group
(?flags)       set flags for the rest of the current group
(?flags:exp)   set flags for exp (non-capturing)
</pre>

Capture group names must start with `_` or an alphabetic codepoint, followed by
alpha-numeric codepoints, `.`, `_`, `[` or `]`.

<pre class="rust">
i     case-insensitive: letters match both upper and lower case
m     multi-line mode: ^ and $ match begin/end of line
s     allow . to match \n
U     swap the meaning of x* and x*?
u     Unicode support (enabled by default)
x     verbose mode, ignores whitespace and allow line comments (starting with `#`)
</pre>

`(?flags)` applies up to the end of the innermost enclosing group, including later
branches of an alternation in that group:

```
use ib_regex::Regex;

let re = Regex::new(r"(?i)a+(?-i)b+").unwrap();
assert_eq!(re.find("AaAaAbbBBBb").unwrap().range(), 0..7);

let re = Regex::new(r"(x(?i)y|z)").unwrap();
assert!(re.is_match("xY"));
assert!(re.is_match("Z"));
assert!(!re.is_match("Xy"));
```

Multi-line mode:

```
use ib_regex::Regex;

let re = Regex::new(r"(?m)^line \d+").unwrap();
assert_eq!(re.find("line one\nline 2\n").unwrap().range(), 9..15);

let re = Regex::new(r"(?m)^").unwrap();
let m = re.find_iter("test\n").last().unwrap();
assert_eq!((m.start(), m.end()), (5, 5));
```

With Unicode mode disabled, classes match bytes and `\xFF` is a raw byte:

```
use ib_regex::Regex;

let re = Regex::new(r"(?-u:\b).+(?-u:\b)").unwrap();
assert_eq!(re.find("$$abc$$").unwrap().range(), 2..5);

let re = Regex::new(r"(?-u)\xFF+").unwrap();
assert_eq!(re.find(b"a\xFF\xFFb").unwrap().range(), 1..3);
```

### Escape sequences

<pre class="rust">
\*              literal *, applies to all ASCII except [0-9A-Za-z<>]
\a              bell (\x07)
\f              form feed (\x0C)
\t              horizontal tab
\n              new line
\r              carriage return
\v              vertical tab (\x0B)
\x7F            hex character code (exactly two digits)
\x{10FFFF}      any hex character code corresponding to a Unicode code point
\u007F          hex character code (exactly four digits)
\u{7F}          any hex character code corresponding to a Unicode code point
\U0000007F      hex character code (exactly eight digits)
\U{7F}          any hex character code corresponding to a Unicode code point
</pre>

### ASCII character classes

<pre class="rust">
[[:alnum:]]    alphanumeric ([0-9A-Za-z])
[[:alpha:]]    alphabetic ([A-Za-z])
[[:ascii:]]    ASCII ([\x00-\x7F])
[[:blank:]]    blank ([\t ])
[[:cntrl:]]    control ([\x00-\x1F\x7F])
[[:digit:]]    digits ([0-9])
[[:graph:]]    graphical ([!-~])
[[:lower:]]    lower case ([a-z])
[[:print:]]    printable ([ -~])
[[:punct:]]    punctuation ([!-/:-@\[-`{-~])
[[:space:]]    whitespace ([\t\n\v\f\r ])
[[:upper:]]    upper case ([A-Z])
[[:word:]]     word characters ([0-9A-Za-z_])
[[:xdigit:]]   hex digit ([0-9A-Fa-f])
</pre>
*/
pub mod ast;
pub mod class;
mod parse;
pub mod unicode;

pub use ast::{Ast, Look};

use crate::error::{Error, ErrorKind};
use parse::{Flags, Parser};

/// The default flags of a pattern, and parser limits.
///
/// Each flag can still be toggled inline, e.g. `(?-i)`.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) unicode: bool,
    pub(crate) case_insensitive: bool,
    pub(crate) multi_line: bool,
    pub(crate) dot_matches_new_line: bool,
    pub(crate) swap_greed: bool,
    pub(crate) ignore_whitespace: bool,
    pub(crate) nest_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unicode: true,
            case_insensitive: false,
            multi_line: false,
            dot_matches_new_line: false,
            swap_greed: false,
            ignore_whitespace: false,
            nest_limit: 250,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `u` flag. Enabled by default.
    pub fn unicode(mut self, yes: bool) -> Self {
        self.unicode = yes;
        self
    }

    /// The `i` flag.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// The `m` flag.
    pub fn multi_line(mut self, yes: bool) -> Self {
        self.multi_line = yes;
        self
    }

    /// The `s` flag.
    pub fn dot_matches_new_line(mut self, yes: bool) -> Self {
        self.dot_matches_new_line = yes;
        self
    }

    /// The `U` flag.
    pub fn swap_greed(mut self, yes: bool) -> Self {
        self.swap_greed = yes;
        self
    }

    /// The `x` flag.
    pub fn ignore_whitespace(mut self, yes: bool) -> Self {
        self.ignore_whitespace = yes;
        self
    }

    /// Maximum nesting depth of groups, classes and stacked repetitions. 250 by default.
    ///
    /// This bounds the recursion depth of the parser and the compiler.
    pub fn nest_limit(mut self, limit: u32) -> Self {
        self.nest_limit = limit;
        self
    }
}

/// Parses a pattern with the default [`Config`].
///
/// ```
/// use ib_regex::syntax::{self, Ast, ast::Literal};
///
/// assert_eq!(syntax::parse("a").unwrap(), Ast::Literal(Literal::Char('a')));
/// assert!(syntax::parse("a{3,1}").is_err());
/// ```
pub fn parse(pattern: &str) -> Result<Ast, Error> {
    parse_with(pattern, &Config::default())
}

pub fn parse_with(pattern: &str, config: &Config) -> Result<Ast, Error> {
    Parser::new(pattern, config)
        .parse(Flags::from_config(config))
        .map_err(|err| {
            tracing::debug!(pattern, %err, "regex parse failed");
            err
        })
}

/// Like [`parse_with`], but for patterns that may not be valid UTF-8.
pub fn parse_bytes_with(pattern: &[u8], config: &Config) -> Result<Ast, Error> {
    let pattern = core::str::from_utf8(pattern)
        .map_err(|e| Error::new(ErrorKind::InvalidUtf8, e.valid_up_to()))?;
    parse_with(pattern, config)
}
