//! `PathPattern` — compiled path-pattern matcher
//!
//! Patterns follow the path-to-regexp conventions used by Express-style
//! routers:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `/users` | literal text |
//! | `/:id` | named parameter, one segment |
//! | `/:id(\d+)` | named parameter with a custom pattern |
//! | `/(\d+)` | positional parameter, named `0`, `1`, ... |
//! | `/:id?` `/:path*` `/:path+` | optional, zero-or-more, one-or-more |
//! | `/files{/:name}?` | group with prefix/suffix and a modifier |
//! | `/admin/*` | wildcard over the remainder (may be empty) |
//! | `\:` | escaped literal |
//!
//! Compilation goes through the `regex` crate, so matching is linear-time.

use crate::pattern_parser::{self, Token};
use crate::{PatternError, MAX_PATTERN_LENGTH};
use regex::Regex;
use std::fmt::{self, Write as _};

/// Characters that delimit path segments.
const DELIMITER_CLASS: &str = "[/#?]";

/// Options controlling how a pattern matches.
///
/// The defaults mirror path-to-regexp: case-insensitive, trailing delimiter
/// optional, anchored at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PatternOptions {
    /// Match case-sensitively. Default `false`.
    pub sensitive: bool,
    /// Disallow an optional trailing delimiter. Default `false`.
    pub strict: bool,
    /// Require the pattern to match the whole path. When `false` the pattern
    /// matches a prefix ending on a segment boundary. Default `true`.
    pub end: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            end: true,
        }
    }
}

impl PatternOptions {
    /// Set case sensitivity.
    #[must_use]
    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    /// Set strict trailing-delimiter handling.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set whether the pattern must match to the end of the path.
    #[must_use]
    pub fn end(mut self, end: bool) -> Self {
        self.end = end;
        self
    }
}

/// Repetition modifier on a parameter or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// `?`: zero or one.
    Optional,
    /// `*`: zero or more.
    ZeroOrMore,
    /// `+`: one or more.
    OneOrMore,
}

impl Modifier {
    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Self::Optional),
            '*' => Some(Self::ZeroOrMore),
            '+' => Some(Self::OneOrMore),
            _ => None,
        }
    }

    /// The modifier as written in a pattern.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optional => "?",
            Self::ZeroOrMore => "*",
            Self::OneOrMore => "+",
        }
    }

    fn is_repeat(self) -> bool {
        matches!(self, Self::ZeroOrMore | Self::OneOrMore)
    }
}

/// A parameter declared by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    name: String,
    prefix: String,
    suffix: String,
    pattern: String,
    modifier: Option<Modifier>,
}

impl Key {
    pub(crate) fn new(
        name: String,
        prefix: String,
        suffix: String,
        pattern: String,
        modifier: Option<Modifier>,
    ) -> Self {
        Self {
            name,
            prefix,
            suffix,
            pattern,
            modifier,
        }
    }

    /// Parameter name; positional parameters are named `0`, `1`, ...
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Literal text required before the value (`/` or `.` or a group prefix).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Literal text required after the value (group suffix).
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Regex fragment the value must match.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Repetition modifier, if any.
    #[must_use]
    pub fn modifier(&self) -> Option<Modifier> {
        self.modifier
    }

    /// Returns `true` if the parameter may be absent.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(
            self.modifier,
            Some(Modifier::Optional | Modifier::ZeroOrMore)
        )
    }
}

/// Parameters captured by a successful match, in declaration order.
///
/// Values are the raw matched text; repeated parameters (`*`, `+`) keep their
/// delimiters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    /// Get a parameter by name (positional parameters by index: `"0"`).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A compiled path pattern.
///
/// Immutable after construction and `Send + Sync`; compile once and share.
///
/// # Example
///
/// ```
/// use except::PathPattern;
///
/// let pattern = PathPattern::new("/users/:id").unwrap();
/// assert!(pattern.is_match("/users/42"));
/// assert!(pattern.is_match("/USERS/42/"));
/// assert!(!pattern.is_match("/users/42/posts"));
///
/// let params = pattern.params("/users/42").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// ```
#[derive(Clone)]
pub struct PathPattern {
    source: String,
    options: PatternOptions,
    keys: Vec<Key>,
    regex: Regex,
}

impl PathPattern {
    /// Compile a pattern with default [`PatternOptions`].
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] describing the first syntax problem.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Self::with_options(pattern, PatternOptions::default())
    }

    /// Compile a pattern with explicit options.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] if the pattern is too long, malformed, or a
    /// custom parameter pattern is not a valid regex.
    pub fn with_options(pattern: &str, options: PatternOptions) -> Result<Self, PatternError> {
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(PatternError::TooLong {
                len: pattern.len(),
                max: MAX_PATTERN_LENGTH,
            });
        }

        let tokens = pattern_parser::parse(pattern)?;
        let source = regex_source(&tokens, options);
        let regex = Regex::new(&source).map_err(|e| PatternError::Regex {
            message: e.to_string(),
        })?;
        let keys = tokens
            .into_iter()
            .filter_map(|t| match t {
                Token::Param(key) => Some(key),
                _ => None,
            })
            .collect();

        Ok(Self {
            source: pattern.to_owned(),
            options,
            keys,
            regex,
        })
    }

    /// Returns `true` if `path` matches this pattern.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and extract its parameters.
    ///
    /// Returns `None` if the path does not match. Optional parameters that did
    /// not participate in the match are omitted.
    #[must_use]
    pub fn params(&self, path: &str) -> Option<PathParams> {
        let captures = self.regex.captures(path)?;
        let entries = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                captures
                    .name(&group_name(i))
                    .map(|m| (key.name.clone(), m.as_str().to_owned()))
            })
            .collect();
        Some(PathParams { entries })
    }

    /// The parameters this pattern declares.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The options this pattern was compiled with.
    #[must_use]
    pub fn options(&self) -> PatternOptions {
        self.options
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("source", &self.source)
            .field("options", &self.options)
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn group_name(index: usize) -> String {
    format!("p{index}")
}

/// Build the regex source for a token list.
///
/// Parameters become named groups `p0`, `p1`, ... so capturing groups inside
/// custom patterns (e.g. `(?P<x>..)`) cannot shift parameter positions.
fn regex_source(tokens: &[Token], options: PatternOptions) -> String {
    let mut route = String::new();
    if !options.sensitive {
        route.push_str("(?i)");
    }
    route.push('^');

    let mut group = 0;
    for token in tokens {
        match token {
            Token::Literal(text) => route.push_str(&regex::escape(text)),
            Token::Group { text, modifier } => {
                let _ = write!(
                    route,
                    "(?:{}){}",
                    regex::escape(text),
                    modifier.map_or("", Modifier::as_str)
                );
            }
            Token::Param(key) => {
                push_param(&mut route, key, &group_name(group));
                group += 1;
            }
        }
    }

    if options.end {
        if !options.strict {
            route.push_str(DELIMITER_CLASS);
            route.push('?');
        }
        route.push('$');
    } else {
        // Prefix match: the remainder must start at a delimiter unless the
        // pattern itself already ends on one.
        let end_delimited = match tokens.last() {
            None => true,
            Some(Token::Literal(text)) => text.ends_with(['/', '#', '?']),
            Some(_) => false,
        };
        if end_delimited {
            route.push_str("(?s:.*)$");
        } else {
            let _ = write!(route, "(?s:(?:{DELIMITER_CLASS}.*)?)$");
        }
    }

    route
}

fn push_param(route: &mut String, key: &Key, name: &str) {
    let prefix = regex::escape(&key.prefix);
    let suffix = regex::escape(&key.suffix);
    let pattern = &key.pattern;

    let _ = if prefix.is_empty() && suffix.is_empty() {
        match key.modifier {
            Some(m) if m.is_repeat() => {
                write!(route, "(?P<{name}>(?:{pattern}){})", m.as_str())
            }
            m => write!(
                route,
                "(?P<{name}>{pattern}){}",
                m.map_or("", Modifier::as_str)
            ),
        }
    } else {
        match key.modifier {
            Some(m) if m.is_repeat() => {
                let outer = if m == Modifier::ZeroOrMore { "?" } else { "" };
                write!(
                    route,
                    "(?:{prefix}(?P<{name}>(?:{pattern})(?:{suffix}{prefix}(?:{pattern}))*){suffix}){outer}"
                )
            }
            m => write!(
                route,
                "(?:{prefix}(?P<{name}>{pattern}){suffix}){}",
                m.map_or("", Modifier::as_str)
            ),
        }
    };
}
