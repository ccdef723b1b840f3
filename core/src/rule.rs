//! `Rule` — one unit of exception criteria, as the caller wrote it
//!
//! A rule is a path pattern, a method + path pair, or a predicate. The shape
//! is fixed when the rule is constructed; [`RuleSet`](crate::RuleSet)
//! compiles rules once and never re-inspects them.

use crate::predicate::{AsyncFnPredicate, FnPredicate, TryFnPredicate};
use crate::{BoxError, PredicateFuture, RequestPredicate};
use std::fmt;
use std::sync::Arc;

/// A single exception rule.
///
/// # Example
///
/// ```
/// use except::Rule;
///
/// struct Request { internal: bool }
///
/// let rules: Vec<Rule<Request>> = vec![
///     "/health".into(),                 // path
///     ("GET", "/users/:id").into(),     // method + path
///     Rule::predicate(|req: &Request, _: &()| req.internal),
/// ];
/// assert_eq!(rules.len(), 3);
/// ```
pub enum Rule<Req, Res = ()> {
    /// Excepts requests whose path matches the pattern.
    Path(String),

    /// Excepts requests whose method equals `method` (case-insensitive) and
    /// whose path matches `path`.
    MethodPath {
        /// HTTP method.
        method: String,
        /// Path pattern.
        path: String,
    },

    /// Excepts requests for which the predicate resolves to `true`.
    Predicate(Arc<dyn RequestPredicate<Req, Res>>),
}

impl<Req, Res> Rule<Req, Res> {
    /// A path rule.
    pub fn path(pattern: impl Into<String>) -> Self {
        Self::Path(pattern.into())
    }

    /// A method + path rule.
    pub fn method_path(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MethodPath {
            method: method.into(),
            path: path.into(),
        }
    }

    /// A predicate rule from an infallible synchronous closure.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Req, &Res) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(FnPredicate(f)))
    }

    /// A predicate rule from a fallible synchronous closure.
    ///
    /// An `Err` fails the evaluation.
    pub fn try_predicate<F, E>(f: F) -> Self
    where
        F: Fn(&Req, &Res) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::Predicate(Arc::new(TryFnPredicate(f)))
    }

    /// A predicate rule from a closure returning a boxed future.
    ///
    /// ```
    /// use except::Rule;
    /// use futures::FutureExt;
    ///
    /// let rule: Rule<String> = Rule::async_predicate(|req: &String, _: &()| {
    ///     async move { Ok(req.starts_with("/internal")) }.boxed()
    /// });
    /// ```
    pub fn async_predicate<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a Req, &'a Res) -> PredicateFuture<'a> + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(AsyncFnPredicate(f)))
    }

    /// A predicate rule from a [`RequestPredicate`] implementation.
    pub fn custom<P>(predicate: P) -> Self
    where
        P: RequestPredicate<Req, Res> + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Which variant this rule is.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Path(_) => RuleKind::Path,
            Self::MethodPath { .. } => RuleKind::MethodPath,
            Self::Predicate(_) => RuleKind::Predicate,
        }
    }
}

impl<Req, Res> Clone for Rule<Req, Res> {
    fn clone(&self) -> Self {
        match self {
            Self::Path(p) => Self::Path(p.clone()),
            Self::MethodPath { method, path } => Self::MethodPath {
                method: method.clone(),
                path: path.clone(),
            },
            Self::Predicate(p) => Self::Predicate(Arc::clone(p)),
        }
    }
}

impl<Req, Res> fmt::Debug for Rule<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::MethodPath { method, path } => f
                .debug_struct("MethodPath")
                .field("method", method)
                .field("path", path)
                .finish(),
            Self::Predicate(p) => f.debug_tuple("Predicate").field(&p.describe()).finish(),
        }
    }
}

impl<Req, Res> From<&str> for Rule<Req, Res> {
    fn from(pattern: &str) -> Self {
        Self::path(pattern)
    }
}

impl<Req, Res> From<String> for Rule<Req, Res> {
    fn from(pattern: String) -> Self {
        Self::Path(pattern)
    }
}

/// `(method, path)`.
impl<Req, Res> From<(&str, &str)> for Rule<Req, Res> {
    fn from((method, path): (&str, &str)) -> Self {
        Self::method_path(method, path)
    }
}

/// Discriminant of a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// [`Rule::Path`].
    Path,
    /// [`Rule::MethodPath`].
    MethodPath,
    /// [`Rule::Predicate`].
    Predicate,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Path => "path",
            Self::MethodPath => "method_path",
            Self::Predicate => "predicate",
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rules: caller input
// ═══════════════════════════════════════════════════════════════════════════════

/// Caller-supplied rules: a single bare path pattern or a list.
///
/// The bare form is a convenience and is exactly equivalent to a one-element
/// list holding a [`Rule::Path`].
pub enum Rules<Req, Res = ()> {
    /// One bare path pattern.
    Single(String),
    /// An ordered list; first match wins.
    List(Vec<Rule<Req, Res>>),
}

impl<Req, Res> Rules<Req, Res> {
    /// Normalize into an ordered list of rules.
    #[must_use]
    pub fn into_vec(self) -> Vec<Rule<Req, Res>> {
        match self {
            Self::Single(pattern) => vec![Rule::Path(pattern)],
            Self::List(rules) => rules,
        }
    }

    /// Number of rules after normalization.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::List(rules) => rules.len(),
        }
    }

    /// Returns `true` for an empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<Req, Res> fmt::Debug for Rules<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(p) => f.debug_tuple("Single").field(p).finish(),
            Self::List(rules) => f.debug_tuple("List").field(rules).finish(),
        }
    }
}

impl<Req, Res> From<&str> for Rules<Req, Res> {
    fn from(pattern: &str) -> Self {
        Self::Single(pattern.to_owned())
    }
}

impl<Req, Res> From<String> for Rules<Req, Res> {
    fn from(pattern: String) -> Self {
        Self::Single(pattern)
    }
}

impl<Req, Res> From<Rule<Req, Res>> for Rules<Req, Res> {
    fn from(rule: Rule<Req, Res>) -> Self {
        Self::List(vec![rule])
    }
}

impl<Req, Res> From<Vec<Rule<Req, Res>>> for Rules<Req, Res> {
    fn from(rules: Vec<Rule<Req, Res>>) -> Self {
        Self::List(rules)
    }
}

impl<Req, Res> From<Vec<&str>> for Rules<Req, Res> {
    fn from(patterns: Vec<&str>) -> Self {
        Self::List(patterns.into_iter().map(Rule::path).collect())
    }
}

impl<Req, Res> FromIterator<Rule<Req, Res>> for Rules<Req, Res> {
    fn from_iter<I: IntoIterator<Item = Rule<Req, Res>>>(iter: I) -> Self {
        Self::List(iter.into_iter().collect())
    }
}
