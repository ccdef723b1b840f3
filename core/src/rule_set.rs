//! `RuleSet` — compiled, immutable exception rules
//!
//! Built once at setup, shared across requests. Every path pattern is
//! compiled at construction, so a malformed pattern surfaces here, with the
//! offending rule's index, and never mid-request.

use crate::evaluator::CompiledRule;
use crate::{ExceptError, PathPattern, PatternOptions, RuleKind, Rules};
use std::fmt;

/// An ordered, compiled set of exception rules.
///
/// `RuleSet` is `Send + Sync` whenever the request and response types are,
/// and holds no interior mutability: wrap it in an `Arc` and share it
/// between concurrent evaluations without locking.
///
/// See [`evaluate`](Self::evaluate) for matching semantics.
pub struct RuleSet<Req, Res = ()> {
    pub(crate) rules: Vec<CompiledRule<Req, Res>>,
    options: PatternOptions,
}

impl<Req, Res> RuleSet<Req, Res> {
    /// Compile rules with default [`PatternOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`ExceptError::InvalidPattern`] for the first rule whose path
    /// pattern does not compile.
    pub fn new(rules: impl Into<Rules<Req, Res>>) -> Result<Self, ExceptError> {
        Self::with_options(rules, PatternOptions::default())
    }

    /// Compile rules with explicit [`PatternOptions`], applied to every path
    /// pattern in the set.
    ///
    /// # Errors
    ///
    /// Returns [`ExceptError::InvalidPattern`] for the first rule whose path
    /// pattern does not compile.
    pub fn with_options(
        rules: impl Into<Rules<Req, Res>>,
        options: PatternOptions,
    ) -> Result<Self, ExceptError> {
        let rules = rules
            .into()
            .into_vec()
            .into_iter()
            .enumerate()
            .map(|(index, rule)| CompiledRule::compile(index, rule, options))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(rules = rules.len(), ?options, "compiled exception rule set");
        Ok(Self { rules, options })
    }

    /// A rule set that never excepts.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            options: PatternOptions::default(),
        }
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules (nothing is ever excepted).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The options path patterns were compiled with.
    #[must_use]
    pub fn options(&self) -> PatternOptions {
        self.options
    }

    /// Rule kinds, in evaluation order.
    pub fn kinds(&self) -> impl Iterator<Item = RuleKind> + '_ {
        self.rules.iter().map(CompiledRule::kind)
    }

    /// Compiled path patterns, in evaluation order (predicate rules skipped).
    pub fn patterns(&self) -> impl Iterator<Item = &PathPattern> + '_ {
        self.rules.iter().filter_map(CompiledRule::pattern)
    }
}

impl<Req, Res> Default for RuleSet<Req, Res> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<Req, Res> fmt::Debug for RuleSet<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules)
            .field("options", &self.options)
            .finish()
    }
}
