//! Rule evaluation: first-match-wins over a compiled [`RuleSet`].

use crate::{
    BoxError, EvalTrace, ExceptError, PathPattern, PatternOptions, RequestPredicate, RequestView,
    Rule, RuleKind, RuleSet, RuleTrace,
};
use std::fmt;
use std::sync::Arc;

/// A rule after classification and pattern compilation.
pub(crate) enum CompiledRule<Req, Res> {
    Path(PathPattern),
    MethodPath {
        method: String,
        pattern: PathPattern,
    },
    Predicate(Arc<dyn RequestPredicate<Req, Res>>),
}

impl<Req, Res> CompiledRule<Req, Res> {
    pub(crate) fn compile(
        index: usize,
        rule: Rule<Req, Res>,
        options: PatternOptions,
    ) -> Result<Self, ExceptError> {
        let compile_pattern = |pattern: String| {
            PathPattern::with_options(&pattern, options).map_err(|source| {
                ExceptError::InvalidPattern {
                    index,
                    pattern,
                    source,
                }
            })
        };

        Ok(match rule {
            Rule::Path(pattern) => Self::Path(compile_pattern(pattern)?),
            Rule::MethodPath { method, path } => Self::MethodPath {
                method,
                pattern: compile_pattern(path)?,
            },
            Rule::Predicate(predicate) => Self::Predicate(predicate),
        })
    }

    pub(crate) fn kind(&self) -> RuleKind {
        match self {
            Self::Path(_) => RuleKind::Path,
            Self::MethodPath { .. } => RuleKind::MethodPath,
            Self::Predicate(_) => RuleKind::Predicate,
        }
    }

    pub(crate) fn pattern(&self) -> Option<&PathPattern> {
        match self {
            Self::Path(pattern) | Self::MethodPath { pattern, .. } => Some(pattern),
            Self::Predicate(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Path(pattern) => pattern.to_string(),
            Self::MethodPath { method, pattern } => format!("{method} {pattern}"),
            Self::Predicate(predicate) => predicate.describe(),
        }
    }

    /// Test one rule. Only predicate rules suspend.
    async fn matches(&self, req: &Req, res: &Res) -> Result<bool, BoxError>
    where
        Req: RequestView,
    {
        match self {
            Self::Path(pattern) => Ok(pattern.is_match(req.path())),
            // Path first: it is the cheaper rejection for most rule sets.
            Self::MethodPath { method, pattern } => {
                Ok(pattern.is_match(req.path()) && method.eq_ignore_ascii_case(req.method()))
            }
            Self::Predicate(predicate) => predicate.test(req, res).await,
        }
    }
}

impl<Req, Res> fmt::Debug for CompiledRule<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(pattern) => f.debug_tuple("Path").field(&pattern.as_str()).finish(),
            Self::MethodPath { method, pattern } => f
                .debug_struct("MethodPath")
                .field("method", method)
                .field("path", &pattern.as_str())
                .finish(),
            Self::Predicate(predicate) => f
                .debug_tuple("Predicate")
                .field(&predicate.describe())
                .finish(),
        }
    }
}

impl<Req: RequestView, Res> RuleSet<Req, Res> {
    /// Decide whether `req` is excepted.
    ///
    /// Returns `Ok(true)` if any rule matches (skip the protected step) and
    /// `Ok(false)` otherwise (run it).
    ///
    /// # First-match-wins semantics
    ///
    /// Rules are evaluated strictly in order, one at a time. Evaluation stops
    /// at the first matching rule; later rules, including predicates with side
    /// effects, never run. An empty rule set always yields `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ExceptError::Predicate`] if a predicate rule fails. The failure
    /// is never treated as "not excepted".
    pub async fn evaluate(&self, req: &Req, res: &Res) -> Result<bool, ExceptError> {
        self.run(req, res, |_, _, _| {}).await
    }

    /// Evaluate and record which rules ran.
    ///
    /// Same decision and same short-circuiting as [`evaluate`](Self::evaluate):
    /// rules after the first match are neither run nor traced.
    ///
    /// # Errors
    ///
    /// Returns [`ExceptError::Predicate`] if a predicate rule fails.
    pub async fn evaluate_with_trace(
        &self,
        req: &Req,
        res: &Res,
    ) -> Result<EvalTrace, ExceptError> {
        let mut steps = Vec::new();
        let excepted = self
            .run(req, res, |index, rule, matched| {
                steps.push(RuleTrace {
                    index,
                    kind: rule.kind(),
                    rule: rule.describe(),
                    matched,
                });
            })
            .await?;

        Ok(EvalTrace { excepted, steps })
    }

    /// The single evaluation loop. `observe` sees every rule that ran.
    async fn run<F>(&self, req: &Req, res: &Res, mut observe: F) -> Result<bool, ExceptError>
    where
        F: FnMut(usize, &CompiledRule<Req, Res>, bool),
    {
        for (index, rule) in self.rules.iter().enumerate() {
            let matched = rule
                .matches(req, res)
                .await
                .map_err(|source| predicate_failed(index, source))?;

            tracing::trace!(index, kind = %rule.kind(), matched, "evaluated exception rule");
            observe(index, rule, matched);

            if matched {
                tracing::debug!(
                    index,
                    method = req.method(),
                    path = req.path(),
                    "request excepted"
                );
                return Ok(true);
            }
        }

        tracing::debug!(
            method = req.method(),
            path = req.path(),
            "request not excepted"
        );
        Ok(false)
    }
}

fn predicate_failed(index: usize, source: BoxError) -> ExceptError {
    tracing::warn!(index, error = %source, "exception predicate failed");
    ExceptError::Predicate { index, source }
}
