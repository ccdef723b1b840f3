//! `Except` — run a protected step for every request except matching ones

use crate::{ExceptError, RequestView, RuleSet, Rules};
use std::fmt;
use std::sync::Arc;

/// A protected step guarded by exception rules.
///
/// On each request the rule set is evaluated. If the request is excepted,
/// the pipeline's `proceed` continuation runs and the protected step does
/// not; otherwise the protected step runs and receives `proceed` to call
/// (or not) as it sees fit.
///
/// # Example
///
/// ```
/// use except::prelude::*;
///
/// struct Request { path: String }
///
/// impl RequestView for Request {
///     fn method(&self) -> &str { "GET" }
///     fn path(&self) -> &str { &self.path }
/// }
///
/// let auth = except("/health", |_req: &Request, _res: &(), _next: fn() -> &'static str| {
///     "401 unauthorized"
/// })
/// .unwrap();
///
/// let next: fn() -> &'static str = || "200 ok";
/// let run = |path: &str| {
///     let req = Request { path: path.into() };
///     futures::executor::block_on(auth.handle(&req, &(), next)).unwrap()
/// };
///
/// assert_eq!(run("/health"), "200 ok");
/// assert_eq!(run("/users"), "401 unauthorized");
/// ```
pub struct Except<Req, Res, H> {
    rules: Arc<RuleSet<Req, Res>>,
    protected: H,
}

impl<Req, Res, H> Except<Req, Res, H> {
    /// Guard `protected` with a compiled rule set.
    pub fn new(rules: RuleSet<Req, Res>, protected: H) -> Self {
        Self::from_shared(Arc::new(rules), protected)
    }

    /// Guard `protected` with a rule set shared with other guards.
    pub fn from_shared(rules: Arc<RuleSet<Req, Res>>, protected: H) -> Self {
        Self { rules, protected }
    }

    /// The rule set this guard evaluates.
    #[must_use]
    pub fn rules(&self) -> &RuleSet<Req, Res> {
        &self.rules
    }

    /// The wrapped protected step.
    pub fn protected(&self) -> &H {
        &self.protected
    }
}

impl<Req: RequestView, Res, H> Except<Req, Res, H> {
    /// Evaluate the rules, then run exactly one branch.
    ///
    /// Returns `proceed()` when the request is excepted, and
    /// `protected(req, res, proceed)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ExceptError::Predicate`] if a predicate rule fails. Neither
    /// branch runs in that case.
    pub async fn handle<N, O>(&self, req: &Req, res: &Res, proceed: N) -> Result<O, ExceptError>
    where
        H: Fn(&Req, &Res, N) -> O,
        N: FnOnce() -> O,
    {
        if self.rules.evaluate(req, res).await? {
            Ok(proceed())
        } else {
            Ok((self.protected)(req, res, proceed))
        }
    }
}

impl<Req, Res, H: Clone> Clone for Except<Req, Res, H> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            protected: self.protected.clone(),
        }
    }
}

impl<Req, Res, H> fmt::Debug for Except<Req, Res, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Except")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// Compile `rules` and guard `protected` with them.
///
/// # Errors
///
/// Returns [`ExceptError::InvalidPattern`] if a path pattern does not compile.
pub fn except<Req, Res, H>(
    rules: impl Into<Rules<Req, Res>>,
    protected: H,
) -> Result<Except<Req, Res, H>, ExceptError> {
    Ok(Except::new(RuleSet::new(rules)?, protected))
}
