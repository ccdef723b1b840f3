//! `RequestPredicate` — caller-supplied decision functions
//!
//! Predicate results are always a future. Synchronous closures are wrapped
//! in a ready future, so the evaluator awaits uniformly and never branches on
//! the shape of the result.

use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;

/// Boxed error returned by failing predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The future a predicate resolves to.
pub type PredicateFuture<'a> = BoxFuture<'a, Result<bool, BoxError>>;

/// A rule that decides from the full request and response context.
///
/// `Ok(true)` excepts the request. An `Err` fails the whole evaluation; it is
/// never treated as `false`.
///
/// Most callers use [`Rule::predicate`](crate::Rule::predicate),
/// [`Rule::try_predicate`](crate::Rule::try_predicate) or
/// [`Rule::async_predicate`](crate::Rule::async_predicate). Implement this
/// trait directly for predicates that carry configuration.
///
/// # Example
///
/// ```
/// use except::{PredicateFuture, RequestPredicate};
/// use futures::FutureExt;
///
/// struct Internal;
///
/// impl RequestPredicate<String, ()> for Internal {
///     fn test<'a>(&'a self, req: &'a String, _res: &'a ()) -> PredicateFuture<'a> {
///         let internal = req.starts_with("10.");
///         async move { Ok(internal) }.boxed()
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `RequestPredicate<{Req}, {Res}>`",
    label = "this type cannot decide whether a request is excepted",
    note = "wrap a closure with `Rule::predicate`, `Rule::try_predicate` or `Rule::async_predicate`"
)]
pub trait RequestPredicate<Req, Res>: Send + Sync {
    /// Decide whether the request is excepted.
    fn test<'a>(&'a self, req: &'a Req, res: &'a Res) -> PredicateFuture<'a>;

    /// Short description used in evaluation traces.
    fn describe(&self) -> String {
        "predicate".to_owned()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Closure adapters
// ═══════════════════════════════════════════════════════════════════════════════

/// Infallible synchronous closure.
pub(crate) struct FnPredicate<F>(pub(crate) F);

impl<Req, Res, F> RequestPredicate<Req, Res> for FnPredicate<F>
where
    F: Fn(&Req, &Res) -> bool + Send + Sync,
{
    fn test<'a>(&'a self, req: &'a Req, res: &'a Res) -> PredicateFuture<'a> {
        future::ready(Ok((self.0)(req, res))).boxed()
    }
}

/// Fallible synchronous closure.
pub(crate) struct TryFnPredicate<F>(pub(crate) F);

impl<Req, Res, F, E> RequestPredicate<Req, Res> for TryFnPredicate<F>
where
    F: Fn(&Req, &Res) -> Result<bool, E> + Send + Sync,
    E: Into<BoxError>,
{
    fn test<'a>(&'a self, req: &'a Req, res: &'a Res) -> PredicateFuture<'a> {
        future::ready((self.0)(req, res).map_err(Into::into)).boxed()
    }
}

/// Closure returning a boxed future.
pub(crate) struct AsyncFnPredicate<F>(pub(crate) F);

impl<Req, Res, F> RequestPredicate<Req, Res> for AsyncFnPredicate<F>
where
    F: for<'a> Fn(&'a Req, &'a Res) -> PredicateFuture<'a> + Send + Sync,
{
    fn test<'a>(&'a self, req: &'a Req, res: &'a Res) -> PredicateFuture<'a> {
        (self.0)(req, res)
    }

    fn describe(&self) -> String {
        "async predicate".to_owned()
    }
}

impl<F> fmt::Debug for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnPredicate")
    }
}

impl<F> fmt::Debug for TryFnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TryFnPredicate")
    }
}

impl<F> fmt::Debug for AsyncFnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsyncFnPredicate")
    }
}
