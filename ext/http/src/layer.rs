//! Tower integration: apply a layer to every request except matching ones.
//!
//! ```text
//! ExceptLayer<L>::layer(S)
//!         ↓
//! ExceptService { inner: S, protected: L::Service }
//!         ↓ call(req)
//! rules.evaluate(&parts) ── excepted ──→ S
//!                        └─ otherwise ─→ L::Service (wrapping S)
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use except::RuleSet;
use http::request::Parts;
use http::Request;
use tower::{BoxError, Layer, Service, ServiceExt};

/// Tower layer that skips a protected layer for excepted requests.
///
/// Rules are evaluated against the request head ([`Parts`]), so predicates
/// see the method, URI, headers and extensions but never the body.
///
/// # Example
///
/// ```ignore
/// let rules = RuleSet::new(vec![Rule::path("/health"), Rule::path("/metrics")])?;
/// let app = Router::new()
///     .route("/users", get(list_users))
///     .layer(ExceptLayer::new(rules, AuthLayer::new(provider)));
/// ```
pub struct ExceptLayer<L> {
    rules: Arc<RuleSet<Parts>>,
    protected: L,
}

impl<L> ExceptLayer<L> {
    /// Wrap `protected` so it only applies to requests the rules do not
    /// except.
    pub fn new(rules: RuleSet<Parts>, protected: L) -> Self {
        Self::from_shared(Arc::new(rules), protected)
    }

    /// Like [`new`](Self::new), with a rule set shared elsewhere.
    pub fn from_shared(rules: Arc<RuleSet<Parts>>, protected: L) -> Self {
        Self { rules, protected }
    }
}

impl<L: Clone> Clone for ExceptLayer<L> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            protected: self.protected.clone(),
        }
    }
}

impl<L> fmt::Debug for ExceptLayer<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptLayer")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<S, L> Layer<S> for ExceptLayer<L>
where
    S: Clone,
    L: Layer<S>,
{
    type Service = ExceptService<S, L::Service>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptService {
            rules: Arc::clone(&self.rules),
            protected: self.protected.layer(inner.clone()),
            inner,
        }
    }
}

/// Tower service that routes each request to the protected service or
/// straight to the inner one.
pub struct ExceptService<S, P> {
    rules: Arc<RuleSet<Parts>>,
    inner: S,
    protected: P,
}

impl<S: Clone, P: Clone> Clone for ExceptService<S, P> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            inner: self.inner.clone(),
            protected: self.protected.clone(),
        }
    }
}

impl<S, P> fmt::Debug for ExceptService<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptService")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<S, P, B> Service<Request<B>> for ExceptService<S, P>
where
    S: Service<Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    P: Service<Request<B>, Response = S::Response> + Clone + Send + 'static,
    P::Future: Send + 'static,
    P::Error: Into<BoxError>,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The branch is unknown until the request is evaluated; readiness
        // is awaited on the chosen clone in `call`.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let rules = Arc::clone(&self.rules);
        let inner = self.inner.clone();
        let protected = self.protected.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let excepted = rules.evaluate(&parts, &()).await.map_err(BoxError::from)?;
            let req = Request::from_parts(parts, body);

            tracing::trace!(excepted, "routing request");
            if excepted {
                inner.oneshot(req).await.map_err(Into::<BoxError>::into)
            } else {
                protected.oneshot(req).await.map_err(Into::<BoxError>::into)
            }
        })
    }
}
