//! except-test: Test predicates for conformance testing
//!
//! Provides predicates with fixed outcomes so fixtures can exercise
//! short-circuiting and error propagation without a real backend.
//! This is the reference extension that demonstrates how to build
//! predicate extensions.
//!
//! # Example
//!
//! ```
//! use except_test::prelude::*;
//! use futures::executor::block_on;
//!
//! let rules: RuleSet<HttpRequest> = RuleSet::new(vec![
//!     Rule::path("/health"),
//!     Rule::custom(Fail::new("must not be reached")),
//! ])
//! .unwrap();
//!
//! let req = HttpRequest::builder().path("/health").build();
//! assert!(block_on(rules.evaluate(&req, &())).unwrap());
//! ```

use except::{BoxError, PredicateFuture, RequestPredicate};
use futures::future::{self, FutureExt};
use std::fmt;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Predicate with a fixed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Always(pub bool);

impl<Req, Res> RequestPredicate<Req, Res> for Always {
    fn test<'a>(&'a self, _req: &'a Req, _res: &'a Res) -> PredicateFuture<'a> {
        future::ready(Ok(self.0)).boxed()
    }

    fn describe(&self) -> String {
        format!("always {}", self.0)
    }
}

/// Predicate that always fails with [`FailError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fail {
    message: String,
}

impl Fail {
    /// Create a failing predicate with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<Req, Res> RequestPredicate<Req, Res> for Fail {
    fn test<'a>(&'a self, _req: &'a Req, _res: &'a Res) -> PredicateFuture<'a> {
        let err: BoxError = Box::new(FailError(self.message.clone()));
        future::ready(Err(err)).boxed()
    }

    fn describe(&self) -> String {
        "fail".to_owned()
    }
}

/// The error raised by [`Fail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailError(pub String);

impl fmt::Display for FailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FailError {}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry (feature-gated)
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "registry")]
mod registry {
    use super::{Always, Fail};
    use except::{ExceptError, IntoPredicate, PredicateRegistry, PredicateRegistryBuilder, RequestPredicate};
    use except_http::HttpRequest;
    use serde::Deserialize;
    use std::sync::Arc;

    /// Config for [`Always`].
    #[derive(Debug, Clone, Deserialize)]
    pub struct AlwaysConfig {
        /// The fixed result.
        pub result: bool,
    }

    /// Config for [`Fail`].
    #[derive(Debug, Clone, Deserialize)]
    pub struct FailConfig {
        /// Error message.
        #[serde(default = "default_message")]
        pub message: String,
    }

    fn default_message() -> String {
        "predicate failed".to_owned()
    }

    impl<Req: 'static, Res: 'static> IntoPredicate<Req, Res> for Always {
        type Config = AlwaysConfig;

        fn from_config(
            config: Self::Config,
        ) -> Result<Arc<dyn RequestPredicate<Req, Res>>, ExceptError> {
            Ok(Arc::new(Always(config.result)))
        }
    }

    impl<Req: 'static, Res: 'static> IntoPredicate<Req, Res> for Fail {
        type Config = FailConfig;

        fn from_config(
            config: Self::Config,
        ) -> Result<Arc<dyn RequestPredicate<Req, Res>>, ExceptError> {
            Ok(Arc::new(Fail::new(config.message)))
        }
    }

    /// Register test predicates.
    #[must_use]
    pub fn register<Req: 'static, Res: 'static>(
        builder: PredicateRegistryBuilder<Req, Res>,
    ) -> PredicateRegistryBuilder<Req, Res> {
        builder
            .predicate::<Always>("except.test.v1.Always")
            .predicate::<Fail>("except.test.v1.Fail")
    }

    /// Registry with the built-in HTTP predicates and the test predicates,
    /// over [`HttpRequest`].
    #[must_use]
    pub fn registry() -> PredicateRegistry<HttpRequest> {
        register(except_http::register(PredicateRegistryBuilder::new())).build()
    }
}

#[cfg(feature = "registry")]
pub use registry::{register, registry, AlwaysConfig, FailConfig};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{Always, Fail, FailError};
    pub use except::prelude::*;
    pub use except_http::HttpRequest;
}

#[cfg(test)]
mod tests {
    use super::*;
    use except::{ExceptError, Rule, RuleSet};
    use except_http::HttpRequest;
    use futures::executor::block_on;

    #[test]
    fn always_is_fixed() {
        let req = HttpRequest::builder().build();
        let yes: RuleSet<HttpRequest> = RuleSet::new(Rule::custom(Always(true))).unwrap();
        let no: RuleSet<HttpRequest> = RuleSet::new(Rule::custom(Always(false))).unwrap();
        assert!(block_on(yes.evaluate(&req, &())).unwrap());
        assert!(!block_on(no.evaluate(&req, &())).unwrap());
    }

    #[test]
    fn fail_error_is_recoverable_by_downcast() {
        let rules: RuleSet<HttpRequest> = RuleSet::new(vec![
            Rule::custom(Always(false)),
            Rule::custom(Fail::new("backend down")),
        ])
        .unwrap();

        let err = block_on(rules.evaluate(&HttpRequest::builder().build(), &())).unwrap_err();
        assert!(matches!(err, ExceptError::Predicate { index: 1, .. }));
        let source = err.predicate_source().unwrap();
        assert_eq!(
            source.downcast_ref::<FailError>(),
            Some(&FailError("backend down".into()))
        );
    }

    #[cfg(feature = "registry")]
    #[test]
    fn registry_contains_http_and_test_predicates() {
        let registry = registry();
        assert_eq!(
            registry.type_urls(),
            vec![
                "except.http.v1.HeaderEquals",
                "except.http.v1.HeaderPresent",
                "except.http.v1.QueryParamEquals",
                "except.test.v1.Always",
                "except.test.v1.Fail",
            ]
        );
    }
}
