//! Built-in HTTP predicates.
//!
//! Usable in code via [`Rule::custom`](except::Rule::custom) and, with the
//! `registry` feature, from config by type URL:
//!
//! | Type URL | Predicate |
//! |----------|-----------|
//! | `except.http.v1.HeaderEquals` | [`HeaderEquals`] |
//! | `except.http.v1.HeaderPresent` | [`HeaderPresent`] |
//! | `except.http.v1.QueryParamEquals` | [`QueryParamEquals`] |

use crate::HttpView;
use except::{PredicateFuture, RequestPredicate};
use futures::future::{self, FutureExt};

/// Excepts requests whose header `name` equals `value` exactly.
///
/// The header name is case-insensitive; the value is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEquals {
    name: String,
    value: String,
}

impl HeaderEquals {
    /// Create a header equality predicate.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            value: value.into(),
        }
    }
}

impl<Req: HttpView, Res> RequestPredicate<Req, Res> for HeaderEquals {
    fn test<'a>(&'a self, req: &'a Req, _res: &'a Res) -> PredicateFuture<'a> {
        let matched = req.header(&self.name) == Some(self.value.as_str());
        future::ready(Ok(matched)).boxed()
    }

    fn describe(&self) -> String {
        format!("header {} == {:?}", self.name, self.value)
    }
}

/// Excepts requests that carry header `name`, whatever its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPresent {
    name: String,
}

impl HeaderPresent {
    /// Create a header presence predicate.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
        }
    }
}

impl<Req: HttpView, Res> RequestPredicate<Req, Res> for HeaderPresent {
    fn test<'a>(&'a self, req: &'a Req, _res: &'a Res) -> PredicateFuture<'a> {
        future::ready(Ok(req.header(&self.name).is_some())).boxed()
    }

    fn describe(&self) -> String {
        format!("header {} present", self.name)
    }
}

/// Excepts requests whose query parameter `name` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParamEquals {
    name: String,
    value: String,
}

impl QueryParamEquals {
    /// Create a query parameter equality predicate.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl<Req: HttpView, Res> RequestPredicate<Req, Res> for QueryParamEquals {
    fn test<'a>(&'a self, req: &'a Req, _res: &'a Res) -> PredicateFuture<'a> {
        let matched = req.query_param(&self.name) == Some(self.value.as_str());
        future::ready(Ok(matched)).boxed()
    }

    fn describe(&self) -> String {
        format!("query {} == {:?}", self.name, self.value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry (feature-gated)
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "registry")]
mod registry {
    use super::{HeaderEquals, HeaderPresent, QueryParamEquals};
    use crate::HttpView;
    use except::{ExceptError, IntoPredicate, PredicateRegistryBuilder, RequestPredicate};
    use serde::Deserialize;
    use std::sync::Arc;

    /// Config for [`HeaderEquals`].
    #[derive(Debug, Clone, Deserialize)]
    pub struct HeaderEqualsConfig {
        /// Header name (case-insensitive).
        pub name: String,
        /// Expected value.
        pub value: String,
    }

    /// Config for [`HeaderPresent`].
    #[derive(Debug, Clone, Deserialize)]
    pub struct HeaderPresentConfig {
        /// Header name (case-insensitive).
        pub name: String,
    }

    /// Config for [`QueryParamEquals`].
    #[derive(Debug, Clone, Deserialize)]
    pub struct QueryParamEqualsConfig {
        /// Parameter name.
        pub name: String,
        /// Expected raw value.
        pub value: String,
    }

    fn require_name(name: &str, what: &str) -> Result<(), ExceptError> {
        if name.is_empty() {
            return Err(ExceptError::InvalidConfig {
                message: format!("{what} name must not be empty"),
            });
        }
        Ok(())
    }

    impl<Req, Res> IntoPredicate<Req, Res> for HeaderEquals
    where
        Req: HttpView + 'static,
        Res: 'static,
    {
        type Config = HeaderEqualsConfig;

        fn from_config(
            config: Self::Config,
        ) -> Result<Arc<dyn RequestPredicate<Req, Res>>, ExceptError> {
            require_name(&config.name, "header")?;
            Ok(Arc::new(HeaderEquals::new(config.name, config.value)))
        }
    }

    impl<Req, Res> IntoPredicate<Req, Res> for HeaderPresent
    where
        Req: HttpView + 'static,
        Res: 'static,
    {
        type Config = HeaderPresentConfig;

        fn from_config(
            config: Self::Config,
        ) -> Result<Arc<dyn RequestPredicate<Req, Res>>, ExceptError> {
            require_name(&config.name, "header")?;
            Ok(Arc::new(HeaderPresent::new(config.name)))
        }
    }

    impl<Req, Res> IntoPredicate<Req, Res> for QueryParamEquals
    where
        Req: HttpView + 'static,
        Res: 'static,
    {
        type Config = QueryParamEqualsConfig;

        fn from_config(
            config: Self::Config,
        ) -> Result<Arc<dyn RequestPredicate<Req, Res>>, ExceptError> {
            require_name(&config.name, "query parameter")?;
            Ok(Arc::new(QueryParamEquals::new(config.name, config.value)))
        }
    }

    /// Register the built-in HTTP predicates.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let registry = except_http::register(PredicateRegistryBuilder::<HttpRequest>::new())
    ///     .predicate::<MyPredicate>("my.v1.MyPredicate")
    ///     .build();
    /// ```
    #[must_use]
    pub fn register<Req, Res>(
        builder: PredicateRegistryBuilder<Req, Res>,
    ) -> PredicateRegistryBuilder<Req, Res>
    where
        Req: HttpView + 'static,
        Res: 'static,
    {
        builder
            .predicate::<HeaderEquals>("except.http.v1.HeaderEquals")
            .predicate::<HeaderPresent>("except.http.v1.HeaderPresent")
            .predicate::<QueryParamEquals>("except.http.v1.QueryParamEquals")
    }
}

#[cfg(feature = "registry")]
pub use registry::{
    register, HeaderEqualsConfig, HeaderPresentConfig, QueryParamEqualsConfig,
};
