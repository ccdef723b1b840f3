//! except-http: HTTP integration for exception rules
//!
//! This crate provides three pieces:
//!
//! 1. **Request views**: [`HttpView`] (headers, query) on top of
//!    [`RequestView`](except::RequestView) for `http::Request`,
//!    `http::request::Parts` and the simple [`HttpRequest`].
//! 2. **Predicates**: [`HeaderEquals`], [`HeaderPresent`] and
//!    [`QueryParamEquals`], loadable from config with the `registry` feature.
//! 3. **Tower**: [`ExceptLayer`] skips a protected layer for excepted requests.
//!
//! # Architecture
//!
//! ```text
//! RuleSet<Parts> + protected Layer (config)
//!         ↓ ExceptLayer::new()
//! ExceptService { inner, protected }
//!         ↓ call()
//! http::Request (runtime)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use except_http::prelude::*;
//!
//! let rules = RuleSet::new(vec![
//!     Rule::path("/health"),
//!     Rule::method_path("GET", "/docs/*"),
//!     Rule::custom(HeaderEquals::new("x-internal", "1")),
//! ])?;
//!
//! let service = ServiceBuilder::new()
//!     .layer(ExceptLayer::new(rules, auth_layer))
//!     .service(app);
//! ```

mod layer;
mod predicates;
mod simple;
mod view;

pub use layer::{ExceptLayer, ExceptService};
pub use predicates::{HeaderEquals, HeaderPresent, QueryParamEquals};
pub use simple::{HttpRequest, HttpRequestBuilder};
pub use view::{get_query_param, split_path_and_query, HttpView};

#[cfg(feature = "registry")]
pub use predicates::{register, HeaderEqualsConfig, HeaderPresentConfig, QueryParamEqualsConfig};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        // Tower
        ExceptLayer,
        ExceptService,
        // Predicates
        HeaderEquals,
        HeaderPresent,
        // Simple context (for testing)
        HttpRequest,
        HttpRequestBuilder,
        // Views
        HttpView,
        QueryParamEquals,
    };
    pub use except::prelude::*;
}
