//! Type registry for config-driven rule sets.
//!
//! Path and method+path rules deserialize directly. Predicate rules name a
//! registered type by URL and carry that type's own configuration:
//!
//! ```yaml
//! - predicate:
//!     type_url: except.http.v1.HeaderEquals
//!     config: { name: x-internal, value: "1" }
//! ```
//!
//! # Architecture (axum `BoxedIntoRoute` pattern)
//!
//! Each predicate type registers itself via [`IntoPredicate`]. At registration
//! time the concrete type `T` is monomorphized into a closure and erased
//! behind `Box<dyn Fn>`; at load time the closure deserializes `T::Config` and
//! constructs the predicate.
//!
//! # Example
//!
//! ```ignore
//! let registry = PredicateRegistryBuilder::new()
//!     .predicate::<HeaderEquals>("except.http.v1.HeaderEquals")
//!     .build();
//!
//! let config: RuleSetConfig = serde_json::from_str(json)?;
//! let rules = registry.load_rule_set(config)?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    config::{RuleConfig, RuleSetConfig, RulesConfig, TypedConfig},
    ExceptError, RequestPredicate, Rule, RuleSet, Rules, MAX_RULES,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Traits
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for predicate types that can be constructed from configuration.
///
/// Each predicate type knows its own config shape via the associated `Config`
/// type. The registry calls [`from_config`](Self::from_config) at load time.
///
/// # Example
///
/// ```ignore
/// impl IntoPredicate<HttpRequest, ()> for HeaderPresent {
///     type Config = HeaderPresentConfig;
///     fn from_config(config: Self::Config) -> Result<Arc<dyn RequestPredicate<HttpRequest, ()>>, ExceptError> {
///         Ok(Arc::new(HeaderPresent::new(config.name)))
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be built from config as a predicate over `{Req}`",
    label = "missing `IntoPredicate<{Req}, {Res}>` implementation",
    note = "implement `IntoPredicate` with a `Config` type that derives `Deserialize`"
)]
pub trait IntoPredicate<Req: 'static, Res: 'static>: Send + Sync + 'static {
    /// The configuration type deserialized from JSON/YAML.
    type Config: DeserializeOwned + Send + Sync;

    /// Construct a predicate from deserialized configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ExceptError::InvalidConfig`] if the config is semantically
    /// invalid (e.g., an empty header name).
    fn from_config(
        config: Self::Config,
    ) -> Result<Arc<dyn RequestPredicate<Req, Res>>, ExceptError>;
}

/// Type-erased predicate factory closure.
type BoxedPredicateFactory<Req, Res> = Box<
    dyn Fn(&serde_json::Value) -> Result<Arc<dyn RequestPredicate<Req, Res>>, ExceptError>
        + Send
        + Sync,
>;

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for constructing a [`PredicateRegistry`].
///
/// Register predicate types with their type URLs, then call
/// [`build()`](Self::build) to produce an immutable registry. No runtime
/// registration is possible after that.
pub struct PredicateRegistryBuilder<Req, Res = ()> {
    factories: HashMap<String, BoxedPredicateFactory<Req, Res>>,
    _phantom: PhantomData<fn(&Req, &Res)>,
}

impl<Req: 'static, Res: 'static> PredicateRegistryBuilder<Req, Res> {
    /// Create a new empty registry builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            _phantom: PhantomData,
        }
    }

    /// Register a predicate type with a type URL.
    ///
    /// Registering the same URL twice keeps the later registration.
    #[must_use]
    pub fn predicate<T: IntoPredicate<Req, Res>>(mut self, type_url: &str) -> Self {
        self.factories.insert(
            type_url.to_owned(),
            Box::new(|value: &serde_json::Value| {
                let config: T::Config = serde_json::from_value(value.clone()).map_err(|e| {
                    ExceptError::InvalidConfig {
                        message: e.to_string(),
                    }
                })?;
                T::from_config(config)
            }),
        );
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> PredicateRegistry<Req, Res> {
        tracing::debug!(
            predicates = self.factories.len(),
            "built predicate registry"
        );
        PredicateRegistry {
            factories: self.factories,
            _phantom: PhantomData,
        }
    }
}

impl<Req: 'static, Res: 'static> Default for PredicateRegistryBuilder<Req, Res> {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable registry of predicate factories.
///
/// Constructed via [`PredicateRegistryBuilder`]. Use
/// [`load_rule_set()`](Self::load_rule_set) to compile config into a runtime
/// [`RuleSet`].
pub struct PredicateRegistry<Req, Res = ()> {
    factories: HashMap<String, BoxedPredicateFactory<Req, Res>>,
    _phantom: PhantomData<fn(&Req, &Res)>,
}

impl<Req: 'static, Res: 'static> PredicateRegistry<Req, Res> {
    /// Load and compile a [`RuleSet`] from configuration.
    ///
    /// # Errors
    ///
    /// - [`ExceptError::TooManyRules`]: more than [`MAX_RULES`] rules
    /// - [`ExceptError::UnknownTypeUrl`]: predicate `type_url` not registered
    /// - [`ExceptError::InvalidConfig`]: predicate config deserialization or construction failed
    /// - [`ExceptError::InvalidPattern`]: a path pattern does not compile
    pub fn load_rule_set(&self, config: RuleSetConfig) -> Result<RuleSet<Req, Res>, ExceptError> {
        let rules = self.load_rules(config.rules)?;
        RuleSet::with_options(rules, config.options)
    }

    /// Resolve configured rules without compiling their path patterns.
    ///
    /// # Errors
    ///
    /// Same as [`load_rule_set()`](Self::load_rule_set), except pattern errors
    /// which surface only when the rules are compiled.
    pub fn load_rules(&self, config: RulesConfig) -> Result<Rules<Req, Res>, ExceptError> {
        if config.len() > MAX_RULES {
            return Err(ExceptError::TooManyRules {
                count: config.len(),
                max: MAX_RULES,
            });
        }

        match config {
            RulesConfig::Single(pattern) => Ok(Rules::Single(pattern)),
            RulesConfig::List(rules) => rules.into_iter().map(|r| self.load_rule(r)).collect(),
        }
    }

    /// Returns the number of registered predicate types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no predicate types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns `true` if the given type URL is registered.
    #[must_use]
    pub fn contains(&self, type_url: &str) -> bool {
        self.factories.contains_key(type_url)
    }

    /// Returns all registered type URLs (sorted).
    #[must_use]
    pub fn type_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    fn load_rule(&self, config: RuleConfig) -> Result<Rule<Req, Res>, ExceptError> {
        Ok(match config {
            RuleConfig::Path(pattern) => Rule::Path(pattern),
            RuleConfig::MethodPath { method, path } => Rule::MethodPath { method, path },
            RuleConfig::Predicate { predicate } => Rule::Predicate(self.resolve(&predicate)?),
        })
    }

    fn resolve(
        &self,
        config: &TypedConfig,
    ) -> Result<Arc<dyn RequestPredicate<Req, Res>>, ExceptError> {
        let factory =
            self.factories
                .get(&config.type_url)
                .ok_or_else(|| ExceptError::UnknownTypeUrl {
                    type_url: config.type_url.clone(),
                    available: self.type_urls().into_iter().map(str::to_owned).collect(),
                })?;
        factory(&config.config)
    }
}

impl<Req, Res> fmt::Debug for PredicateRegistry<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut urls: Vec<&String> = self.factories.keys().collect();
        urls.sort_unstable();
        f.debug_struct("PredicateRegistry")
            .field("type_urls", &urls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PredicateFuture, RequestView, RuleKind};
    use futures::executor::block_on;
    use futures::FutureExt;
    use serde::Deserialize;

    struct Req {
        method: &'static str,
        path: &'static str,
        user: &'static str,
    }

    impl RequestView for Req {
        fn method(&self) -> &str {
            self.method
        }

        fn path(&self) -> &str {
            self.path
        }
    }

    /// Excepts a fixed user.
    struct UserIs(String);

    impl RequestPredicate<Req, ()> for UserIs {
        fn test<'a>(&'a self, req: &'a Req, _: &'a ()) -> PredicateFuture<'a> {
            futures::future::ready(Ok(req.user == self.0)).boxed()
        }
    }

    #[derive(Deserialize)]
    struct UserIsConfig {
        user: String,
    }

    impl IntoPredicate<Req, ()> for UserIs {
        type Config = UserIsConfig;

        fn from_config(
            config: Self::Config,
        ) -> Result<Arc<dyn RequestPredicate<Req, ()>>, ExceptError> {
            if config.user.is_empty() {
                return Err(ExceptError::InvalidConfig {
                    message: "user must not be empty".into(),
                });
            }
            Ok(Arc::new(UserIs(config.user)))
        }
    }

    fn registry() -> PredicateRegistry<Req> {
        PredicateRegistryBuilder::new()
            .predicate::<UserIs>("test.UserIs")
            .build()
    }

    fn load(json: serde_json::Value) -> Result<RuleSet<Req>, ExceptError> {
        let config: RuleSetConfig = serde_json::from_value(json).unwrap();
        registry().load_rule_set(config)
    }

    fn req(method: &'static str, path: &'static str, user: &'static str) -> Req {
        Req { method, path, user }
    }

    #[test]
    fn loads_all_rule_shapes() {
        let rules = load(serde_json::json!({
            "rules": [
                "/health",
                { "method": "GET", "path": "/users/:id" },
                { "predicate": { "type_url": "test.UserIs", "config": { "user": "root" } } }
            ]
        }))
        .unwrap();

        assert_eq!(
            rules.kinds().collect::<Vec<_>>(),
            vec![RuleKind::Path, RuleKind::MethodPath, RuleKind::Predicate]
        );
        assert!(block_on(rules.evaluate(&req("POST", "/health", "bob"), &())).unwrap());
        assert!(block_on(rules.evaluate(&req("GET", "/users/9", "bob"), &())).unwrap());
        assert!(block_on(rules.evaluate(&req("POST", "/orders", "root"), &())).unwrap());
        assert!(!block_on(rules.evaluate(&req("POST", "/orders", "bob"), &())).unwrap());
    }

    #[test]
    fn bare_string_config() {
        let rules = load(serde_json::json!({ "rules": "/admin/*" })).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(block_on(rules.evaluate(&req("GET", "/admin/users", ""), &())).unwrap());
    }

    #[test]
    fn options_are_applied() {
        let rules = load(serde_json::json!({
            "options": { "sensitive": true },
            "rules": ["/Health"]
        }))
        .unwrap();
        assert!(!block_on(rules.evaluate(&req("GET", "/health", ""), &())).unwrap());
    }

    #[test]
    fn unknown_type_url_lists_registered() {
        let err = load(serde_json::json!({
            "rules": [{ "predicate": { "type_url": "test.Missing" } }]
        }))
        .unwrap_err();

        match err {
            ExceptError::UnknownTypeUrl {
                type_url,
                available,
            } => {
                assert_eq!(type_url, "test.Missing");
                assert_eq!(available, vec!["test.UserIs".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_predicate_config() {
        let err = load(serde_json::json!({
            "rules": [{ "predicate": { "type_url": "test.UserIs", "config": { "nope": 1 } } }]
        }))
        .unwrap_err();
        assert!(matches!(err, ExceptError::InvalidConfig { .. }));

        let err = load(serde_json::json!({
            "rules": [{ "predicate": { "type_url": "test.UserIs", "config": { "user": "" } } }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("user must not be empty"));
    }

    #[test]
    fn invalid_pattern_in_config() {
        let err = load(serde_json::json!({ "rules": ["/ok", "/(a"] })).unwrap_err();
        assert_eq!(err.rule_index(), Some(1));
    }

    #[test]
    fn too_many_rules() {
        let rules: Vec<String> = (0..=MAX_RULES).map(|i| format!("/r{i}")).collect();
        let err = load(serde_json::json!({ "rules": rules })).unwrap_err();
        assert!(matches!(
            err,
            ExceptError::TooManyRules { count, max } if count == MAX_RULES + 1 && max == MAX_RULES
        ));
    }

    #[test]
    fn registry_introspection() {
        let registry = registry();
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert!(registry.contains("test.UserIs"));
        assert!(!registry.contains("test.Other"));
        assert_eq!(registry.type_urls(), vec!["test.UserIs"]);

        let empty = PredicateRegistryBuilder::<Req>::new().build();
        assert!(empty.is_empty());
    }

    #[test]
    fn registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PredicateRegistry<Req>>();
    }
}
