//! Config types for data-driven rule sets.
//!
//! These types mirror the runtime rule types but are serde-deserializable,
//! enabling rule sets loaded from JSON/YAML via
//! [`PredicateRegistry::load_rule_set()`](crate::PredicateRegistry::load_rule_set).
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type |
//! |-------------|-------------|
//! | [`RuleSetConfig`] | [`RuleSet`](crate::RuleSet) |
//! | [`RulesConfig`] | [`Rules`](crate::Rules) |
//! | [`RuleConfig`] | [`Rule`](crate::Rule) |
//! | [`TypedConfig`] | `Arc<dyn RequestPredicate>` via registry factory |
//!
//! ```yaml
//! options: { sensitive: true }
//! rules:
//!   - /health
//!   - { method: GET, path: /users/:id }
//!   - predicate:
//!       type_url: except.http.v1.HeaderEquals
//!       config: { name: x-internal, value: "1" }
//! ```

use crate::PatternOptions;
use serde::Deserialize;

/// Configuration for a [`RuleSet`](crate::RuleSet).
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetConfig {
    /// Path-pattern options applied to every path rule.
    #[serde(default)]
    pub options: PatternOptions,

    /// The exception rules.
    pub rules: RulesConfig,
}

/// Either one bare path pattern or an ordered list of rules.
///
/// ```json
/// "/admin/*"
/// ["/health", { "method": "GET", "path": "/users" }]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RulesConfig {
    /// One bare path pattern.
    Single(String),
    /// An ordered list; first match wins.
    List(Vec<RuleConfig>),
}

impl RulesConfig {
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

/// Configuration for one [`Rule`](crate::Rule).
///
/// The shape of the entry decides the rule kind:
///
/// ```json
/// "/health"
/// { "method": "GET", "path": "/users" }
/// { "predicate": { "type_url": "except.http.v1.HeaderPresent", "config": { "name": "x-skip" } } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleConfig {
    /// A path pattern.
    Path(String),

    /// A method + path pair.
    MethodPath {
        /// HTTP method (case-insensitive).
        method: String,
        /// Path pattern.
        path: String,
    },

    /// A registered predicate.
    Predicate {
        /// Resolved at load time via the registry's `type_url` lookup.
        predicate: TypedConfig,
    },
}

/// Reference to a registered predicate type with its configuration.
///
/// - `type_url` names a predicate type registered with the registry
/// - `config` is that type's own payload, opaque until the type is resolved
#[derive(Debug, Clone, Deserialize)]
pub struct TypedConfig {
    /// Must match a `type_url` registered in the
    /// [`PredicateRegistry`](crate::PredicateRegistry).
    pub type_url: String,

    /// Deserialized as the `Config` associated type of the registered
    /// [`IntoPredicate`](crate::IntoPredicate).
    #[serde(default = "default_config")]
    pub config: serde_json::Value,
}

fn default_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Empty configuration for predicates that need no parameters.
///
/// Accepts any JSON value (`{}`, `null`, etc.) and ignores it.
#[derive(Debug, Clone, Copy)]
pub struct UnitConfig;

impl<'de> Deserialize<'de> for UnitConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(UnitConfig)
    }
}
