//! except - skip a protected handler for requests matching exception rules
//!
//! "Apply this handler to every request except these." A [`RuleSet`] holds an
//! ordered list of exception rules; evaluating it against a request yields a
//! single boolean: `true` means the request is *excepted* and the protected
//! step must be skipped.
//!
//! # Architecture
//!
//! - [`Rule`] — What the caller wrote: a path pattern, a method + path pair,
//!   or a predicate. Classified once, never inspected at runtime.
//! - [`Rules`] — Caller input: a single bare path pattern or a list of rules.
//! - [`RuleSet`] — Compiled, immutable, shareable. Path patterns are compiled
//!   to [`PathPattern`]s at construction.
//! - [`RuleSet::evaluate`] — First-match-wins, short-circuiting evaluation.
//! - [`Except`] — Wraps a protected step: runs it, or the pipeline's
//!   `proceed` continuation, depending on the decision.
//!
//! # Key Invariants
//!
//! 1. **First match wins**: rules run in declaration order; rules after the
//!    first match are never evaluated (predicates may have side effects).
//!
//! 2. **Predicate failure propagates**: a failing predicate fails the whole
//!    evaluation. It never degrades to "not excepted".
//!
//! 3. **Compile once**: malformed path patterns are rejected when the
//!    [`RuleSet`] is built, with the offending rule's index.
//!
//! # Example
//!
//! ```
//! use except::prelude::*;
//!
//! struct Request { method: String, path: String }
//!
//! impl RequestView for Request {
//!     fn method(&self) -> &str { &self.method }
//!     fn path(&self) -> &str { &self.path }
//! }
//!
//! let rules: RuleSet<Request> = RuleSet::new(vec![
//!     Rule::path("/health"),
//!     Rule::method_path("GET", "/users/:id"),
//! ])
//! .unwrap();
//!
//! let req = Request { method: "get".into(), path: "/users/42".into() };
//! let excepted = futures::executor::block_on(rules.evaluate(&req, &())).unwrap();
//! assert!(excepted);
//! ```
//!
//! # Extensions
//!
//! - [`except-http`](https://docs.rs/except-http) — `http` request views and a tower layer
//! - [`except-test`](https://docs.rs/except-test) — YAML conformance fixtures (internal)

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod evaluator;
mod guard;
mod path_pattern;
mod pattern_parser;
mod predicate;
mod request;
mod rule;
mod rule_set;
mod trace;

#[cfg(feature = "registry")]
mod config;
#[cfg(feature = "registry")]
mod registry;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use guard::{except, Except};
pub use path_pattern::{Key, Modifier, PathParams, PathPattern, PatternOptions};
pub use predicate::{BoxError, PredicateFuture, RequestPredicate};
pub use request::RequestView;
pub use rule::{Rule, RuleKind, Rules};
pub use rule_set::RuleSet;

// Trace types
pub use trace::{EvalTrace, RuleTrace};

// Registry (feature-gated)
#[cfg(feature = "registry")]
pub use config::{RuleConfig, RuleSetConfig, RulesConfig, TypedConfig, UnitConfig};
#[cfg(feature = "registry")]
pub use registry::{IntoPredicate, PredicateRegistry, PredicateRegistryBuilder};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use except::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Guard
        except,
        // Errors
        BoxError,
        // Trace types
        EvalTrace,
        Except,
        ExceptError,
        // Path patterns
        PathParams,
        PathPattern,
        PatternError,
        PatternOptions,
        PredicateFuture,
        // Traits
        RequestPredicate,
        RequestView,
        // Rules
        Rule,
        RuleKind,
        RuleSet,
        RuleTrace,
        Rules,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum length of a path pattern, in bytes.
pub const MAX_PATTERN_LENGTH: usize = 8192;

/// Maximum number of rules in a config-loaded [`RuleSet`].
///
/// Rule sets built in code are not limited; this guards config files only.
pub const MAX_RULES: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from path-pattern parsing and compilation.
///
/// Indices are character offsets into the pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// `:` not followed by a parameter name.
    #[error("missing parameter name at {index}")]
    MissingName {
        /// Offset of the `:`.
        index: usize,
    },
    /// A custom parameter pattern starts with `?`.
    #[error("pattern cannot start with \"?\" at {index}")]
    LeadingQuestionMark {
        /// Offset of the `?`.
        index: usize,
    },
    /// A custom parameter pattern contains a capturing group.
    #[error("capturing groups are not allowed at {index}")]
    CapturingGroup {
        /// Offset of the inner `(`.
        index: usize,
    },
    /// A custom parameter pattern is missing its closing `)`.
    #[error("unbalanced pattern at {index}")]
    UnbalancedPattern {
        /// Offset of the opening `(`.
        index: usize,
    },
    /// A custom parameter pattern is empty: `()`.
    #[error("missing pattern at {index}")]
    MissingPattern {
        /// Offset of the opening `(`.
        index: usize,
    },
    /// The pattern ends with an unescaped `\`.
    #[error("trailing escape character at {index}")]
    TrailingEscape {
        /// Offset of the `\`.
        index: usize,
    },
    /// A token appeared where it is not allowed (e.g. a stray `+`).
    #[error("unexpected {found} at {index}, expected {expected}")]
    UnexpectedToken {
        /// The token kind found.
        found: &'static str,
        /// Offset of the token.
        index: usize,
        /// The token kind expected.
        expected: &'static str,
    },
    /// The pattern exceeds [`MAX_PATTERN_LENGTH`].
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    TooLong {
        /// Actual length in bytes.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// The generated regular expression failed to compile.
    #[error("invalid regex: {message}")]
    Regex {
        /// The regex engine's message.
        message: String,
    },
}

/// Errors from building or evaluating a [`RuleSet`].
///
/// `InvalidPattern`, `InvalidConfig`, `UnknownTypeUrl` and `TooManyRules` are
/// configuration errors: fix the rules and rebuild. `Predicate` is a runtime
/// failure and belongs to the hosting pipeline's error channel.
#[derive(Debug, thiserror::Error)]
pub enum ExceptError {
    /// A path or method+path rule carries a malformed path pattern.
    #[error("rule #{index}: invalid path pattern \"{pattern}\": {source}")]
    InvalidPattern {
        /// Position of the rule in the rule set.
        index: usize,
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        #[source]
        source: PatternError,
    },
    /// A predicate rule returned an error.
    #[error("predicate rule #{index} failed: {source}")]
    Predicate {
        /// Position of the rule in the rule set.
        index: usize,
        /// The predicate's own error, unchanged.
        #[source]
        source: BoxError,
    },
    /// Configuration deserialization or construction failed.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// The underlying error message.
        message: String,
    },
    /// A predicate type URL was not found in the registry.
    #[error("unknown predicate type URL \"{type_url}\"; {}", describe_available(.available))]
    UnknownTypeUrl {
        /// The unregistered type URL.
        type_url: String,
        /// Type URLs that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },
    /// A config-loaded rule set exceeds [`MAX_RULES`].
    #[error("rule set has {count} rules, but maximum allowed is {max}")]
    TooManyRules {
        /// Actual count of rules.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
}

impl ExceptError {
    /// Position of the offending rule, when the error belongs to one.
    #[must_use]
    pub fn rule_index(&self) -> Option<usize> {
        match self {
            Self::InvalidPattern { index, .. } | Self::Predicate { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Returns `true` for errors caused by the rule configuration itself.
    #[must_use]
    pub fn is_config(&self) -> bool {
        !matches!(self, Self::Predicate { .. })
    }

    /// The predicate's own error, if this is a predicate failure.
    #[must_use]
    pub fn predicate_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Predicate { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

fn describe_available(available: &[String]) -> String {
    if available.is_empty() {
        "no predicate types are registered".to_owned()
    } else {
        format!("registered: {}", available.join(", "))
    }
}
