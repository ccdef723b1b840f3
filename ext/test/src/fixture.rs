//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the except engine.
//!
//! ```yaml
//! name: health probe
//! description: literal path rule
//! rules:
//!   - /health
//! cases:
//!   - name: probe is excepted
//!     path: /health
//!     expect: true
//!   - name: predicate failure propagates
//!     path: /other
//!     expect_error: "rule #1"
//! ```

use crate::registry;
use except::{ExceptError, PatternOptions, RuleSetConfig, RulesConfig};
use except_http::HttpRequest;
use futures::executor::block_on;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: PatternOptions,
    pub rules: RulesConfig,
    /// Substring of the error expected when building the rule set.
    #[serde(default)]
    pub build_error: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Request target; may carry a `?query` suffix.
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
    /// Expected decision.
    #[serde(default)]
    pub expect: Option<bool>,
    /// Substring of the expected evaluation error.
    #[serde(default)]
    pub expect_error: Option<String>,
}

fn default_method() -> String {
    "GET".to_owned()
}

impl TestCase {
    /// Build an `HttpRequest` from this case
    pub fn build_request(&self) -> HttpRequest {
        let mut builder = HttpRequest::builder()
            .method(&self.method)
            .path(&self.path);
        for (k, v) in &self.headers {
            builder = builder.header(k, v);
        }
        for (k, v) in &self.query {
            builder = builder.query_param(k, v);
        }
        builder.build()
    }

    fn expected(&self) -> Outcome {
        match (&self.expect_error, self.expect) {
            (Some(message), _) => Outcome::Error(message.clone()),
            (None, Some(excepted)) => Outcome::Decided(excepted),
            (None, None) => Outcome::Error("case declares neither expect nor expect_error".into()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// What a case produced, or was expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A decision: `true` = excepted.
    Decided(bool),
    /// An error; expected outcomes hold a substring of the message.
    Error(String),
}

impl Outcome {
    fn satisfies(&self, expected: &Outcome) -> bool {
        match (self, expected) {
            (Self::Decided(a), Self::Decided(e)) => a == e,
            (Self::Error(a), Self::Error(e)) => a.contains(e.as_str()),
            _ => false,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decided(true) => f.write_str("excepted"),
            Self::Decided(false) => f.write_str("not excepted"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Outcome,
    pub actual: Outcome,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    fn config(&self) -> RuleSetConfig {
        RuleSetConfig {
            options: self.options,
            rules: self.rules.clone(),
        }
    }

    /// Run all test cases and return results
    ///
    /// A fixture with `build_error` yields one `<build>` result.
    pub fn run(&self) -> Vec<CaseResult> {
        let built = registry().load_rule_set(self.config());

        if let Some(expected) = &self.build_error {
            let expected = Outcome::Error(expected.clone());
            let actual = match &built {
                Ok(_) => Outcome::Decided(false),
                Err(e) => Outcome::Error(e.to_string()),
            };
            return vec![CaseResult {
                case_name: "<build>".into(),
                passed: actual.satisfies(&expected),
                expected,
                actual,
            }];
        }

        let rules = match built {
            Ok(rules) => rules,
            Err(e) => return vec![build_failure(&e)],
        };

        self.cases
            .iter()
            .map(|case| {
                let req = case.build_request();
                let actual = match block_on(rules.evaluate(&req, &())) {
                    Ok(excepted) => Outcome::Decided(excepted),
                    Err(e) => Outcome::Error(e.to_string()),
                };
                let expected = case.expected();
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual.satisfies(&expected),
                    expected,
                    actual,
                }
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self.run();
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {}, got {}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

fn build_failure(err: &ExceptError) -> CaseResult {
    CaseResult {
        case_name: "<build>".into(),
        passed: false,
        expected: Outcome::Decided(true),
        actual: Outcome::Error(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: inline
description: inline fixture
rules:
  - /health
  - { method: POST, path: "/hooks/:source" }
  - predicate: { type_url: except.test.v1.Fail, config: { message: boom } }
cases:
  - name: literal
    path: /health
    expect: true
  - name: method path
    method: post
    path: /hooks/github
    expect: true
  - name: falls through to failing predicate
    path: /users
    expect_error: "predicate rule #2 failed: boom"
---
name: broken
description: invalid pattern
rules: "/:"
build_error: "rule #0"
"#;

    #[test]
    fn runs_inline_fixtures() {
        let fixtures = Fixture::from_yaml_multi(YAML).unwrap();
        assert_eq!(fixtures.len(), 2);
        for fixture in &fixtures {
            fixture.run_and_assert();
        }
    }

    #[test]
    fn reports_failures() {
        let fixture = Fixture::from_yaml(
            r#"
name: wrong
description: wrong expectation
rules: /a
cases:
  - { name: miss, path: /b, expect: true }
"#,
        )
        .unwrap();

        let results = fixture.run();
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
        assert_eq!(results[0].actual, Outcome::Decided(false));
    }
}
