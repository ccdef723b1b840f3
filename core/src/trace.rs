//! Evaluation trace types for debugging exception decisions.
//!
//! [`RuleSet::evaluate_with_trace`](crate::RuleSet::evaluate_with_trace)
//! returns the same decision as `evaluate()` plus the rules it actually ran.
//!
//! # Example
//!
//! ```ignore
//! let trace = rules.evaluate_with_trace(&req, &()).await?;
//! println!("excepted: {}", trace.excepted);
//! for step in &trace.steps {
//!     println!("  rule[{}] {} {}: matched={}", step.index, step.kind, step.rule, step.matched);
//! }
//! ```

use crate::RuleKind;
use std::fmt;

/// Trace of a full [`RuleSet`](crate::RuleSet) evaluation.
///
/// # INV: `excepted` == `evaluate()` result
///
/// Rules after the first match are not evaluated and so do not appear in
/// `steps`.
#[derive(Clone, PartialEq, Eq)]
pub struct EvalTrace {
    /// The decision (identical to what `evaluate()` returns).
    pub excepted: bool,
    /// Each rule that was evaluated, in order.
    pub steps: Vec<RuleTrace>,
}

impl EvalTrace {
    /// The step that excepted the request, if any.
    #[must_use]
    pub fn matched_rule(&self) -> Option<&RuleTrace> {
        self.steps.iter().find(|step| step.matched)
    }

    /// How many rules were evaluated before a decision was reached.
    #[must_use]
    pub fn evaluated(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Debug for EvalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalTrace")
            .field("excepted", &self.excepted)
            .field("steps", &self.steps)
            .finish()
    }
}

impl fmt::Display for EvalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}",
            if self.excepted { "excepted" } else { "not excepted" }
        )?;
        for step in &self.steps {
            writeln!(
                f,
                "  [{}] {:<11} {:<30} {}",
                step.index,
                step.kind,
                step.rule,
                if step.matched { "match" } else { "-" }
            )?;
        }
        Ok(())
    }
}

/// One rule's evaluation in a trace.
#[derive(Clone, PartialEq, Eq)]
pub struct RuleTrace {
    /// Position in the rule set (0-based).
    pub index: usize,
    /// Rule variant.
    pub kind: RuleKind,
    /// The pattern (`"GET /users/:id"` for method+path) or the predicate's
    /// description.
    pub rule: String,
    /// Did the rule match?
    pub matched: bool,
}

impl fmt::Debug for RuleTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTrace")
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("rule", &self.rule)
            .field("matched", &self.matched)
            .finish()
    }
}
