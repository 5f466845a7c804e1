//! Constraint Analyzer: Static Analysis for Generated Python Code
//!
//! Parses a code string into an AST and checks it against a configurable
//! set of engineering/security rules, producing structured, explainable
//! violations plus a derived compliance summary.
//!
//! **Design Philosophy:**
//! Static analysis in Rust, not runtime validation in Python. The analyzer
//! is pure and reentrant: the rule registry is built once at construction
//! and immutable afterwards, every `analyze` call works on its own input,
//! and nothing here performs I/O. Unparseable input is reported as a single
//! `syntax_error` violation, never as an error the caller must catch.

mod context;
mod rules;
pub mod walk;

use context::{AnalysisContext, LineIndex};
use rules::RegisteredRule;
use rustpython_parser::{ast, Parse};
use vigil_protocol::config::rule_ids;
use vigil_protocol::{AnalyzerConfig, ConstraintViolation, Severity, ViolationsSummary};

/// Checks Python source against the loaded rule set.
pub struct ConstraintAnalyzer {
    registry: Vec<RegisteredRule>,
}

impl Default for ConstraintAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintAnalyzer {
    /// Analyzer with the built-in rule set: all seven checks enabled with
    /// their default severities.
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Analyzer with caller-supplied rule overrides. Construction never
    /// fails; unknown rule identifiers are logged and ignored.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            registry: rules::build_registry(&config),
        }
    }

    /// Analyzer from a JSON configuration document. A malformed document is
    /// recovered locally: the built-in defaults are used and a warning is
    /// logged, matching the contract that configuration errors are never
    /// fatal.
    pub fn from_json_config(json: &str) -> Self {
        match AnalyzerConfig::from_json_str(json) {
            Ok(config) => Self::with_config(config),
            Err(err) => {
                tracing::warn!(error = %err, "falling back to built-in rule set");
                Self::new()
            }
        }
    }

    /// Identifiers of the rules that will run, in execution order.
    pub fn enabled_rules(&self) -> Vec<&'static str> {
        self.registry
            .iter()
            .filter(|rule| rule.enabled)
            .map(|rule| rule.id)
            .collect()
    }

    /// Analyze one code string.
    ///
    /// Parse failure yields exactly one `syntax_error` violation carrying
    /// the parser's line/column and message; rule checks only run on
    /// syntactically valid input. Violations are produced in a fixed,
    /// deterministic order: registration order of the rules, source order
    /// within each rule.
    pub fn analyze(&self, code: &str) -> Vec<ConstraintViolation> {
        let suite = match ast::Suite::parse(code, "<completion>") {
            Ok(suite) => suite,
            Err(err) => return vec![syntax_error_violation(code, &err)],
        };

        let ctx = AnalysisContext::new(code, &suite);
        let mut violations = Vec::new();
        for rule in self.registry.iter().filter(|rule| rule.enabled) {
            let mut found = (rule.check)(rule, &ctx);
            if !found.is_empty() {
                tracing::debug!(rule = rule.id, count = found.len(), "rule check fired");
            }
            violations.append(&mut found);
        }
        violations
    }

    /// Pure aggregation over a violation list; no rules are re-run.
    pub fn summarize(&self, violations: &[ConstraintViolation]) -> ViolationsSummary {
        ViolationsSummary::from_violations(violations)
    }
}

fn syntax_error_violation(
    code: &str,
    err: &rustpython_parser::ParseError,
) -> ConstraintViolation {
    let index = LineIndex::new(code);
    let (line, column) = index.location(u32::from(err.offset) as usize);
    let snippet = code
        .split('\n')
        .nth(line.saturating_sub(1))
        .map(str::trim)
        .unwrap_or("")
        .to_string();
    ConstraintViolation {
        rule: rule_ids::SYNTAX_ERROR.to_string(),
        line,
        column,
        explanation: format!("Syntax error in code: {}", err.error),
        severity: Severity::Error,
        code_snippet: snippet,
    }
}
