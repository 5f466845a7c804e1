//! Core payload types shared across the Vigil crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Importance assumed for an alternative the semantic-analysis provider has
/// not scored yet ("unknown/neutral").
pub const DEFAULT_IMPORTANCE: f64 = 0.5;

// ============================================================================
// Canonical Enums (used across all crates)
// ============================================================================

/// Violation severity. This is the CANONICAL definition - use this everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(format!(
                "Invalid severity: '{}'. Expected: info, warning, or error",
                s
            )),
        }
    }
}

/// Semantic category a provider can attach to a token alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Affects behavior, security, or efficiency.
    Significant,
    /// Stylistic difference only.
    Minor,
    /// Would not be valid code.
    Incorrect,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Significant => "Significant",
            Category::Minor => "Minor",
            Category::Incorrect => "Incorrect",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Significant" => Ok(Category::Significant),
            "Minor" => Ok(Category::Minor),
            "Incorrect" => Ok(Category::Incorrect),
            _ => Err(format!(
                "Invalid category: '{}'. Expected: Significant, Minor, or Incorrect",
                s
            )),
        }
    }
}

/// Overall compliance of a piece of analyzed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// No violations at all.
    Compliant,
    /// Violations exist, none of them errors.
    Warnings,
    /// At least one error-severity violation.
    NonCompliant,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::Warnings => "warnings",
            ComplianceStatus::NonCompliant => "non_compliant",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Completion-side types
// ============================================================================

/// One candidate token at a generation position.
///
/// Produced by the completion provider with `token` and `probability` set;
/// `importance` and `category` are attached later by the semantic-analysis
/// provider. That attachment is the only mutation this type supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAlternative {
    pub token: String,
    /// Model probability in [0, 1].
    pub probability: f64,
    /// Importance score in [0, 1]; `None` means not yet analyzed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl TokenAlternative {
    pub fn new(token: impl Into<String>, probability: f64) -> Self {
        Self {
            token: token.into(),
            probability,
            importance: None,
            category: None,
        }
    }

    /// Attach the semantic-analysis result for this alternative.
    pub fn set_analysis(&mut self, importance: f64, category: Category) {
        self.importance = Some(importance);
        self.category = Some(category);
    }

    /// Importance to use in entropy math, defaulting when unanalyzed.
    pub fn importance_or_default(&self) -> f64 {
        self.importance.unwrap_or(DEFAULT_IMPORTANCE)
    }
}

/// Ranked alternatives for one generation step.
///
/// The first element is the token the completion provider actually chose.
/// Probabilities are conventionally non-increasing but this is NOT
/// guaranteed; consumers must treat the probability values, not the rank,
/// as the source of truth.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionAlternatives {
    pub alternatives: Vec<TokenAlternative>,
}

impl PositionAlternatives {
    pub fn new(alternatives: Vec<TokenAlternative>) -> Self {
        Self { alternatives }
    }

    /// The token the completion provider selected, if any were reported.
    pub fn chosen(&self) -> Option<&TokenAlternative> {
        self.alternatives.first()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}

// ============================================================================
// Analyzer-side types
// ============================================================================

/// A single reported breach of one constraint rule.
///
/// Plain value type: two violations with identical fields are equal.
/// Violations never outlive the `analyze` call that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Identifier of the rule that fired (e.g. `no_global_vars`).
    pub rule: String,
    /// 1-based line number.
    pub line: usize,
    /// 0-based column.
    pub column: usize,
    /// Rendered human-readable explanation.
    pub explanation: String,
    pub severity: Severity,
    /// Verbatim (whitespace-trimmed) snippet of the offending source line.
    pub code_snippet: String,
}

/// Aggregate view over a violation list. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationsSummary {
    pub total_violations: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_rule: BTreeMap<String, usize>,
    pub status: ComplianceStatus,
}

impl ViolationsSummary {
    /// Pure aggregation over a violation slice.
    pub fn from_violations(violations: &[ConstraintViolation]) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut by_rule: BTreeMap<String, usize> = BTreeMap::new();

        for violation in violations {
            *by_severity.entry(violation.severity).or_insert(0) += 1;
            *by_rule.entry(violation.rule.clone()).or_insert(0) += 1;
        }

        let status = if by_severity.get(&Severity::Error).copied().unwrap_or(0) > 0 {
            ComplianceStatus::NonCompliant
        } else if violations.is_empty() {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::Warnings
        };

        Self {
            total_violations: violations.len(),
            by_severity,
            by_rule,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(rule: &str, severity: Severity) -> ConstraintViolation {
        ConstraintViolation {
            rule: rule.to_string(),
            line: 1,
            column: 0,
            explanation: "test".to_string(),
            severity,
            code_snippet: String::new(),
        }
    }

    #[test]
    fn test_severity_round_trip() {
        for severity in [Severity::Info, Severity::Warning, Severity::Error] {
            let parsed: Severity = severity.as_str().parse().unwrap();
            assert_eq!(parsed, severity);
            let json = serde_json::to_string(&severity).unwrap();
            assert_eq!(json, format!("\"{}\"", severity.as_str()));
        }
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_compliance_status_serde_shape() {
        let json = serde_json::to_string(&ComplianceStatus::NonCompliant).unwrap();
        assert_eq!(json, "\"non_compliant\"");
    }

    #[test]
    fn test_summary_empty_is_compliant() {
        let summary = ViolationsSummary::from_violations(&[]);
        assert_eq!(summary.total_violations, 0);
        assert!(summary.by_severity.is_empty());
        assert!(summary.by_rule.is_empty());
        assert_eq!(summary.status, ComplianceStatus::Compliant);
    }

    #[test]
    fn test_summary_error_means_non_compliant() {
        let violations = vec![
            violation("no_global_vars", Severity::Warning),
            violation("sanitize_inputs", Severity::Error),
        ];
        let summary = ViolationsSummary::from_violations(&violations);
        assert_eq!(summary.total_violations, 2);
        assert_eq!(summary.by_severity[&Severity::Error], 1);
        assert_eq!(summary.by_rule["sanitize_inputs"], 1);
        assert_eq!(summary.status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_summary_warnings_only() {
        let violations = vec![
            violation("no_global_vars", Severity::Warning),
            violation("require_type_hints", Severity::Info),
        ];
        let summary = ViolationsSummary::from_violations(&violations);
        assert_eq!(summary.status, ComplianceStatus::Warnings);
    }

    #[test]
    fn test_importance_default() {
        let mut alt = TokenAlternative::new("return", 0.9);
        assert_eq!(alt.importance_or_default(), DEFAULT_IMPORTANCE);
        alt.set_analysis(0.8, Category::Significant);
        assert_eq!(alt.importance_or_default(), 0.8);
        assert_eq!(alt.category, Some(Category::Significant));
    }

    #[test]
    fn test_position_alternatives_chosen() {
        let position = PositionAlternatives::new(vec![
            TokenAlternative::new("return", 0.9),
            TokenAlternative::new("yield", 0.1),
        ]);
        assert_eq!(position.chosen().unwrap().token, "return");
        assert_eq!(position.len(), 2);
    }
}
