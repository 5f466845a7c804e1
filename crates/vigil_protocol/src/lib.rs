//! Shared data model for the Vigil completion-review core.
//!
//! Everything the highlighter, the analyzer and the CLI exchange lives here:
//! token alternatives reported by a completion provider, constraint
//! violations produced by the analyzer, and the rule configuration shape.

pub mod config;
pub mod types;

pub use config::{AnalyzerConfig, ConfigError, RuleSettings};
pub use types::{
    Category, ComplianceStatus, ConstraintViolation, PositionAlternatives, Severity,
    TokenAlternative, ViolationsSummary, DEFAULT_IMPORTANCE,
};
