//! Rule configuration for the constraint analyzer.
//!
//! The wire shape is one JSON object:
//! `{"constraints": {"<rule_id>": {"enabled": ..., "severity": ...,
//! "message": ..., "max_lines": ...}}}`. Every per-rule field is optional;
//! omitted fields fall back to the built-in defaults declared here.
//!
//! Loading a malformed document is a recoverable [`ConfigError`] - the
//! analyzer recovers by constructing itself from [`AnalyzerConfig::built_in`].
//! Persisting a configuration file is the caller's business, not ours;
//! [`AnalyzerConfig::default_json`] exists so a caller has something to write.

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Rule identifiers for the built-in check set.
pub mod rule_ids {
    pub const NO_GLOBAL_VARS: &str = "no_global_vars";
    pub const SANITIZE_INPUTS: &str = "sanitize_inputs";
    pub const DISALLOW_RAW_SQL: &str = "disallow_raw_sql";
    pub const NO_HARDCODED_SECRETS: &str = "no_hardcoded_secrets";
    pub const REQUIRE_ERROR_HANDLING: &str = "require_error_handling";
    pub const REQUIRE_TYPE_HINTS: &str = "require_type_hints";
    pub const MAX_FUNCTION_LENGTH: &str = "max_function_length";
    /// Synthetic rule for unparseable input. Not configurable.
    pub const SYNTAX_ERROR: &str = "syntax_error";
}

/// Default line limit for `max_function_length`.
pub const DEFAULT_MAX_FUNCTION_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Malformed rule configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Per-rule settings. `None` fields mean "use the built-in default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Only meaningful for `max_function_length`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<usize>,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
            message: None,
            max_lines: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

impl RuleSettings {
    fn full(severity: Severity, message: &str) -> Self {
        Self {
            enabled: true,
            severity: Some(severity),
            message: Some(message.to_string()),
            max_lines: None,
        }
    }
}

/// The rule configuration handed to the analyzer at construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub constraints: BTreeMap<String, RuleSettings>,
}

impl AnalyzerConfig {
    /// The documented built-in rule set: all seven checks enabled, with
    /// their default severities and messages fully spelled out.
    pub fn built_in() -> Self {
        let mut constraints = BTreeMap::new();
        constraints.insert(
            rule_ids::NO_GLOBAL_VARS.to_string(),
            RuleSettings::full(
                Severity::Warning,
                "Global variables can cause hidden side effects and make code \
                 harder to test and maintain.",
            ),
        );
        constraints.insert(
            rule_ids::SANITIZE_INPUTS.to_string(),
            RuleSettings::full(
                Severity::Error,
                "User inputs should be sanitized to prevent injection attacks \
                 and data corruption.",
            ),
        );
        constraints.insert(
            rule_ids::DISALLOW_RAW_SQL.to_string(),
            RuleSettings::full(
                Severity::Error,
                "Raw SQL query detected without parameterization.",
            ),
        );
        constraints.insert(
            rule_ids::NO_HARDCODED_SECRETS.to_string(),
            RuleSettings::full(Severity::Error, "Hardcoded secret detected."),
        );
        constraints.insert(
            rule_ids::REQUIRE_ERROR_HANDLING.to_string(),
            RuleSettings::full(
                Severity::Warning,
                "Function performs risky operations without error handling.",
            ),
        );
        constraints.insert(
            rule_ids::REQUIRE_TYPE_HINTS.to_string(),
            RuleSettings::full(Severity::Info, "Function missing type hints."),
        );
        let mut max_len = RuleSettings::full(
            Severity::Warning,
            "Function exceeds the configured maximum length.",
        );
        max_len.max_lines = Some(DEFAULT_MAX_FUNCTION_LINES);
        constraints.insert(rule_ids::MAX_FUNCTION_LENGTH.to_string(), max_len);
        Self { constraints }
    }

    /// Parse a configuration document. Callers that want the "recover to
    /// defaults" behavior handle the `Err` branch themselves.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the built-in rule set, pretty-printed, for callers that want
    /// to persist a starter configuration file.
    pub fn default_json() -> String {
        // Serializing a static, fully-owned structure cannot fail.
        serde_json::to_string_pretty(&Self::built_in())
            .unwrap_or_else(|_| "{\"constraints\":{}}".to_string())
    }

    /// Settings override for one rule, if the document mentions it.
    pub fn rule(&self, rule_id: &str) -> Option<&RuleSettings> {
        self.constraints.get(rule_id)
    }
}
