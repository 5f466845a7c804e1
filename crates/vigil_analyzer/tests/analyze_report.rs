//! End-to-end analysis of a realistic completion: several rules firing at
//! once, stable ordering, and summary derivation.

use vigil_analyzer::ConstraintAnalyzer;
use vigil_protocol::{ComplianceStatus, Severity};

const SAMPLE: &str = r#"
import os

def process_user_input():
    user_data = input("Enter data: ")
    return user_data

def connect_database():
    password = "secret123"
    query = "SELECT * FROM users WHERE id = " + user_id
    return query

global_var = "module state"
"#;

#[test]
fn test_sample_fires_expected_rules() {
    let analyzer = ConstraintAnalyzer::new();
    let violations = analyzer.analyze(SAMPLE);

    let fired: Vec<&str> = violations.iter().map(|v| v.rule.as_str()).collect();
    assert!(fired.contains(&"no_global_vars"));
    assert!(fired.contains(&"sanitize_inputs"));
    assert!(fired.contains(&"disallow_raw_sql"));
    assert!(fired.contains(&"no_hardcoded_secrets"));
    assert!(fired.contains(&"require_type_hints"));

    // Rules run in registration order, so violations group by rule.
    let global_idx = fired.iter().position(|r| *r == "no_global_vars").unwrap();
    let sql_idx = fired.iter().position(|r| *r == "disallow_raw_sql").unwrap();
    assert!(global_idx < sql_idx);

    let global = violations
        .iter()
        .find(|v| v.rule == "no_global_vars")
        .unwrap();
    assert_eq!(global.line, 13);
    assert_eq!(global.code_snippet, "global_var = \"module state\"");
}

#[test]
fn test_summary_of_sample_is_non_compliant() {
    let analyzer = ConstraintAnalyzer::new();
    let violations = analyzer.analyze(SAMPLE);
    let summary = analyzer.summarize(&violations);

    assert_eq!(summary.total_violations, violations.len());
    assert_eq!(summary.status, ComplianceStatus::NonCompliant);
    assert!(summary.by_severity[&Severity::Error] >= 2);
    assert_eq!(summary.by_rule["no_global_vars"], 1);
}

#[test]
fn test_violations_serialize_for_the_wire() {
    let analyzer = ConstraintAnalyzer::new();
    let violations = analyzer.analyze("x = 1\n");
    let json = serde_json::to_string(&violations).unwrap();
    let parsed: Vec<vigil_protocol::ConstraintViolation> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, violations);
}

#[test]
fn test_repeated_analysis_is_identical() {
    let analyzer = ConstraintAnalyzer::new();
    let first = analyzer.analyze(SAMPLE);
    let second = analyzer.analyze(SAMPLE);
    assert_eq!(first, second);
}
