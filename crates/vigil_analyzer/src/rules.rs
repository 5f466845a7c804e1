//! Built-in rule checks and the rule registry.
//!
//! Each rule is a plain function over the [`AnalysisContext`]; the registry
//! binds rule identifiers to check functions once, at analyzer construction,
//! in a fixed order. Adding a rule means registering one more entry, not
//! editing a dispatch chain. Checks are total functions: they perform no
//! I/O, hold no state, and cannot fail, so there is no "checker crashed"
//! violation code.

use crate::context::AnalysisContext;
use crate::walk::{self, Node};
use regex::Regex;
use rustpython_parser::ast;
use vigil_protocol::config::{rule_ids, AnalyzerConfig, DEFAULT_MAX_FUNCTION_LINES};
use vigil_protocol::{ConstraintViolation, Severity};

/// Functions recognized as reading external input.
const INPUT_FUNCTIONS: &[&str] = &["input", "raw_input"];

/// Dotted call paths recognized as reading external input.
const INPUT_ATTR_PATHS: &[&str] = &["sys.stdin.read", "sys.stdin.readline"];

/// Method/function names that count as sanitizing a value.
const SANITIZERS: &[&str] = &["strip", "escape", "sanitize", "validate", "clean"];

/// Substrings that mark a SQL line as parameterized. Fixed allow-list:
/// positional placeholders, named placeholders, formatting/interpolation.
const PARAM_MARKERS: &[&str] = &["%s", "?", ":", "format(", "f\""];

pub(crate) type CheckFn =
    fn(&RegisteredRule, &AnalysisContext<'_>) -> Vec<ConstraintViolation>;

/// One entry of the rule registry: effective settings plus the check.
pub(crate) struct RegisteredRule {
    pub id: &'static str,
    pub enabled: bool,
    pub severity: Severity,
    pub message: String,
    /// Line limit; only `max_function_length` reads it.
    pub max_lines: usize,
    /// Pre-compiled line-scan patterns; empty for tree-based rules.
    pub patterns: Vec<Regex>,
    pub check: CheckFn,
}

impl RegisteredRule {
    fn violation_at(
        &self,
        ctx: &AnalysisContext<'_>,
        offset: usize,
        explanation: Option<String>,
    ) -> ConstraintViolation {
        let (line, column) = ctx.location(offset);
        ConstraintViolation {
            rule: self.id.to_string(),
            line,
            column,
            explanation: explanation.unwrap_or_else(|| self.message.clone()),
            severity: self.severity,
            code_snippet: ctx.snippet(line).to_string(),
        }
    }

    fn violation_on_line(&self, ctx: &AnalysisContext<'_>, line: usize) -> ConstraintViolation {
        ConstraintViolation {
            rule: self.id.to_string(),
            line,
            column: 0,
            explanation: self.message.clone(),
            severity: self.severity,
            code_snippet: ctx.snippet(line).to_string(),
        }
    }
}

/// Build the registry in fixed registration order, merging built-in
/// defaults with the caller's overrides. Unknown rule identifiers in the
/// configuration are logged and ignored.
pub(crate) fn build_registry(config: &AnalyzerConfig) -> Vec<RegisteredRule> {
    let registrations: &[(&'static str, CheckFn, fn() -> Vec<Regex>)] = &[
        (rule_ids::NO_GLOBAL_VARS, check_global_vars, no_patterns),
        (rule_ids::SANITIZE_INPUTS, check_sanitize_inputs, no_patterns),
        (rule_ids::DISALLOW_RAW_SQL, check_raw_sql, sql_patterns),
        (
            rule_ids::NO_HARDCODED_SECRETS,
            check_hardcoded_secrets,
            secret_patterns,
        ),
        (
            rule_ids::REQUIRE_ERROR_HANDLING,
            check_error_handling,
            no_patterns,
        ),
        (rule_ids::REQUIRE_TYPE_HINTS, check_type_hints, no_patterns),
        (
            rule_ids::MAX_FUNCTION_LENGTH,
            check_function_length,
            no_patterns,
        ),
    ];

    for id in config.constraints.keys() {
        if !registrations.iter().any(|(known, _, _)| *known == id.as_str()) {
            tracing::warn!(rule = %id, "unknown rule in configuration, ignoring");
        }
    }

    let defaults = AnalyzerConfig::built_in();
    registrations
        .iter()
        .map(|&(id, check, patterns)| {
            let built_in = defaults.rule(id).cloned().unwrap_or_default();
            let overrides = config.rule(id);
            RegisteredRule {
                id,
                enabled: overrides.map(|s| s.enabled).unwrap_or(built_in.enabled),
                severity: overrides
                    .and_then(|s| s.severity)
                    .or(built_in.severity)
                    .unwrap_or(Severity::Warning),
                message: overrides
                    .and_then(|s| s.message.clone())
                    .or(built_in.message)
                    .unwrap_or_else(|| format!("Rule '{}' violated", id)),
                max_lines: overrides
                    .and_then(|s| s.max_lines)
                    .or(built_in.max_lines)
                    .unwrap_or(DEFAULT_MAX_FUNCTION_LINES),
                patterns: patterns(),
                check,
            }
        })
        .collect()
}

fn no_patterns() -> Vec<Regex> {
    Vec::new()
}

fn sql_patterns() -> Vec<Regex> {
    [
        r"(?i)SELECT\s+.*FROM",
        r"(?i)INSERT\s+INTO",
        r"(?i)UPDATE\s+.*SET",
        r"(?i)DELETE\s+FROM",
        r"(?i)DROP\s+TABLE",
        r"(?i)CREATE\s+TABLE",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
}

fn secret_patterns() -> Vec<Regex> {
    // No leading word boundary: `SECRET_KEY` and `DB_PASSWORD` must match,
    // and `_` is a word character, so `\b` would miss them.
    vec![Regex::new(r#"(?i)(password|api_key|secret|token|key)\s*=\s*["'][^"']+["']"#).unwrap()]
}

// ============================================================================
// Tree-based checks
// ============================================================================

/// Assignments whose innermost enclosing scope is the module itself.
fn check_global_vars(
    rule: &RegisteredRule,
    ctx: &AnalysisContext<'_>,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    walk::walk(ctx.suite, &mut |node, scopes| {
        if !scopes.at_module_level() {
            return;
        }
        let offset = match node {
            Node::Stmt(ast::Stmt::Assign(assign)) => Some(assign.range.start()),
            Node::Stmt(ast::Stmt::AugAssign(assign)) => Some(assign.range.start()),
            Node::Stmt(ast::Stmt::AnnAssign(assign)) if assign.value.is_some() => {
                Some(assign.range.start())
            }
            _ => None,
        };
        if let Some(offset) = offset {
            violations.push(rule.violation_at(ctx, u32::from(offset) as usize, None));
        }
    });
    violations
}

/// External-input reads whose value is never sanitized in the same scope.
///
/// Only single-assignment traces are followed: an inline sanitizer on the
/// read, a later method call on the assigned variable, or a later sanitizer
/// function taking the variable all clear the flag. Anything more complex
/// stays flagged; false positives are preferred over missed input paths.
fn check_sanitize_inputs(
    rule: &RegisteredRule,
    ctx: &AnalysisContext<'_>,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    walk::walk(ctx.suite, &mut |node, _| {
        let Node::ScopeBody { body, .. } = node else {
            return;
        };
        for (index, stmt) in body.iter().enumerate() {
            let mut input_offsets = Vec::new();
            walk::exprs_in_stmt(stmt, true, &mut |expr| {
                if let ast::Expr::Call(call) = expr {
                    if is_input_call(call) {
                        input_offsets.push(u32::from(call.range.start()) as usize);
                    }
                }
            });
            if input_offsets.is_empty() {
                continue;
            }
            if stmt_mentions_sanitizer(stmt) {
                continue;
            }
            if let Some(var) = assigned_name(stmt) {
                let sanitized_later = body[index + 1..]
                    .iter()
                    .any(|later| stmt_sanitizes_var(later, var));
                if sanitized_later {
                    continue;
                }
            }
            for offset in input_offsets {
                violations.push(rule.violation_at(ctx, offset, None));
            }
        }
    });
    violations
}

/// Functions whose body performs calls or attribute access with no `try`
/// anywhere inside.
fn check_error_handling(
    rule: &RegisteredRule,
    ctx: &AnalysisContext<'_>,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    walk::walk(ctx.suite, &mut |node, _| {
        let (body, offset) = match node {
            Node::Stmt(ast::Stmt::FunctionDef(def)) => (&def.body, def.range.start()),
            Node::Stmt(ast::Stmt::AsyncFunctionDef(def)) => (&def.body, def.range.start()),
            _ => return,
        };
        if body.is_empty() {
            return;
        }

        let mut has_try = false;
        walk::for_each_stmt(body, &mut |stmt| {
            if matches!(stmt, ast::Stmt::Try(_) | ast::Stmt::TryStar(_)) {
                has_try = true;
            }
        });
        if has_try {
            return;
        }

        let mut has_risky_ops = false;
        walk::for_each_expr_in_body(body, &mut |expr| {
            if matches!(expr, ast::Expr::Call(_) | ast::Expr::Attribute(_)) {
                has_risky_ops = true;
            }
        });
        if has_risky_ops {
            violations.push(rule.violation_at(ctx, u32::from(offset) as usize, None));
        }
    });
    violations
}

/// Missing return annotations and unannotated parameters.
fn check_type_hints(
    rule: &RegisteredRule,
    ctx: &AnalysisContext<'_>,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    walk::walk(ctx.suite, &mut |node, _| {
        let (args, returns, offset) = match node {
            Node::Stmt(ast::Stmt::FunctionDef(def)) => {
                (def.args.as_ref(), &def.returns, def.range.start())
            }
            Node::Stmt(ast::Stmt::AsyncFunctionDef(def)) => {
                (def.args.as_ref(), &def.returns, def.range.start())
            }
            _ => return,
        };
        let offset = u32::from(offset) as usize;

        if returns.is_none() {
            violations.push(rule.violation_at(ctx, offset, None));
        }
        for arg in args
            .posonlyargs
            .iter()
            .chain(args.args.iter())
            .chain(args.kwonlyargs.iter())
        {
            if arg.def.annotation.is_none() {
                violations.push(rule.violation_at(
                    ctx,
                    offset,
                    Some(format!(
                        "Parameter '{}' missing type hint",
                        arg.def.arg.as_str()
                    )),
                ));
            }
        }
    });
    violations
}

/// Functions spanning more lines than the configured limit, counted
/// inclusively from the `def` line to the function's last line.
fn check_function_length(
    rule: &RegisteredRule,
    ctx: &AnalysisContext<'_>,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    walk::walk(ctx.suite, &mut |node, _| {
        let (name, range) = match node {
            Node::Stmt(ast::Stmt::FunctionDef(def)) => (def.name.as_str(), def.range),
            Node::Stmt(ast::Stmt::AsyncFunctionDef(def)) => (def.name.as_str(), def.range),
            _ => return,
        };
        let start_offset = u32::from(range.start()) as usize;
        let end_offset = (u32::from(range.end()) as usize).saturating_sub(1);
        let (start_line, _) = ctx.location(start_offset);
        let (end_line, _) = ctx.location(end_offset);
        let span = end_line - start_line + 1;
        if span > rule.max_lines {
            violations.push(rule.violation_at(
                ctx,
                start_offset,
                Some(format!(
                    "Function '{}' spans {} lines, exceeding the limit of {}",
                    name, span, rule.max_lines
                )),
            ));
        }
    });
    violations
}

// ============================================================================
// Line-based checks
// ============================================================================

/// SQL statements embedded in source lines without a parameterization
/// marker. Line-based on purpose: SQL mostly lives inside string literals.
fn check_raw_sql(rule: &RegisteredRule, ctx: &AnalysisContext<'_>) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    for (index, line) in ctx.lines.iter().enumerate() {
        let is_sql = rule.patterns.iter().any(|pattern| pattern.is_match(line));
        if !is_sql {
            continue;
        }
        let parameterized = PARAM_MARKERS.iter().any(|marker| line.contains(marker));
        if !parameterized {
            violations.push(rule.violation_on_line(ctx, index + 1));
        }
    }
    violations
}

/// Secret-sounding identifiers bound directly to quoted literals.
fn check_hardcoded_secrets(
    rule: &RegisteredRule,
    ctx: &AnalysisContext<'_>,
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    for (index, line) in ctx.lines.iter().enumerate() {
        if rule.patterns.iter().any(|pattern| pattern.is_match(line)) {
            violations.push(rule.violation_on_line(ctx, index + 1));
        }
    }
    violations
}

// ============================================================================
// Predicates
// ============================================================================

fn is_input_call(call: &ast::ExprCall) -> bool {
    match call.func.as_ref() {
        ast::Expr::Name(name) => INPUT_FUNCTIONS.contains(&name.id.as_str()),
        ast::Expr::Attribute(_) => dotted_path(call.func.as_ref())
            .map(|path| INPUT_ATTR_PATHS.contains(&path.as_str()))
            .unwrap_or(false),
        _ => false,
    }
}

/// Render `a.b.c` attribute chains rooted at a plain name.
fn dotted_path(expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Name(name) => Some(name.id.as_str().to_string()),
        ast::Expr::Attribute(attr) => {
            let base = dotted_path(attr.value.as_ref())?;
            Some(format!("{}.{}", base, attr.attr.as_str()))
        }
        _ => None,
    }
}

/// Does this statement apply any recognized sanitizer anywhere inside
/// itself (e.g. `x = input().strip()` or `x = clean(input())`)?
fn stmt_mentions_sanitizer(stmt: &ast::Stmt) -> bool {
    let mut found = false;
    walk::exprs_in_stmt(stmt, true, &mut |expr| match expr {
        ast::Expr::Attribute(attr) if SANITIZERS.contains(&attr.attr.as_str()) => {
            found = true;
        }
        ast::Expr::Call(call) => {
            if let ast::Expr::Name(name) = call.func.as_ref() {
                if SANITIZERS.contains(&name.id.as_str()) {
                    found = true;
                }
            }
        }
        _ => {}
    });
    found
}

/// Name bound by a simple single-target assignment, if any.
fn assigned_name(stmt: &ast::Stmt) -> Option<&str> {
    let ast::Stmt::Assign(assign) = stmt else {
        return None;
    };
    match assign.targets.as_slice() {
        [ast::Expr::Name(name)] => Some(name.id.as_str()),
        _ => None,
    }
}

/// Does this statement pass `var` through a sanitizer, either as a method
/// call on the variable or as an argument to a sanitizer function?
fn stmt_sanitizes_var(stmt: &ast::Stmt, var: &str) -> bool {
    let mut found = false;
    walk::exprs_in_stmt(stmt, true, &mut |expr| {
        let ast::Expr::Call(call) = expr else {
            return;
        };
        match call.func.as_ref() {
            ast::Expr::Attribute(attr) if SANITIZERS.contains(&attr.attr.as_str()) => {
                if let ast::Expr::Name(receiver) = attr.value.as_ref() {
                    if receiver.id.as_str() == var {
                        found = true;
                    }
                }
            }
            ast::Expr::Name(func) if SANITIZERS.contains(&func.id.as_str()) => {
                let takes_var = call.args.iter().any(|arg| {
                    matches!(arg, ast::Expr::Name(name) if name.id.as_str() == var)
                });
                if takes_var {
                    found = true;
                }
            }
            _ => {}
        }
    });
    found
}
