//! Shared depth-first, scope-tracking traversal of a parsed Python module.
//!
//! Every rule check walks the tree through this one utility and expresses
//! only its node predicates; no check carries its own traversal. The walker
//! maintains an explicit scope stack (module / function / class) so checks
//! like `no_global_vars` can ask "is the innermost scope the module?"
//! instead of scanning ancestors.

use rustpython_parser::ast;

/// Kind of lexical scope a node sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Class,
}

/// Stack of enclosing scopes, innermost last. Never empty.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<ScopeKind>,
}

impl ScopeStack {
    fn new() -> Self {
        Self {
            scopes: vec![ScopeKind::Module],
        }
    }

    pub fn current(&self) -> ScopeKind {
        *self.scopes.last().expect("scope stack is never empty")
    }

    pub fn at_module_level(&self) -> bool {
        self.current() == ScopeKind::Module
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(kind);
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }
}

/// One traversal event.
#[derive(Clone, Copy)]
pub enum Node<'a> {
    Stmt(&'a ast::Stmt),
    Expr(&'a ast::Expr),
    /// Fired when entering a scope, before its statements are visited.
    /// The module body fires first with `ScopeKind::Module`.
    ScopeBody {
        body: &'a [ast::Stmt],
        kind: ScopeKind,
    },
}

/// Depth-first walk over a parsed module.
pub fn walk<'a>(suite: &'a [ast::Stmt], visit: &mut dyn FnMut(Node<'a>, &ScopeStack)) {
    let mut scopes = ScopeStack::new();
    visit(
        Node::ScopeBody {
            body: suite,
            kind: ScopeKind::Module,
        },
        &scopes,
    );
    for stmt in suite {
        walk_stmt(stmt, &mut scopes, visit);
    }
}

/// Visit every expression inside one statement, in source order.
///
/// With `same_scope_only` set, bodies of nested function and class
/// definitions are skipped, so the caller sees only expressions evaluated
/// in the statement's own scope.
pub fn exprs_in_stmt<'a>(
    stmt: &'a ast::Stmt,
    same_scope_only: bool,
    f: &mut dyn FnMut(&'a ast::Expr),
) {
    let mut scopes = ScopeStack::new();
    let base = scopes.depth();
    walk_stmt(stmt, &mut scopes, &mut |node, current: &ScopeStack| {
        if same_scope_only && current.depth() > base {
            return;
        }
        if let Node::Expr(expr) = node {
            f(expr);
        }
    });
}

/// Visit every statement in `body`, recursively, at any scope depth.
pub fn for_each_stmt<'a>(body: &'a [ast::Stmt], f: &mut dyn FnMut(&'a ast::Stmt)) {
    let mut scopes = ScopeStack::new();
    walk_body(body, &mut scopes, &mut |node, _: &ScopeStack| {
        if let Node::Stmt(stmt) = node {
            f(stmt);
        }
    });
}

/// Visit every expression under `body`, recursively, at any scope depth.
pub fn for_each_expr_in_body<'a>(body: &'a [ast::Stmt], f: &mut dyn FnMut(&'a ast::Expr)) {
    let mut scopes = ScopeStack::new();
    walk_body(body, &mut scopes, &mut |node, _: &ScopeStack| {
        if let Node::Expr(expr) = node {
            f(expr);
        }
    });
}

/// Visit `expr` and every expression nested inside it.
pub fn for_each_expr<'a>(expr: &'a ast::Expr, f: &mut dyn FnMut(&'a ast::Expr)) {
    let mut scopes = ScopeStack::new();
    walk_expr(expr, &mut scopes, &mut |node, _: &ScopeStack| {
        if let Node::Expr(inner) = node {
            f(inner);
        }
    });
}

fn walk_body<'a>(
    body: &'a [ast::Stmt],
    scopes: &mut ScopeStack,
    visit: &mut dyn FnMut(Node<'a>, &ScopeStack),
) {
    for stmt in body {
        walk_stmt(stmt, scopes, visit);
    }
}

fn walk_scope<'a>(
    body: &'a [ast::Stmt],
    kind: ScopeKind,
    scopes: &mut ScopeStack,
    visit: &mut dyn FnMut(Node<'a>, &ScopeStack),
) {
    scopes.push(kind);
    visit(Node::ScopeBody { body, kind }, scopes);
    walk_body(body, scopes, visit);
    scopes.pop();
}

fn walk_stmt<'a>(
    stmt: &'a ast::Stmt,
    scopes: &mut ScopeStack,
    visit: &mut dyn FnMut(Node<'a>, &ScopeStack),
) {
    visit(Node::Stmt(stmt), scopes);
    match stmt {
        ast::Stmt::FunctionDef(def) => {
            // Decorators, defaults and annotations evaluate in the
            // enclosing scope; only the body opens a new one.
            for decorator in &def.decorator_list {
                walk_expr(decorator, scopes, visit);
            }
            walk_arg_defaults(&def.args, scopes, visit);
            if let Some(returns) = &def.returns {
                walk_expr(returns, scopes, visit);
            }
            walk_scope(&def.body, ScopeKind::Function, scopes, visit);
        }
        ast::Stmt::AsyncFunctionDef(def) => {
            for decorator in &def.decorator_list {
                walk_expr(decorator, scopes, visit);
            }
            walk_arg_defaults(&def.args, scopes, visit);
            if let Some(returns) = &def.returns {
                walk_expr(returns, scopes, visit);
            }
            walk_scope(&def.body, ScopeKind::Function, scopes, visit);
        }
        ast::Stmt::ClassDef(def) => {
            for decorator in &def.decorator_list {
                walk_expr(decorator, scopes, visit);
            }
            for base in &def.bases {
                walk_expr(base, scopes, visit);
            }
            for keyword in &def.keywords {
                walk_expr(&keyword.value, scopes, visit);
            }
            walk_scope(&def.body, ScopeKind::Class, scopes, visit);
        }
        ast::Stmt::Return(ret) => {
            if let Some(value) = &ret.value {
                walk_expr(value, scopes, visit);
            }
        }
        ast::Stmt::Delete(del) => {
            for target in &del.targets {
                walk_expr(target, scopes, visit);
            }
        }
        ast::Stmt::Assign(assign) => {
            for target in &assign.targets {
                walk_expr(target, scopes, visit);
            }
            walk_expr(&assign.value, scopes, visit);
        }
        ast::Stmt::AugAssign(assign) => {
            walk_expr(&assign.target, scopes, visit);
            walk_expr(&assign.value, scopes, visit);
        }
        ast::Stmt::AnnAssign(assign) => {
            walk_expr(&assign.target, scopes, visit);
            walk_expr(&assign.annotation, scopes, visit);
            if let Some(value) = &assign.value {
                walk_expr(value, scopes, visit);
            }
        }
        ast::Stmt::For(stmt_for) => {
            walk_expr(&stmt_for.target, scopes, visit);
            walk_expr(&stmt_for.iter, scopes, visit);
            walk_body(&stmt_for.body, scopes, visit);
            walk_body(&stmt_for.orelse, scopes, visit);
        }
        ast::Stmt::AsyncFor(stmt_for) => {
            walk_expr(&stmt_for.target, scopes, visit);
            walk_expr(&stmt_for.iter, scopes, visit);
            walk_body(&stmt_for.body, scopes, visit);
            walk_body(&stmt_for.orelse, scopes, visit);
        }
        ast::Stmt::While(stmt_while) => {
            walk_expr(&stmt_while.test, scopes, visit);
            walk_body(&stmt_while.body, scopes, visit);
            walk_body(&stmt_while.orelse, scopes, visit);
        }
        ast::Stmt::If(stmt_if) => {
            walk_expr(&stmt_if.test, scopes, visit);
            walk_body(&stmt_if.body, scopes, visit);
            walk_body(&stmt_if.orelse, scopes, visit);
        }
        ast::Stmt::With(stmt_with) => {
            for item in &stmt_with.items {
                walk_expr(&item.context_expr, scopes, visit);
                if let Some(optional_vars) = &item.optional_vars {
                    walk_expr(optional_vars, scopes, visit);
                }
            }
            walk_body(&stmt_with.body, scopes, visit);
        }
        ast::Stmt::AsyncWith(stmt_with) => {
            for item in &stmt_with.items {
                walk_expr(&item.context_expr, scopes, visit);
                if let Some(optional_vars) = &item.optional_vars {
                    walk_expr(optional_vars, scopes, visit);
                }
            }
            walk_body(&stmt_with.body, scopes, visit);
        }
        ast::Stmt::Match(stmt_match) => {
            walk_expr(&stmt_match.subject, scopes, visit);
            for case in &stmt_match.cases {
                if let Some(guard) = &case.guard {
                    walk_expr(guard, scopes, visit);
                }
                walk_body(&case.body, scopes, visit);
            }
        }
        ast::Stmt::Raise(raise) => {
            if let Some(exc) = &raise.exc {
                walk_expr(exc, scopes, visit);
            }
            if let Some(cause) = &raise.cause {
                walk_expr(cause, scopes, visit);
            }
        }
        ast::Stmt::Try(stmt_try) => {
            walk_body(&stmt_try.body, scopes, visit);
            for handler in &stmt_try.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                if let Some(type_) = &handler.type_ {
                    walk_expr(type_, scopes, visit);
                }
                walk_body(&handler.body, scopes, visit);
            }
            walk_body(&stmt_try.orelse, scopes, visit);
            walk_body(&stmt_try.finalbody, scopes, visit);
        }
        ast::Stmt::TryStar(stmt_try) => {
            walk_body(&stmt_try.body, scopes, visit);
            for handler in &stmt_try.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                if let Some(type_) = &handler.type_ {
                    walk_expr(type_, scopes, visit);
                }
                walk_body(&handler.body, scopes, visit);
            }
            walk_body(&stmt_try.orelse, scopes, visit);
            walk_body(&stmt_try.finalbody, scopes, visit);
        }
        ast::Stmt::Assert(assert) => {
            walk_expr(&assert.test, scopes, visit);
            if let Some(msg) = &assert.msg {
                walk_expr(msg, scopes, visit);
            }
        }
        ast::Stmt::Expr(expr_stmt) => {
            walk_expr(&expr_stmt.value, scopes, visit);
        }
        // Import, ImportFrom, Global, Nonlocal, Pass, Break, Continue, and
        // any newer statement forms carry no expressions we inspect.
        _ => {}
    }
}

fn walk_expr<'a>(
    expr: &'a ast::Expr,
    scopes: &mut ScopeStack,
    visit: &mut dyn FnMut(Node<'a>, &ScopeStack),
) {
    visit(Node::Expr(expr), scopes);
    match expr {
        ast::Expr::BoolOp(e) => {
            for value in &e.values {
                walk_expr(value, scopes, visit);
            }
        }
        ast::Expr::NamedExpr(e) => {
            walk_expr(&e.target, scopes, visit);
            walk_expr(&e.value, scopes, visit);
        }
        ast::Expr::BinOp(e) => {
            walk_expr(&e.left, scopes, visit);
            walk_expr(&e.right, scopes, visit);
        }
        ast::Expr::UnaryOp(e) => {
            walk_expr(&e.operand, scopes, visit);
        }
        ast::Expr::Lambda(e) => {
            walk_arg_defaults(&e.args, scopes, visit);
            walk_expr(&e.body, scopes, visit);
        }
        ast::Expr::IfExp(e) => {
            walk_expr(&e.test, scopes, visit);
            walk_expr(&e.body, scopes, visit);
            walk_expr(&e.orelse, scopes, visit);
        }
        ast::Expr::Dict(e) => {
            for key in e.keys.iter().flatten() {
                walk_expr(key, scopes, visit);
            }
            for value in &e.values {
                walk_expr(value, scopes, visit);
            }
        }
        ast::Expr::Set(e) => {
            for elt in &e.elts {
                walk_expr(elt, scopes, visit);
            }
        }
        ast::Expr::ListComp(e) => {
            walk_expr(&e.elt, scopes, visit);
            walk_comprehensions(&e.generators, scopes, visit);
        }
        ast::Expr::SetComp(e) => {
            walk_expr(&e.elt, scopes, visit);
            walk_comprehensions(&e.generators, scopes, visit);
        }
        ast::Expr::DictComp(e) => {
            walk_expr(&e.key, scopes, visit);
            walk_expr(&e.value, scopes, visit);
            walk_comprehensions(&e.generators, scopes, visit);
        }
        ast::Expr::GeneratorExp(e) => {
            walk_expr(&e.elt, scopes, visit);
            walk_comprehensions(&e.generators, scopes, visit);
        }
        ast::Expr::Await(e) => {
            walk_expr(&e.value, scopes, visit);
        }
        ast::Expr::Yield(e) => {
            if let Some(value) = &e.value {
                walk_expr(value, scopes, visit);
            }
        }
        ast::Expr::YieldFrom(e) => {
            walk_expr(&e.value, scopes, visit);
        }
        ast::Expr::Compare(e) => {
            walk_expr(&e.left, scopes, visit);
            for comparator in &e.comparators {
                walk_expr(comparator, scopes, visit);
            }
        }
        ast::Expr::Call(e) => {
            walk_expr(&e.func, scopes, visit);
            for arg in &e.args {
                walk_expr(arg, scopes, visit);
            }
            for keyword in &e.keywords {
                walk_expr(&keyword.value, scopes, visit);
            }
        }
        ast::Expr::FormattedValue(e) => {
            walk_expr(&e.value, scopes, visit);
            if let Some(format_spec) = &e.format_spec {
                walk_expr(format_spec, scopes, visit);
            }
        }
        ast::Expr::JoinedStr(e) => {
            for value in &e.values {
                walk_expr(value, scopes, visit);
            }
        }
        ast::Expr::Attribute(e) => {
            walk_expr(&e.value, scopes, visit);
        }
        ast::Expr::Subscript(e) => {
            walk_expr(&e.value, scopes, visit);
            walk_expr(&e.slice, scopes, visit);
        }
        ast::Expr::Starred(e) => {
            walk_expr(&e.value, scopes, visit);
        }
        ast::Expr::List(e) => {
            for elt in &e.elts {
                walk_expr(elt, scopes, visit);
            }
        }
        ast::Expr::Tuple(e) => {
            for elt in &e.elts {
                walk_expr(elt, scopes, visit);
            }
        }
        ast::Expr::Slice(e) => {
            if let Some(lower) = &e.lower {
                walk_expr(lower, scopes, visit);
            }
            if let Some(upper) = &e.upper {
                walk_expr(upper, scopes, visit);
            }
            if let Some(step) = &e.step {
                walk_expr(step, scopes, visit);
            }
        }
        // Name and Constant are leaves.
        _ => {}
    }
}

/// Parameter defaults evaluate once, in the scope enclosing the `def`.
fn walk_arg_defaults<'a>(
    args: &'a ast::Arguments,
    scopes: &mut ScopeStack,
    visit: &mut dyn FnMut(Node<'a>, &ScopeStack),
) {
    for arg in args
        .posonlyargs
        .iter()
        .chain(args.args.iter())
        .chain(args.kwonlyargs.iter())
    {
        if let Some(default) = &arg.default {
            walk_expr(default, scopes, visit);
        }
    }
}

fn walk_comprehensions<'a>(
    generators: &'a [ast::Comprehension],
    scopes: &mut ScopeStack,
    visit: &mut dyn FnMut(Node<'a>, &ScopeStack),
) {
    for generator in generators {
        walk_expr(&generator.target, scopes, visit);
        walk_expr(&generator.iter, scopes, visit);
        for if_clause in &generator.ifs {
            walk_expr(if_clause, scopes, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_parser::{ast, Parse};

    fn parse(code: &str) -> Vec<ast::Stmt> {
        ast::Suite::parse(code, "<test>").expect("fixture parses")
    }

    #[test]
    fn test_scope_stack_tracks_nesting() {
        let suite = parse(
            r#"
x = 1

def outer():
    y = 2
    def inner():
        z = 3

class Config:
    retries = 5
"#,
        );

        let mut module_assigns = 0;
        let mut function_assigns = 0;
        let mut class_assigns = 0;
        walk(&suite, &mut |node, scopes| {
            if let Node::Stmt(ast::Stmt::Assign(_)) = node {
                match scopes.current() {
                    ScopeKind::Module => module_assigns += 1,
                    ScopeKind::Function => function_assigns += 1,
                    ScopeKind::Class => class_assigns += 1,
                }
            }
        });
        assert_eq!(module_assigns, 1);
        assert_eq!(function_assigns, 2);
        assert_eq!(class_assigns, 1);
    }

    #[test]
    fn test_scope_body_events() {
        let suite = parse("def f():\n    pass\n");
        let mut kinds = Vec::new();
        walk(&suite, &mut |node, _| {
            if let Node::ScopeBody { kind, .. } = node {
                kinds.push(kind);
            }
        });
        assert_eq!(kinds, vec![ScopeKind::Module, ScopeKind::Function]);
    }

    #[test]
    fn test_exprs_in_stmt_same_scope_skips_nested_defs() {
        let suite = parse(
            r#"
if ready:
    a = fetch()
    def inner():
        b = hidden()
"#,
        );
        let outer = &suite[0];
        let mut call_names = Vec::new();
        exprs_in_stmt(outer, true, &mut |expr| {
            if let ast::Expr::Call(call) = expr {
                if let ast::Expr::Name(name) = call.func.as_ref() {
                    call_names.push(name.id.as_str().to_string());
                }
            }
        });
        assert_eq!(call_names, vec!["fetch".to_string()]);
    }

    #[test]
    fn test_parameter_defaults_visited_in_enclosing_scope() {
        let suite = parse("def greet(name=fetch_default()):\n    pass\n");
        let mut call_names = Vec::new();
        exprs_in_stmt(&suite[0], true, &mut |expr| {
            if let ast::Expr::Call(call) = expr {
                if let ast::Expr::Name(name) = call.func.as_ref() {
                    call_names.push(name.id.as_str().to_string());
                }
            }
        });
        assert_eq!(call_names, vec!["fetch_default".to_string()]);
    }

    #[test]
    fn test_for_each_expr_descends_calls() {
        let suite = parse("x = clean(input('? '))\n");
        let ast::Stmt::Assign(assign) = &suite[0] else {
            panic!("expected assignment");
        };
        let mut calls = 0;
        for_each_expr(&assign.value, &mut |expr| {
            if matches!(expr, ast::Expr::Call(_)) {
                calls += 1;
            }
        });
        assert_eq!(calls, 2);
    }
}
