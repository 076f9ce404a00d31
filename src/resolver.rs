//! Static resolution pass.
//!
//! This module performs a single AST walk between parsing and execution to:
//! 1. **Build lexical scopes**: maintains a stack of `HashMap<String, bool>`
//!    tracking declared (false) and fully defined (true) names in each nested
//!    block, function body or class body.
//! 2. **Enforce static rules**: reports redeclaration in the same scope,
//!    reading a variable in its own initializer, `return` outside a function,
//!    returning a value from an initializer, and `this`/`super` outside their
//!    legal contexts. Every violation goes through the shared [`Reporter`]
//!    and the walk continues, so one pass surfaces every error.
//! 3. **Record binding distances**: for every `Variable`, `Assign`, `This`
//!    and `Super` occurrence found in some scope, tells the interpreter how
//!    many frames to climb at runtime. Occurrences found in no scope are
//!    globals and record nothing.
//!
//! The pass is idempotent: resolving the same tree twice writes the same
//! (id, depth) entries.

use crate::error::Reporter;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;
use std::rc::Rc;

/// What kind of function body we are inside. Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances by calling back into the interpreter.
pub struct Resolver<'i, 'r> {
    interpreter: &'i mut Interpreter,
    reporter: &'r mut Reporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'i, 'r> Resolver<'i, 'r> {
    pub fn new(interpreter: &'i mut Interpreter, reporter: &'r mut Reporter) -> Self {
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top-level statements. Check the reporter afterwards.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Class {
                name,
                superclasses,
                methods,
            } => self.resolve_class(name, superclasses, methods),

            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declared first so the initializer sees the name as
                // not-yet-defined and `var a = a;` is caught.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Defined immediately to allow recursion.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(FunctionType::Function, declaration);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            // Validity was checked by the parser's loop-depth counter.
            Stmt::Break => {}

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.reporter
                        .error_at(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.reporter
                            .error_at(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(&mut self, name: &Token, superclasses: &[Expr], methods: &[Rc<FunctionDecl>]) {
        // Self-inheritance guard, against every listed superclass.
        for superclass in superclasses {
            if let Expr::Variable {
                name: super_name, ..
            } = superclass
            {
                if super_name.lexeme == name.lexeme {
                    self.reporter
                        .error_at(super_name, "A class can't inherit from itself.");
                }
            }
        }

        // The class name is visible inside its own body.
        self.declare(name);
        self.define(name);

        let enclosing_class = self.current_class;
        self.current_class = if superclasses.is_empty() {
            ClassType::Class
        } else {
            ClassType::Subclass
        };

        for superclass in superclasses {
            self.resolve_expr(superclass);
        }

        // `super` lives in its own scope wrapped around the method scopes.
        if !superclasses.is_empty() {
            self.begin_scope();
            if let Some(scope) = self.scopes.last_mut() {
                scope.insert("super".to_string(), true);
            }
        }

        // Implicit `this` scope for the methods.
        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert("this".to_string(), true);
        }

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(kind, method);
        }

        self.end_scope();

        if !superclasses.is_empty() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // Reading a name whose own initializer is still running.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme.as_str()) == Some(&false) {
                        self.reporter.error_at(
                            name,
                            "Can't read local variable in its own initializer.",
                        );
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => {
                // Properties are looked up dynamically; only the object
                // expression resolves statically.
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.reporter
                        .error_at(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.reporter
                            .error_at(keyword, "Can't use 'super' outside of a class.");
                        return;
                    }

                    ClassType::Class => {
                        self.reporter.error_at(
                            keyword,
                            "Can't use 'super' in a class with no superclass.",
                        );
                        return;
                    }

                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Class and function helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, kind: FunctionType, declaration: &FunctionDecl) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in &declaration.params {
            // declare() flags duplicate parameter names.
            self.declare(param);
            self.define(param);
        }

        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme.as_str()) {
                self.reporter
                    .error_at(name, "Already a variable with this name in this scope.");
            }

            // Declared but not yet defined.
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at the depth of the innermost scope
    /// containing the name. Not found anywhere → global, record nothing.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.resolve(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;
    use crate::token::Token;

    /// Run scanner, parser and resolver; return the depth map and the number
    /// of compile diagnostics.
    fn resolve_source(source: &str) -> (HashMap<ExprId, usize>, usize) {
        let mut reporter = Reporter::new();
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();

        let mut parser = Parser::new(tokens, &mut reporter);
        let statements = parser.parse();
        assert_eq!(reporter.error_count(), 0, "parse errors in {:?}", source);

        let mut interpreter = Interpreter::new();
        let mut resolver = Resolver::new(&mut interpreter, &mut reporter);
        resolver.resolve(&statements);

        (interpreter.locals().clone(), reporter.error_count())
    }

    #[test]
    fn reading_a_variable_in_its_own_initializer_is_an_error() {
        let (_, errors) = resolve_source("var a = 1; { var a = a; }");
        assert_eq!(errors, 1);
    }

    #[test]
    fn redeclaration_in_a_local_scope_is_an_error() {
        let (_, errors) = resolve_source("{ var a = 1; var a = 2; }");
        assert_eq!(errors, 1);

        // Redeclaring a global is allowed.
        let (_, errors) = resolve_source("var a = 1; var a = 2;");
        assert_eq!(errors, 0);
    }

    #[test]
    fn duplicate_parameters_are_an_error() {
        let (_, errors) = resolve_source("fun f(a, a) { }");
        assert_eq!(errors, 1);
    }

    #[test]
    fn return_at_top_level_is_an_error() {
        let (_, errors) = resolve_source("return 1;");
        assert_eq!(errors, 1);
    }

    #[test]
    fn returning_a_value_from_an_initializer_is_an_error() {
        let (_, errors) = resolve_source("class A { init() { return 1; } }");
        assert_eq!(errors, 1);

        // A bare return is fine.
        let (_, errors) = resolve_source("class A { init() { return; } }");
        assert_eq!(errors, 0);
    }

    #[test]
    fn this_outside_a_class_is_an_error() {
        let (_, errors) = resolve_source("print this;");
        assert_eq!(errors, 1);

        let (_, errors) = resolve_source("fun notAMethod() { print this; }");
        assert_eq!(errors, 1);
    }

    #[test]
    fn super_outside_a_subclass_is_an_error() {
        let (_, errors) = resolve_source("fun f() { super.m(); }");
        assert_eq!(errors, 1);

        let (_, errors) = resolve_source("class A { m() { super.m(); } }");
        assert_eq!(errors, 1);

        let (_, errors) = resolve_source("class A { } class B < A { m() { super.m(); } }");
        assert_eq!(errors, 0);
    }

    #[test]
    fn a_class_cannot_inherit_from_itself() {
        let (_, errors) = resolve_source("class A < A { }");
        assert_eq!(errors, 1);
    }

    #[test]
    fn globals_record_no_depth() {
        let (locals, errors) = resolve_source("var a = 1; print a;");
        assert_eq!(errors, 0);
        assert!(locals.is_empty());
    }

    #[test]
    fn locals_record_their_lexical_depth() {
        // `a` is read one block below its declaration.
        let (locals, errors) = resolve_source("{ var a = 1; { print a; } }");
        assert_eq!(errors, 0);
        assert_eq!(locals.len(), 1);
        assert_eq!(locals.values().copied().max(), Some(1));
    }

    #[test]
    fn closures_resolve_through_function_scopes() {
        let (locals, errors) =
            resolve_source("{ var a = 1; fun f() { print a; } }");
        assert_eq!(errors, 0);

        // The read of `a` inside f crosses the function scope: depth 1.
        assert!(locals.values().any(|&depth| depth == 1));
    }

    #[test]
    fn resolving_twice_yields_the_same_map() {
        let source = "{ var a = 1; fun f(b) { print a + b; } f(2); }";

        let mut reporter = Reporter::new();
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();

        let mut parser = Parser::new(tokens, &mut reporter);
        let statements = parser.parse();

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);
        let first = interpreter.locals().clone();

        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);
        let second = interpreter.locals().clone();

        assert_eq!(first, second);
        assert_eq!(reporter.error_count(), 0);
    }
}
