//! Recursive-descent parser for the Lox grammar.
//!
//! Consumes the scanner's token list through a monotonic cursor and produces
//! statement trees. Precedence is encoded in the call chain (lowest first):
//!
//! ```text
//! expression = assignment
//! assignment = (call ".")? IDENT "=" assignment | logic_or
//! logic_or   = logic_and ("or" logic_and)*
//! logic_and  = equality ("and" equality)*
//! equality   = comparison (("!=" | "==") comparison)*
//! comparison = term ((">" | ">=" | "<" | "<=") term)*
//! term       = factor (("-" | "+") factor)*
//! factor     = unary (("/" | "*") unary)*
//! unary      = ("!" | "-") unary | call
//! call       = primary ("(" arguments? ")" | "." IDENT)*
//! ```
//!
//! A parser really has two jobs: turn a valid token sequence into a tree, and
//! report every mistake in an invalid one. Errors are reported through the
//! shared [`Reporter`]; panic-mode recovery then skips to the next statement
//! boundary so a single run can surface multiple diagnostics.
//!
//! `for` loops never reach the resolver or interpreter: they are rewritten
//! here into an initializer block wrapping a `while` loop.

use log::{debug, info};

use crate::error::Reporter;
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use std::rc::Rc;

/// Sentinel raised inside the parser to trigger panic-mode recovery.
/// Never escapes [`Parser::parse`]; the reporter carries the diagnostics.
struct ParseError;

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,
    loop_depth: usize,
    reporter: &'r mut Reporter,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, reporter: &'r mut Reporter) -> Self {
        let mut tokens = tokens;

        // The grammar relies on a terminating EOF token; synthesize one if
        // the scanner bailed out before producing any tokens at all.
        if tokens.is_empty() {
            tokens.push(Token::new(TokenType::EOF, String::new(), 1));
        }

        Parser {
            tokens,
            current: 0,
            loop_depth: 0,
            reporter,
        }
    }

    /// Parse the whole program. Statements that failed to parse are skipped;
    /// check the reporter's flag before executing the result.
    pub fn parse(&mut self) -> Vec<Stmt> {
        info!("Parsing {} token(s)", self.tokens.len());

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        statements
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Declarations and statements
    // ─────────────────────────────────────────────────────────────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_tokens(&[TokenType::CLASS]) {
            self.class_declaration()
        } else if self.match_tokens(&[TokenType::FUN]) {
            self.function("function").map(Stmt::Function)
        } else if self.match_tokens(&[TokenType::VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(_) => {
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        // One or more comma-separated superclasses after '<'.
        let mut superclasses: Vec<Expr> = Vec::new();
        if self.match_tokens(&[TokenType::LESS]) {
            loop {
                let superclass = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;

                superclasses.push(Expr::Variable {
                    id: self.make_id(),
                    name: superclass,
                });

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclasses,
            methods,
        })
    }

    /// `kind` is "function" or "method"; it only changes the error messages.
    fn function(&mut self, kind: &str) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.consume(TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= 255 {
                    // Reported but not fatal; parsing continues in place.
                    let token = self.peek().clone();
                    self.error(token, "Can't have more than 255 parameters.");
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.match_tokens(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_tokens(&[TokenType::FOR]) {
            return self.for_statement();
        }

        if self.match_tokens(&[TokenType::IF]) {
            return self.if_statement();
        }

        if self.match_tokens(&[TokenType::WHILE]) {
            return self.while_statement();
        }

        if self.match_tokens(&[TokenType::BREAK]) {
            return self.break_statement();
        }

        if self.match_tokens(&[TokenType::PRINT]) {
            return self.print_statement();
        }

        if self.match_tokens(&[TokenType::RETURN]) {
            return self.return_statement();
        }

        if self.match_tokens(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block()?));
        }

        self.expression_statement()
    }

    /// `for (init; cond; incr) body` has no tree shape of its own; it becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.match_tokens(&[TokenType::SEMICOLON]) {
            None
        } else if self.match_tokens(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(&TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        let paren = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        let mut body = body?;

        // Trailing increment runs after each iteration of the body.
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        // A missing condition is an infinite loop.
        let condition = condition.unwrap_or_else(|| {
            Expr::Literal(Token::new(TokenType::TRUE, "true".to_string(), paren.line))
        });

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        // 'else' binds to the nearest 'if'.
        let then_branch = Box::new(self.statement()?);

        let else_branch: Option<Box<Stmt>> = if self.match_tokens(&[TokenType::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        Ok(Stmt::While {
            condition,
            body: Box::new(body?),
        })
    }

    fn break_statement(&mut self) -> ParseResult<Stmt> {
        if self.loop_depth == 0 {
            let keyword = self.previous().clone();
            self.error(keyword, "Must be inside a loop to use 'break'.");
        }

        self.consume(TokenType::SEMICOLON, "Expect ';' after 'break'.")?;

        Ok(Stmt::Break)
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let value = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value: Option<Expr> = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.match_tokens(&[TokenType::EQUAL]) {
            let equals = self.previous().clone();

            // Right-recursive: `a = b = c` is `a = (b = c)`.
            let value = self.assignment()?;

            return Ok(match expr {
                // A plain variable read becomes an assignment target.
                Expr::Variable { id, name } => Expr::Assign {
                    id,
                    name,
                    value: Box::new(value),
                },

                // A property read becomes a property write.
                Expr::Get { object, name } => Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                },

                other => {
                    self.error(equals, "Invalid assignment target.");
                    other
                }
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while self.match_tokens(&[TokenType::OR]) {
            let operator = self.previous().clone();
            let right = self.and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.match_tokens(&[TokenType::AND]) {
            let operator = self.previous().clone();
            let right = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while self.match_tokens(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while self.match_tokens(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while self.match_tokens(&[TokenType::MINUS, TokenType::PLUS]) {
            let operator = self.previous().clone();
            let right = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while self.match_tokens(&[TokenType::SLASH, TokenType::STAR]) {
            let operator = self.previous().clone();
            let right = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_tokens(&[TokenType::BANG, TokenType::MINUS]) {
            let operator = self.previous().clone();
            let right = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_tokens(&[TokenType::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tokens(&[TokenType::DOT]) {
                let name =
                    self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= 255 {
                    let token = self.peek().clone();
                    self.error(token, "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.match_tokens(&[
            TokenType::NUMBER(0.0),
            TokenType::STRING(String::new()),
            TokenType::TRUE,
            TokenType::FALSE,
            TokenType::NIL,
        ]) {
            return Ok(Expr::Literal(self.previous().clone()));
        }

        if self.match_tokens(&[TokenType::SUPER]) {
            let keyword = self.previous().clone();

            self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenType::IDENTIFIER, "Expect superclass method name.")?;

            return Ok(Expr::Super {
                id: self.make_id(),
                keyword,
                method,
            });
        }

        if self.match_tokens(&[TokenType::THIS]) {
            return Ok(Expr::This {
                id: self.make_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: self.make_id(),
                name: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::LEFT_PAREN]) {
            let expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        // Error productions: a binary operator with no left operand. Report,
        // then swallow the right operand via the matching production so the
        // cursor lands on a sane boundary. The swallowed operand stands in as
        // the recovery expression; the error flag keeps it from running.
        if self.match_tokens(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator = self.previous().clone();
            self.error(operator, "Missing left-hand operand.");
            return self.equality();
        }

        if self.match_tokens(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator = self.previous().clone();
            self.error(operator, "Missing left-hand operand.");
            return self.comparison();
        }

        if self.match_tokens(&[TokenType::PLUS]) {
            let operator = self.previous().clone();
            self.error(operator, "Missing left-hand operand.");
            return self.term();
        }

        if self.match_tokens(&[TokenType::SLASH, TokenType::STAR]) {
            let operator = self.previous().clone();
            self.error(operator, "Missing left-hand operand.");
            return self.factor();
        }

        let token = self.peek().clone();
        Err(self.error(token, "Expect expression."))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cursor helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn match_tokens(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }

        false
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<Token> {
        if self.check(&token_type) {
            return Ok(self.advance().clone());
        }

        let token = self.peek().clone();
        Err(self.error(token, message))
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        &self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn make_id(&mut self) -> ExprId {
        crate::expr::next_expr_id()
    }

    /// Report a diagnostic and hand back the recovery sentinel. Callers that
    /// can continue in place simply drop the sentinel.
    fn error(&mut self, token: Token, message: &str) -> ParseError {
        self.reporter.error_at(&token, message);
        ParseError
    }

    /// Panic-mode recovery: discard tokens until a statement boundary, i.e.
    /// just past a ';' or in front of a keyword that begins a declaration.
    fn synchronize(&mut self) {
        debug!("Synchronizing after parse error at line {}", self.peek().line);

        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,

                _ => {}
            }

            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_printer::Ast;
    use crate::scanner::Scanner;

    fn parse_source(source: &str) -> (Vec<Stmt>, usize) {
        let mut reporter = Reporter::new();
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();

        let mut parser = Parser::new(tokens, &mut reporter);
        let statements = parser.parse();

        (statements, reporter.error_count())
    }

    fn parse_expr(source: &str) -> String {
        let (statements, errors) = parse_source(source);
        assert_eq!(errors, 0, "unexpected parse errors in {:?}", source);

        match &statements[0] {
            Stmt::Expression(expr) | Stmt::Print(expr) => Ast.print(expr),
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(parse_expr("1 + 2 * 3;"), "(+ 1 (* 2 3))");
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        assert_eq!(parse_expr("-a + b;"), "(+ (- a) b)");
    }

    #[test]
    fn comparison_binds_tighter_than_equality() {
        assert_eq!(parse_expr("a < b == c < d;"), "(== (< a b) (< c d))");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(parse_expr("a or b and c;"), "(or a (and b c))");
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(parse_expr("a - b - c;"), "(- (- a b) c)");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(parse_expr("a = b = c;"), "(= a (= b c))");
    }

    #[test]
    fn property_assignment_becomes_set() {
        assert_eq!(parse_expr("a.b.c = 1;"), "(= (. (. a b) c) 1)");
    }

    #[test]
    fn super_call_parses() {
        assert_eq!(parse_expr("super.cook();"), "(call (super cook))");
    }

    #[test]
    fn for_desugars_to_while() {
        let (statements, errors) = parse_source("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(errors, 0);
        assert_eq!(statements.len(), 1);

        // { var i; while (i < 3) { print i; i = i + 1; } }
        let outer = match &statements[0] {
            Stmt::Block(stmts) => stmts,
            other => panic!("expected block, got {:?}", other),
        };
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let body = match &outer[1] {
            Stmt::While { body, .. } => body,
            other => panic!("expected while, got {:?}", other),
        };
        match &**body {
            Stmt::Block(stmts) => {
                assert!(matches!(stmts[0], Stmt::Print(_)));
                assert!(matches!(stmts[1], Stmt::Expression(_)));
            }
            other => panic!("expected block body, got {:?}", other),
        }
    }

    #[test]
    fn for_without_condition_loops_on_true() {
        let (statements, errors) = parse_source("for (;;) break;");
        assert_eq!(errors, 0);

        match &statements[0] {
            Stmt::While { condition, .. } => {
                assert_eq!(Ast.print(condition), "true");
            }
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let (_, errors) = parse_source("break;");
        assert_eq!(errors, 1);

        let (_, errors) = parse_source("while (true) break;");
        assert_eq!(errors, 0);
    }

    #[test]
    fn invalid_assignment_target_is_reported() {
        let (_, errors) = parse_source("a + b = c;");
        assert_eq!(errors, 1);
    }

    #[test]
    fn missing_left_operand_is_reported_and_swallowed() {
        let (_, errors) = parse_source("== 2;");
        assert_eq!(errors, 1);
    }

    #[test]
    fn one_error_per_bad_statement() {
        let (_, errors) = parse_source("var 1 = 2;\nprint;\nvar ok = 3;");
        assert_eq!(errors, 2);
    }

    #[test]
    fn argument_cap_is_reported() {
        let args: Vec<String> = (0..256).map(|n| n.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let (_, errors) = parse_source(&source);
        assert_eq!(errors, 1);
    }

    #[test]
    fn class_accepts_multiple_superclasses() {
        let (statements, errors) = parse_source("class A < B, C { }");
        assert_eq!(errors, 0);

        match &statements[0] {
            Stmt::Class { superclasses, .. } => assert_eq!(superclasses.len(), 2),
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn distinct_variable_nodes_get_distinct_ids() {
        let (statements, _) = parse_source("a + a;");

        let expr = match &statements[0] {
            Stmt::Expression(expr) => expr,
            other => panic!("expected expression, got {:?}", other),
        };

        match expr {
            Expr::Binary { left, right, .. } => match (&**left, &**right) {
                (Expr::Variable { id: l, .. }, Expr::Variable { id: r, .. }) => {
                    assert_ne!(l, r);
                }
                other => panic!("expected variables, got {:?}", other),
            },
            other => panic!("expected binary, got {:?}", other),
        }
    }
}
