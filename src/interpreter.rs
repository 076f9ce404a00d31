//! Tree-walk evaluator.
//!
//! Owns the globals frame (preloaded with the native functions), the current
//! environment pointer, and the resolution map produced by the resolver.
//! Statement execution and expression evaluation dispatch on the tree shape;
//! `return` and `break` travel as [`Unwind`] values and are caught exactly at
//! their targets, never anywhere else.

use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::function::LoxFunction;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

/// Non-local control flow raised during evaluation.
///
/// `Break` unwinds to the nearest enclosing `While`, `Return` to the
/// enclosing call; `Error` is a genuine runtime error headed for the top.
pub(crate) enum Unwind {
    Break,
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(error: LoxError) -> Self {
        Unwind::Error(error)
    }
}

type Exec = Result<(), Unwind>;
type Eval = Result<Value, Unwind>;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
}

impl Interpreter {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to the given writer. Tests inject a buffer here.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a resolved binding distance. Called by the resolver.
    pub(crate) fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    #[cfg(test)]
    pub(crate) fn locals(&self) -> &HashMap<ExprId, usize> {
        &self.locals
    }

    /// Execute a resolved program. The first runtime error aborts execution
    /// and is returned for the driver to report.
    pub fn interpret(&mut self, statements: &[Stmt]) -> crate::error::Result<()> {
        for statement in statements {
            if let Err(unwind) = self.execute(statement) {
                return Err(into_runtime_error(unwind));
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement execution
    // ─────────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Exec {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(LoxError::Io)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(environment)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body) {
                        Ok(()) => {}

                        // `break` terminates exactly this loop.
                        Err(Unwind::Break) => break,

                        Err(other) => return Err(other),
                    }
                }

                Ok(())
            }

            Stmt::Break => Err(Unwind::Break),

            Stmt::Function(declaration) => {
                // The closure is the environment at declaration time.
                let function =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclasses,
                methods,
            } => self.execute_class(name, superclasses, methods),
        }
    }

    /// Run statements in the given environment, restoring the previous one on
    /// every exit path: normal completion, break, return, runtime error.
    fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Exec {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass_exprs: &[Expr],
        methods: &[Rc<FunctionDecl>],
    ) -> Exec {
        let mut superclasses: Vec<Rc<LoxClass>> = Vec::new();

        for superclass in superclass_exprs {
            match self.evaluate(superclass)? {
                Value::Class(class) => superclasses.push(class),

                _ => {
                    let line = match superclass {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };

                    return Err(LoxError::runtime(line, "Superclass must be a class.").into());
                }
            }
        }

        // The name exists (as nil) while the methods are built, so they can
        // refer to the class being declared.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        // With superclasses, methods close over an extra frame holding
        // `super` bound to the first superclass.
        let previous: Option<EnvRef> = if superclasses.is_empty() {
            None
        } else {
            let previous = self.environment.clone();

            let mut environment = Environment::with_enclosing(previous.clone());
            environment.define("super", Value::Class(superclasses[0].clone()));

            self.environment = Rc::new(RefCell::new(environment));
            Some(previous)
        };

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for declaration in methods {
            let is_initializer = declaration.name.lexeme == "init";

            let function =
                LoxFunction::new(declaration.clone(), self.environment.clone(), is_initializer);

            method_map.insert(declaration.name.lexeme.clone(), Rc::new(function));
        }

        let class = Value::Class(Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclasses,
            method_map,
        )));

        if let Some(previous) = previous {
            self.environment = previous;
        }

        self.environment.borrow_mut().assign(&name.lexeme, class);

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression evaluation
    // ─────────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Eval {
        match expr {
            Expr::Literal(token) => evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                let assigned = if let Some(&distance) = self.locals.get(id) {
                    Environment::assign_at(&self.environment, distance, &name.lexeme, value.clone())
                } else {
                    self.globals.borrow_mut().assign(&name.lexeme, value.clone())
                };

                if !assigned {
                    return Err(undefined_variable(name));
                }

                // The assignment expression's value is its right-hand side.
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee_val, args, paren)
            }

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => self.evaluate_set(object, name, value),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> Eval {
        let value: Value = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(op.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(op.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Eval {
        // Strict left-to-right evaluation.
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            // Division follows IEEE-754; dividing by zero yields an infinity.
            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            _ => Err(LoxError::runtime(op.line, "Invalid binary operator.").into()),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Eval {
        let left_val: Value = self.evaluate(left)?;

        match op.token_type {
            // Short-circuit: the right operand only runs when needed, and
            // the result is whichever operand decided the outcome.
            TokenType::OR => {
                if is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                if !is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            _ => Err(LoxError::runtime(op.line, "Invalid logical operator.").into()),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Eval {
        let value: Option<Value> = if let Some(&distance) = self.locals.get(&id) {
            Environment::get_at(&self.environment, distance, &name.lexeme)
        } else {
            self.globals.borrow().get(&name.lexeme)
        };

        value.ok_or_else(|| undefined_variable(name))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls, properties, super
    // ─────────────────────────────────────────────────────────────────────────

    fn call_value(&mut self, callee: Value, arguments: Vec<Value>, paren: &Token) -> Eval {
        match callee {
            Value::NativeFunction { arity, func, name } => {
                debug!("Calling native function '{}'", name);

                check_arity(arity, arguments.len(), paren)?;

                func(&arguments).map_err(|msg| LoxError::runtime(paren.line, msg).into())
            }

            Value::Function(function) => {
                debug!("Calling function '{}'", function.name());

                check_arity(function.arity(), arguments.len(), paren)?;

                self.call_function(&function, arguments)
            }

            Value::Class(class) => {
                debug!("Constructing instance of '{}'", class.name);

                check_arity(class.arity(), arguments.len(), paren)?;

                self.construct(&class, arguments)
            }

            _ => Err(LoxError::runtime(paren.line, "Can only call functions and classes.").into()),
        }
    }

    /// The call protocol: fresh frame under the closure, parameters bound in
    /// order, body run as a block. A `Return` unwind caught here yields the
    /// carried value; initializers always yield their instance.
    fn call_function(&mut self, function: &LoxFunction, arguments: Vec<Value>) -> Eval {
        let mut environment = Environment::with_enclosing(function.closure.clone());

        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let environment = Rc::new(RefCell::new(environment));

        match self.execute_block(&function.declaration.body, environment) {
            Ok(()) => {
                if function.is_initializer {
                    initializer_instance(function)
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Unwind::Return(value)) => {
                if function.is_initializer {
                    initializer_instance(function)
                } else {
                    Ok(value)
                }
            }

            Err(other) => Err(other),
        }
    }

    fn construct(&mut self, class: &Rc<LoxClass>, arguments: Vec<Value>) -> Eval {
        let instance = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(class.clone()))));

        if let Some(initializer) = class.find_method("init") {
            let bound = initializer.bind(instance.clone());
            self.call_function(&bound, arguments)?;
        }

        Ok(instance)
    }

    fn evaluate_get(&mut self, object: &Expr, name: &Token) -> Eval {
        let object = self.evaluate(object)?;

        match object {
            Value::Instance(instance) => {
                // Fields shadow methods.
                let field = instance.borrow().get_field(&name.lexeme);
                if let Some(value) = field {
                    return Ok(value);
                }

                let method = instance.borrow().class().find_method(&name.lexeme);
                if let Some(method) = method {
                    let bound = method.bind(Value::Instance(instance.clone()));
                    return Ok(Value::Function(Rc::new(bound)));
                }

                Err(LoxError::runtime(
                    name.line,
                    format!("Undefined property '{}'.", name.lexeme),
                )
                .into())
            }

            _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
        }
    }

    fn evaluate_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> Eval {
        let object = self.evaluate(object)?;

        match object {
            Value::Instance(instance) => {
                let value = self.evaluate(value)?;

                instance.borrow_mut().set_field(&name.lexeme, value.clone());

                Ok(value)
            }

            _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Eval {
        // The resolver bound `super` at a known depth, with `this` one frame
        // closer in the bound-method environment.
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) => distance,
            None => return Err(undefined_variable(keyword)),
        };

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(undefined_variable(keyword)),
        };

        let object = match Environment::get_at(&self.environment, distance - 1, "this") {
            Some(value) => value,
            None => return Err(undefined_variable(keyword)),
        };

        let method_fn = superclass.find_method(&method.lexeme).ok_or_else(|| {
            Unwind::from(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            ))
        })?;

        Ok(Value::Function(Rc::new(method_fn.bind(object))))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Free helpers
// ─────────────────────────────────────────────────────────────────────────────

fn evaluate_literal(token: &Token) -> Eval {
    match &token.token_type {
        TokenType::NUMBER(n) => Ok(Value::Number(*n)),

        TokenType::STRING(s) => Ok(Value::String(s.clone())),

        TokenType::TRUE => Ok(Value::Bool(true)),

        TokenType::FALSE => Ok(Value::Bool(false)),

        TokenType::NIL => Ok(Value::Nil),

        _ => Err(LoxError::runtime(token.line, "Invalid literal.").into()),
    }
}

/// `false` and `nil` are falsy; every other value is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<(), Unwind> {
    if expected != got {
        return Err(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, got),
        )
        .into());
    }

    Ok(())
}

fn undefined_variable(name: &Token) -> Unwind {
    Unwind::from(LoxError::runtime(
        name.line,
        format!("Undefined variable '{}'.", name.lexeme),
    ))
}

/// A bound initializer keeps `this` at depth 0 of its closure; that instance
/// is the call's result no matter how the body exited.
fn initializer_instance(function: &LoxFunction) -> Eval {
    match Environment::get_at(&function.closure, 0, "this") {
        Some(value) => Ok(value),

        None => Err(LoxError::runtime(
            function.declaration.name.line,
            "Initializer lost its instance.",
        )
        .into()),
    }
}

fn into_runtime_error(unwind: Unwind) -> LoxError {
    match unwind {
        Unwind::Error(error) => error,

        // The parser rejects stray `break` and the resolver stray `return`,
        // so a signal reaching the top is an interpreter bug.
        Unwind::Break | Unwind::Return(_) => {
            LoxError::runtime(0, "Control-flow signal escaped its target.")
        }
    }
}

fn clock_native(_args: &[Value]) -> Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_projects_false_and_nil_only() {
        assert!(!is_truthy(&Value::Nil));
        assert!(!is_truthy(&Value::Bool(false)));

        assert!(is_truthy(&Value::Bool(true)));
        assert!(is_truthy(&Value::Number(0.0)));
        assert!(is_truthy(&Value::String(String::new())));
    }

    #[test]
    fn clock_returns_a_number() {
        assert!(matches!(clock_native(&[]), Ok(Value::Number(_))));
    }
}
