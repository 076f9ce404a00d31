//! Lexical scope frames.
//!
//! An environment is a map of names to values plus a link to its enclosing
//! frame. Frames are shared (`Rc<RefCell<_>>`): a closure and the block that
//! created it both hold the same frame, so assignments made after capture are
//! observed by the closure.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type EnvRef = Rc<RefCell<Environment>>;

pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind a name in this frame, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Read a name, searching outward through enclosing frames.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Overwrite an existing binding, searching outward. Returns false when
    /// the name is not bound anywhere on the chain.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Read a name from exactly `distance` frames up the chain.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
        let frame = Self::ancestor(env, distance)?;
        let value = frame.borrow().values.get(name).cloned();
        value
    }

    /// Write a name exactly `distance` frames up the chain. Returns false
    /// when the chain is shorter than `distance`.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
        match Self::ancestor(env, distance) {
            Some(frame) => {
                frame.borrow_mut().values.insert(name.to_string(), value);
                true
            }

            None => false,
        }
    }

    fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut frame: EnvRef = env.clone();

        for _ in 0..distance {
            let enclosing = frame.borrow().enclosing.clone()?;
            frame = enclosing;
        }

        Some(frame)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("x", Value::Number(1.0));

        assert_eq!(env.get("x"), Some(Value::Number(1.0)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn get_searches_enclosing_frames() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("x", Value::Number(1.0));

        let inner = Environment::with_enclosing(globals.clone());
        assert_eq!(inner.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn assign_updates_the_owning_frame() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("x", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(globals.clone());
        assert!(inner.assign("x", Value::Number(2.0)));
        assert!(!inner.assign("missing", Value::Nil));

        assert_eq!(globals.borrow().get("x"), Some(Value::Number(2.0)));
    }

    #[test]
    fn get_at_walks_exactly_the_requested_distance() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("x", Value::Number(1.0));

        let middle: EnvRef = Rc::new(RefCell::new(Environment::with_enclosing(globals.clone())));
        middle.borrow_mut().define("x", Value::Number(2.0));

        let inner: EnvRef = Rc::new(RefCell::new(Environment::with_enclosing(middle)));

        assert_eq!(
            Environment::get_at(&inner, 1, "x"),
            Some(Value::Number(2.0))
        );
        assert_eq!(
            Environment::get_at(&inner, 2, "x"),
            Some(Value::Number(1.0))
        );
        assert_eq!(Environment::get_at(&inner, 3, "x"), None);
    }
}
