//! User function objects.
//!
//! A `LoxFunction` pairs a shared declaration with the environment it was
//! defined in. The call protocol itself lives in the interpreter; this module
//! only owns the data and the `this`-binding operation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::{EnvRef, Environment};
use crate::stmt::FunctionDecl;
use crate::value::Value;

pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
    /// Initializers (`init` methods) always yield the instance.
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy of this function whose closure has `this` bound to the
    /// given instance, one frame inside the original closure.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let mut environment = Environment::with_enclosing(self.closure.clone());
        environment.define("this", instance);

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

// The closure chain can be cyclic (a class environment holds methods whose
// closures point back at it), so Debug must not recurse into it.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}
