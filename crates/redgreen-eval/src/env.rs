//! Lexical scope chain for the evaluator.
//!
//! Scopes are reference-counted so closures can keep their defining scope
//! alive. `var` declarations land in the nearest function scope; `let`,
//! `const` and function declarations land in the current scope.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::{release, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Global scope or a function body: the target of `var`.
    Function,
    /// Block, loop or catch scope.
    Block,
}

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug)]
struct Scope {
    bindings: RefCell<BTreeMap<String, Binding>>,
    parent: Option<Env>,
    kind: ScopeKind,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let bindings = std::mem::take(self.bindings.get_mut());
        if !bindings.is_empty() {
            release(bindings.into_values().map(|b| b.value).collect());
        }
    }
}

/// Why an assignment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    /// The binding was declared `const`.
    Constant,
}

/// Handle to one scope in the chain.
#[derive(Debug, Clone)]
pub struct Env(Rc<Scope>);

impl Env {
    /// A fresh global scope with no bindings.
    pub fn new_global() -> Self {
        Self(Rc::new(Scope {
            bindings: RefCell::new(BTreeMap::new()),
            parent: None,
            kind: ScopeKind::Function,
        }))
    }

    /// A child scope of `self`.
    pub fn child(&self, kind: ScopeKind) -> Self {
        Self(Rc::new(Scope {
            bindings: RefCell::new(BTreeMap::new()),
            parent: Some(self.clone()),
            kind,
        }))
    }

    /// Define (or redefine) a binding in this scope.
    pub fn define(&self, name: &str, value: Value, mutable: bool) {
        self.0
            .bindings
            .borrow_mut()
            .insert(name.to_string(), Binding { value, mutable });
    }

    /// Hoist a `var` into the nearest function scope, initialised to
    /// `undefined` unless already bound there.
    pub fn declare_var(&self, name: &str) {
        let scope = self.function_scope();
        let mut bindings = scope.0.bindings.borrow_mut();
        bindings.entry(name.to_string()).or_insert(Binding {
            value: Value::Undefined,
            mutable: true,
        });
    }

    /// Look a name up from this scope outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(binding) = env.0.bindings.borrow().get(name) {
                return Some(binding.value.clone());
            }
            scope = env.0.parent.as_ref();
        }
        None
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Assign to the nearest existing binding. An unbound name becomes a
    /// global binding, as in sloppy-mode scripts.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(binding) = env.0.bindings.borrow_mut().get_mut(name) {
                if !binding.mutable {
                    return Err(AssignError::Constant);
                }
                binding.value = value;
                return Ok(());
            }
            scope = env.0.parent.as_ref();
        }
        self.global().define(name, value, true);
        Ok(())
    }

    /// Move this scope's binding values into `out` if nothing else holds the
    /// scope.
    pub(crate) fn detach_bindings(&mut self, out: &mut Vec<Value>) {
        if let Some(scope) = Rc::get_mut(&mut self.0) {
            let bindings = std::mem::take(scope.bindings.get_mut());
            out.extend(bindings.into_values().map(|b| b.value));
        }
    }

    /// Drop every binding in this scope. Closures stored in a scope keep that
    /// scope alive, so the evaluator clears its global scope when dropped.
    pub fn clear(&self) {
        let bindings = std::mem::take(&mut *self.0.bindings.borrow_mut());
        drop(bindings);
    }

    fn function_scope(&self) -> Env {
        let mut env = self.clone();
        while env.0.kind != ScopeKind::Function {
            match env.0.parent.clone() {
                Some(parent) => env = parent,
                None => break,
            }
        }
        env
    }

    fn global(&self) -> Env {
        let mut env = self.clone();
        while let Some(parent) = env.0.parent.clone() {
            env = parent;
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let global = Env::new_global();
        global.define("x", Value::Number(1.0), true);
        let inner = global.child(ScopeKind::Block);
        inner.define("y", Value::Number(2.0), true);
        assert_eq!(inner.get("x"), Some(Value::Number(1.0)));
        assert_eq!(global.get("y"), None);
    }

    #[test]
    fn test_shadowing() {
        let global = Env::new_global();
        global.define("x", Value::Number(1.0), true);
        let inner = global.child(ScopeKind::Block);
        inner.define("x", Value::Number(2.0), true);
        assert_eq!(inner.get("x"), Some(Value::Number(2.0)));
        assert_eq!(global.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_const_rejects_assignment() {
        let env = Env::new_global();
        env.define("c", Value::Number(1.0), false);
        assert_eq!(
            env.assign("c", Value::Number(2.0)),
            Err(AssignError::Constant)
        );
    }

    #[test]
    fn test_var_hoists_to_function_scope() {
        let global = Env::new_global();
        let func = global.child(ScopeKind::Function);
        let block = func.child(ScopeKind::Block);
        block.declare_var("v");
        assert!(func.has("v"));
        assert!(!global.has("v"));
    }

    #[test]
    fn test_unbound_assignment_creates_global() {
        let global = Env::new_global();
        let block = global.child(ScopeKind::Function).child(ScopeKind::Block);
        assert!(block.assign("leak", Value::Bool(true)).is_ok());
        assert_eq!(global.get("leak"), Some(Value::Bool(true)));
    }
}
