//! Environment for variable scopes
//!
//! Scopes form a chain through parent links. An `Environment` is a cheap
//! handle to one scope; closures keep their defining scope alive by holding
//! such a handle. A function bound in the scope it closes over forms a
//! reference cycle, which `release` breaks once nothing else can reach it.

use crate::parser::error::{OrcaError, Result};
use crate::types::value::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Default)]
struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<Environment>,
}

/// Handle to a scope in the chain
#[derive(Debug, Clone, Default)]
pub struct Environment {
    scope: Rc<RefCell<Scope>>,
}

impl Environment {
    /// Create a new root scope
    pub fn new() -> Self {
        Environment::default()
    }

    /// Create a child scope whose lookups fall through to `self`
    pub fn child(&self) -> Environment {
        Environment {
            scope: Rc::new(RefCell::new(Scope {
                vars: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    pub fn parent(&self) -> Option<Environment> {
        self.scope.borrow().parent.clone()
    }

    /// Define a variable in this scope, shadowing any outer binding
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.scope.borrow_mut().vars.insert(name.into(), value);
    }

    /// Get a variable's value (searches from inner to outer scopes)
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let next = {
                let scope = current.scope.borrow();
                if let Some(value) = scope.vars.get(name) {
                    return Some(value.clone());
                }
                scope.parent.clone()
            };
            current = next?;
        }
    }

    /// Get a variable or fail with an undefined-variable error
    pub fn lookup(&self, name: &str) -> Result<Value> {
        self.get(name)
            .ok_or_else(|| OrcaError::UndefinedVariable(name.to_string()))
    }

    /// Find the nearest scope that binds `name`
    fn owner_of(&self, name: &str) -> Option<Environment> {
        let mut current = self.clone();
        loop {
            if current.scope.borrow().vars.contains_key(name) {
                return Some(current);
            }
            current = current.parent()?;
        }
    }

    /// Rebind `name` where it already lives, or define it here
    pub fn assign(&self, name: &str, value: Value) {
        self.owner_of(name).unwrap_or_else(|| self.clone()).define(name, value);
    }

    /// Check if a variable is defined in any scope
    pub fn is_defined(&self, name: &str) -> bool {
        self.owner_of(name).is_some()
    }

    /// All visible bindings, inner scopes shadowing outer ones, sorted by name
    pub fn all_bindings(&self) -> Vec<(String, Value)> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut current = Some(self.clone());

        while let Some(env) = current {
            let scope = env.scope.borrow();
            for (name, value) in scope.vars.iter() {
                if seen.insert(name.clone()) {
                    result.push((name.clone(), value.clone()));
                }
            }
            current = scope.parent.clone();
        }

        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// Number of scopes in the chain (1 = root only)
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent();
        while let Some(env) = current {
            depth += 1;
            current = env.parent();
        }
        depth
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }

    /// Drop this scope's bindings when the only other references to it come
    /// from functions defined in it that nothing else holds. Returns whether
    /// the bindings were dropped.
    ///
    /// Scopes kept alive from outside (an escaped closure, a child scope)
    /// are left alone.
    pub fn release(&self) -> bool {
        let unreachable = {
            let scope = self.scope.borrow();
            let self_held = scope
                .vars
                .values()
                .filter(|value| match value {
                    Value::Function(function) => {
                        Rc::strong_count(function) == 1 && function.closure.ptr_eq(self)
                    }
                    _ => false,
                })
                .count();
            self_held > 0 && Rc::strong_count(&self.scope) == self_held + 1
        };

        if unreachable {
            // dropped after the borrow ends; each closure handle points back here
            let vars = std::mem::take(&mut self.scope.borrow_mut().vars);
            drop(vars);
        }
        unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Function;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_basic_define_and_get() {
        let env = Environment::new();

        env.define("x", num(1.0));

        assert!(env.is_defined("x"));
        assert!(!env.is_defined("y"));
        assert_eq!(env.get("x"), Some(num(1.0)));
    }

    #[test]
    fn test_scope_shadowing() {
        let env = Environment::new();
        env.define("x", num(1.0));

        let inner = env.child();
        inner.define("x", num(2.0));

        assert_eq!(inner.get("x"), Some(num(2.0)));
        assert_eq!(env.get("x"), Some(num(1.0)));
    }

    #[test]
    fn test_inner_bindings_disappear_with_scope() {
        let env = Environment::new();
        env.define("outer", num(1.0));

        let inner = env.child();
        inner.define("inner", num(2.0));
        assert!(inner.is_defined("outer"));
        assert!(inner.is_defined("inner"));

        assert!(env.is_defined("outer"));
        assert!(!env.is_defined("inner"));
    }

    #[test]
    fn test_assign_rebinds_outer() {
        let env = Environment::new();
        env.define("count", num(0.0));

        let inner = env.child().child();
        inner.assign("count", num(5.0));
        inner.assign("fresh", num(1.0));

        assert_eq!(env.get("count"), Some(num(5.0)));
        assert!(!env.is_defined("fresh"));
        assert!(inner.is_defined("fresh"));
    }

    #[test]
    fn test_lookup_undefined_fails() {
        let env = Environment::new();
        assert_eq!(
            env.lookup("undefined"),
            Err(OrcaError::UndefinedVariable("undefined".to_string()))
        );
    }

    #[test]
    fn test_depth() {
        let env = Environment::new();
        assert_eq!(env.depth(), 1);

        let child = env.child();
        assert_eq!(child.depth(), 2);
        assert_eq!(child.child().depth(), 3);
        assert!(child.parent().unwrap().ptr_eq(&env));
    }

    #[test]
    fn test_all_bindings_respects_shadowing() {
        let env = Environment::new();
        env.define("b", num(1.0));
        env.define("a", num(1.0));
        let inner = env.child();
        inner.define("b", num(2.0));

        let bindings = inner.all_bindings();
        assert_eq!(
            bindings,
            vec![("a".to_string(), num(1.0)), ("b".to_string(), num(2.0))]
        );
    }

    fn define_function(scope: &Environment, name: &str) {
        let function = Function {
            name: name.to_string(),
            params: Vec::new(),
            body: Rc::new(Vec::new()),
            closure: scope.clone(),
        };
        scope.define(name, Value::Function(Rc::new(function)));
    }

    #[test]
    fn test_release_breaks_function_scope_cycle() {
        let scope = Environment::new().child();
        define_function(&scope, "inner");
        let weak = Rc::downgrade(&scope.scope);

        assert!(scope.release());
        drop(scope);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_release_keeps_reachable_scopes() {
        let scope = Environment::new().child();
        define_function(&scope, "step");

        // an escaped closure still needs its scope
        let escaped = scope.get("step");
        assert!(!scope.release());
        assert!(scope.is_defined("step"));
        drop(escaped);

        // so does a live child scope
        let child = scope.child();
        assert!(!scope.release());
        drop(child);

        assert!(scope.release());
        assert!(!scope.is_defined("step"));
    }

    #[test]
    fn test_release_without_functions_is_a_no_op() {
        let env = Environment::new();
        env.define("x", num(1.0));
        assert!(!env.release());
        assert_eq!(env.get("x"), Some(num(1.0)));
    }
}
