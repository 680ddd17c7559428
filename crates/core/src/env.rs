//! Lexically scoped environments.
//!
//! An environment is a chain of mutable frames. Lookup walks outward;
//! `define` always writes the current frame, shadowing outer bindings;
//! `set` writes the nearest frame that already binds the symbol. A fresh
//! frame is created per closure invocation, chained to the closure's
//! captured frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::symbol::Symbol;
use crate::value::{Params, Value};

/// One frame in the environment chain.
#[derive(Debug, Default)]
pub struct Env {
    vars: RefCell<HashMap<Symbol, Value>>,
    outer: Option<Rc<Env>>,
}

impl Env {
    /// An empty frame with no outer chain.
    pub fn new() -> Rc<Env> {
        Rc::new(Env::default())
    }

    /// A frame holding `bindings`, chained to `outer`.
    pub fn with_outer(bindings: HashMap<Symbol, Value>, outer: Rc<Env>) -> Rc<Env> {
        Rc::new(Env { vars: RefCell::new(bindings), outer: Some(outer) })
    }

    /// Bind parameters to arguments in a fresh frame chained to `outer`.
    ///
    /// A variadic parameter takes the whole argument list regardless of
    /// arity; a fixed parameter list must match exactly.
    pub fn from_params_and_args(
        params: &Params,
        args: Vec<Value>,
        outer: Rc<Env>,
    ) -> Result<Rc<Env>> {
        let mut vars = HashMap::new();
        match params {
            Params::Variadic(sym) => {
                vars.insert(*sym, Value::list(args));
            }
            Params::Fixed(syms) => {
                if syms.len() != args.len() {
                    return Err(Error::Syntax(format!(
                        "expected {} arguments, got {}",
                        syms.len(),
                        args.len()
                    )));
                }
                for (sym, arg) in syms.iter().zip(args) {
                    vars.insert(*sym, arg);
                }
            }
        }
        Ok(Rc::new(Env { vars: RefCell::new(vars), outer: Some(outer) }))
    }

    /// Bind `sym` in this frame, shadowing any outer binding.
    pub fn define(&self, sym: Symbol, value: Value) {
        self.vars.borrow_mut().insert(sym, value);
    }

    /// The nearest frame, walking outward, that binds `sym`.
    pub fn containing_frame(self: &Rc<Self>, sym: Symbol) -> Option<Rc<Env>> {
        let mut frame = Rc::clone(self);
        loop {
            if frame.vars.borrow().contains_key(&sym) {
                return Some(frame);
            }
            let outer = Rc::clone(frame.outer.as_ref()?);
            frame = outer;
        }
    }

    /// Look `sym` up through the chain.
    pub fn get(&self, sym: Symbol) -> Result<Value> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.vars.borrow().get(&sym) {
                return Ok(value.clone());
            }
            match &frame.outer {
                Some(outer) => frame = outer,
                None => return Err(Error::Unbound(sym.to_string())),
            }
        }
    }

    /// Assign into the containing frame; fails if no frame binds `sym`.
    pub fn set(self: &Rc<Self>, sym: Symbol, value: Value) -> Result<()> {
        match self.containing_frame(sym) {
            Some(frame) => {
                frame.vars.borrow_mut().insert(sym, value);
                Ok(())
            }
            None => Err(Error::Unbound(sym.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::intern(name)
    }

    #[test]
    fn test_define_and_get() {
        let env = Env::new();
        env.define(sym("x"), Value::Int(1));
        assert_eq!(env.get(sym("x")).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_lookup_walks_outward() {
        let outer = Env::new();
        outer.define(sym("x"), Value::Int(1));
        let inner = Env::with_outer(HashMap::new(), Rc::clone(&outer));
        assert_eq!(inner.get(sym("x")).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_define_shadows_outer() {
        let outer = Env::new();
        outer.define(sym("x"), Value::Int(1));
        let inner = Env::with_outer(HashMap::new(), Rc::clone(&outer));
        inner.define(sym("x"), Value::Int(2));
        assert_eq!(inner.get(sym("x")).unwrap(), Value::Int(2));
        assert_eq!(outer.get(sym("x")).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_set_writes_containing_frame() {
        let outer = Env::new();
        outer.define(sym("x"), Value::Int(1));
        let inner = Env::with_outer(HashMap::new(), Rc::clone(&outer));
        inner.set(sym("x"), Value::Int(9)).unwrap();
        assert_eq!(outer.get(sym("x")).unwrap(), Value::Int(9));
        assert!(inner.vars.borrow().is_empty());
    }

    #[test]
    fn test_set_unbound_fails() {
        let env = Env::new();
        assert!(matches!(env.set(sym("nope"), Value::Int(0)), Err(Error::Unbound(_))));
    }

    #[test]
    fn test_variadic_params_collect_all_args() {
        let env = Env::from_params_and_args(
            &Params::Variadic(sym("args")),
            vec![Value::Int(1), Value::Int(2)],
            Env::new(),
        )
        .unwrap();
        assert_eq!(
            env.get(sym("args")).unwrap(),
            Value::list(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_fixed_params_require_exact_arity() {
        let params = Params::Fixed(vec![sym("a"), sym("b")]);
        let err = Env::from_params_and_args(&params, vec![Value::Int(1)], Env::new());
        assert!(matches!(err, Err(Error::Syntax(_))));
    }
}
