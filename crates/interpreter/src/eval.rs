//! Evaluation: canonical forms to values.
//!
//! The evaluator is a trampoline over a mutable `(expr, env)` pair. Tail
//! positions (the chosen `if` branch, the last `begin` element, a closure
//! body at an application) assign the pair and continue the loop; only
//! non-tail subexpressions recurse. That keeps user-level tail calls in
//! bounded host stack.

use std::rc::Rc;

use schemy_core::{Closure, Env, Error, Params, Result, Value, reserved};

use crate::interpreter::Interpreter;

impl Interpreter {
    /// Evaluate one canonical expression in `env`.
    pub fn eval(&self, expr: Value, env: Rc<Env>) -> Result<Value> {
        let res = reserved();
        let mut expr = expr;
        let mut env = env;
        loop {
            let items = match &expr {
                Value::Sym(sym) => return env.get(*sym),
                Value::List(items) if !items.is_empty() => Rc::clone(items),
                other => return Ok(other.clone()),
            };
            if let Some(head) = items[0].as_symbol() {
                if head == res.quote {
                    expect_form(items.len() == 2, &expr)?;
                    return Ok(items[1].clone());
                }
                if head == res.if_ {
                    expect_form(items.len() == 4, &expr)?;
                    let test = self.eval(items[1].clone(), Rc::clone(&env))?;
                    expr = if test.is_truthy() { items[2].clone() } else { items[3].clone() };
                    continue;
                }
                if head == res.define {
                    expect_form(items.len() == 3, &expr)?;
                    let Some(name) = items[1].as_symbol() else {
                        return Err(Error::Syntax(format!("define expects a symbol: {expr}")));
                    };
                    let value = self.eval(items[2].clone(), Rc::clone(&env))?;
                    env.define(name, value);
                    return Ok(Value::None);
                }
                if head == res.set {
                    expect_form(items.len() == 3, &expr)?;
                    let Some(name) = items[1].as_symbol() else {
                        return Err(Error::Syntax(format!("set! expects a symbol: {expr}")));
                    };
                    let value = self.eval(items[2].clone(), Rc::clone(&env))?;
                    env.set(name, value)?;
                    return Ok(Value::None);
                }
                if head == res.lambda {
                    expect_form(items.len() == 3, &expr)?;
                    return Ok(Value::Closure(Rc::new(Closure {
                        params: parse_params(&items[1], &expr)?,
                        body: items[2].clone(),
                        env: Rc::clone(&env),
                    })));
                }
                if head == res.begin {
                    if items.len() == 1 {
                        return Ok(Value::None);
                    }
                    for item in &items[1..items.len() - 1] {
                        self.eval(item.clone(), Rc::clone(&env))?;
                    }
                    expr = items[items.len() - 1].clone();
                    continue;
                }
            }
            // Application: evaluate the head, then the arguments left to
            // right, then either jump into the closure body (tail call) or
            // hand off to the native.
            let callable = self.eval(items[0].clone(), Rc::clone(&env))?;
            let mut args = Vec::with_capacity(items.len() - 1);
            for item in &items[1..] {
                args.push(self.eval(item.clone(), Rc::clone(&env))?);
            }
            match callable {
                Value::Closure(closure) => {
                    env = Env::from_params_and_args(&closure.params, args, Rc::clone(&closure.env))?;
                    expr = closure.body.clone();
                }
                Value::Native(native) => return (native.func)(self, &args),
                other => return Err(Error::Type(format!("not a procedure: {other}"))),
            }
        }
    }
}

fn parse_params(form: &Value, expr: &Value) -> Result<Params> {
    match form {
        Value::Sym(sym) => Ok(Params::Variadic(*sym)),
        Value::List(items) => {
            let mut syms = Vec::with_capacity(items.len());
            for item in items.iter() {
                let Some(sym) = item.as_symbol() else {
                    return Err(Error::Syntax(format!("lambda parameters must be symbols: {expr}")));
                };
                syms.push(sym);
            }
            Ok(Params::Fixed(syms))
        }
        _ => Err(Error::Syntax(format!("bad parameter list: {expr}"))),
    }
}

fn expect_form(ok: bool, expr: &Value) -> Result<()> {
    if !ok {
        return Err(Error::Syntax(format!("malformed special form: {expr}")));
    }
    Ok(())
}
