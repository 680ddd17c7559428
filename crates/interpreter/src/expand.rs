//! Expansion: raw S-expressions to canonical forms.
//!
//! A single walk validates the special forms, rewrites the sugared ones
//! (`(define (f a) ...)`, multi-body `lambda`, quasiquote) and applies
//! user macros to fixpoint. Heads are matched against the reserved symbol
//! identities, never against spellings, so a user shadowing `if` with a
//! local still gets the special form recognized here and the binding
//! resolved by the evaluator.

use std::rc::Rc;

use schemy_core::{Apply, Closure, Env, Error, Result, Symbol, Value, reserved};
use tracing::debug;

use crate::interpreter::Interpreter;

impl Interpreter {
    /// Rewrite `expr` into canonical form. `top_level` gates
    /// `define-macro` and is preserved through `begin` so macros may be
    /// installed from a top-level `(begin ...)`.
    pub fn expand(&self, expr: &Value, env: &Rc<Env>, top_level: bool) -> Result<Value> {
        let Value::List(items) = expr else { return Ok(expr.clone()) };
        if items.is_empty() {
            return Ok(expr.clone());
        }
        let res = reserved();
        if let Some(head) = items[0].as_symbol() {
            if head == res.quote {
                expect_len(items, 2, expr)?;
                return Ok(expr.clone());
            }
            if head == res.if_ {
                let mut form: Vec<Value> = items.iter().cloned().collect();
                if form.len() == 3 {
                    form.push(Value::None);
                }
                if form.len() != 4 {
                    return Err(syntax("if takes a test and one or two branches", expr));
                }
                let test = self.expand(&form[1], env, false)?;
                let conseq = self.expand(&form[2], env, false)?;
                let alt = self.expand(&form[3], env, false)?;
                return Ok(Value::list(vec![form[0].clone(), test, conseq, alt]));
            }
            if head == res.set {
                expect_len(items, 3, expr)?;
                if !matches!(items[1], Value::Sym(_)) {
                    return Err(syntax("set! expects a symbol", expr));
                }
                return Ok(Value::list(vec![
                    items[0].clone(),
                    items[1].clone(),
                    self.expand(&items[2], env, false)?,
                ]));
            }
            if head == res.define || head == res.define_macro {
                return self.expand_define(head, items, expr, env, top_level);
            }
            if head == res.begin {
                if items.len() == 1 {
                    return Ok(Value::None);
                }
                let mut form = vec![items[0].clone()];
                for item in &items[1..] {
                    form.push(self.expand(item, env, top_level)?);
                }
                return Ok(Value::list(form));
            }
            if head == res.lambda {
                return self.expand_lambda(items, expr, env);
            }
            if head == res.quasiquote {
                expect_len(items, 2, expr)?;
                return expand_quasiquote(&items[1]);
            }
            let macro_closure = self.macros.borrow().get(&head).cloned();
            if let Some(closure) = macro_closure {
                // Macros receive the unexpanded tail; their result is
                // re-expanded, so macros may expand into macro calls.
                let expanded = self.apply_macro(&closure, &items[1..])?;
                return self.expand(&expanded, env, top_level);
            }
        }
        let mut form = Vec::with_capacity(items.len());
        for item in items.iter() {
            form.push(self.expand(item, env, false)?);
        }
        Ok(Value::list(form))
    }

    fn apply_macro(&self, closure: &Rc<Closure>, args: &[Value]) -> Result<Value> {
        self.apply(&Value::Closure(Rc::clone(closure)), args.to_vec())
    }

    fn expand_define(
        &self,
        head: Symbol,
        items: &[Value],
        expr: &Value,
        env: &Rc<Env>,
        top_level: bool,
    ) -> Result<Value> {
        let res = reserved();
        if items.len() < 3 {
            return Err(syntax("define takes a name and a value", expr));
        }
        match &items[1] {
            // (define (f a b) body...) is sugar for a lambda binding.
            Value::List(signature) => {
                let Some((name, params)) = signature.split_first() else {
                    return Err(syntax("define signature is empty", expr));
                };
                let mut lambda_form = vec![Value::Sym(res.lambda), Value::list(params.to_vec())];
                lambda_form.extend_from_slice(&items[2..]);
                let rewritten = Value::list(vec![
                    Value::Sym(head),
                    name.clone(),
                    Value::list(lambda_form),
                ]);
                self.expand(&rewritten, env, top_level)
            }
            Value::Sym(name) => {
                if items.len() != 3 {
                    return Err(syntax("define takes exactly one value", expr));
                }
                if head == res.define_macro {
                    if !top_level {
                        return Err(syntax("define-macro is only allowed at top level", expr));
                    }
                    let canonical = self.expand(&items[2], env, false)?;
                    let value = self.eval(canonical, Rc::clone(env))?;
                    let Value::Closure(closure) = value else {
                        return Err(Error::Type(format!(
                            "macro value must be a procedure: {expr}"
                        )));
                    };
                    debug!(name = name.name(), "installed macro");
                    self.macros.borrow_mut().insert(*name, closure);
                    return Ok(Value::None);
                }
                Ok(Value::list(vec![
                    items[0].clone(),
                    items[1].clone(),
                    self.expand(&items[2], env, false)?,
                ]))
            }
            _ => Err(syntax("define expects a symbol or a signature list", expr)),
        }
    }

    fn expand_lambda(&self, items: &[Value], expr: &Value, env: &Rc<Env>) -> Result<Value> {
        if items.len() < 3 {
            return Err(syntax("lambda takes parameters and a body", expr));
        }
        match &items[1] {
            Value::Sym(_) => {}
            Value::List(params) => {
                if params.iter().any(|p| !matches!(p, Value::Sym(_))) {
                    return Err(syntax("lambda parameters must be symbols", expr));
                }
            }
            _ => {
                return Err(syntax("lambda parameters must be a symbol or a list of symbols", expr));
            }
        }
        let body = if items.len() == 3 {
            items[2].clone()
        } else {
            let mut body = vec![Value::Sym(reserved().begin)];
            body.extend_from_slice(&items[2..]);
            Value::list(body)
        };
        Ok(Value::list(vec![items[0].clone(), items[1].clone(), self.expand(&body, env, false)?]))
    }
}

/// Desugar a quasiquoted template into `cons`/`append`/`quote` forms.
pub fn expand_quasiquote(expr: &Value) -> Result<Value> {
    let res = reserved();
    let items = match expr {
        Value::List(items) if !items.is_empty() => items,
        _ => return Ok(Value::list(vec![Value::Sym(res.quote), expr.clone()])),
    };
    let head = &items[0];
    if let Value::Sym(sym) = head {
        if *sym == res.unquote_splicing {
            return Err(Error::Syntax(format!("cannot splice here: {expr}")));
        }
        if *sym == res.unquote {
            if items.len() != 2 {
                return Err(Error::Syntax(format!("unquote takes one expression: {expr}")));
            }
            return Ok(items[1].clone());
        }
    }
    let tail = Value::list(items[1..].to_vec());
    if let Value::List(inner) = head {
        if inner.len() == 2 && inner[0].as_symbol() == Some(res.unquote_splicing) {
            return Ok(Value::list(vec![
                Value::Sym(res.append),
                inner[1].clone(),
                expand_quasiquote(&tail)?,
            ]));
        }
    }
    Ok(Value::list(vec![Value::Sym(res.cons), expand_quasiquote(head)?, expand_quasiquote(&tail)?]))
}

fn syntax(msg: &str, expr: &Value) -> Error {
    Error::Syntax(format!("{msg}: {expr}"))
}

fn expect_len(items: &[Value], want: usize, expr: &Value) -> Result<()> {
    if items.len() != want {
        return Err(Error::Syntax(format!(
            "expected {} elements, got {}: {expr}",
            want,
            items.len()
        )));
    }
    Ok(())
}
