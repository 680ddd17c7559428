//! The embedding surface.
//!
//! An [`Interpreter`] owns the global environment chain and the macro
//! table. Hosts construct one, optionally layering extension symbol tables
//! onto the environment, then feed it input with [`Interpreter::evaluate`]
//! or run an interactive loop with [`Interpreter::repl`]. Construction
//! evaluates the embedded prelude (`init.ss`) into the global frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use schemy_core::{Apply, Closure, Env, Error, Result, Symbol, Value, reserved};
use tracing::debug;

use crate::builtins;
use crate::reader::Reader;
use crate::stdlib_embed;

/// A symbol table producer: takes the interpreter under construction and
/// returns a frame of bindings to layer onto the environment.
pub type Extension = fn(&Interpreter) -> HashMap<Symbol, Value>;

/// A Schemy interpreter instance: one evaluation at a time, one global
/// environment, one macro table.
pub struct Interpreter {
    global: Rc<Env>,
    pub(crate) macros: RefCell<HashMap<Symbol, Rc<Closure>>>,
}

impl Interpreter {
    /// An interpreter with the builtin frame and the embedded prelude.
    pub fn new() -> Interpreter {
        Interpreter::with_extensions(&[])
    }

    /// An interpreter with extension frames layered between the builtins
    /// and the global frame, innermost last.
    pub fn with_extensions(extensions: &[Extension]) -> Interpreter {
        let base = Env::with_outer(builtins::base_table(), Env::new());
        let mut interp = Interpreter { global: base, macros: RefCell::new(HashMap::new()) };
        for extension in extensions {
            let table = extension(&interp);
            interp.global = Env::with_outer(table, Rc::clone(&interp.global));
        }
        interp.global = Env::with_outer(HashMap::new(), Rc::clone(&interp.global));
        match interp.evaluate(stdlib_embed::prelude().as_bytes()) {
            Ok(_) => debug!("embedded prelude loaded"),
            // The prelude ships inside the binary; failing to load it is a
            // build defect, not a user error.
            Err(err) => panic!("embedded prelude failed to load: {err}"),
        }
        interp
    }

    /// The global environment (the innermost frame user `define`s land in).
    pub fn global_env(&self) -> &Rc<Env> {
        &self.global
    }

    /// Read, expand and evaluate every expression from `input`.
    ///
    /// Stops at the first error; otherwise returns the value of the last
    /// expression, or `None` if the input held nothing but whitespace.
    pub fn evaluate<R: BufRead>(&self, input: R) -> Result<Option<Value>> {
        let mut reader = Reader::new(input);
        let eof = reserved().eof;
        let mut last = None;
        loop {
            let expr = reader.read()?;
            if expr.as_symbol() == Some(eof) {
                return Ok(last);
            }
            let expanded = self.expand(&expr, &self.global, true)?;
            last = Some(self.eval(expanded, Rc::clone(&self.global))?);
        }
    }

    /// Convenience for in-memory sources.
    pub fn evaluate_str(&self, source: &str) -> Result<Option<Value>> {
        self.evaluate(source.as_bytes())
    }

    /// Read-eval-print loop: prints each value, reports errors per
    /// expression, keeps going until end of input.
    pub fn repl<R: BufRead, W: Write>(
        &self,
        input: R,
        output: &mut W,
        prompt: Option<&str>,
        banner: Option<&str>,
    ) -> io::Result<()> {
        let mut reader = Reader::new(input);
        let eof = reserved().eof;
        if let Some(banner) = banner {
            writeln!(output, "{banner}")?;
        }
        loop {
            if let Some(prompt) = prompt {
                write!(output, "{prompt}")?;
                output.flush()?;
            }
            match reader.read() {
                Ok(expr) if expr.as_symbol() == Some(eof) => return Ok(()),
                Ok(expr) => {
                    let result = self
                        .expand(&expr, &self.global, true)
                        .and_then(|canonical| self.eval(canonical, Rc::clone(&self.global)));
                    match result {
                        Ok(Value::None) => {}
                        Ok(value) => writeln!(output, "{value}")?,
                        Err(err) => writeln!(output, "{err}")?,
                    }
                }
                Err(err) => {
                    writeln!(output, "{err}")?;
                    reader.discard_line();
                }
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Natives re-enter evaluation through this seam (`map`, `apply`, and any
/// host extension that receives a callable).
impl Apply for Interpreter {
    fn apply(&self, callable: &Value, args: Vec<Value>) -> Result<Value> {
        match callable {
            Value::Closure(closure) => {
                let env =
                    Env::from_params_and_args(&closure.params, args, Rc::clone(&closure.env))?;
                self.eval(closure.body.clone(), env)
            }
            Value::Native(native) => (native.func)(self, &args),
            other => Err(Error::Type(format!("not a procedure: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_last(source: &str) -> Value {
        Interpreter::new().evaluate_str(source).unwrap().unwrap()
    }

    #[test]
    fn test_evaluate_returns_last_value() {
        assert_eq!(eval_last("1 2 3"), Value::Int(3));
    }

    #[test]
    fn test_evaluate_empty_input() {
        assert_eq!(Interpreter::new().evaluate_str("  \n ; comment\n").unwrap(), None);
    }

    #[test]
    fn test_evaluate_stops_at_first_error() {
        let interp = Interpreter::new();
        assert!(interp.evaluate_str("(define x 1) (undefined-thing) (define x 2)").is_err());
        assert_eq!(interp.evaluate_str("x").unwrap().unwrap(), Value::Int(1));
    }

    #[test]
    fn test_extensions_layer_onto_environment() {
        fn table(_: &Interpreter) -> HashMap<Symbol, Value> {
            HashMap::from([(Symbol::intern("host-version"), Value::Int(7))])
        }
        let interp = Interpreter::with_extensions(&[table]);
        assert_eq!(interp.evaluate_str("host-version").unwrap().unwrap(), Value::Int(7));
        // Extension bindings sit outside the global frame, so user code can
        // shadow them without clobbering the extension table.
        interp.evaluate_str("(define host-version 8)").unwrap();
        assert_eq!(interp.evaluate_str("host-version").unwrap().unwrap(), Value::Int(8));
    }

    #[test]
    fn test_repl_prints_values_and_recovers_from_errors() {
        let interp = Interpreter::new();
        let input = "(+ 1 2)\nnope\n(* 2 3)\n";
        let mut output = Vec::new();
        interp.repl(input.as_bytes(), &mut output, Some("> "), Some("hi")).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("hi\n"));
        assert!(text.contains("3\n"));
        assert!(text.contains("symbol not defined: 'nope"));
        assert!(text.contains("6\n"));
    }

    #[test]
    fn test_repl_does_not_print_none() {
        let interp = Interpreter::new();
        let mut output = Vec::new();
        interp.repl("(define x 1)\n".as_bytes(), &mut output, None, None).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "");
    }

    #[test]
    fn test_apply_seam_calls_closures() {
        let interp = Interpreter::new();
        let double = interp.evaluate_str("(lambda (n) (* n 2))").unwrap().unwrap();
        let result = interp.apply(&double, vec![Value::Int(21)]).unwrap();
        assert_eq!(result, Value::Int(42));
    }
}
