//! Schemy: an embeddable Scheme-dialect interpreter.
//!
//! The pipeline is `chars -> tokens -> raw S-expression -> (expand) ->
//! canonical S-expression -> (evaluate) -> value`. [`Interpreter`] is the
//! embedding surface: construct one (optionally layering extension symbol
//! tables onto the environment), then feed it readers with
//! [`Interpreter::evaluate`] or run [`Interpreter::repl`].
//!
//! ```no_run
//! use schemy::Interpreter;
//!
//! let interp = Interpreter::new();
//! let value = interp.evaluate_str("(+ 1 2 3 4)").unwrap();
//! assert_eq!(value.unwrap().to_string(), "10");
//! ```

pub mod builtins;
pub mod eval;
pub mod expand;
pub mod interpreter;
pub mod reader;
pub mod stdlib_embed;

pub use interpreter::{Extension, Interpreter};
pub use reader::{Reader, Token, parse_atom};
pub use schemy_core::{
    Apply, Closure, Env, Error, NativeFn, NativeProc, Params, Result, Symbol, Value, reserved,
};
