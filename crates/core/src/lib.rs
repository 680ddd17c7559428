//! Core value model for the Schemy interpreter.
//!
//! Everything the reader, expander and evaluator agree on lives here: the
//! tagged [`Value`] sum, the process-wide [`Symbol`] interner with its
//! reserved special-form identities, the chained [`Env`] frames, and the
//! typed [`Error`] surface.

pub mod env;
pub mod error;
pub mod symbol;
pub mod value;

pub use env::Env;
pub use error::{Error, Result};
pub use symbol::{Reserved, Symbol, reserved};
pub use value::{Apply, Closure, NativeFn, NativeProc, Params, Value};
