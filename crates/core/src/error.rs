//! Interpreter errors.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by the reader, expander or evaluator.
///
/// `evaluate` stops at the first error and hands it back to the caller; the
/// REPL reports per expression and keeps going. Messages carry a printed
/// form of the offending expression where one is available.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed token stream, special form or parameter list.
    Syntax(String),
    /// Lookup or `set!` on a symbol with no containing frame.
    Unbound(String),
    /// Operation applied to a value of the wrong kind.
    Type(String),
    /// Raised by `assert` on a false predicate.
    Assert(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(msg) => write!(f, "syntax error: {msg}"),
            Error::Unbound(msg) => write!(f, "symbol not defined: {msg}"),
            Error::Type(msg) => write!(f, "type error: {msg}"),
            Error::Assert(msg) => write!(f, "assertion failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
