//! Symbol interning.
//!
//! Symbols are handles into a process-wide interner: for any string `s`,
//! `Symbol::intern(s)` returns the same handle every time, so equality and
//! hashing are identity. The special-form names are preinterned at startup
//! as [`Reserved`] and the expander and evaluator compare against those
//! identities, never against spellings.

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex};

// The interner is locked rather than thread-local: macros intern new
// symbols mid-evaluation, and embedding hosts may construct interpreters
// from several threads.
static INTERNER: LazyLock<Mutex<Interner>> = LazyLock::new(|| Mutex::new(Interner::default()));

#[derive(Default)]
struct Interner {
    names: Vec<&'static str>,
    ids: HashMap<&'static str, u32>,
}

/// An interned symbol. Copyable handle; equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern `name`, returning its unique symbol. Idempotent.
    pub fn intern(name: &str) -> Symbol {
        let mut interner = INTERNER.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(&id) = interner.ids.get(name) {
            return Symbol(id);
        }
        let id = interner.names.len() as u32;
        // Interned names live for the rest of the process.
        let name: &'static str = Box::leak(name.to_owned().into_boxed_str());
        interner.names.push(name);
        interner.ids.insert(name, id);
        Symbol(id)
    }

    /// The symbol's source spelling.
    pub fn name(self) -> &'static str {
        let interner = INTERNER.lock().unwrap_or_else(|e| e.into_inner());
        interner.names[self.0 as usize]
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}", self.name())
    }
}

/// The thirteen preinterned special-form identities.
#[derive(Debug, Clone, Copy)]
pub struct Reserved {
    pub quote: Symbol,
    pub if_: Symbol,
    pub define: Symbol,
    pub define_macro: Symbol,
    pub lambda: Symbol,
    pub set: Symbol,
    pub begin: Symbol,
    pub cons: Symbol,
    pub append: Symbol,
    pub quasiquote: Symbol,
    pub unquote: Symbol,
    pub unquote_splicing: Symbol,
    pub eof: Symbol,
}

static RESERVED: LazyLock<Reserved> = LazyLock::new(|| Reserved {
    quote: Symbol::intern("quote"),
    if_: Symbol::intern("if"),
    define: Symbol::intern("define"),
    define_macro: Symbol::intern("define-macro"),
    lambda: Symbol::intern("lambda"),
    set: Symbol::intern("set!"),
    begin: Symbol::intern("begin"),
    cons: Symbol::intern("cons"),
    append: Symbol::intern("append"),
    quasiquote: Symbol::intern("quasiquote"),
    unquote: Symbol::intern("unquote"),
    unquote_splicing: Symbol::intern("unquote-splicing"),
    eof: Symbol::intern("#<eof-object>"),
});

/// The reserved special-form symbols.
pub fn reserved() -> &'static Reserved {
    &RESERVED
}
