//! Embedded prelude.
//!
//! `init.ss` is compiled into the binary so interpreters are
//! self-contained: no external prelude file is needed at runtime.

/// The bundled standard prelude, evaluated into every new interpreter.
pub fn prelude() -> &'static str {
    include_str!("../stdlib/init.ss")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_defines_core_forms() {
        let source = prelude();
        assert!(source.contains("(define-macro let"));
        assert!(source.contains("(define-macro cond"));
        assert!(source.contains("(define (fold"));
    }
}
