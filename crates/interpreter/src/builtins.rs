//! Native procedures for the base environment.
//!
//! Arithmetic is a variadic left-fold over two-argument kernels with the
//! Int/Float contagion rule: Int op Int stays Int (truncating division,
//! integer modulus); anything else coerces both sides to Float.

use std::collections::HashMap;
use std::rc::Rc;

use schemy_core::{Apply, Error, NativeFn, NativeProc, Result, Symbol, Value};

/// Numeric `=` keeps the inherited absolute tolerance; it is intentionally
/// not exact equality.
const NUM_EQ_TOLERANCE: f64 = 1e-13;

/// Build the base frame of native procedures.
pub fn base_table() -> HashMap<Symbol, Value> {
    let mut table = HashMap::new();

    // Arithmetic
    native(&mut table, "+", |_, args| numeric_fold("+", args, add));
    native(&mut table, "-", |_, args| numeric_fold("-", args, sub));
    native(&mut table, "*", |_, args| numeric_fold("*", args, mul));
    native(&mut table, "/", |_, args| numeric_fold("/", args, div));
    native(&mut table, "%", |_, args| numeric_fold("%", args, modulo));
    native(&mut table, "abs", abs);
    native(&mut table, "max", |_, args| numeric_fold("max", args, max));
    native(&mut table, "min", |_, args| numeric_fold("min", args, min));

    // Comparisons
    native(&mut table, "=", num_eq);
    native(&mut table, "<", |_, args| compare("<", args, |o| o.is_lt()));
    native(&mut table, "<=", |_, args| compare("<=", args, |o| o.is_le()));
    native(&mut table, ">", |_, args| compare(">", args, |o| o.is_gt()));
    native(&mut table, ">=", |_, args| compare(">=", args, |o| o.is_ge()));

    // Predicates
    native(&mut table, "eq?", |_, args| {
        let (a, b) = two("eq?", args)?;
        Ok(Value::Bool(a.is_eq(b)))
    });
    native(&mut table, "equal?", |_, args| {
        let (a, b) = two("equal?", args)?;
        Ok(Value::Bool(a == b))
    });
    native(&mut table, "boolean?", |_, args| {
        Ok(Value::Bool(matches!(one("boolean?", args)?, Value::Bool(_))))
    });
    native(&mut table, "num?", |_, args| {
        Ok(Value::Bool(matches!(one("num?", args)?, Value::Int(_) | Value::Float(_))))
    });
    native(&mut table, "string?", |_, args| {
        Ok(Value::Bool(matches!(one("string?", args)?, Value::Str(_))))
    });
    native(&mut table, "symbol?", |_, args| {
        Ok(Value::Bool(matches!(one("symbol?", args)?, Value::Sym(_))))
    });
    native(&mut table, "list?", |_, args| {
        Ok(Value::Bool(matches!(one("list?", args)?, Value::List(_))))
    });
    native(&mut table, "null?", |_, args| {
        let value = one("null?", args)?;
        let is_null = matches!(value, Value::None)
            || matches!(value, Value::List(items) if items.is_empty());
        Ok(Value::Bool(is_null))
    });
    native(&mut table, "not", |_, args| Ok(Value::Bool(!one("not", args)?.is_truthy())));

    // Lists
    native(&mut table, "list", |_, args| Ok(Value::list(args.to_vec())));
    native(&mut table, "length", |_, args| {
        Ok(Value::Int(expect_list("length", one("length", args)?)?.len() as i64))
    });
    native(&mut table, "car", |_, args| {
        let items = expect_list("car", one("car", args)?)?;
        items.first().cloned().ok_or_else(|| Error::Type("car: empty list".to_string()))
    });
    native(&mut table, "cdr", |_, args| {
        let items = expect_list("cdr", one("cdr", args)?)?;
        if items.is_empty() {
            return Err(Error::Type("cdr: empty list".to_string()));
        }
        Ok(Value::list(items[1..].to_vec()))
    });
    native(&mut table, "cons", |_, args| {
        let (head, tail) = two("cons", args)?;
        let tail = expect_list("cons", tail)?;
        let mut items = Vec::with_capacity(tail.len() + 1);
        items.push(head.clone());
        items.extend_from_slice(tail);
        Ok(Value::list(items))
    });
    native(&mut table, "append", |_, args| {
        let (a, b) = two("append", args)?;
        let a = expect_list("append", a)?;
        let b = expect_list("append", b)?;
        let mut items = Vec::with_capacity(a.len() + b.len());
        items.extend_from_slice(a);
        items.extend_from_slice(b);
        Ok(Value::list(items))
    });
    native(&mut table, "reverse", |_, args| {
        let items = expect_list("reverse", one("reverse", args)?)?;
        Ok(Value::list(items.iter().rev().cloned().collect()))
    });
    native(&mut table, "list-ref", |_, args| {
        let (list, index) = two("list-ref", args)?;
        let items = expect_list("list-ref", list)?;
        let Value::Int(i) = index else {
            return Err(Error::Type(format!("list-ref: expected an integer, got {index}")));
        };
        usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or_else(|| Error::Type(format!("list-ref: index {i} out of range")))
    });
    native(&mut table, "map", |interp, args| {
        let (func, list) = two("map", args)?;
        let items = expect_list("map", list)?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(interp.apply(func, vec![item.clone()])?);
        }
        Ok(Value::list(out))
    });
    native(&mut table, "apply", |interp, args| {
        let (func, list) = two("apply", args)?;
        let items = expect_list("apply", list)?;
        interp.apply(func, items.to_vec())
    });
    native(&mut table, "range", range);

    // Misc
    native(&mut table, "symbol->string", |_, args| {
        match one("symbol->string", args)? {
            Value::Sym(sym) => Ok(Value::str(sym.name())),
            other => Err(Error::Type(format!("symbol->string: expected a symbol, got {other}"))),
        }
    });
    native(&mut table, "assert", assert_builtin);
    native(&mut table, "null", |_, args| {
        if !args.is_empty() {
            return Err(Error::Type(format!("null: expected no arguments, got {}", args.len())));
        }
        Ok(Value::None)
    });
    native(&mut table, "print", |_, args| {
        println!("{}", one("print", args)?);
        Ok(Value::None)
    });

    table
}

fn native(
    table: &mut HashMap<Symbol, Value>,
    name: &str,
    func: fn(&dyn Apply, &[Value]) -> Result<Value>,
) {
    let func: NativeFn = Rc::new(func);
    table.insert(Symbol::intern(name), Value::Native(Rc::new(NativeProc::new(name, func))));
}

fn one<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value> {
    match args {
        [value] => Ok(value),
        _ => Err(Error::Type(format!("{name}: expected 1 argument, got {}", args.len()))),
    }
}

fn two<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(Error::Type(format!("{name}: expected 2 arguments, got {}", args.len()))),
    }
}

fn expect_list<'a>(name: &str, value: &'a Value) -> Result<&'a [Value]> {
    value.as_list().ok_or_else(|| Error::Type(format!("{name}: expected a list, got {value}")))
}

fn as_float(name: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(Error::Type(format!("{name}: expected a number, got {other}"))),
    }
}

fn numeric_fold(
    name: &str,
    args: &[Value],
    kernel: fn(&Value, &Value) -> Result<Value>,
) -> Result<Value> {
    let Some((first, rest)) = args.split_first() else {
        return Err(Error::Type(format!("{name}: expected at least 1 argument")));
    };
    let mut acc = first.clone();
    for arg in rest {
        acc = kernel(&acc, arg)?;
    }
    Ok(acc)
}

fn add(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| Error::Type("+: integer overflow".to_string())),
        _ => Ok(Value::Float(as_float("+", a)? + as_float("+", b)?)),
    }
}

fn sub(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_sub(*b)
            .map(Value::Int)
            .ok_or_else(|| Error::Type("-: integer overflow".to_string())),
        _ => Ok(Value::Float(as_float("-", a)? - as_float("-", b)?)),
    }
}

fn mul(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_mul(*b)
            .map(Value::Int)
            .ok_or_else(|| Error::Type("*: integer overflow".to_string())),
        _ => Ok(Value::Float(as_float("*", a)? * as_float("*", b)?)),
    }
}

fn div(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_div(*b)
            .map(Value::Int)
            .ok_or_else(|| Error::Type("/: division by zero".to_string())),
        _ => Ok(Value::Float(as_float("/", a)? / as_float("/", b)?)),
    }
}

/// Modulus is defined only for integers.
fn modulo(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_rem(*b)
            .map(Value::Int)
            .ok_or_else(|| Error::Type("%: division by zero".to_string())),
        _ => Err(Error::Type(format!("%: expected integers, got {a} and {b}"))),
    }
}

fn max(a: &Value, b: &Value) -> Result<Value> {
    pick("max", a, b, |ord| ord.is_ge())
}

fn min(a: &Value, b: &Value) -> Result<Value> {
    pick("min", a, b, |ord| ord.is_le())
}

/// Return the winning operand as-is, preserving its numeric type.
fn pick(
    name: &str,
    a: &Value,
    b: &Value,
    keep_left: fn(std::cmp::Ordering) -> bool,
) -> Result<Value> {
    let ord = match (a, b) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        _ => {
            let (x, y) = (as_float(name, a)?, as_float(name, b)?);
            x.partial_cmp(&y)
                .ok_or_else(|| Error::Type(format!("{name}: cannot compare {a} and {b}")))?
        }
    };
    Ok(if keep_left(ord) { a.clone() } else { b.clone() })
}

fn abs(_: &dyn Apply, args: &[Value]) -> Result<Value> {
    match one("abs", args)? {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| Error::Type("abs: integer overflow".to_string())),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        other => Err(Error::Type(format!("abs: expected a number, got {other}"))),
    }
}

fn num_eq(_: &dyn Apply, args: &[Value]) -> Result<Value> {
    let (a, b) = two("=", args)?;
    let (x, y) = (as_float("=", a)?, as_float("=", b)?);
    Ok(Value::Bool((x - y).abs() < NUM_EQ_TOLERANCE))
}

fn compare(
    name: &str,
    args: &[Value],
    accept: fn(std::cmp::Ordering) -> bool,
) -> Result<Value> {
    let (a, b) = two(name, args)?;
    let ord = match (a, b) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        _ => {
            let (x, y) = (as_float(name, a)?, as_float(name, b)?);
            x.partial_cmp(&y)
                .ok_or_else(|| Error::Type(format!("{name}: cannot compare {a} and {b}")))?
        }
    };
    Ok(Value::Bool(accept(ord)))
}

/// `(range stop)`, `(range start stop)` or `(range start stop step)` over
/// integers. A zero step is an error; a step that walks away from the
/// bound yields the empty list.
fn range(_: &dyn Apply, args: &[Value]) -> Result<Value> {
    let ints = args
        .iter()
        .map(|arg| match arg {
            Value::Int(n) => Ok(*n),
            other => Err(Error::Type(format!("range: expected an integer, got {other}"))),
        })
        .collect::<Result<Vec<i64>>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(Error::Type(format!(
                "range: expected 1 to 3 arguments, got {}",
                args.len()
            )));
        }
    };
    if step == 0 {
        return Err(Error::Type("range: step must not be zero".to_string()));
    }
    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        items.push(Value::Int(i));
        i += step;
    }
    Ok(Value::list(items))
}

/// `(assert pred)` or `(assert pred "message")`.
fn assert_builtin(_: &dyn Apply, args: &[Value]) -> Result<Value> {
    let (pred, message) = match args {
        [pred] => (pred, None),
        [pred, Value::Str(msg)] => (pred, Some(msg.to_string())),
        [_, other] => {
            return Err(Error::Type(format!("assert: message must be a string, got {other}")));
        }
        _ => {
            return Err(Error::Type(format!(
                "assert: expected 1 or 2 arguments, got {}",
                args.len()
            )));
        }
    };
    if pred.is_truthy() {
        return Ok(Value::None);
    }
    Err(Error::Assert(message.unwrap_or_else(|| format!("{pred}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn eval(source: &str) -> Value {
        Interpreter::new()
            .evaluate_str(source)
            .expect("evaluation failed")
            .expect("no value produced")
    }

    fn eval_err(source: &str) -> Error {
        Interpreter::new().evaluate_str(source).unwrap_err()
    }

    #[test]
    fn test_arithmetic_folds_left() {
        assert_eq!(eval("(+ 1 2 3 4)"), Value::Int(10));
        assert_eq!(eval("(- 10 1 2)"), Value::Int(7));
        assert_eq!(eval("(* 2 3 4)"), Value::Int(24));
        assert_eq!(eval("(- 5)"), Value::Int(5));
    }

    #[test]
    fn test_int_float_contagion() {
        assert_eq!(eval("(+ 1 2)"), Value::Int(3));
        assert_eq!(eval("(+ 1 2.0)"), Value::Float(3.0));
        assert_eq!(eval("(* 2.5 2)"), Value::Float(5.0));
    }

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(eval("(/ 7 2)"), Value::Int(3));
        assert_eq!(eval("(/ -7 2)"), Value::Int(-3));
        assert_eq!(eval("(/ 7 2.0)"), Value::Float(3.5));
    }

    #[test]
    fn test_division_by_zero_is_type_error() {
        assert!(matches!(eval_err("(/ 1 0)"), Error::Type(_)));
        assert!(matches!(eval_err("(% 1 0)"), Error::Type(_)));
    }

    #[test]
    fn test_modulus_is_integer_only() {
        assert_eq!(eval("(% 7 3)"), Value::Int(1));
        assert_eq!(eval("(% -7 3)"), Value::Int(-1));
        assert!(matches!(eval_err("(% 7 3.0)"), Error::Type(_)));
    }

    #[test]
    fn test_arithmetic_rejects_non_numbers() {
        assert!(matches!(eval_err(r#"(+ 1 "two")"#), Error::Type(_)));
    }

    #[test]
    fn test_numeric_equality_uses_tolerance() {
        assert_eq!(eval("(= 1 1.0)"), Value::Bool(true));
        assert_eq!(eval("(= 0.1 0.10000000000000000001)"), Value::Bool(true));
        assert_eq!(eval("(= 1 2)"), Value::Bool(false));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("(< 1 2)"), Value::Bool(true));
        assert_eq!(eval("(<= 2 2)"), Value::Bool(true));
        assert_eq!(eval("(> 1 2)"), Value::Bool(false));
        assert_eq!(eval("(>= 2 2.5)"), Value::Bool(false));
    }

    #[test]
    fn test_predicates() {
        assert_eq!(eval("(boolean? #f)"), Value::Bool(true));
        assert_eq!(eval("(num? 1)"), Value::Bool(true));
        assert_eq!(eval("(num? 1.5)"), Value::Bool(true));
        assert_eq!(eval(r#"(string? "s")"#), Value::Bool(true));
        assert_eq!(eval("(symbol? 'a)"), Value::Bool(true));
        assert_eq!(eval("(list? '(1))"), Value::Bool(true));
        assert_eq!(eval("(list? 1)"), Value::Bool(false));
        assert_eq!(eval("(null? '())"), Value::Bool(true));
        assert_eq!(eval("(null? (null))"), Value::Bool(true));
        assert_eq!(eval("(null? '(1))"), Value::Bool(false));
        assert_eq!(eval("(not #f)"), Value::Bool(true));
        assert_eq!(eval("(not 0)"), Value::Bool(false));
    }

    #[test]
    fn test_eq_vs_equal() {
        assert_eq!(eval("(eq? 'a 'a)"), Value::Bool(true));
        assert_eq!(eval("(eq? '(1 2) '(1 2))"), Value::Bool(false));
        assert_eq!(eval("(equal? '(1 (2)) '(1 (2)))"), Value::Bool(true));
        assert_eq!(eval("(define xs '(1 2)) (eq? xs xs)"), Value::Bool(true));
    }

    #[test]
    fn test_list_operations() {
        assert_eq!(eval("(list 1 2)"), Value::list(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(eval("(length '(a b c))"), Value::Int(3));
        assert_eq!(eval("(car '(1 2))"), Value::Int(1));
        assert_eq!(eval("(cdr '(1 2 3))"), Value::list(vec![Value::Int(2), Value::Int(3)]));
        assert_eq!(eval("(cons 0 '(1))"), Value::list(vec![Value::Int(0), Value::Int(1)]));
        assert_eq!(
            eval("(append '(1) '(2 3))"),
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(eval("(reverse '(1 2 3))").to_string(), "(3 2 1)");
        assert_eq!(eval("(list-ref '(a b c) 1)").to_string(), "b");
    }

    #[test]
    fn test_car_cdr_on_empty_list_fail() {
        assert!(matches!(eval_err("(car '())"), Error::Type(_)));
        assert!(matches!(eval_err("(cdr '())"), Error::Type(_)));
    }

    #[test]
    fn test_cons_requires_list_tail() {
        assert!(matches!(eval_err("(cons 1 2)"), Error::Type(_)));
    }

    #[test]
    fn test_list_ref_out_of_range() {
        assert!(matches!(eval_err("(list-ref '(1) 5)"), Error::Type(_)));
        assert!(matches!(eval_err("(list-ref '(1) -1)"), Error::Type(_)));
    }

    #[test]
    fn test_map_and_apply() {
        assert_eq!(eval("(map (lambda (n) (* n n)) '(1 2 3))").to_string(), "(1 4 9)");
        assert_eq!(eval("(apply + '(1 2 3))"), Value::Int(6));
        assert_eq!(eval("(apply car '((9 8)))"), Value::Int(9));
    }

    #[test]
    fn test_range() {
        assert_eq!(eval("(range 4)").to_string(), "(0 1 2 3)");
        assert_eq!(eval("(range 2 5)").to_string(), "(2 3 4)");
        assert_eq!(eval("(range 0 10 3)").to_string(), "(0 3 6 9)");
        assert_eq!(eval("(range 5 0 -2)").to_string(), "(5 3 1)");
        assert_eq!(eval("(range 0 5 -1)").to_string(), "()");
        assert!(matches!(eval_err("(range 0 5 0)"), Error::Type(_)));
        assert!(matches!(eval_err("(range 1.5)"), Error::Type(_)));
    }

    #[test]
    fn test_symbol_to_string() {
        assert_eq!(eval("(symbol->string 'abc)"), Value::str("abc"));
        assert!(matches!(eval_err("(symbol->string 1)"), Error::Type(_)));
    }

    #[test]
    fn test_assert() {
        assert!(matches!(eval("(assert (= 1 1))"), Value::None));
        assert!(matches!(eval_err("(assert #f)"), Error::Assert(_)));
        let err = eval_err(r#"(assert (> 1 2) "one is not greater")"#);
        assert_eq!(err, Error::Assert("one is not greater".to_string()));
    }

    #[test]
    fn test_null_returns_none() {
        assert!(matches!(eval("(null)"), Value::None));
    }

    #[test]
    fn test_max_min() {
        assert_eq!(eval("(max 1 3 2)"), Value::Int(3));
        assert_eq!(eval("(min 1 3 -2)"), Value::Int(-2));
        assert_eq!(eval("(max 1 2.5)"), Value::Float(2.5));
        assert_eq!(eval("(abs -4)"), Value::Int(4));
        assert_eq!(eval("(abs -4.5)"), Value::Float(4.5));
    }
}
