//! The tagged runtime value (spec §3 "Value").

use crate::handle::Handle;
use crate::heap::object::Obj;
use crate::heap::Heap;

#[derive(Clone, Copy, Debug)]
pub enum Value {
    Bool(bool),
    Null,
    Number(f64),
    Object(Handle),
}

impl Value {
    #[must_use]
    pub fn is_truthy(self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Null)
    }

    #[must_use]
    pub fn as_number(self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n),
            Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(self) -> Option<Handle> {
        match self {
            Value::Object(h) => Some(h),
            _ => None,
        }
    }

    #[must_use]
    pub fn type_name(self, heap: &Heap) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::Object(h) => heap.get(h).type_name(),
        }
    }
}

/// Spec §4.4's `==`/`!=`: same-tag, then payload equality for primitives
/// and pointer (handle) equality for objects. Because strings are
/// interned (equal content implies equal handle), this already *is*
/// value equality for strings — no separate byte comparison needed.
#[must_use]
pub fn values_equal(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => x == y,
        _ => false,
    }
}

/// Spec §4.4's `is`: "pointer equality for non-string Objects, by-value
/// for Strings, normal equality for primitives, false across differing
/// tags". Since interning makes string pointer-equality and value-equality
/// coincide, this is exactly [`values_equal`] — recorded here as a named
/// alias rather than duplicated logic, so the two can diverge later if a
/// non-interned object type ever needs a real identity/value distinction.
#[must_use]
pub fn values_identical(a: Value, b: Value) -> bool {
    values_equal(a, b)
}

/// Spec §11: integral doubles print without a trailing `.0`; everything
/// else uses Rust's default float formatting (already elides unnecessary
/// trailing zeros).
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[must_use]
pub fn display_value(value: Value, heap: &Heap) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Number(n) => format_number(n),
        Value::Object(h) => display_object(h, heap),
    }
}

fn display_object(handle: Handle, heap: &Heap) -> String {
    match heap.get(handle) {
        Obj::Str(s) => s.as_str().into_owned(),
        Obj::Array(a) => {
            let items: Vec<String> = a.items.iter().map(|v| display_value(*v, heap)).collect();
            format!("[{}]", items.join(", "))
        }
        Obj::Map(m) => {
            let entries: Vec<String> = m
                .keys
                .iter()
                .map(|k| {
                    let key = display_object(*k, heap);
                    let value = m.table.get(*k).map(|v| display_value(*v, heap)).unwrap_or_default();
                    format!("\"{key}\": {value}")
                })
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Obj::Function(f) => match &f.prototype.name {
            Some(name) => format!("<function {name}>"),
            None => "<script>".to_string(),
        },
        Obj::Closure(c) => display_object(c.function, heap),
        Obj::Native(n) => format!("<native {}>", n.name),
        Obj::Upvalue(_) => "<upvalue>".to_string(),
        Obj::Class(c) => format!("<class {}>", display_object(c.name, heap)),
        Obj::Instance(i) => {
            let Obj::Class(class) = heap.get(i.class) else { unreachable!("class handle") };
            format!("<{} instance>", display_object(class.name, heap))
        }
        Obj::BoundMethod(b) => display_object(b.method, heap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_print_without_trailing_zero() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-7.0), "-7");
    }

    #[test]
    fn fractional_floats_keep_their_digits() {
        assert_eq!(format_number(3.5), "3.5");
    }

    #[test]
    fn truthiness_excludes_only_false_and_null() {
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::Bool(true).is_truthy());
    }
}
