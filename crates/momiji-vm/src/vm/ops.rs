//! Arithmetic, comparison, and array/map operand shaping (spec §4.4
//! "Comparison semantics" / "Arithmetic coercion", §4.8 "Array / Map
//! runtime operations").

use crate::error::RuntimeError;
use crate::handle::Handle;
use crate::heap::object::{ArrayObj, MapObj, Obj};
use crate::value::{values_equal, values_identical, Value};

use super::Vm;

#[derive(Clone, Copy)]
pub(super) enum Arith {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    BitwiseAnd,
    BitwiseOr,
}

#[derive(Clone, Copy)]
pub(super) enum Compare {
    Equal,
    NotEqual,
    Greater,
    Smaller,
    GreaterEqual,
    SmallerEqual,
}

impl Vm {
    pub(super) fn binary_arith(&mut self, op: Arith) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();

        if matches!(op, Arith::Add) {
            if let (Value::Object(x), Value::Object(y)) = (a, b) {
                let both_strings =
                    matches!(self.heap.get(x), Obj::Str(_)) && matches!(self.heap.get(y), Obj::Str(_));
                if both_strings {
                    let result = self.concatenate(x, y);
                    self.push(result);
                    return Ok(());
                }
            }
        }

        let (Some(x), Some(y)) = (a.as_number(), b.as_number()) else {
            return Err(self.runtime_error(format!(
                "cannot apply '{}' to {} and {}",
                arith_symbol(op),
                self.display(a),
                self.display(b)
            )));
        };
        let result = match op {
            Arith::Add => x + y,
            Arith::Subtract => x - y,
            Arith::Multiply => x * y,
            Arith::Divide => x / y,
            Arith::Mod => x % y,
            Arith::BitwiseAnd => f64::from((x as i64) & (y as i64)),
            Arith::BitwiseOr => f64::from((x as i64) | (y as i64)),
        };
        self.push(Value::Number(result));
        Ok(())
    }

    fn concatenate(&mut self, left: Handle, right: Handle) -> Value {
        let mut bytes = match self.heap.get(left) {
            Obj::Str(s) => s.bytes.to_vec(),
            _ => unreachable!("concatenate called on a non-string handle"),
        };
        let right_bytes = match self.heap.get(right) {
            Obj::Str(s) => s.bytes.to_vec(),
            _ => unreachable!("concatenate called on a non-string handle"),
        };
        bytes.extend_from_slice(&right_bytes);
        self.intern_string(&bytes)
    }

    pub(super) fn compare(&mut self, op: Compare) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        let short_circuits_equal = matches!(op, Compare::GreaterEqual | Compare::SmallerEqual);
        let result = if short_circuits_equal && values_equal(a, b) {
            true
        } else {
            match op {
                Compare::Equal => values_equal(a, b),
                Compare::NotEqual => !values_equal(a, b),
                _ => {
                    let (Some(x), Some(y)) = (a.as_number(), b.as_number()) else {
                        return Err(self.runtime_error(format!(
                            "cannot compare {} and {}",
                            self.display(a),
                            self.display(b)
                        )));
                    };
                    match op {
                        Compare::Greater => x > y,
                        Compare::Smaller => x < y,
                        Compare::GreaterEqual => x >= y,
                        Compare::SmallerEqual => x <= y,
                        Compare::Equal | Compare::NotEqual => unreachable!(),
                    }
                }
            }
        };
        self.push(Value::Bool(result));
        Ok(())
    }

    pub(super) fn is_op(&mut self) {
        let b = self.pop();
        let a = self.pop();
        self.push(Value::Bool(values_identical(a, b)));
    }

    pub(super) fn negate(&mut self) -> Result<(), RuntimeError> {
        let v = self.pop();
        let Some(n) = v.as_number() else {
            return Err(self.runtime_error(format!("cannot negate {}", self.display(v))));
        };
        self.push(Value::Number(-n));
        Ok(())
    }

    pub(super) fn not_op(&mut self) {
        let v = self.pop();
        self.push(Value::Bool(!v.is_truthy()));
    }

    pub(super) fn build_array(&mut self, count: u16) -> Result<(), RuntimeError> {
        // Collect while the elements are still rooted on the stack, not
        // after copying them into an unrooted local `Vec`.
        self.maybe_collect();
        let start = self.stack_len() - usize::from(count);
        let items = self.stack_slice(start..start + usize::from(count)).to_vec();
        self.truncate_stack(start - 1);
        let handle = self.heap.alloc(Obj::Array(ArrayObj { items }));
        self.push(Value::Object(handle));
        Ok(())
    }

    pub(super) fn build_map(&mut self, count: u16) -> Result<(), RuntimeError> {
        self.maybe_collect();
        let start = self.stack_len() - usize::from(count) * 2;
        let pairs = self.stack_slice(start..start + usize::from(count) * 2).to_vec();
        self.truncate_stack(start - 1);
        let mut map = MapObj::default();
        for pair in pairs.chunks_exact(2) {
            let (key, value) = (pair[0], pair[1]);
            let Value::Object(key_handle) = key else {
                return Err(self.runtime_error("map keys must be strings"));
            };
            if !matches!(self.heap.get(key_handle), Obj::Str(_)) {
                return Err(self.runtime_error("map keys must be strings"));
            }
            if map.table.set(key_handle, value) {
                map.keys.push(key_handle);
            }
        }
        let handle = self.heap.alloc(Obj::Map(map));
        self.push(Value::Object(handle));
        Ok(())
    }

    pub(super) fn get_index(&mut self) -> Result<(), RuntimeError> {
        let index = self.pop();
        let target = self.pop();
        let Value::Object(handle) = target else {
            return Err(self.runtime_error("only arrays and maps can be indexed"));
        };

        enum Found {
            ArrayElem(Value),
            MapLookup,
            NotIndexable(&'static str),
        }
        let found = match self.heap.get(handle) {
            Obj::Array(array) => match self.normalize_read(index, array.items.len()) {
                Ok(i) => Found::ArrayElem(array.items[i]),
                Err(e) => return Err(e),
            },
            Obj::Map(_) => Found::MapLookup,
            other => Found::NotIndexable(other.type_name()),
        };

        match found {
            Found::ArrayElem(v) => {
                self.push(v);
                Ok(())
            }
            Found::MapLookup => {
                let Value::Object(key_handle) = index else {
                    return Err(self.runtime_error("map keys must be strings"));
                };
                let Obj::Map(map) = self.heap.get(handle) else { unreachable!() };
                let value = map.table.get(key_handle).copied().unwrap_or(Value::Null);
                self.push(value);
                Ok(())
            }
            Found::NotIndexable(name) => Err(self.runtime_error(format!("cannot index a {name}"))),
        }
    }

    pub(super) fn set_index(&mut self) -> Result<(), RuntimeError> {
        let value = self.pop();
        let index = self.pop();
        let target = self.pop();
        let Value::Object(handle) = target else {
            return Err(self.runtime_error("only arrays and maps can be indexed"));
        };

        enum Kind {
            Array(usize),
            Map,
            Other(&'static str),
        }
        let kind = match self.heap.get(handle) {
            Obj::Array(a) => Kind::Array(a.items.len()),
            Obj::Map(_) => Kind::Map,
            other => Kind::Other(other.type_name()),
        };

        match kind {
            Kind::Array(len) => {
                let i = self.normalize_write(index, len)?;
                let Obj::Array(array) = self.heap.get_mut(handle) else { unreachable!() };
                if i == len {
                    array.items.push(value);
                } else {
                    array.items[i] = value;
                }
                self.push(value);
                Ok(())
            }
            Kind::Map => {
                let Value::Object(key_handle) = index else {
                    return Err(self.runtime_error("map keys must be strings"));
                };
                if !matches!(self.heap.get(key_handle), Obj::Str(_)) {
                    return Err(self.runtime_error("map keys must be strings"));
                }
                let Obj::Map(map) = self.heap.get_mut(handle) else { unreachable!() };
                if map.table.set(key_handle, value) {
                    map.keys.push(key_handle);
                }
                self.push(value);
                Ok(())
            }
            Kind::Other(name) => Err(self.runtime_error(format!("cannot index a {name}"))),
        }
    }

    /// `a[min:max:step]` (spec §4.8 "`Array.get_range`"): `null` bounds
    /// default to `0`/`length-1`/`1`; a negative step reverses.
    pub(super) fn get_index_ranged(&mut self) -> Result<(), RuntimeError> {
        // Collect while target/min/max/step are still rooted on the stack.
        self.maybe_collect();
        let step = self.pop();
        let max = self.pop();
        let min = self.pop();
        let target = self.pop();
        let Value::Object(handle) = target else {
            return Err(self.runtime_error("only arrays can be sliced"));
        };
        let items = match self.heap.get(handle) {
            Obj::Array(array) => array.items.clone(),
            _ => return Err(self.runtime_error("only arrays can be sliced")),
        };
        let len = items.len() as i64;

        let step = match step {
            Value::Null => 1,
            other => match other.as_number() {
                Some(n) => n as i64,
                None => return Err(self.runtime_error("slice step must be a number")),
            },
        };
        if step == 0 {
            return Err(self.runtime_error("slice step cannot be zero"));
        }
        let default_min = if step > 0 { 0 } else { len - 1 };
        let default_max = if step > 0 { len - 1 } else { 0 };
        let min = match resolve_bound(min, default_min, len) {
            Ok(v) => v,
            Err(msg) => return Err(self.runtime_error(msg)),
        };
        let max = match resolve_bound(max, default_max, len) {
            Ok(v) => v,
            Err(msg) => return Err(self.runtime_error(msg)),
        };

        let mut result = Vec::new();
        if step > 0 {
            let mut i = min;
            while i <= max && i < len {
                if i >= 0 {
                    result.push(items[i as usize]);
                }
                i += step;
            }
        } else {
            let mut i = min;
            while i >= max && i >= 0 {
                if i < len {
                    result.push(items[i as usize]);
                }
                i += step;
            }
        }
        let handle = self.heap.alloc(Obj::Array(ArrayObj { items: result }));
        self.push(Value::Object(handle));
        Ok(())
    }

    fn normalize_read(&self, index: Value, len: usize) -> Result<usize, RuntimeError> {
        let Some(n) = index.as_number() else {
            return Err(self.runtime_error("array index must be a number"));
        };
        let mut i = n as i64;
        if i < 0 {
            i += len as i64;
        }
        if i < 0 || i as usize >= len {
            return Err(self.runtime_error(format!("index {} out of range (length {len})", n as i64)));
        }
        Ok(i as usize)
    }

    /// Like [`Self::normalize_read`] but `i == length` is a valid append
    /// position (spec §4.8 "`i == length` permits append").
    fn normalize_write(&self, index: Value, len: usize) -> Result<usize, RuntimeError> {
        let Some(n) = index.as_number() else {
            return Err(self.runtime_error("array index must be a number"));
        };
        let mut i = n as i64;
        if i < 0 {
            i += len as i64;
        }
        if i < 0 || i as usize > len {
            return Err(self.runtime_error(format!("index {} out of range (length {len})", n as i64)));
        }
        Ok(i as usize)
    }
}

fn resolve_bound(value: Value, default: i64, len: i64) -> Result<i64, &'static str> {
    match value {
        Value::Null => Ok(default),
        other => {
            let n = other.as_number().ok_or("slice bound must be a number")?;
            let mut i = n as i64;
            if i < 0 {
                i += len;
            }
            Ok(i)
        }
    }
}

fn arith_symbol(op: Arith) -> &'static str {
    match op {
        Arith::Add => "+",
        Arith::Subtract => "-",
        Arith::Multiply => "*",
        Arith::Divide => "/",
        Arith::Mod => "%",
        Arith::BitwiseAnd => "&",
        Arith::BitwiseOr => "|",
    }
}
