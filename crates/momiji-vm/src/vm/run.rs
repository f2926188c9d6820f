//! The bytecode dispatch loop itself (spec §4.5 "Virtual Machine").

use momiji_compiler::{Constant, OpCode};

use crate::error::RuntimeError;
use crate::handle::Handle;
use crate::heap::object::{ClassObj, ClosureObj, Obj, UpvalueObj};
use crate::value::Value;

use super::ops::{Arith, Compare};
use super::Vm;

impl Vm {
    pub(super) fn run_loop(&mut self) -> Result<(), RuntimeError> {
        loop {
            if self.trace_execution {
                let line = self.current_frame().current_line();
                tracing::trace!(line, ip = self.current_frame().ip, stack_depth = self.stack_len(), "executing");
            }
            let op = self.read_op();
            match op {
                OpCode::Constant => {
                    let index = u32::from(self.current_frame_mut().read_byte());
                    let value = self.constant_value(index);
                    self.push(value);
                }
                OpCode::ConstantLong => {
                    let index = self.current_frame_mut().read_u32();
                    let value = self.constant_value(index);
                    self.push(value);
                }
                OpCode::Null => self.push(Value::Null),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Maybe => {
                    let b = self.maybe_random_bool();
                    self.push(Value::Bool(b));
                }
                OpCode::Pop => {
                    self.pop();
                }
                OpCode::Duplicate => {
                    let v = self.peek(0);
                    self.push(v);
                }
                OpCode::DefineGlobal => {
                    let index = self.current_frame_mut().read_u32();
                    let name = self.read_string_constant(index);
                    let value = self.pop();
                    self.globals.set(name, value);
                }
                OpCode::GetGlobal => {
                    let index = self.current_frame_mut().read_u32();
                    let name = self.read_string_constant(index);
                    let value = self.globals.get(name).copied().ok_or_else(|| {
                        self.runtime_error(format!("undefined global '{}'", self.resolve_name(name)))
                    })?;
                    self.push(value);
                }
                OpCode::SetGlobal => {
                    let index = self.current_frame_mut().read_u32();
                    let name = self.read_string_constant(index);
                    let value = self.peek(0);
                    if self.globals.set(name, value) {
                        self.globals.delete(name);
                        return Err(self.runtime_error(format!("undefined global '{}'", self.resolve_name(name))));
                    }
                }
                OpCode::GetLocal => {
                    let slot = self.current_frame_mut().read_u32() as usize;
                    let base = self.current_frame().base;
                    self.push(self.stack_slice(base + slot..base + slot + 1)[0]);
                }
                OpCode::SetLocal => {
                    let slot = self.current_frame_mut().read_u32() as usize;
                    let base = self.current_frame().base;
                    let value = self.peek(0);
                    self.set_stack(base + slot, value);
                }
                OpCode::GetUpvalue => {
                    let slot = self.current_frame_mut().read_u32() as u8;
                    let value = self.get_upvalue(slot);
                    self.push(value);
                }
                OpCode::SetUpvalue => {
                    let slot = self.current_frame_mut().read_u32() as u8;
                    let value = self.peek(0);
                    self.set_upvalue(slot, value);
                }
                OpCode::CloseUpvalue => {
                    let top = self.stack_len() - 1;
                    self.close_upvalues(top);
                    self.pop();
                }
                OpCode::GetProperty => self.op_get_property()?,
                OpCode::SetProperty => self.op_set_property()?,
                OpCode::InitProperty => self.op_init_property(),
                OpCode::GetSuper => self.op_get_super()?,
                OpCode::GetIndex => self.get_index()?,
                OpCode::SetIndex => self.set_index()?,
                OpCode::GetIndexRanged => self.get_index_ranged()?,
                OpCode::Equal => self.compare(Compare::Equal)?,
                OpCode::NotEqual => self.compare(Compare::NotEqual)?,
                OpCode::Greater => self.compare(Compare::Greater)?,
                OpCode::Smaller => self.compare(Compare::Smaller)?,
                OpCode::GreaterEqual => self.compare(Compare::GreaterEqual)?,
                OpCode::SmallerEqual => self.compare(Compare::SmallerEqual)?,
                OpCode::Is => self.is_op(),
                OpCode::Add => self.binary_arith(Arith::Add)?,
                OpCode::Subtract => self.binary_arith(Arith::Subtract)?,
                OpCode::Multiply => self.binary_arith(Arith::Multiply)?,
                OpCode::Divide => self.binary_arith(Arith::Divide)?,
                OpCode::Mod => self.binary_arith(Arith::Mod)?,
                OpCode::BitwiseAnd => self.binary_arith(Arith::BitwiseAnd)?,
                OpCode::BitwiseOr => self.binary_arith(Arith::BitwiseOr)?,
                OpCode::Negate => self.negate()?,
                OpCode::Not => self.not_op(),
                OpCode::PreIncrease => self.pre_step(1.0)?,
                OpCode::PreDecrease => self.pre_step(-1.0)?,
                OpCode::PostIncrease => self.post_step(1.0)?,
                OpCode::PostDecrease => self.post_step(-1.0)?,
                OpCode::Jump => {
                    let offset = self.current_frame_mut().read_u16();
                    self.current_frame_mut().patch_ip(i32::from(offset));
                }
                OpCode::JumpIfFalse => {
                    let offset = self.current_frame_mut().read_u16();
                    if !self.peek(0).is_truthy() {
                        self.current_frame_mut().patch_ip(i32::from(offset));
                    }
                }
                OpCode::Loop => {
                    let offset = self.current_frame_mut().read_u16();
                    self.current_frame_mut().patch_ip(-i32::from(offset));
                }
                OpCode::Call => {
                    let argc = self.current_frame_mut().read_byte();
                    let callee = self.peek(usize::from(argc));
                    self.call_value(callee, argc)?;
                }
                OpCode::Invoke => {
                    let index = self.current_frame_mut().read_u32();
                    let name = self.read_string_constant(index);
                    let argc = self.current_frame_mut().read_byte();
                    self.invoke(name, argc)?;
                }
                OpCode::SuperInvoke => {
                    let index = self.current_frame_mut().read_u32();
                    let name = self.read_string_constant(index);
                    let argc = self.current_frame_mut().read_byte();
                    let superclass = self.pop();
                    let Value::Object(class_handle) = superclass else {
                        return Err(self.runtime_error("'super' target is not a class"));
                    };
                    self.invoke_from_class(class_handle, name, argc)?;
                }
                OpCode::Closure => self.op_closure()?,
                OpCode::Array => {
                    let count = self.current_frame_mut().read_u16();
                    self.build_array(count)?;
                }
                OpCode::Map => {
                    let count = self.current_frame_mut().read_u16();
                    self.build_map(count)?;
                }
                OpCode::Class => {
                    let index = self.current_frame_mut().read_u32();
                    let name = self.read_string_constant(index);
                    let handle = self.alloc(Obj::Class(ClassObj { name, ..ClassObj::default() }));
                    self.push(Value::Object(handle));
                }
                OpCode::Inherit => self.op_inherit()?,
                OpCode::Method => self.op_method(),
                OpCode::Return => {
                    let result = self.pop();
                    let frame = self.pop_frame();
                    self.close_upvalues(frame.base);
                    self.truncate_stack(frame.base);
                    if self.frame_count() == 0 {
                        if !matches!(result, Value::Null) {
                            println!("{}", self.display(result));
                        }
                        return Ok(());
                    }
                    self.push(result);
                }
                OpCode::Print => {
                    let v = self.pop();
                    println!("{}", self.display(v));
                }
            }
        }
    }

    fn read_op(&mut self) -> OpCode {
        let byte = self.current_frame_mut().read_byte();
        OpCode::try_from(byte).unwrap_or_else(|b| unreachable!("unknown opcode byte {b}"))
    }

    fn constant_value(&mut self, index: u32) -> Value {
        let constant = self.current_frame().function.chunk.constants()[index as usize].clone();
        match constant {
            Constant::Number(n) => Value::Number(n),
            Constant::Str(s) => self.intern_string(s.as_bytes()),
            Constant::Func(_) => unreachable!("a bare CONSTANT/CONSTANT_LONG never targets a function prototype"),
        }
    }

    fn op_get_property(&mut self) -> Result<(), RuntimeError> {
        let index = self.current_frame_mut().read_u32();
        let name = self.read_string_constant(index);
        let receiver = self.pop();
        let Value::Object(handle) = receiver else {
            return Err(self.runtime_error("only instances have properties"));
        };

        enum Found {
            Field(Value),
            Method(Handle),
        }
        let found = match self.heap.get(handle) {
            Obj::Instance(instance) => match instance.fields.get(name).copied() {
                Some(v) => Found::Field(v),
                None => Found::Method(instance.class),
            },
            _ => return Err(self.runtime_error("only instances have properties")),
        };
        match found {
            Found::Field(v) => self.push(v),
            Found::Method(class_handle) => {
                self.push(receiver);
                self.bind_method(class_handle, name)?;
            }
        }
        Ok(())
    }

    fn op_set_property(&mut self) -> Result<(), RuntimeError> {
        let index = self.current_frame_mut().read_u32();
        let name = self.read_string_constant(index);
        let value = self.pop();
        let receiver = self.pop();
        let Value::Object(handle) = receiver else {
            return Err(self.runtime_error("only instances have properties"));
        };
        match self.heap.get_mut(handle) {
            Obj::Instance(instance) => {
                instance.fields.set(name, value);
            }
            _ => return Err(self.runtime_error("only instances have properties")),
        }
        self.push(value);
        Ok(())
    }

    /// Default field values declared in a class body (spec §4.2 "`local
    /// field = expr;`"): the class sits under the value on the stack for
    /// the whole body, so this only ever peeks it, never pops it.
    fn op_init_property(&mut self) {
        let index = self.current_frame_mut().read_u32();
        let name = self.read_string_constant(index);
        let value = self.pop();
        let Value::Object(class_handle) = self.peek(0) else {
            unreachable!("INIT_PROPERTY without a class beneath the value")
        };
        match self.heap.get_mut(class_handle) {
            Obj::Class(class) => {
                if class.fields.set(name, value) {
                    class.field_names.push(name);
                }
            }
            _ => unreachable!("INIT_PROPERTY targeting a non-class"),
        }
    }

    /// `super.method` with no call (spec §4.3): stack holds `[this, super]`
    /// on entry, matching how `super_expr` emits both `this` and `super`
    /// before this opcode.
    fn op_get_super(&mut self) -> Result<(), RuntimeError> {
        let index = self.current_frame_mut().read_u32();
        let name = self.read_string_constant(index);
        let superclass = self.pop();
        let Value::Object(class_handle) = superclass else {
            return Err(self.runtime_error("'super' target is not a class"));
        };
        self.bind_method(class_handle, name)
    }

    fn op_closure(&mut self) -> Result<(), RuntimeError> {
        let index = self.current_frame_mut().read_u32();
        let prototype = self.read_function_constant(index);
        let upvalue_count = prototype.upvalue_count;
        let function_handle = self.materialize_function(prototype);
        let enclosing_closure = self.current_frame().closure;
        let base = self.current_frame().base;

        let mut upvalues = Vec::with_capacity(upvalue_count);
        for _ in 0..upvalue_count {
            let is_local = self.current_frame_mut().read_byte() != 0;
            let slot_index = self.current_frame_mut().read_byte();
            let handle = if is_local {
                self.capture_upvalue(base + usize::from(slot_index))
            } else {
                match self.heap.get(enclosing_closure) {
                    Obj::Closure(c) => c.upvalues[usize::from(slot_index)],
                    _ => unreachable!("enclosing frame's closure handle is not a closure"),
                }
            };
            upvalues.push(handle);
        }
        let closure_handle = self.alloc(Obj::Closure(ClosureObj { function: function_handle, upvalues }));
        self.push(Value::Object(closure_handle));
        Ok(())
    }

    /// `OP_INHERIT` (spec §4.3 "inherit copies methods and fields by
    /// value at declaration time, not by a superclass pointer"): superclass
    /// sits at `peek(1)`, the fresh subclass at `peek(0)`; only the
    /// subclass copy is popped, leaving the superclass as the `super`
    /// local's stack slot.
    fn op_inherit(&mut self) -> Result<(), RuntimeError> {
        let subclass = self.peek(0);
        let superclass = self.peek(1);
        let Value::Object(super_handle) = superclass else {
            return Err(self.runtime_error("superclass must be a class"));
        };
        let Value::Object(sub_handle) = subclass else {
            unreachable!("INHERIT without a subclass on the stack")
        };
        let (super_methods, super_fields) = match self.heap.get(super_handle) {
            Obj::Class(c) => (c.methods.clone(), c.fields.clone()),
            _ => return Err(self.runtime_error("superclass must be a class")),
        };
        let methods: Vec<(Handle, Handle)> = super_methods.iter().map(|(k, v)| (k, *v)).collect();
        let fields: Vec<(Handle, Value)> = super_fields.iter().map(|(k, v)| (k, *v)).collect();
        match self.heap.get_mut(sub_handle) {
            Obj::Class(sub) => {
                for (key, value) in methods {
                    if sub.methods.set(key, value) {
                        sub.method_names.push(key);
                    }
                }
                for (key, value) in fields {
                    if sub.fields.set(key, value) {
                        sub.field_names.push(key);
                    }
                }
            }
            _ => unreachable!("INHERIT targeting a non-class subclass"),
        }
        self.pop();
        Ok(())
    }

    /// `OP_METHOD`: the class sits below the freshly-closed method on the
    /// stack; a method whose name equals the class's own name becomes the
    /// constructor (spec §4.3 "constructor naming convention").
    fn op_method(&mut self) {
        let index = self.current_frame_mut().read_u32();
        let name = self.read_string_constant(index);
        let closure = self.pop();
        let Value::Object(closure_handle) = closure else {
            unreachable!("METHOD without a closure on the stack")
        };
        let Value::Object(class_handle) = self.peek(0) else {
            unreachable!("METHOD without a class beneath the closure")
        };
        match self.heap.get_mut(class_handle) {
            Obj::Class(class) => {
                if class.methods.set(name, closure_handle) {
                    class.method_names.push(name);
                }
                if name == class.name {
                    class.initializer = Some(closure_handle);
                }
            }
            _ => unreachable!("METHOD targeting a non-class"),
        }
    }

    /// Prefix `++`/`--`: pushes the new value twice, so the write-back's
    /// own pop (emitted by the compiler right after the SET opcode) still
    /// leaves one copy as the expression's result.
    fn pre_step(&mut self, delta: f64) -> Result<(), RuntimeError> {
        let v = self.pop();
        let Some(n) = v.as_number() else {
            return Err(self.runtime_error(format!("cannot increment/decrement {}", self.display(v))));
        };
        let new = Value::Number(n + delta);
        self.push(new);
        self.push(new);
        Ok(())
    }

    /// Postfix `++`/`--`: pushes the original then the new value, so the
    /// write-back's pop leaves the original as the expression's result.
    fn post_step(&mut self, delta: f64) -> Result<(), RuntimeError> {
        let v = self.pop();
        let Some(n) = v.as_number() else {
            return Err(self.runtime_error(format!("cannot increment/decrement {}", self.display(v))));
        };
        self.push(Value::Number(n));
        self.push(Value::Number(n + delta));
        Ok(())
    }

    fn get_upvalue(&self, slot: u8) -> Value {
        let closure = self.current_frame().closure;
        let upvalue_handle = match self.heap.get(closure) {
            Obj::Closure(c) => c.upvalues[usize::from(slot)],
            _ => unreachable!("current frame's closure handle is not a closure"),
        };
        match self.heap.get(upvalue_handle) {
            Obj::Upvalue(UpvalueObj::Open(location)) => self.stack_slice(*location..*location + 1)[0],
            Obj::Upvalue(UpvalueObj::Closed(value)) => *value,
            _ => unreachable!("upvalue handle is not an upvalue"),
        }
    }

    fn set_upvalue(&mut self, slot: u8, value: Value) {
        let closure = self.current_frame().closure;
        let upvalue_handle = match self.heap.get(closure) {
            Obj::Closure(c) => c.upvalues[usize::from(slot)],
            _ => unreachable!("current frame's closure handle is not a closure"),
        };
        let open_location = match self.heap.get(upvalue_handle) {
            Obj::Upvalue(UpvalueObj::Open(location)) => Some(*location),
            Obj::Upvalue(UpvalueObj::Closed(_)) => None,
            _ => unreachable!("upvalue handle is not an upvalue"),
        };
        match open_location {
            Some(location) => self.set_stack(location, value),
            None => {
                if let Obj::Upvalue(u) = self.heap.get_mut(upvalue_handle) {
                    *u = UpvalueObj::Closed(value);
                }
            }
        }
    }

    /// Reuses an already-open upvalue for `location` if one exists (spec
    /// §3 invariant 4: at most one live upvalue per stack slot); otherwise
    /// opens a fresh one, keeping `open_upvalues` sorted by descending
    /// slot the way clox's linked list does.
    fn capture_upvalue(&mut self, location: usize) -> Handle {
        for &handle in &self.open_upvalues {
            if let Obj::Upvalue(UpvalueObj::Open(loc)) = self.heap.get(handle) {
                if *loc == location {
                    return handle;
                }
            }
        }
        let handle = self.alloc(Obj::Upvalue(UpvalueObj::Open(location)));
        let insert_at = self
            .open_upvalues
            .iter()
            .position(|&h| match self.heap.get(h) {
                Obj::Upvalue(UpvalueObj::Open(loc)) => *loc < location,
                _ => false,
            })
            .unwrap_or(self.open_upvalues.len());
        self.open_upvalues.insert(insert_at, handle);
        handle
    }

    /// Closes every open upvalue at or above stack slot `from`, copying
    /// its value inline so the slot can be discarded (spec §4.5 "Upvalue
    /// closing", fired by `OP_CLOSE_UPVALUE` and by `OP_RETURN`).
    fn close_upvalues(&mut self, from: usize) {
        let mut i = 0;
        while i < self.open_upvalues.len() {
            let handle = self.open_upvalues[i];
            let location = match self.heap.get(handle) {
                Obj::Upvalue(UpvalueObj::Open(loc)) => *loc,
                _ => unreachable!("open_upvalues holds a non-open upvalue"),
            };
            if location >= from {
                let value = self.stack_slice(location..location + 1)[0];
                if let Obj::Upvalue(u) = self.heap.get_mut(handle) {
                    *u = UpvalueObj::Closed(value);
                }
                self.open_upvalues.remove(i);
            } else {
                i += 1;
            }
        }
    }
}
