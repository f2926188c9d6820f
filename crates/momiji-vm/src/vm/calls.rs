//! Call protocol (spec §4.5 "Call protocol" / "Method invoke").

use crate::error::RuntimeError;
use crate::handle::Handle;
use crate::heap::object::{BoundMethodObj, InstanceObj, NativeFn, Obj};
use crate::value::Value;

use super::frame::{CallFrame, FRAMES_MAX};
use super::Vm;

enum Dispatch {
    Closure(Handle),
    Native(NativeFn, Option<u8>),
    Class(Handle),
    Bound(Value, Handle),
    NotCallable(&'static str),
}

impl Vm {
    /// Dispatches `callee(args)` where `args` are the top `argc` stack
    /// slots and `callee` sits just below them.
    pub(super) fn call_value(&mut self, callee: Value, argc: u8) -> Result<(), RuntimeError> {
        let Value::Object(handle) = callee else {
            return Err(self.runtime_error(format!("'{}' is not callable", self.display(callee))));
        };
        let dispatch = match self.heap.get(handle) {
            Obj::Closure(_) => Dispatch::Closure(handle),
            Obj::Native(native) => Dispatch::Native(native.func, native.arity),
            Obj::Class(_) => Dispatch::Class(handle),
            Obj::BoundMethod(bound) => Dispatch::Bound(bound.receiver, bound.method),
            other => Dispatch::NotCallable(other.type_name()),
        };
        match dispatch {
            Dispatch::Closure(h) => self.call_closure(h, argc),
            Dispatch::Native(func, arity) => self.call_native(func, arity, argc),
            Dispatch::Class(h) => self.instantiate(h, argc),
            Dispatch::Bound(receiver, method) => {
                let base = self.stack_len() - usize::from(argc) - 1;
                self.set_stack(base, receiver);
                self.call_closure(method, argc)
            }
            Dispatch::NotCallable(name) => Err(self.runtime_error(format!("'{name}' is not callable"))),
        }
    }

    fn call_native(&mut self, func: NativeFn, arity: Option<u8>, argc: u8) -> Result<(), RuntimeError> {
        if let Some(expected) = arity {
            if expected != argc {
                return Err(self.runtime_error(format!("expected {expected} argument(s) but got {argc}")));
            }
        }
        let base = self.stack_len() - usize::from(argc);
        let args: Vec<Value> = self.stack_slice(base..base + usize::from(argc)).to_vec();
        let result = func(self, &args)?;
        self.truncate_stack(base - 1);
        self.push(result);
        Ok(())
    }

    pub(super) fn call_closure(&mut self, closure_handle: Handle, argc: u8) -> Result<(), RuntimeError> {
        let function_handle = match self.heap.get(closure_handle) {
            Obj::Closure(closure) => closure.function,
            _ => unreachable!("call_closure invoked on a non-closure handle"),
        };
        let prototype = match self.heap.get(function_handle) {
            Obj::Function(function) => function.prototype.clone(),
            _ => unreachable!("closure points at a non-function handle"),
        };
        if prototype.arity != argc {
            let arity = prototype.arity;
            return Err(self.runtime_error(format!("expected {arity} argument(s) but got {argc}")));
        }
        if self.frame_count() >= FRAMES_MAX {
            return Err(self.runtime_error("stack overflow"));
        }
        let base = self.stack_len() - usize::from(argc) - 1;
        self.push_frame(CallFrame { closure: closure_handle, function: prototype, ip: 0, base });
        Ok(())
    }

    /// Replaces slot 0 (the class value) with a fresh instance and runs
    /// its constructor, if any (spec §4.5 "Class: replace slot 0…").
    fn instantiate(&mut self, class_handle: Handle, argc: u8) -> Result<(), RuntimeError> {
        let (initializer, fields) = match self.heap.get(class_handle) {
            Obj::Class(class) => (class.initializer, class.fields.clone()),
            _ => unreachable!("instantiate invoked on a non-class handle"),
        };
        let instance = self.alloc(Obj::Instance(InstanceObj { class: class_handle, fields }));
        let base = self.stack_len() - usize::from(argc) - 1;
        self.set_stack(base, Value::Object(instance));

        match initializer {
            Some(ctor) => self.call_closure(ctor, argc),
            None => {
                if argc != 0 {
                    return Err(self.runtime_error(format!("expected 0 arguments but got {argc}")));
                }
                Ok(())
            }
        }
    }

    /// Fused get-property-then-call (`OP_INVOKE`): a shadowing instance
    /// field wins over a method with the same name.
    pub(super) fn invoke(&mut self, name: Handle, argc: u8) -> Result<(), RuntimeError> {
        let receiver = self.peek(usize::from(argc));
        let Value::Object(handle) = receiver else {
            return Err(self.runtime_error("only instances have methods"));
        };
        let (field, class_handle) = match self.heap.get(handle) {
            Obj::Instance(instance) => (instance.fields.get(name).copied(), instance.class),
            _ => return Err(self.runtime_error("only instances have methods")),
        };
        if let Some(field) = field {
            let base = self.stack_len() - usize::from(argc) - 1;
            self.set_stack(base, field);
            return self.call_value(field, argc);
        }
        self.invoke_from_class(class_handle, name, argc)
    }

    pub(super) fn invoke_from_class(
        &mut self,
        class_handle: Handle,
        name: Handle,
        argc: u8,
    ) -> Result<(), RuntimeError> {
        let method = match self.heap.get(class_handle) {
            Obj::Class(class) => class.methods.get(name).copied(),
            _ => unreachable!("invoke_from_class invoked on a non-class handle"),
        };
        let Some(method) = method else {
            return Err(self.runtime_error(format!("undefined property '{}'", self.resolve_name(name))));
        };
        self.call_closure(method, argc)
    }

    /// Binds a method off a class into a fresh `BoundMethod`, leaving it
    /// on top of the stack in place of the receiver (`OP_GET_PROPERTY`
    /// falling through to a method, and `OP_GET_SUPER`).
    pub(super) fn bind_method(&mut self, class_handle: Handle, name: Handle) -> Result<(), RuntimeError> {
        let method = match self.heap.get(class_handle) {
            Obj::Class(class) => class.methods.get(name).copied(),
            _ => unreachable!("bind_method invoked on a non-class handle"),
        };
        let Some(method) = method else {
            return Err(self.runtime_error(format!("undefined property '{}'", self.resolve_name(name))));
        };
        // Collect while the receiver is still rooted on the stack, not
        // after it is popped into a local.
        self.maybe_collect();
        let receiver = self.pop();
        let bound = self.heap.alloc(Obj::BoundMethod(BoundMethodObj { receiver, method }));
        self.push(Value::Object(bound));
        Ok(())
    }

    pub(super) fn resolve_name(&self, handle: Handle) -> String {
        match self.heap.get(handle) {
            Obj::Str(s) => s.as_str().into_owned(),
            _ => "<?>".to_string(),
        }
    }
}
