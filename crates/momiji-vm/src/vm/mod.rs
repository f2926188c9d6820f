//! The call-frame bytecode dispatcher (spec §4.5 "Virtual Machine").

mod calls;
mod collect;
mod frame;
mod ops;
mod run;

use std::rc::Rc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use momiji_compiler::{CompiledFunction, Constant};

use crate::error::RuntimeError;
use crate::gc::{GcConfig, GcStats};
use crate::handle::Handle;
use crate::heap::object::{ClosureObj, FunctionObj, Obj};
use crate::heap::Heap;
use crate::interner::Interner;
use crate::natives::{make_native, BUILTINS};
use crate::table::Table;
use crate::value::Value;

use frame::{CallFrame, FRAMES_MAX};

const STACK_MAX: usize = FRAMES_MAX * 256;

pub struct Vm {
    pub(crate) heap: Heap,
    interner: Interner,
    globals: Table<Value>,
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    /// Open upvalues, sorted by descending stack slot (spec §3 invariant 4).
    open_upvalues: Vec<Handle>,
    /// Materializes each `Constant::Func` prototype into exactly one heap
    /// `Function` object, compared by `Rc::ptr_eq` (spec §4.5 "OP_CLOSURE"
    /// references a constant-pool function; re-running the same `OP_CLOSURE`
    /// site must not allocate a second `Function` for the same prototype).
    function_cache: Vec<(Rc<CompiledFunction>, Handle)>,
    gc_config: GcConfig,
    gc_stats: GcStats,
    next_collection: usize,
    rng: StdRng,
    /// Emit a `tracing::trace!` per executed instruction (spec §10.2,
    /// the runtime-toggleable successor to the distilled source's
    /// `DEBUG_TRACE_EXECUTION` compile-time flag).
    trace_execution: bool,
    pub(crate) start_time: Instant,
}

impl Vm {
    #[must_use]
    pub fn new(gc_config: GcConfig, rng_seed: Option<u64>) -> Self {
        Self::with_trace_execution(gc_config, rng_seed, false)
    }

    #[must_use]
    pub fn with_trace_execution(gc_config: GcConfig, rng_seed: Option<u64>, trace_execution: bool) -> Self {
        let mut vm = Self {
            heap: Heap::new(),
            interner: Interner::new(),
            globals: Table::new(),
            stack: Vec::with_capacity(256),
            frames: Vec::with_capacity(64),
            open_upvalues: Vec::new(),
            function_cache: Vec::new(),
            next_collection: gc_config.initial_threshold,
            gc_config,
            gc_stats: GcStats::default(),
            rng: rng_seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
            trace_execution,
            start_time: Instant::now(),
        };
        vm.define_natives();
        vm
    }

    fn define_natives(&mut self) {
        for &(name, arity, func) in BUILTINS {
            let name_handle = self.intern(name.as_bytes());
            let native = self.alloc(make_native(name, arity, func));
            self.globals.set(name_handle, Value::Object(native));
        }
    }

    /// Runs a freshly compiled top-level program to completion (spec §6:
    /// the REPL feeds one top-level chunk per submission; the file loader
    /// feeds exactly one).
    pub fn run(&mut self, function: CompiledFunction) -> Result<(), RuntimeError> {
        let closure = self.wrap_as_closure(function);
        self.push(Value::Object(closure));
        self.call_value(Value::Object(closure), 0)?;
        self.run_loop()
    }

    fn wrap_as_closure(&mut self, function: CompiledFunction) -> Handle {
        let prototype = Rc::new(function);
        let function_handle = self.alloc(Obj::Function(FunctionObj { prototype: prototype.clone() }));
        self.function_cache.push((prototype, function_handle));
        self.alloc(Obj::Closure(ClosureObj { function: function_handle, upvalues: Vec::new() }))
    }

    /// Materializes a `Constant::Func` prototype into a heap `Function`
    /// exactly once per distinct `Rc` (spec §4.5 "OP_CLOSURE").
    pub(crate) fn materialize_function(&mut self, prototype: Rc<CompiledFunction>) -> Handle {
        if let Some((_, handle)) = self.function_cache.iter().find(|(p, _)| Rc::ptr_eq(p, &prototype)) {
            return *handle;
        }
        let handle = self.alloc(Obj::Function(FunctionObj { prototype: prototype.clone() }));
        self.function_cache.push((prototype, handle));
        handle
    }

    /// Reads the constant at `index` in the current frame's constant pool,
    /// interning it if it is a string (compile-time constants never touch
    /// this heap directly — see `DESIGN.md`'s "Constant vs. Value split").
    pub(crate) fn read_string_constant(&mut self, index: u32) -> Handle {
        let constant = self.current_frame().function.chunk.constants()[index as usize].clone();
        match constant {
            Constant::Str(s) => self.intern(s.as_bytes()),
            Constant::Number(_) | Constant::Func(_) => {
                unreachable!("read_string_constant on a non-string constant")
            }
        }
    }

    pub(crate) fn read_number_constant(&self, index: u32) -> f64 {
        match &self.current_frame().function.chunk.constants()[index as usize] {
            Constant::Number(n) => *n,
            Constant::Str(_) | Constant::Func(_) => unreachable!("read_number_constant on a non-number constant"),
        }
    }

    pub(crate) fn read_function_constant(&self, index: u32) -> Rc<CompiledFunction> {
        match &self.current_frame().function.chunk.constants()[index as usize] {
            Constant::Func(f) => f.clone(),
            Constant::Str(_) | Constant::Number(_) => {
                unreachable!("read_function_constant on a non-function constant")
            }
        }
    }

    pub(crate) fn intern(&mut self, bytes: &[u8]) -> Handle {
        self.interner.intern(&mut self.heap, bytes)
    }

    pub(crate) fn intern_string(&mut self, bytes: &[u8]) -> Value {
        Value::Object(self.intern(bytes))
    }

    pub(crate) fn push(&mut self, value: Value) {
        assert!(self.stack.len() < STACK_MAX, "stack overflow: invariant 5 violated");
        self.stack.push(value);
    }

    pub(crate) fn pop(&mut self) -> Value {
        self.stack.pop().expect("stack underflow: invariant 5 violated")
    }

    pub(crate) fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack.len() - 1 - distance]
    }

    pub(crate) fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn set_stack(&mut self, index: usize, value: Value) {
        self.stack[index] = value;
    }

    pub(crate) fn stack_slice(&self, range: std::ops::Range<usize>) -> &[Value] {
        &self.stack[range]
    }

    pub(crate) fn truncate_stack(&mut self, len: usize) {
        self.stack.truncate(len);
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push_frame(&mut self, frame: CallFrame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) -> CallFrame {
        self.frames.pop().expect("frame stack underflow")
    }

    pub(crate) fn current_frame(&self) -> &CallFrame {
        self.frames.last().expect("no active call frame")
    }

    pub(crate) fn current_frame_mut(&mut self) -> &mut CallFrame {
        self.frames.last_mut().expect("no active call frame")
    }

    pub(crate) fn display(&self, value: Value) -> String {
        crate::value::display_value(value, &self.heap)
    }

    pub(crate) fn runtime_error(&self, message: impl Into<String>) -> RuntimeError {
        let line = self.frames.last().map_or(0, |f| f.current_line());
        let snippet = self.frames.last().and_then(frame::CallFrame::current_snippet);
        let trace: Vec<String> = self
            .frames
            .iter()
            .rev()
            .map(|f| {
                let name = f.function.name.as_deref().unwrap_or("script");
                format!("[line {}] in {name}()", f.current_line())
            })
            .collect();
        RuntimeError::new(message, line, snippet).with_trace(trace)
    }

    fn maybe_random_bool(&mut self) -> bool {
        use rand::Rng as _;
        self.rng.gen_bool(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::GcConfig;

    fn run_source(source: &str) -> Result<Vm, RuntimeError> {
        let function = momiji_compiler::compile(source).expect("compile error");
        let mut vm = Vm::new(GcConfig::default(), Some(1));
        vm.run(function)?;
        Ok(vm)
    }

    #[test]
    fn runs_an_arithmetic_print_statement() {
        run_source("print 1 + 2 * 3;").expect("should run");
    }

    #[test]
    fn globals_roundtrip() {
        run_source("global x = 41; x = x + 1; print x;").expect("should run");
    }

    #[test]
    fn postfix_and_prefix_increment_shape_the_stack_correctly() {
        run_source("global x = 1; print x++; print x; print ++x; print x;").expect("should run");
    }
}
