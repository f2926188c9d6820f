//! Tricolor mark-sweep orchestration (spec §4.7 "Garbage Collector").
//!
//! The config/stats shapes live in [`crate::gc`]; this module holds the
//! root-walk and trace/sweep logic, which needs simultaneous access to
//! every piece of mutable VM state and so cannot live on `Heap` alone.

use tracing::debug;

use crate::gc::GcCycleReport;
use crate::handle::Handle;
use crate::heap::object::{Obj, UpvalueObj};
use crate::heap::Heap;
use crate::value::Value;

use super::Vm;

impl Vm {
    /// Runs the collector's trigger check (spec §4.7 "triggered at every
    /// allocation if `allocatedBytes >= nextCollection`") without
    /// allocating. Callers that must first pop values off the rooted
    /// operand stack before building the object they allocate (array/map
    /// literals, bound methods) call this *before* popping, then finish
    /// with a plain `self.heap.alloc` — the idiom the spec calls out as
    /// "push partially constructed objects before a subsequent
    /// allocation": here the values are already pushed, so the collection
    /// point just has to land before they come off the stack.
    pub(crate) fn maybe_collect(&mut self) {
        if self.gc_config.stress || self.heap.bytes_allocated >= self.next_collection {
            self.collect_garbage();
        }
    }

    /// Allocates through the collector's trigger check.
    pub(crate) fn alloc(&mut self, obj: Obj) -> Handle {
        self.maybe_collect();
        self.heap.alloc(obj)
    }

    pub(crate) fn collect_garbage(&mut self) {
        let bytes_before = self.heap.bytes_allocated;

        let mut gray: Vec<Handle> = Vec::new();
        self.mark_roots(&mut gray);
        while let Some(handle) = gray.pop() {
            self.blacken(handle, &mut gray);
        }

        self.interner.remove_unmarked(&self.heap);
        let freed = self.heap.sweep();

        let bytes_after = self.heap.bytes_allocated;
        self.next_collection =
            ((bytes_after as f64 * self.gc_config.grow_factor) as usize).max(self.gc_config.initial_threshold);

        let report = GcCycleReport { objects_freed: freed.len(), bytes_before, bytes_after };
        debug!(objects_freed = report.objects_freed, bytes_before, bytes_after, "gc cycle");
        self.gc_stats.record(report);
    }

    /// Roots (spec §4.7): the operand stack, every frame's closure, every
    /// open upvalue, and the globals table. There is no separate
    /// "in-progress Compiler chain" or reserved `initString` root here —
    /// `momiji-compiler` never touches this heap (see `DESIGN.md`'s
    /// "Constant vs. Value split"), and constructor lookup uses each
    /// class's own denormalized `initializer` handle, already reachable
    /// through the class itself.
    fn mark_roots(&mut self, gray: &mut Vec<Handle>) {
        let stack_values: Vec<Value> = self.stack.clone();
        for value in stack_values {
            mark_value(&mut self.heap, value, gray);
        }
        let frame_closures: Vec<Handle> = self.frames.iter().map(|f| f.closure).collect();
        for closure in frame_closures {
            mark_handle(&mut self.heap, closure, gray);
        }
        let open_upvalues = self.open_upvalues.clone();
        for handle in open_upvalues {
            mark_handle(&mut self.heap, handle, gray);
        }
        let globals: Vec<(Handle, Value)> = self.globals.iter().map(|(k, v)| (k, *v)).collect();
        for (key, value) in globals {
            mark_handle(&mut self.heap, key, gray);
            mark_value(&mut self.heap, value, gray);
        }
        let cached_functions: Vec<Handle> = self.function_cache.iter().map(|(_, h)| *h).collect();
        for handle in cached_functions {
            mark_handle(&mut self.heap, handle, gray);
        }
    }

    /// Blackens one object: marks everything it directly references.
    fn blacken(&mut self, handle: Handle, gray: &mut Vec<Handle>) {
        match self.heap.get(handle) {
            Obj::Str(_) | Obj::Native(_) | Obj::Function(_) => {}
            Obj::Array(array) => {
                let items = array.items.clone();
                for item in items {
                    mark_value(&mut self.heap, item, gray);
                }
            }
            Obj::Map(map) => {
                let keys = map.keys.clone();
                let values: Vec<Value> = keys.iter().filter_map(|k| map.table.get(*k).copied()).collect();
                for key in keys {
                    mark_handle(&mut self.heap, key, gray);
                }
                for value in values {
                    mark_value(&mut self.heap, value, gray);
                }
            }
            Obj::Upvalue(upvalue) => {
                if let UpvalueObj::Closed(value) = upvalue {
                    let value = *value;
                    mark_value(&mut self.heap, value, gray);
                }
            }
            Obj::Closure(closure) => {
                let function = closure.function;
                let upvalues = closure.upvalues.clone();
                mark_handle(&mut self.heap, function, gray);
                for upvalue in upvalues {
                    mark_handle(&mut self.heap, upvalue, gray);
                }
            }
            Obj::Class(class) => {
                let name = class.name;
                let method_names = class.method_names.clone();
                let methods: Vec<Handle> =
                    method_names.iter().filter_map(|n| class.methods.get(*n).copied()).collect();
                let field_names = class.field_names.clone();
                let fields: Vec<Value> = field_names.iter().filter_map(|n| class.fields.get(*n).copied()).collect();
                mark_handle(&mut self.heap, name, gray);
                for n in method_names {
                    mark_handle(&mut self.heap, n, gray);
                }
                for m in methods {
                    mark_handle(&mut self.heap, m, gray);
                }
                for n in field_names {
                    mark_handle(&mut self.heap, n, gray);
                }
                for v in fields {
                    mark_value(&mut self.heap, v, gray);
                }
            }
            Obj::Instance(instance) => {
                let class = instance.class;
                let entries: Vec<(Handle, Value)> = instance.fields.iter().map(|(k, v)| (k, *v)).collect();
                mark_handle(&mut self.heap, class, gray);
                for (key, value) in entries {
                    mark_handle(&mut self.heap, key, gray);
                    mark_value(&mut self.heap, value, gray);
                }
            }
            Obj::BoundMethod(bound) => {
                let receiver = bound.receiver;
                let method = bound.method;
                mark_value(&mut self.heap, receiver, gray);
                mark_handle(&mut self.heap, method, gray);
            }
        }
    }
}

fn mark_value(heap: &mut Heap, value: Value, gray: &mut Vec<Handle>) {
    if let Some(handle) = value.as_object() {
        mark_handle(heap, handle, gray);
    }
}

fn mark_handle(heap: &mut Heap, handle: Handle, gray: &mut Vec<Handle>) {
    if heap.mark(handle) {
        gray.push(handle);
    }
}
