//! Heap object variants (spec §3 "Object").

use std::rc::Rc;

use momiji_compiler::CompiledFunction;

use crate::handle::Handle;
use crate::table::Table;
use crate::value::Value;

/// FNV-1a, matching the distilled source's `StringHash` (`object.c`)
/// exactly so the algorithm choice is grounded rather than invented.
pub(crate) fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

/// An interned, immutable byte buffer. Two `StringObj`s with equal bytes
/// are never both live — the [`crate::interner::Interner`] guarantees a
/// single canonical `Handle` per distinct content, so `Handle` equality
/// already is string equality.
#[derive(Debug)]
pub struct StringObj {
    pub bytes: Box<[u8]>,
    pub hash: u32,
}

impl StringObj {
    #[must_use]
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

#[derive(Debug, Default)]
pub struct ArrayObj {
    pub items: Vec<Value>,
}

/// Insertion-ordered map: `keys` preserves insertion order for iteration
/// and `print` (spec §11), `table` gives O(1) lookup by key handle.
#[derive(Debug, Default)]
pub struct MapObj {
    pub keys: Vec<Handle>,
    pub table: Table<Value>,
}

/// Wraps the compile-time prototype directly; `momiji-compiler` never
/// allocates on a GC heap (see `momiji-compiler::lib` docs), so there is
/// nothing left to convert beyond attaching a heap identity to it.
#[derive(Debug)]
pub struct FunctionObj {
    pub prototype: Rc<CompiledFunction>,
}

pub type NativeFn = fn(&mut crate::vm::Vm, &[Value]) -> Result<Value, crate::error::RuntimeError>;

#[derive(Clone, Copy)]
pub struct NativeObj {
    pub name: &'static str,
    pub arity: Option<u8>,
    pub func: NativeFn,
}

impl std::fmt::Debug for NativeObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeObj").field("name", &self.name).finish()
    }
}

/// Either open (still pointing at a live stack slot) or closed (the value
/// has been copied inline). See spec §4.5 "Upvalue closing".
#[derive(Debug)]
pub enum UpvalueObj {
    Open(usize),
    Closed(Value),
}

#[derive(Debug)]
pub struct ClosureObj {
    pub function: Handle,
    pub upvalues: Vec<Handle>,
}

#[derive(Debug, Default)]
pub struct ClassObj {
    pub name: Handle,
    pub methods: Table<Handle>,
    pub method_names: Vec<Handle>,
    pub fields: Table<Value>,
    pub field_names: Vec<Handle>,
    pub initializer: Option<Handle>,
}

#[derive(Debug)]
pub struct InstanceObj {
    pub class: Handle,
    pub fields: Table<Value>,
}

#[derive(Debug)]
pub struct BoundMethodObj {
    pub receiver: Value,
    pub method: Handle,
}

#[derive(Debug)]
pub enum Obj {
    Str(StringObj),
    Array(ArrayObj),
    Map(MapObj),
    Function(FunctionObj),
    Native(NativeObj),
    Upvalue(UpvalueObj),
    Closure(ClosureObj),
    Class(ClassObj),
    Instance(InstanceObj),
    BoundMethod(BoundMethodObj),
}

impl Obj {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Obj::Str(_) => "string",
            Obj::Array(_) => "array",
            Obj::Map(_) => "map",
            Obj::Function(_) => "function",
            Obj::Native(_) => "native function",
            Obj::Upvalue(_) => "upvalue",
            Obj::Closure(_) => "function",
            Obj::Class(_) => "class",
            Obj::Instance(_) => "instance",
            Obj::BoundMethod(_) => "function",
        }
    }

    /// A rough accounting size used only to drive the GC's grow-factor
    /// heuristic (spec §4.7); this is not required to be byte-exact.
    pub(crate) fn heap_size(&self) -> usize {
        let base = std::mem::size_of::<Self>();
        base + match self {
            Obj::Str(s) => s.bytes.len(),
            Obj::Array(a) => a.items.len() * std::mem::size_of::<Value>(),
            Obj::Map(m) => m.keys.len() * std::mem::size_of::<Handle>(),
            Obj::Closure(c) => c.upvalues.len() * std::mem::size_of::<Handle>(),
            Obj::Class(c) => {
                (c.method_names.len() + c.field_names.len()) * std::mem::size_of::<Handle>()
            }
            _ => 0,
        }
    }
}
