//! Per-function compiler state: locals, upvalues, and the enclosing chain
//! (spec §4.3 "Local-variable model").

use std::rc::Rc;

use crate::chunk::Chunk;

/// What kind of function body is currently being compiled. Controls
/// whether `this`/`super` are in scope, what bare `return;` yields, and
/// whether `return e;` is legal at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionType {
    /// The implicit top-level function wrapping the whole source file.
    Script,
    Function,
    Method,
    /// A method whose name matches its enclosing class's name.
    Initializer,
}

/// One entry in a function compiler's local-variable array. `depth` of
/// `-1` marks "declared but not yet initialized", which rejects
/// self-referential reads like `local x = x;`.
#[derive(Clone, Debug)]
pub struct Local {
    pub name: String,
    pub depth: i32,
    pub is_captured: bool,
}

/// One entry in a function compiler's upvalue array. `is_local` true
/// means `index` is a slot in the immediately enclosing function's
/// locals; false means it is an index into that enclosing function's
/// own upvalue array.
#[derive(Clone, Copy, Debug)]
pub struct UpvalueDescriptor {
    pub index: u8,
    pub is_local: bool,
}

/// The compiler state for one function body. A chain of these, linked
/// through `enclosing`, mirrors the nesting of `function` expressions
/// and methods currently being compiled.
pub struct FunctionState {
    pub enclosing: Option<Box<FunctionState>>,
    pub function_type: FunctionType,
    pub name: Option<Rc<str>>,
    pub arity: u8,
    pub chunk: Chunk,
    pub locals: Vec<Local>,
    pub upvalues: Vec<UpvalueDescriptor>,
    pub scope_depth: i32,
}

impl FunctionState {
    #[must_use]
    pub fn new(function_type: FunctionType, name: Option<Rc<str>>) -> Self {
        // Slot 0 of every call frame is reserved: the callee itself for
        // plain functions (never read by name), `this` for methods.
        let slot_zero_name = if matches!(function_type, FunctionType::Method | FunctionType::Initializer) {
            "this"
        } else {
            ""
        };
        Self {
            enclosing: None,
            function_type,
            name,
            arity: 0,
            chunk: Chunk::new(),
            locals: vec![Local {
                name: slot_zero_name.to_string(),
                depth: 0,
                is_captured: false,
            }],
            upvalues: Vec::new(),
            scope_depth: 0,
        }
    }

    /// Resolves `name` against this function's own locals, newest first.
    #[must_use]
    pub fn resolve_local(&self, name: &str) -> Option<usize> {
        self.locals.iter().rposition(|local| local.name == name)
    }

    fn add_upvalue(&mut self, index: usize, is_local: bool) -> usize {
        if let Some(pos) = self
            .upvalues
            .iter()
            .position(|uv| uv.index as usize == index && uv.is_local == is_local)
        {
            return pos;
        }
        self.upvalues.push(UpvalueDescriptor {
            index: index as u8,
            is_local,
        });
        self.upvalues.len() - 1
    }

    /// Recursively resolves `name` in an enclosing function as either a
    /// local (adding an `is_local` upvalue) or an already-captured
    /// upvalue of that enclosing function (adding a chained upvalue).
    pub fn resolve_upvalue(&mut self, name: &str) -> Option<usize> {
        let enclosing = self.enclosing.as_mut()?;
        if let Some(local_idx) = enclosing.resolve_local(name) {
            enclosing.locals[local_idx].is_captured = true;
            return Some(self.add_upvalue(local_idx, true));
        }
        if let Some(upvalue_idx) = enclosing.resolve_upvalue(name) {
            return Some(self.add_upvalue(upvalue_idx, false));
        }
        None
    }
}
