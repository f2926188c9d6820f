//! The GC object arena (spec §3 "Object", §4.7 "Garbage Collector").

pub mod object;

use crate::handle::Handle;
use object::Obj;

pub(crate) struct GcBox {
    pub marked: bool,
    pub size: usize,
    pub obj: Obj,
}

/// A slab of heap objects addressed by [`Handle`], with a free-list for
/// slot reuse after a sweep. See `DESIGN.md`'s "intrusive allocation list
/// -> arena indices" decision for why this replaces spec §3's linked list.
#[derive(Default)]
pub struct Heap {
    slots: Vec<Option<GcBox>>,
    free_list: Vec<u32>,
    pub bytes_allocated: usize,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, obj: Obj) -> Handle {
        let size = obj.heap_size();
        self.bytes_allocated += size;
        let gc_box = GcBox { marked: false, size, obj };
        if let Some(index) = self.free_list.pop() {
            self.slots[index as usize] = Some(gc_box);
            Handle::from_index(index)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Some(gc_box));
            Handle::from_index(index)
        }
    }

    #[must_use]
    pub fn get(&self, handle: Handle) -> &Obj {
        &self.slots[handle.index()].as_ref().expect("dangling handle").obj
    }

    pub fn get_mut(&mut self, handle: Handle) -> &mut Obj {
        &mut self.slots[handle.index()].as_mut().expect("dangling handle").obj
    }

    #[must_use]
    pub fn is_marked(&self, handle: Handle) -> bool {
        self.slots[handle.index()].as_ref().is_some_and(|b| b.marked)
    }

    /// Returns `true` if this call newly grayed the object (it was white
    /// before); the caller uses that to decide whether to push it onto the
    /// gray worklist.
    pub fn mark(&mut self, handle: Handle) -> bool {
        let gc_box = self.slots[handle.index()].as_mut().expect("dangling handle");
        if gc_box.marked {
            false
        } else {
            gc_box.marked = true;
            true
        }
    }

    /// Frees every unmarked slot, clears the mark bit on every survivor,
    /// and returns the handles that were freed (callers use this to prune
    /// any side tables — e.g. the interner — that reference handles
    /// directly instead of going through `mark`/`trace`).
    pub fn sweep(&mut self) -> Vec<Handle> {
        let mut freed = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let keep = match slot {
                Some(gc_box) if gc_box.marked => {
                    gc_box.marked = false;
                    true
                }
                Some(_) => false,
                None => true,
            };
            if !keep {
                let gc_box = slot.take().expect("checked Some above");
                self.bytes_allocated -= gc_box.size;
                freed.push(Handle::from_index(index as u32));
                self.free_list.push(index as u32);
            }
        }
        freed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object::StringObj;

    #[test]
    fn alloc_then_get_round_trips() {
        let mut heap = Heap::new();
        let handle = heap.alloc(Obj::Str(StringObj { bytes: b"hi"[..].into(), hash: 1 }));
        match heap.get(handle) {
            Obj::Str(s) => assert_eq!(&*s.bytes, b"hi"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn sweep_frees_unmarked_and_reuses_slot() {
        let mut heap = Heap::new();
        let a = heap.alloc(Obj::Str(StringObj { bytes: b"a"[..].into(), hash: 1 }));
        let b = heap.alloc(Obj::Str(StringObj { bytes: b"b"[..].into(), hash: 2 }));
        heap.mark(b);
        let freed = heap.sweep();
        assert_eq!(freed, vec![a]);
        assert!(heap.is_marked(b) == false);
        assert_eq!(heap.len(), 1);

        let c = heap.alloc(Obj::Str(StringObj { bytes: b"c"[..].into(), hash: 3 }));
        assert_eq!(c, a, "freed slot should be reused");
    }
}
