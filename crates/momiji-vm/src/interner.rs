//! String interning (spec §4.6's "auxiliary lookup by (chars, length,
//! hash) that walks the same probe sequence" as the main [`crate::table::Table`]).
//!
//! Keyed by raw byte content rather than a `Handle`, since the whole point
//! is to find-or-allocate the canonical `Handle` for a given content.

use crate::handle::Handle;
use crate::heap::object::{fnv1a, Obj, StringObj};
use crate::heap::Heap;

#[derive(Clone, Copy)]
struct Slot {
    hash: u32,
    handle: Handle,
}

#[derive(Default)]
pub struct Interner {
    slots: Vec<Option<Slot>>,
    tombstones: Vec<bool>,
    count: usize,
}

const MAX_LOAD: f64 = 0.75;

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find-or-insert the canonical [`Handle`] for `bytes`.
    pub fn intern(&mut self, heap: &mut Heap, bytes: &[u8]) -> Handle {
        let hash = fnv1a(bytes);
        if self.slots.is_empty() || (self.count + 1) as f64 > self.slots.len() as f64 * MAX_LOAD {
            self.grow();
        }
        let capacity = self.slots.len();
        let mut index = (hash as usize) % capacity;
        let mut first_tombstone = None;
        loop {
            match self.slots[index] {
                Some(slot) if slot.hash == hash => {
                    if let Obj::Str(s) = heap.get(slot.handle) {
                        if s.bytes.as_ref() == bytes {
                            return slot.handle;
                        }
                    }
                }
                Some(_) => {}
                None if self.tombstones[index] => {
                    first_tombstone.get_or_insert(index);
                }
                None => {
                    let slot_index = first_tombstone.unwrap_or(index);
                    let handle = heap.alloc(Obj::Str(StringObj { bytes: bytes.into(), hash }));
                    self.slots[slot_index] = Some(Slot { hash, handle });
                    self.tombstones[slot_index] = false;
                    self.count += 1;
                    return handle;
                }
            }
            index = (index + 1) % capacity;
        }
    }

    fn grow(&mut self) {
        let new_capacity = (self.slots.len() * 2).max(8);
        let old_slots: Vec<Slot> = self.slots.iter().filter_map(|s| *s).collect();
        self.slots = vec![None; new_capacity];
        self.tombstones = vec![false; new_capacity];
        self.count = 0;
        for slot in old_slots {
            let mut index = (slot.hash as usize) % new_capacity;
            while self.slots[index].is_some() {
                index = (index + 1) % new_capacity;
            }
            self.slots[index] = Some(slot);
            self.count += 1;
        }
    }

    /// `TableRemoveWhite` (spec §4.7 "Weak references"): drop any interned
    /// entry whose string didn't survive the mark phase, so the intern
    /// table itself never keeps a dead string reachable.
    pub fn remove_unmarked(&mut self, heap: &Heap) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(s) = slot {
                if !heap.is_marked(s.handle) {
                    *slot = None;
                    self.tombstones[index] = true;
                    self.count -= 1;
                }
            }
        }
    }
}
