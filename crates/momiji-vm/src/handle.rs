//! Arena-slot addressing for heap objects.
//!
//! See `DESIGN.md`'s "intrusive allocation list -> arena indices" decision:
//! spec §3 links heap objects through an intrusive `next` pointer that also
//! serves as the sweep order. Safe Rust has no such pointer without
//! `unsafe` self-reference, so [`Heap`](crate::heap::Heap) instead stores
//! objects in a slab (`Vec<Option<GcBox>>`) and a `Handle` is just that
//! slab's index. Sweeping walks the slab directly rather than a list.

/// An index into [`Heap`](crate::heap::Heap)'s object slab.
///
/// Handles never outlive the sweep that frees their slot (nothing holds a
/// `Handle` past the point its referent becomes unreachable, since
/// reachability is exactly what keeps a slot alive), so slot reuse across
/// collections never produces a stale-handle ABA hazard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    pub(crate) fn from_index(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// A small, well-scattered hash of the handle's raw slot index, used by
    /// [`crate::table::Table`] as the probe-sequence seed.
    pub(crate) fn scatter(self) -> u32 {
        self.0.wrapping_mul(2_654_435_761)
    }
}
