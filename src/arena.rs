//! The `Arena` and `Resource` roles.
//!
//! The original C library represents every role — `Arena`, `Resource`,
//! `File`, `Reader`, `Writer`, `Fmt`, `Logger` — as a `(vtable*, data*)`
//! pair built by hand with macros (`DEFINE_METHOD`/`DEFINE_METHODS`, `Xr`).
//! Rust already has a zero-cost vtable-pair mechanism for this: traits and
//! trait objects. Every role in this crate is a plain trait instead.

use crate::error::CivError;

/// A bump-style memory arena.
///
/// `alloc`/`free` take `&self` rather than `&mut self`: implementors (like
/// [`crate::bba::Bba`]) use interior mutability, because callers routinely
/// hold buffers borrowed from the arena at the same time as allocating
/// more from it (the same pattern `bumpalo` uses). This is what makes
/// `free` unsafe — nothing stops a caller from freeing memory that another
/// live `&[u8]` still points at; the original's discipline ("free exactly
/// reverses alloc, innermost first") is the caller's to uphold.
pub trait Arena {
    /// Allocate `sz` bytes at the given alignment, or `None` if the arena
    /// cannot currently satisfy the request.
    fn alloc_raw(&self, sz: usize, alignment: u16) -> Option<*mut u8>;

    /// Free a previous [`Arena::alloc_raw`] allocation.
    ///
    /// # Safety
    /// `data`, `sz`, and `alignment` must be exactly the values returned
    /// from (and passed to) the matching `alloc_raw` call, and all
    /// allocations made after it from this arena must already have been
    /// freed (reverse-bump discipline).
    unsafe fn free_raw(&self, data: *mut u8, sz: usize, alignment: u16) -> Result<(), CivError>;

    /// Largest single allocation this arena can ever satisfy.
    fn max_alloc(&self) -> usize;
}

/// Borrow `sz` freshly allocated, zero-initialized bytes from `arena`,
/// bound to the arena's own lifetime.
pub fn alloc_bytes<'a, A: Arena>(arena: &'a A, sz: u16, alignment: u16) -> Option<&'a mut [u8]> {
    let ptr = arena.alloc_raw(sz as usize, alignment)?;
    // SAFETY: `alloc_raw` promises `sz` valid, writable, non-aliased bytes
    // at `ptr` for as long as the arena isn't told to free them.
    let bytes = unsafe { core::slice::from_raw_parts_mut(ptr, sz as usize) };
    bytes.fill(0);
    Some(bytes)
}

/// A resource an [`Arena`] tracks so it can be torn down when the arena
/// drops, in the original's drop-before-deciding-you're-done order.
///
/// `drop` returns `false` to ask to be retried after other resources have
/// had a chance to drop first (e.g. a file that must flush a write buffer
/// allocated from the very arena being torn down).
pub trait Resource {
    fn drop_resource(&mut self) -> bool;
}

/// The node type used to link a [`Resource`] into an arena's drop list —
/// the one place this crate keeps the original's raw `(vtable, data)`-style
/// intrusive link, since a resource is owned by its caller and only
/// *registered* with the arena (a `Vec<Box<dyn Resource>>` would force the
/// arena to own it instead).
pub type ResourceNode = crate::list::SllNode<dyn Resource>;

/// Run every resource reachable from `root`, in the original's
/// drop-before-blocks-return order: a pass over the whole list, removing
/// nodes whose [`Resource::drop_resource`] returns `true`, repeated until
/// either the list is empty or a full pass makes no progress (a resource
/// stuck returning `false` forever would otherwise loop here forever).
///
/// # Safety
/// Every node reachable from `root` must be valid, and `dat` must point at
/// a live `dyn Resource`.
pub unsafe fn drop_resources(root: &mut *mut ResourceNode) {
    loop {
        let mut progressed = false;
        let mut prev: *mut ResourceNode = core::ptr::null_mut();
        let mut node = *root;
        while !node.is_null() {
            let next = unsafe { (*node).next };
            let done = unsafe { (*(*node).dat).drop_resource() };
            if done {
                progressed = true;
                if prev.is_null() {
                    *root = next;
                } else {
                    unsafe {
                        (*prev).next = next;
                    }
                }
            } else {
                prev = node;
            }
            node = next;
        }
        if root.is_null() || !progressed {
            break;
        }
    }
}
