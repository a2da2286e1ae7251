//! Fixed-size blocks and the pool that hands them out.
//!
//! A `Block` is the crate's unit of bulk allocation: a flat byte array plus
//! a pair of cursors (`bot`/`top`) that [`crate::bba::Bba`] bumps from
//! either end. The pool itself (`BA` in the original) only ever tracks
//! *which* blocks are free — it has no opinion about what's inside one.

use spin::Mutex;

pub const BLOCK_PO2: u32 = 12;
pub const BLOCK_SIZE: usize = 1 << BLOCK_PO2;
/// Two `u16` cursors are carved out of every block for `BlockInfo`.
pub const BLOCK_AVAIL: usize = BLOCK_SIZE - 2 * core::mem::size_of::<u16>();

#[derive(Clone, Copy, Debug)]
pub struct BlockInfo {
    pub bot: u16,
    pub top: u16,
}

/// A single fixed-size slab. `bot` grows up from 0 (unaligned bump
/// allocations); `top` grows down from `BLOCK_AVAIL` (aligned ones). The
/// block is full when they meet.
#[repr(C)]
pub struct Block {
    pub dat: [u8; BLOCK_AVAIL],
    pub info: BlockInfo,
}

impl Block {
    pub const fn empty() -> Self {
        Block {
            dat: [0; BLOCK_AVAIL],
            info: BlockInfo { bot: 0, top: BLOCK_AVAIL as u16 },
        }
    }

    pub fn reset(&mut self) {
        self.info.bot = 0;
        self.info.top = BLOCK_AVAIL as u16;
    }

    pub fn spare(&self) -> u16 {
        self.info.top - self.info.bot
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::empty()
    }
}

/// Backing storage a [`BlockPool`] draws its blocks from.
#[cfg(feature = "alloc")]
type Storage = alloc::boxed::Box<[Block]>;

/// The root block allocator: a fixed set of blocks and a free-index stack.
///
/// Allocation and free are both O(1) index push/pop, matching the
/// original's `DllRoot`-based free list (itself a LIFO stack of `BANode`s).
pub struct BlockPool {
    #[cfg(feature = "alloc")]
    blocks: Storage,
    #[cfg(not(feature = "alloc"))]
    blocks: &'static mut [Block],
    free: FreeStack,
}

#[cfg(feature = "alloc")]
type FreeStack = alloc::vec::Vec<u32>;
#[cfg(not(feature = "alloc"))]
type FreeStack = NoAllocFreeStack;

/// Bounded free-index stack for builds without `alloc`. `NO_ALLOC_MAX_BLOCKS`
/// caps how many blocks a `no_std`, no-`alloc` embedder can hand to a single
/// pool; this is a self-imposed ceiling to avoid a dynamic collection, not a
/// property of the block format itself.
#[cfg(not(feature = "alloc"))]
const NO_ALLOC_MAX_BLOCKS: usize = 256;

#[cfg(not(feature = "alloc"))]
struct NoAllocFreeStack {
    dat: [u32; NO_ALLOC_MAX_BLOCKS],
    len: usize,
}

#[cfg(not(feature = "alloc"))]
impl NoAllocFreeStack {
    fn new() -> Self {
        NoAllocFreeStack { dat: [0; NO_ALLOC_MAX_BLOCKS], len: 0 }
    }
    fn len(&self) -> usize {
        self.len
    }
    fn push(&mut self, v: u32) -> Result<(), crate::error::CivError> {
        if self.len == NO_ALLOC_MAX_BLOCKS {
            return Err(crate::error::CivError::Capacity { what: "BlockPool free list full" });
        }
        self.dat[self.len] = v;
        self.len += 1;
        Ok(())
    }
    fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.dat[self.len])
    }
}

impl BlockPool {
    #[cfg(feature = "alloc")]
    pub fn with_capacity(n: usize) -> Self {
        let blocks: Storage = (0..n).map(|_| Block::empty()).collect();
        let free: FreeStack = (0..n as u32).collect();
        BlockPool { blocks, free }
    }

    #[cfg(not(feature = "alloc"))]
    pub fn from_static(blocks: &'static mut [Block]) -> Self {
        let n = blocks.len();
        let mut free = NoAllocFreeStack::new();
        for i in 0..n as u32 {
            free.push(i).expect("from_static: too many blocks for NoAllocFreeStack capacity");
        }
        BlockPool { blocks, free }
    }

    pub fn capacity(&self) -> usize {
        self.blocks.len()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Claim a free block index, resetting its cursors.
    pub fn alloc(&mut self) -> Option<u32> {
        let idx = self.free_pop()?;
        self.blocks[idx as usize].reset();
        Some(idx)
    }

    /// Return a block index to the free list.
    pub fn free(&mut self, idx: u32) {
        self.free_push(idx);
    }

    pub fn block(&self, idx: u32) -> &Block {
        &self.blocks[idx as usize]
    }

    pub fn block_mut(&mut self, idx: u32) -> &mut Block {
        &mut self.blocks[idx as usize]
    }

    #[cfg(feature = "alloc")]
    fn free_pop(&mut self) -> Option<u32> {
        self.free.pop()
    }
    #[cfg(feature = "alloc")]
    fn free_push(&mut self, idx: u32) {
        self.free.push(idx);
    }
    #[cfg(not(feature = "alloc"))]
    fn free_pop(&mut self) -> Option<u32> {
        self.free.pop()
    }
    #[cfg(not(feature = "alloc"))]
    fn free_push(&mut self, idx: u32) {
        let _ = self.free.push(idx);
    }
}

/// Shared handle to a [`BlockPool`], safe to hand multiple [`crate::bba::Bba`]
/// arenas a reference to at once. Single-threaded crates still benefit from
/// `spin::Mutex`'s uncontended-lock cheapness and the poison-free API.
pub struct BlockAllocator {
    inner: Mutex<BlockPool>,
}

impl BlockAllocator {
    pub fn new(pool: BlockPool) -> Self {
        BlockAllocator { inner: Mutex::new(pool) }
    }

    pub fn alloc_block(&self) -> Option<u32> {
        self.inner.lock().alloc()
    }

    pub fn free_block(&self, idx: u32) {
        self.inner.lock().free(idx);
    }

    pub fn free_len(&self) -> usize {
        self.inner.lock().free_len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn with_block<R>(&self, idx: u32, f: impl FnOnce(&mut Block) -> R) -> R {
        let mut guard = self.inner.lock();
        f(guard.block_mut(idx))
    }
}
