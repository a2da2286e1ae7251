//! `Bba`: the Block Bump Arena — the [`Arena`] role over [`crate::block`].
//!
//! Allocations pack into the current (most recently drawn) block: `align
//! == 1` requests bump `bot` upward, unaligned; everything else is padded
//! to 4 bytes and bumps `top` downward. A request that doesn't fit the
//! current block draws a fresh one from the shared [`BlockAllocator`].
//! Frees must undo the most recent allocation for their direction exactly
//! (`size` and `alignment` must match) — see [`crate::error::BbaFreeError`]
//! for the ways a caller can get this wrong.

use core::cell::RefCell;
use core::ptr;

use crate::align;
use crate::arena::{self, Arena, ResourceNode};
use crate::block::{Block, BlockAllocator, BLOCK_AVAIL};
use crate::error::{BbaFreeError, CivError};

#[cfg(feature = "alloc")]
struct BlockStack(alloc::vec::Vec<u32>);

#[cfg(feature = "alloc")]
impl BlockStack {
    fn new() -> Self {
        BlockStack(alloc::vec::Vec::new())
    }
    fn push(&mut self, v: u32) {
        self.0.push(v);
    }
    fn pop(&mut self) -> Option<u32> {
        self.0.pop()
    }
    fn top(&self) -> Option<u32> {
        self.0.last().copied()
    }
}

/// Cap on the number of blocks a single arena can own in a `no_std`,
/// no-`alloc` build — a self-imposed ceiling (to avoid a dynamic
/// collection), not a property of the block format.
#[cfg(not(feature = "alloc"))]
const NO_ALLOC_MAX_OWNED_BLOCKS: usize = 64;

#[cfg(not(feature = "alloc"))]
struct BlockStack {
    dat: [u32; NO_ALLOC_MAX_OWNED_BLOCKS],
    len: usize,
}

#[cfg(not(feature = "alloc"))]
impl BlockStack {
    fn new() -> Self {
        BlockStack { dat: [0; NO_ALLOC_MAX_OWNED_BLOCKS], len: 0 }
    }
    fn push(&mut self, v: u32) {
        assert!(self.len < NO_ALLOC_MAX_OWNED_BLOCKS, "Bba: too many blocks for a no_alloc build");
        self.dat[self.len] = v;
        self.len += 1;
    }
    fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.dat[self.len])
    }
    fn top(&self) -> Option<u32> {
        if self.len == 0 { None } else { Some(self.dat[self.len - 1]) }
    }
}

struct BbaState {
    blocks: BlockStack,
    resources: *mut ResourceNode,
}

/// A bump arena drawing blocks from a shared [`BlockAllocator`].
///
/// Interior mutability (`RefCell`) is what lets [`Arena::alloc_raw`] take
/// `&self`: callers routinely hold a live `&[u8]` from one allocation
/// while making another.
pub struct Bba<'p> {
    pool: &'p BlockAllocator,
    state: RefCell<BbaState>,
}

impl<'p> Bba<'p> {
    pub fn new(pool: &'p BlockAllocator) -> Self {
        Bba { pool, state: RefCell::new(BbaState { blocks: BlockStack::new(), resources: ptr::null_mut() }) }
    }

    fn block_ptr(&self, idx: u32) -> *mut u8 {
        self.pool.with_block(idx, |b| b as *mut Block as *mut u8)
    }

    /// Current block's spare bytes (`top - bot`), or 0 if the arena owns
    /// no block yet.
    pub fn spare(&self) -> usize {
        match self.state.borrow().blocks.top() {
            Some(idx) => self.pool.with_block(idx, |b| b.spare() as usize),
            None => 0,
        }
    }

    fn block_for_growth(&self, grow: u16) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        if let Some(idx) = state.blocks.top() {
            let fits = self.pool.with_block(idx, |b| b.info.bot + grow <= b.info.top);
            if fits {
                return Some(idx);
            }
        }
        let idx = self.pool.alloc_block()?;
        state.blocks.push(idx);
        Some(idx)
    }

    /// Register `node` (pointing at a live `dyn Resource`) so it is
    /// visited and dropped before this arena's blocks return to the pool.
    ///
    /// # Safety
    /// `node` must be valid and outlive this arena (or be unregistered by
    /// some other means before it's freed); its `dat` must point at a
    /// live `dyn Resource` for as long as it stays linked.
    pub unsafe fn register_resource(&self, node: *mut ResourceNode) {
        let mut state = self.state.borrow_mut();
        unsafe { crate::list::sll_add(&mut state.resources, node) };
    }

    /// Drop every registered resource, then return all owned blocks to
    /// the pool in list order. Idempotent: calling twice is equivalent to
    /// calling once.
    pub fn drop_arena(&self) {
        let mut state = self.state.borrow_mut();
        unsafe { arena::drop_resources(&mut state.resources) };
        while let Some(idx) = state.blocks.pop() {
            self.pool.free_block(idx);
        }
    }
}

impl<'p> Drop for Bba<'p> {
    fn drop(&mut self) {
        self.drop_arena();
    }
}

impl<'p> Arena for Bba<'p> {
    fn alloc_raw(&self, sz: usize, alignment: u16) -> Option<*mut u8> {
        if sz > BLOCK_AVAIL {
            return None;
        }
        if alignment == 1 {
            let sz16 = sz as u16;
            let idx = self.block_for_growth(sz16)?;
            let offset = self.pool.with_block(idx, |b| {
                let off = b.info.bot;
                b.info.bot += sz16;
                off
            });
            Some(unsafe { self.block_ptr(idx).add(offset as usize) })
        } else {
            let padded = align::align(sz, align::fix_align(alignment) as usize) as u16;
            let idx = self.block_for_growth(padded)?;
            let offset = self.pool.with_block(idx, |b| {
                b.info.top -= padded;
                b.info.top
            });
            Some(unsafe { self.block_ptr(idx).add(offset as usize) })
        }
    }

    unsafe fn free_raw(&self, data: *mut u8, sz: usize, alignment: u16) -> Result<(), CivError> {
        let mut state = self.state.borrow_mut();
        let idx = match state.blocks.top() {
            Some(idx) => idx,
            None => return Err(CivError::BbaFree(BbaFreeError::EmptyArena)),
        };
        let base = self.block_ptr(idx) as usize;
        let data_addr = data as usize;
        if data_addr < base {
            return Err(CivError::BbaFree(BbaFreeError::BelowBlock));
        }
        if data_addr + sz > base + BLOCK_AVAIL {
            return Err(CivError::BbaFree(BbaFreeError::AboveBlock));
        }
        let plc = (data_addr - base) as u16;
        let should_detach = self.pool.with_block(idx, |b| -> Result<bool, CivError> {
            if alignment == 1 {
                let sz16 = sz as u16;
                if plc != b.info.bot.wrapping_sub(sz16) {
                    return Err(CivError::BbaFree(BbaFreeError::UnorderedFree));
                }
                b.info.bot = plc;
            } else {
                let padded = align::align(sz, align::fix_align(alignment) as usize) as u16;
                if plc > b.info.top {
                    return Err(CivError::BbaFree(BbaFreeError::UnorderedFree));
                }
                b.info.top = plc + padded;
            }
            Ok(b.spare() == BLOCK_AVAIL as u16)
        })?;
        if should_detach {
            state.blocks.pop();
            drop(state);
            self.pool.free_block(idx);
        }
        Ok(())
    }

    fn max_alloc(&self) -> usize {
        BLOCK_AVAIL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPool;

    #[test]
    fn bidirectional_bump_matches_reference_trace() {
        let pool = BlockAllocator::new(BlockPool::with_capacity(5));
        let bba = Bba::new(&pool);

        let a = bba.alloc_raw(5, 1).unwrap();
        assert_eq!(bba.state.borrow().blocks.top(), Some(0));
        assert_eq!(bba.pool.with_block(0, |b| b.info.bot), 5);

        let b = bba.alloc_raw(12, 1).unwrap();
        assert_eq!(unsafe { b.offset_from(a) }, 5);
        assert_eq!(bba.pool.with_block(0, |blk| blk.info.bot), 17);

        crate::assert_ok!(unsafe { bba.free_raw(b, 12, 1) });
        crate::assert_eq_test!(bba.pool.with_block(0, |blk| blk.info.bot), 5, "bot restored by reverse-LIFO free");

        let c = bba.alloc_raw(4, 4).unwrap();
        assert_eq!(bba.pool.with_block(0, |blk| blk.info.top), 4088);
        assert_eq!(unsafe { c.offset_from(a) }, 4088 - 0);

        crate::assert_ok!(unsafe { bba.free_raw(c, 4, 4) });
        crate::assert_eq_test!(
            bba.pool.with_block(0, |blk| blk.info.top),
            BLOCK_AVAIL as u16,
            "top restored by reverse-LIFO free"
        );

        bba.drop_arena();
        assert_eq!(pool.free_len(), 5);
    }

    #[test]
    fn alloc_too_large_fails_and_padding_rounds_to_four() {
        let pool = BlockAllocator::new(BlockPool::with_capacity(2));
        let bba = Bba::new(&pool);
        assert!(bba.alloc_raw(BLOCK_AVAIL + 1, 1).is_none());
        assert!(bba.alloc_raw(BLOCK_AVAIL, 1).is_some());

        let pool2 = BlockAllocator::new(BlockPool::with_capacity(2));
        let bba2 = Bba::new(&pool2);
        let p = bba2.alloc_raw(3, 2).unwrap();
        assert_eq!(bba2.pool.with_block(0, |b| b.info.top), BLOCK_AVAIL as u16 - 4);
        unsafe { bba2.free_raw(p, 3, 2).unwrap() };
    }

    #[test]
    fn free_rejects_unordered_and_out_of_block() {
        let pool = BlockAllocator::new(BlockPool::with_capacity(2));
        let bba = Bba::new(&pool);
        assert!(matches!(
            unsafe { bba.free_raw(core::ptr::null_mut(), 1, 1) },
            Err(CivError::BbaFree(BbaFreeError::EmptyArena))
        ));

        let a = bba.alloc_raw(4, 1).unwrap();
        let _b = bba.alloc_raw(4, 1).unwrap();
        // `a` is no longer the most recent allocation: freeing it first
        // violates reverse-LIFO order.
        assert!(matches!(
            unsafe { bba.free_raw(a, 4, 1) },
            Err(CivError::BbaFree(BbaFreeError::UnorderedFree))
        ));
    }

    #[test]
    fn two_drops_are_equivalent_to_one() {
        let pool = BlockAllocator::new(BlockPool::with_capacity(3));
        let bba = Bba::new(&pool);
        bba.alloc_raw(10, 1).unwrap();
        bba.drop_arena();
        assert_eq!(pool.free_len(), 3);
        bba.drop_arena();
        assert_eq!(pool.free_len(), 3);
    }
}
