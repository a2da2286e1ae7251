//! `Buf`: an owned, growable byte buffer allocated from an [`Arena`].
//!
//! Unlike `alloc::vec::Vec`, a `Buf` never reallocates — its capacity is
//! fixed at construction (bounded to `u16::MAX`, matching the original's
//! 64KiB limit) and every mutating operation fails rather than growing the
//! backing storage. This is what lets a `Buf` live happily inside a
//! [`crate::bba::Bba`]: the arena gives out one allocation per `Buf` and
//! never has to reason about it moving.

use crate::align;
use crate::arena::Arena;
use crate::error::CivError;
use crate::slc::{self, Slc};

pub struct Buf<'a> {
    dat: &'a mut [u8],
    len: u16,
}

impl<'a> Buf<'a> {
    /// Wrap pre-allocated storage as an empty `Buf`.
    pub fn new(dat: &'a mut [u8]) -> Self {
        assert!(dat.len() <= u16::MAX as usize, "Buf cap must fit in u16");
        Buf { dat, len: 0 }
    }

    /// Allocate `cap` bytes (unaligned) from `arena` and wrap them as an
    /// empty `Buf`.
    pub fn alloc(arena: &'a impl Arena, cap: u16) -> Option<Self> {
        let bytes = crate::arena::alloc_bytes(arena, cap, 1)?;
        Some(Buf { dat: bytes, len: 0 })
    }

    pub fn cap(&self) -> u16 {
        self.dat.len() as u16
    }

    pub fn len(&self) -> u16 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remain(&self) -> u16 {
        self.cap() - self.len
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_slc(&self) -> Slc<'_> {
        Slc::new(&self.dat[..self.len as usize])
    }

    pub fn dat(&self) -> &[u8] {
        &self.dat[..self.len as usize]
    }

    pub fn push(&mut self, v: u8) -> Result<(), CivError> {
        if self.len >= self.cap() {
            return Err(CivError::Capacity { what: "Buf add OOB" });
        }
        self.dat[self.len as usize] = v;
        self.len += 1;
        Ok(())
    }

    pub fn push_be2(&mut self, v: u16) -> Result<(), CivError> {
        if self.len as u32 + 2 > self.cap() as u32 {
            return Err(CivError::Capacity { what: "Buf addBE2 OOB" });
        }
        align::store_be(&mut self.dat[self.len as usize..self.len as usize + 2], v as u32)?;
        self.len += 2;
        Ok(())
    }

    pub fn push_be4(&mut self, v: u32) -> Result<(), CivError> {
        if self.len as u32 + 4 > self.cap() as u32 {
            return Err(CivError::Capacity { what: "Buf addBE4 OOB" });
        }
        align::store_be(&mut self.dat[self.len as usize..self.len as usize + 4], v)?;
        self.len += 4;
        Ok(())
    }

    pub fn extend(&mut self, s: Slc) -> Result<(), CivError> {
        if self.cap() < self.len + s.len() {
            return Err(CivError::Capacity { what: "Buf extend OOB" });
        }
        let start = self.len as usize;
        let end = start + s.len() as usize;
        self.dat[start..end].copy_from_slice(s.as_bytes());
        self.len += s.len();
        Ok(())
    }

    /// Bounds-checked sub-slice `[start, end)` of the used portion.
    pub fn slc(&self, start: u16, end: u16) -> Result<Slc<'_>, CivError> {
        if end < start {
            return Err(CivError::OutOfBounds { what: "Buf_slc end < start" });
        }
        if end > self.len {
            return Err(CivError::OutOfBounds { what: "Buf_slc OOB" });
        }
        Ok(Slc::new(&self.dat[start as usize..end as usize]))
    }

    /// Move as much of `from` into the unused tail of this buffer as will
    /// fit, advancing `len`. Returns the number of bytes moved.
    pub fn move_in(&mut self, from: Slc) -> u16 {
        let start = self.len as usize;
        let n = slc::mv(&mut self.dat[start..], from.as_bytes());
        self.len += n;
        n
    }

    /// Drop `dat[..plc]`, shifting `dat[plc..len]` to the front. Used by
    /// [`crate::plcbuf::PlcBuf::shift`]; `plc` must be `<= len`.
    pub(crate) fn compact_from(&mut self, plc: u16) {
        let remaining = self.len - plc;
        self.dat.copy_within(plc as usize..self.len as usize, 0);
        self.len = remaining;
    }

    /// Return this buffer's whole backing allocation to `arena`.
    ///
    /// # Safety
    /// `arena` must be the exact arena this `Buf`'s storage was allocated
    /// from (via [`Buf::alloc`]), and this must be the most recent
    /// outstanding allocation from it (reverse-bump LIFO order).
    pub unsafe fn free(&mut self, arena: &dyn Arena) -> Result<(), CivError> {
        let ptr = self.dat.as_mut_ptr();
        let cap = self.dat.len();
        unsafe { arena.free_raw(ptr, cap, 1) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_matches_invariant() {
        let mut dat = [0u8; 8];
        let mut b = Buf::new(&mut dat);
        b.extend(Slc::from("abc")).unwrap();
        assert_eq!(b.len(), 3);
        assert_eq!(b.dat(), b"abc");
        b.extend(Slc::from("de")).unwrap();
        assert_eq!(b.dat(), b"abcde");
        assert!(b.extend(Slc::from("XXXX")).is_err());
    }

    #[test]
    fn be_pushes_match_align_helpers() {
        let mut dat = [0u8; 8];
        let mut b = Buf::new(&mut dat);
        b.push(0x01).unwrap();
        b.push_be2(0x2345).unwrap();
        b.push_be4(0x6789ABCD).unwrap();
        assert_eq!(b.dat(), &[0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD]);
    }

    #[test]
    fn slc_bounds_checked() {
        let mut dat = [0u8; 8];
        let mut b = Buf::new(&mut dat);
        b.extend(Slc::from("hello")).unwrap();
        assert_eq!(b.slc(1, 4).unwrap().as_bytes(), b"ell");
        assert!(b.slc(0, 10).is_err());
    }
}
