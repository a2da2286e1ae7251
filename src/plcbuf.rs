//! `PlcBuf`: a [`Buf`] with a cursor (`plc`) into its used region.
//!
//! The cursor lets a caller consume a buffer incrementally — read a line,
//! advance `plc` past it, then [`PlcBuf::shift`] to compact the remainder
//! to the front before reading more. This is the backing store both
//! [`crate::buffile::BufFile`] and the host-backed file use underneath
//! their `Ring` staging buffer.

use crate::arena::Arena;
use crate::buf::Buf;
use crate::error::CivError;
use crate::slc::Slc;

pub struct PlcBuf<'a> {
    buf: Buf<'a>,
    plc: u16,
}

impl<'a> PlcBuf<'a> {
    pub fn new(dat: &'a mut [u8]) -> Self {
        PlcBuf { buf: Buf::new(dat), plc: 0 }
    }

    pub fn alloc(arena: &'a impl Arena, cap: u16) -> Option<Self> {
        Some(PlcBuf { buf: Buf::alloc(arena, cap)?, plc: 0 })
    }

    pub fn cap(&self) -> u16 {
        self.buf.cap()
    }

    pub fn len(&self) -> u16 {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn plc(&self) -> u16 {
        self.plc
    }

    pub fn set_plc(&mut self, plc: u16) -> Result<(), CivError> {
        if plc > self.buf.len() {
            return Err(CivError::OutOfBounds { what: "PlcBuf plc > len" });
        }
        self.plc = plc;
        Ok(())
    }

    pub fn advance(&mut self, by: u16) -> Result<(), CivError> {
        self.set_plc(self.plc + by)
    }

    pub fn as_buf(&self) -> &Buf<'a> {
        &self.buf
    }

    pub fn as_buf_mut(&mut self) -> &mut Buf<'a> {
        &mut self.buf
    }

    pub fn as_slc(&self) -> Slc<'_> {
        self.buf.as_slc()
    }

    /// The unread remainder, `dat[plc..len]`.
    pub fn plc_as_slc(&self) -> Slc<'_> {
        self.buf.slc(self.plc, self.buf.len()).expect("plc <= len is an invariant")
    }

    pub fn extend(&mut self, s: Slc) -> Result<(), CivError> {
        self.buf.extend(s)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.plc = 0;
    }

    /// Drop `dat[..plc]`, shifting `dat[plc..len]` to the front and
    /// resetting `plc` to 0. Idempotent when `plc == 0`.
    pub fn shift(&mut self) {
        self.buf.compact_from(self.plc);
        self.plc = 0;
    }

    /// Return the backing allocation to `arena`. See [`Buf::free`].
    ///
    /// # Safety
    /// Same as [`Buf::free`].
    pub unsafe fn free(&mut self, arena: &dyn crate::arena::Arena) -> Result<(), CivError> {
        unsafe { self.buf.free(arena) }
    }
}
