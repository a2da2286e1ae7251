//! `BufFile`: an in-memory [`File`] backed by a [`PlcBuf`].
//!
//! Grounded on `BufFile_read`/`BufFile_write`/`BufFile_seek` in the
//! original's `src/civ.c`: `read` moves bytes from the backing buffer's
//! unread tail into the ring (advancing `plc`), finishing with `EOF` once
//! `plc` reaches `len`; `write` drains the ring into the backing `Buf`,
//! finishing with `DONE` once the ring empties. `open` is the one method
//! the original hard-disables (`File_panicOpen`) — a `BufFile` is always
//! already "open" over its backing store — so here it returns
//! [`CivError::Unsupported`] instead of unwinding.

use crate::arena::Arena;
use crate::error::{CivError, CivResult};
use crate::file::{BaseFile, File, FileCode, OpenOptions, SeekWhence};
use crate::plcbuf::PlcBuf;
use crate::slc::Slc;

pub struct BufFile<'a> {
    base: BaseFile<'a>,
    backing: PlcBuf<'a>,
    dropped: bool,
}

impl<'a> BufFile<'a> {
    /// Wrap pre-allocated ring storage and a backing [`PlcBuf`] as an
    /// already-open file (`code == DONE`).
    pub fn new(ring_dat: &'a mut [u8], backing: PlcBuf<'a>) -> Self {
        BufFile { base: BaseFile::new(ring_dat, FileCode::Done), backing, dropped: false }
    }

    /// Allocate both the ring and the backing buffer from `arena`.
    pub fn alloc(arena: &'a impl Arena, ring_cap: u16, backing_cap: u16) -> Option<Self> {
        let ring_dat = crate::arena::alloc_bytes(arena, ring_cap, 1)?;
        let backing = PlcBuf::alloc(arena, backing_cap)?;
        Some(BufFile { base: BaseFile::new(ring_dat, FileCode::Done), backing, dropped: false })
    }

    pub fn backing(&self) -> &PlcBuf<'a> {
        &self.backing
    }
}

impl<'a> File for BufFile<'a> {
    fn as_base(&self) -> &BaseFile<'_> {
        &self.base
    }

    fn as_base_mut(&mut self) -> &mut BaseFile<'_> {
        &mut self.base
    }

    fn drop_file(&mut self, arena: &dyn Arena) {
        if self.dropped {
            return;
        }
        self.dropped = true;
        // `close`/`stop` are no-ops for a `BufFile` (see below); nothing to
        // flush or transition before releasing the backing allocation.
        unsafe {
            let _ = self.backing.free(arena);
        }
    }

    fn open(&mut self, _path: Slc, _options: OpenOptions) -> CivResult<()> {
        Err(CivError::Unsupported { what: "BufFile::open: not supported, always already open" })
    }

    /// A `BufFile` is always already "open" over its backing store, so
    /// `close` has nothing to release and nothing to transition: a literal
    /// no-op, matching `File_noop` in `src/civ.c`.
    fn close(&mut self) -> CivResult<()> {
        Ok(())
    }

    /// No in-flight async work to cancel for an in-memory file: a literal
    /// no-op, matching `File_noop` in `src/civ.c`.
    fn stop(&mut self) -> CivResult<()> {
        Ok(())
    }

    fn seek(&mut self, offset: i64, whence: SeekWhence) -> CivResult<()> {
        if !self.base.code.at_least_done() {
            return Err(CivError::Ordering { what: "File seek: code < DONE" });
        }
        match whence {
            SeekWhence::Set => {
                if offset < 0 {
                    return Err(CivError::OutOfBounds { what: "BufFile seek SET: offset must be >= 0" });
                }
                if offset as u64 > self.backing.len() as u64 {
                    return Err(CivError::OutOfBounds { what: "BufFile seek SET: offset must be <= buf.len" });
                }
                self.backing.set_plc(offset as u16)
            }
            SeekWhence::Cur | SeekWhence::End => {
                Err(CivError::Unsupported { what: "BufFile seek: only SET is implemented" })
            }
        }
    }

    fn read(&mut self) -> CivResult<()> {
        if !(self.base.code == FileCode::Reading || self.base.code.at_least_done()) {
            return Err(CivError::Ordering { what: "File read: called out of order" });
        }
        let moved = self.base.ring.move_in(self.backing.plc_as_slc());
        self.backing.advance(moved)?;
        if self.backing.plc() >= self.backing.len() {
            self.base.code = FileCode::Eof;
        } else if self.base.ring.is_full() {
            self.base.code = FileCode::Done;
        }
        Ok(())
    }

    fn write(&mut self) -> CivResult<()> {
        if !(self.base.code == FileCode::Writing || self.base.code.at_least_done()) {
            return Err(CivError::Ordering { what: "File write: called out of order" });
        }
        self.base.code = FileCode::Writing;
        let s = self.base.ring.first();
        let moved = s.len();
        self.backing.as_buf_mut().extend(s)?;
        self.base.ring.inc_head(moved);
        if self.base.ring.is_empty() {
            self.base.code = FileCode::Done;
        }
        Ok(())
    }
}
