//! Host-backed [`File`]: drives a [`Ring`] with `std::fs::File`.
//!
//! Grounded on `UFile_open`/`UFile_read`/`UFile_readAll`/`UFile_handleErr`
//! in `civ_unix.c` — in particular its `EWOULDBLOCK`-swallowing behavior on
//! `read`/`write`/`seek` (a non-blocking fd can legitimately return "would
//! block" with nothing to report; that isn't an I/O error). `std::fs::File`
//! plus `std::io::{Read, Write, Seek}` stands in for the raw
//! `open`/`read`/`write`/`lseek`/`close` syscalls spec §1 puts out of scope
//! as "the host-specific file-descriptor implementation" — this is the
//! idiomatic Rust rendition of that collaborator, not a reimplementation of
//! it.

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use crate::arena::Arena;
use crate::error::{CivError, CivResult};
use crate::file::{BaseFile, File, FileCode, OpenOptions, SeekWhence};
use crate::slc::Slc;

pub struct StdFile<'a> {
    base: BaseFile<'a>,
    handle: Option<std::fs::File>,
    dropped: bool,
}

impl<'a> StdFile<'a> {
    /// Wrap pre-allocated ring storage as a closed file.
    pub fn new(ring_dat: &'a mut [u8]) -> Self {
        StdFile { base: BaseFile::new(ring_dat, FileCode::Closed), handle: None, dropped: false }
    }

    pub fn alloc(arena: &'a impl Arena, ring_cap: u16) -> Option<Self> {
        let ring_dat = crate::arena::alloc_bytes(arena, ring_cap, 1)?;
        Some(StdFile { base: BaseFile::new(ring_dat, FileCode::Closed), handle: None, dropped: false })
    }

    fn handle_mut(&mut self) -> CivResult<&mut std::fs::File> {
        self.handle.as_mut().ok_or(CivError::Ordering { what: "StdFile: no open handle" })
    }

    /// Map a `std::io::Error` the way `UFile_handleErr` does: swallow
    /// `WouldBlock` (report zero progress, no state change), otherwise
    /// record `EIO`/`ERROR` on the base file and surface it.
    fn handle_io_err(&mut self, e: std::io::Error) -> CivResult<usize> {
        if e.kind() == ErrorKind::WouldBlock {
            return Ok(0);
        }
        self.base.code = FileCode::Eio;
        Err(CivError::Io { what: "StdFile: host I/O error" })
    }
}

impl<'a> File for StdFile<'a> {
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
        if self.handle.is_some() {
            let _ = File::close(self);
        }
        let ring_ptr = self.base.ring.dat_mut_ptr();
        let ring_cap = self.base.ring.backing_len();
        unsafe {
            let _ = arena.free_raw(ring_ptr, ring_cap, 1);
        }
    }

    fn open(&mut self, path: Slc, options: OpenOptions) -> CivResult<()> {
        if self.base.code != FileCode::Closed {
            return Err(CivError::Ordering { what: "File open: code != CLOSED" });
        }
        let path = core::str::from_utf8(path.as_bytes())
            .map_err(|_| CivError::Type { what: "StdFile::open: path is not valid UTF-8" })?;
        let mut opts = std::fs::OpenOptions::new();
        if options.contains(OpenOptions::READ_ONLY) {
            opts.read(true);
        }
        if options.contains(OpenOptions::WRITE_ONLY) {
            opts.write(true);
        }
        if options.contains(OpenOptions::READ_WRITE) {
            opts.read(true).write(true);
        }
        if options.contains(OpenOptions::TRUNCATE) {
            opts.truncate(true);
        }
        if options.contains(OpenOptions::CREATE) {
            opts.create(true);
        }
        let handle = opts.open(path).map_err(|_| CivError::Io { what: "StdFile::open: host open failed" })?;
        self.handle = Some(handle);
        self.base.ring.clear();
        self.base.code = FileCode::Done;
        Ok(())
    }

    fn close(&mut self) -> CivResult<()> {
        if !self.base.code.at_least_done() {
            return Err(CivError::Ordering { what: "File close: code < DONE" });
        }
        if let Some(mut h) = self.handle.take() {
            if h.sync_all().is_err() {
                self.base.code = FileCode::Error;
                return Ok(());
            }
            drop(h);
        }
        self.base.code = FileCode::Closed;
        Ok(())
    }

    fn stop(&mut self) -> CivResult<()> {
        if let Some(h) = self.handle.as_mut() {
            let _ = h.sync_all();
        }
        self.base.code = FileCode::Done;
        Ok(())
    }

    fn seek(&mut self, offset: i64, whence: SeekWhence) -> CivResult<()> {
        if !self.base.code.at_least_done() {
            return Err(CivError::Ordering { what: "File seek: code < DONE" });
        }
        let from = match whence {
            SeekWhence::Set => SeekFrom::Start(offset.max(0) as u64),
            SeekWhence::Cur => SeekFrom::Current(offset),
            SeekWhence::End => SeekFrom::End(offset),
        };
        let h = self.handle_mut()?;
        match h.seek(from) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(_) => {
                self.base.code = FileCode::Eio;
                Err(CivError::Io { what: "StdFile::seek: host seek failed" })
            }
        }
    }

    fn read(&mut self) -> CivResult<()> {
        if !(self.base.code == FileCode::Reading || self.base.code.at_least_done()) {
            return Err(CivError::Ordering { what: "File read: called out of order" });
        }
        self.base.code = FileCode::Reading;
        let avail = {
            let len = self.base.ring.avail().len();
            len
        };
        if avail == 0 {
            self.base.code = FileCode::Done;
            return Ok(());
        }
        let mut scratch = [0u8; 512];
        let want = (avail as usize).min(scratch.len());
        let n = match self.handle_mut()?.read(&mut scratch[..want]) {
            Ok(n) => n,
            Err(e) => self.handle_io_err(e)?,
        };
        if n > 0 {
            self.base.ring.extend(Slc::new(&scratch[..n]))?;
        }
        if self.base.ring.is_full() {
            self.base.code = FileCode::Done;
        } else if n == 0 {
            self.base.code = FileCode::Eof;
        }
        Ok(())
    }

    fn write(&mut self) -> CivResult<()> {
        if !(self.base.code == FileCode::Writing || self.base.code.at_least_done()) {
            return Err(CivError::Ordering { what: "File write: called out of order" });
        }
        self.base.code = FileCode::Writing;
        let s = self.base.ring.first();
        if s.is_empty() {
            self.base.code = FileCode::Done;
            return Ok(());
        }
        let n = match self.handle_mut()?.write(s.as_bytes()) {
            Ok(n) => n,
            Err(e) => self.handle_io_err(e)?,
        };
        self.base.ring.inc_head(n as u16);
        if self.base.ring.is_empty() {
            self.base.code = FileCode::Done;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bba::Bba;
    use crate::block::{BlockAllocator, BlockPool};
    use crate::file::Writer;

    #[test]
    fn write_then_read_back_through_a_temp_file() {
        let pool = BlockAllocator::new(BlockPool::with_capacity(3));
        let bba = Bba::new(&pool);
        let mut f = StdFile::alloc(&bba, 64).unwrap();

        let path = std::env::temp_dir().join(format!("civrt-std-file-test-{}", std::process::id()));
        let path_str = path.to_str().unwrap();

        f.open(Slc::new(path_str.as_bytes()), OpenOptions::READ_WRITE | OpenOptions::CREATE | OpenOptions::TRUNCATE)
            .unwrap();
        Writer::extend(&mut f, Slc::from("hello host file")).unwrap();
        Writer::flush(&mut f).unwrap();
        f.close().unwrap();

        f.open(Slc::new(path_str.as_bytes()), OpenOptions::READ_ONLY).unwrap();
        let mut storage = [0u8; 64];
        let mut collected = crate::buf::Buf::new(&mut storage);
        crate::file::Reader::consume(&mut f, &mut collected).unwrap();
        assert_eq!(collected.dat(), b"hello host file");
        f.close().unwrap();

        f.drop_file(&bba);
        let _ = std::fs::remove_file(&path);
    }
}
