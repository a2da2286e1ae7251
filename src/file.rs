//! The `File` role, `BaseFile`, and the `Reader`/`Writer` helpers layered
//! over it.
//!
//! `BaseFile` is the state every concrete `File` implementor shares: a
//! [`Ring`] staging buffer plus a status/outcome [`FileCode`]. The original
//! drives a single in-band `code` through a small state machine
//! (`CLOSED -> ... -> DONE/EOF/ERROR -> CLOSED`); we keep that machine
//! exactly, including the fact that `code` both reports the current phase
//! (`READING`, `WRITING`, ...) and the terminal outcome (`DONE`, `EOF`,
//! `ERROR`, `EIO`) of the last operation.
//!
//! `Reader`/`Writer` are blanket-implemented over every `File`, matching
//! spec's description of them as helpers layered on the role rather than
//! independent roles of their own.

use crate::arena::Arena;
use crate::buf::Buf;
use crate::error::{CivError, CivResult};
use crate::ring::Ring;
use crate::slc::Slc;

/// Status/outcome code shared by every `File` implementation.
///
/// Variant order intentionally matches the original's numeric ordering
/// (`0x00, 0x10, 0x11, 0x12, 0x13, 0xD0, 0xD1, 0xD2, 0xE0, 0xE2`) so that
/// `code as u8` comparisons (`>= FileCode::Done`) read the same way the
/// state-machine diagram in SPEC_FULL.md does.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileCode {
    Closed = 0x00,
    Seeking = 0x10,
    Reading = 0x11,
    Writing = 0x12,
    Stopping = 0x13,
    Done = 0xD0,
    Stopped = 0xD1,
    Eof = 0xD2,
    Error = 0xE0,
    Eio = 0xE2,
}

impl FileCode {
    /// `true` once this code is `DONE` or later in the state machine.
    pub fn at_least_done(self) -> bool {
        self as u8 >= FileCode::Done as u8
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FileCode::Eof | FileCode::Error | FileCode::Eio)
    }
}

/// `File::seek`'s `whence` argument. Per SPEC_FULL.md's resolved Open
/// Question, only `Set` is implemented by the in-memory [`crate::buffile::BufFile`];
/// `Cur`/`End` are declared (matching the original's interface) but every
/// implementor in this crate returns [`CivError::Unsupported`] for them
/// unless it backs a real seekable store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekWhence {
    Set,
    Cur,
    End,
}

bitflags::bitflags! {
    /// Permitted `File::open` options, mirrored from the original's
    /// `File_(RDWR|RDONLY|WRONLY|TRUNC|CREATE)` platform flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct OpenOptions: u8 {
        const READ_ONLY  = 0b0000_0001;
        const WRITE_ONLY = 0b0000_0010;
        const READ_WRITE = 0b0000_0100;
        const TRUNCATE   = 0b0000_1000;
        const CREATE     = 0b0001_0000;
    }
}

/// The state every `File` implementor shares: a staging [`Ring`] plus the
/// status code the state machine drives through.
pub struct BaseFile<'a> {
    pub ring: Ring<'a>,
    pub code: FileCode,
}

impl<'a> BaseFile<'a> {
    pub fn new(ring_dat: &'a mut [u8], code: FileCode) -> Self {
        BaseFile { ring: Ring::new(ring_dat), code }
    }
}

/// A capability for reading/writing bounded I/O through a [`Ring`].
///
/// Every method here takes `&mut self`: unlike [`Arena`], a `File` owns its
/// buffer and state exclusively, so there's no need for interior
/// mutability.
pub trait File {
    fn as_base(&self) -> &BaseFile<'_>;
    fn as_base_mut(&mut self) -> &mut BaseFile<'_>;

    /// Close if open, then release this file's buffers back to `arena`.
    /// Idempotent: a second call is a no-op.
    fn drop_file(&mut self, arena: &dyn Arena);

    /// Pre: `code == CLOSED`. Post: `code == DONE` with a cleared ring.
    fn open(&mut self, path: Slc, options: OpenOptions) -> CivResult<()>;

    /// Pre: `code >= DONE`. Post: `code == CLOSED` or `ERROR`.
    fn close(&mut self) -> CivResult<()>;

    /// Cancel any in-flight async work (may flush, for files). Post:
    /// `code == DONE`.
    fn stop(&mut self) -> CivResult<()>;

    /// Pre: `code >= DONE`. Only backing stores that support seeking need
    /// implement every `whence`.
    fn seek(&mut self, offset: i64, whence: SeekWhence) -> CivResult<()>;

    /// Advance the ring toward fullness, transitioning `code` through
    /// `READING` to `DONE` or `EOF`.
    fn read(&mut self) -> CivResult<()>;

    /// Advance the ring toward emptiness, transitioning `code` through
    /// `WRITING` to `DONE`.
    fn write(&mut self) -> CivResult<()>;
}

/// Reader-side helpers layered on [`File`] — blanket-implemented, matching
/// the spec's description of `Reader` as a helper rather than its own role.
pub trait Reader: File {
    /// Return the logical byte at offset `i`, triggering `read()` calls
    /// until it becomes available. Fails if `i` is beyond the ring's
    /// total capacity (not just its current length).
    fn get(&mut self, i: u16) -> CivResult<u8> {
        {
            let ring = &self.as_base().ring;
            if i < ring.len() {
                return ring.get(i);
            }
            if i >= ring.cap() {
                return Err(CivError::OutOfBounds { what: "Reader_get: index larger than Ring" });
            }
        }
        loop {
            self.read()?;
            let base = self.as_base();
            if i < base.ring.len() {
                return base.ring.get(i);
            }
            if base.code as u8 > FileCode::Done as u8 {
                break;
            }
        }
        Err(CivError::Io { what: "Reader_get: file ended before index became available" })
    }

    /// Fill `buf` from successive `read()` calls until it is full or the
    /// file has reached a terminal (`EOF`/`ERROR`/`EIO`) code. Returns the
    /// number of bytes moved.
    fn consume(&mut self, buf: &mut Buf) -> CivResult<u16> {
        let mut moved = 0u16;
        loop {
            moved += self.as_base_mut().ring.consume(buf);
            if buf.remain() == 0 {
                break;
            }
            if self.as_base().code.is_terminal() {
                break;
            }
            self.read()?;
        }
        Ok(moved)
    }
}

impl<T: File + ?Sized> Reader for T {}

/// Writer-side helpers layered on [`File`].
pub trait Writer: File {
    /// Repeatedly fill the ring and flush until the whole slice is
    /// written.
    fn extend(&mut self, mut s: Slc) -> CivResult<()> {
        while !s.is_empty() {
            let moved = self.as_base_mut().ring.move_in(s);
            s = s.slc(moved, s.len())?;
            if !s.is_empty() {
                self.write()?;
            }
        }
        Ok(())
    }

    /// Invoke `write()` until the ring is empty.
    fn flush(&mut self) -> CivResult<()> {
        while !self.as_base().ring.is_empty() {
            self.write()?;
        }
        Ok(())
    }
}

impl<T: File + ?Sized> Writer for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffile::BufFile;
    use crate::plcbuf::PlcBuf;

    fn haiku_file<'a>(ring: &'a mut [u8], backing: &'a mut [u8]) -> BufFile<'a> {
        let mut pb = PlcBuf::new(backing);
        pb.extend(Slc::from(
            "easy to test text\nwriting a simple haiku\nand the job is done\n\n",
        ))
        .unwrap();
        pb.set_plc(0).unwrap();
        BufFile::new(ring, pb)
    }

    #[test]
    fn buffile_read_sequence_matches_reference_trace() {
        let mut ring_dat = [0u8; 20];
        let mut backing_dat = [0u8; 256];
        let mut f = haiku_file(&mut ring_dat, &mut backing_dat);

        f.read().unwrap();
        assert_eq!(f.as_base().code, FileCode::Done);
        assert_eq!(f.as_base().ring.len(), 19);
        assert_eq!(f.as_base().ring.first().as_bytes(), b"easy to test text\nw");

        f.as_base_mut().ring.clear();
        f.as_base_mut().code = FileCode::Reading;
        f.read().unwrap();
        assert_eq!(f.as_base().ring.first().as_bytes(), b"riting a simple hai");

        f.as_base_mut().ring.inc_head(16);
        f.as_base_mut().code = FileCode::Reading;
        f.read().unwrap();
        assert_eq!(f.as_base().ring.len(), 19);
        assert_eq!(f.as_base().ring.first().as_bytes(), b"haiku\nand the job i");

        f.as_base_mut().ring.inc_head(18);
        f.as_base_mut().code = FileCode::Reading;
        f.read().unwrap();
        assert_eq!(f.as_base().ring.len(), 9);
        assert_eq!(f.as_base().code, FileCode::Eof);
        assert_eq!(f.as_base().ring.first().as_bytes(), b"is done\n\n");
    }

    #[test]
    fn buffile_write_sequence_matches_reference_trace() {
        let mut ring_dat = [0u8; 15];
        let mut backing_dat = [0u8; 256];
        let backing = PlcBuf::new(&mut backing_dat);
        let mut f = BufFile::new(&mut ring_dat, backing);

        Writer::extend(&mut f, Slc::from("Hello ")).unwrap();
        f.write().unwrap();
        assert_eq!(f.as_base().code, FileCode::Done);
        assert!(f.as_base().ring.is_empty());
        assert_eq!(f.backing().as_slc().as_bytes(), b"Hello ");

        crate::file::Writer::extend(&mut f, Slc::from("World!")).unwrap();
        Writer::flush(&mut f).unwrap();
        assert_eq!(f.backing().as_slc().as_bytes(), b"Hello World!");
    }

    #[test]
    fn reader_get_triggers_reads_until_available() {
        let mut ring_dat = [0u8; 20];
        let mut backing_dat = [0u8; 256];
        let mut f = haiku_file(&mut ring_dat, &mut backing_dat);
        assert_eq!(Reader::get(&mut f, 4).unwrap(), b' ');
        assert!(Reader::get(&mut f, 200).is_err());
    }
}
