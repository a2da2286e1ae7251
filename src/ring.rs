//! `Ring`: a single-producer/single-consumer byte ring buffer.
//!
//! Not SMP-safe — this crate's concurrency model is cooperative and single
//! threaded throughout (see the crate-level docs), so `head`/`tail` are
//! plain `u16`s, not atomics. The usable capacity is one less than the
//! backing buffer's length: a full ring (`tail + 1 == head`) is
//! distinguishable from an empty one (`tail == head`) only by reserving
//! that one slot.

use crate::error::CivError;
use crate::slc::{self, Slc};

pub struct Ring<'a> {
    dat: &'a mut [u8],
    head: u16,
    tail: u16,
}

impl<'a> Ring<'a> {
    pub fn new(dat: &'a mut [u8]) -> Self {
        assert!(dat.len() <= u16::MAX as usize, "Ring backing buffer too large");
        Ring { dat, head: 0, tail: 0 }
    }

    fn cap_raw(&self) -> u16 {
        self.dat.len() as u16
    }

    /// Raw pointer to the backing storage, for callers that need to return
    /// it to the [`crate::arena::Arena`] it came from (e.g. a `File`'s
    /// `drop_file`).
    pub fn dat_mut_ptr(&mut self) -> *mut u8 {
        self.dat.as_mut_ptr()
    }

    /// Size of the backing storage, in bytes (`cap() + 1`).
    pub fn backing_len(&self) -> usize {
        self.dat.len()
    }

    /// Usable capacity: one less than the backing buffer's size.
    pub fn cap(&self) -> u16 {
        self.cap_raw() - 1
    }

    pub fn remain(&self) -> u16 {
        self.cap() - self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tail == self.head
    }

    pub fn is_full(&self) -> bool {
        self.wrap(self.tail + 1) == self.head
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    fn wrap(&self, i: u16) -> u16 {
        i % self.cap_raw()
    }

    pub fn len(&self) -> u16 {
        if self.tail >= self.head {
            self.tail - self.head
        } else {
            self.tail + self.cap_raw() - self.head
        }
    }

    pub fn get(&self, i: u16) -> Result<u8, CivError> {
        if i >= self.len() {
            return Err(CivError::OutOfBounds { what: "Ring_get OOB" });
        }
        Ok(self.dat[self.wrap(self.head + i) as usize])
    }

    /// Read-and-advance the head. `None` when empty.
    pub fn next(&mut self) -> Option<u8> {
        if self.head == self.tail {
            return None;
        }
        let out = self.dat[self.head as usize];
        self.head = self.wrap(self.head + 1);
        Some(out)
    }

    pub fn pop(&mut self) -> Result<u8, CivError> {
        if self.is_empty() {
            return Err(CivError::OutOfBounds { what: "Ring pop: empty" });
        }
        let c = self.dat[self.head as usize];
        self.head = self.wrap(self.head + 1);
        Ok(c)
    }

    pub fn push(&mut self, c: u8) -> Result<(), CivError> {
        if self.is_full() {
            return Err(CivError::Capacity { what: "Ring push: already full" });
        }
        self.dat[self.tail as usize] = c;
        self.tail = self.wrap(self.tail + 1);
        Ok(())
    }

    pub fn extend(&mut self, s: Slc) -> Result<(), CivError> {
        if self.cap_raw() - self.len() <= s.len() {
            return Err(CivError::Capacity { what: "Ring extend: too full" });
        }
        let s = s.as_bytes();
        let first = self.cap_raw() - self.tail;
        if first as usize >= s.len() {
            self.dat[self.tail as usize..self.tail as usize + s.len()].copy_from_slice(s);
            self.tail += s.len() as u16;
            if self.tail >= self.cap_raw() {
                self.tail = 0;
            }
        } else {
            let second = s.len() - first as usize;
            self.dat[self.tail as usize..].copy_from_slice(&s[..first as usize]);
            self.dat[..second].copy_from_slice(&s[first as usize..]);
            self.tail = second as u16;
        }
        Ok(())
    }

    /// The next contiguous writable run (from `tail` towards the end of the
    /// backing buffer, or up to `head` once wrapped). May be shorter than
    /// the ring's total remaining capacity — call twice to fill it all.
    pub fn avail(&mut self) -> Slc<'_> {
        let (start, len) = if self.tail >= self.head {
            (self.tail, self.cap_raw() - self.tail - if self.head == 0 { 1 } else { 0 })
        } else {
            (self.tail, self.head - self.tail - 1)
        };
        Slc::new(&self.dat[start as usize..start as usize + len as usize])
    }

    /// Move as much of `s` into the ring's next available run as fits.
    /// Returns the amount moved; call again to continue past a wraparound.
    pub fn move_in(&mut self, s: Slc) -> u16 {
        let tail = self.tail;
        let (start, cap_len) = if tail >= self.head {
            (tail, self.cap_raw() - tail - if self.head == 0 { 1 } else { 0 })
        } else {
            (tail, self.head - tail - 1)
        };
        let src = s.as_bytes();
        let n = slc::mv(&mut self.dat[start as usize..start as usize + cap_len as usize], src);
        self.inc_tail(n);
        n
    }

    /// Drain as much of the ring's readable content into `buf` as fits,
    /// advancing `head`. Returns the number of bytes moved.
    pub fn consume(&mut self, buf: &mut crate::buf::Buf) -> u16 {
        let mut moved = 0u16;
        loop {
            let first = self.first();
            if first.is_empty() {
                break;
            }
            let room = buf.remain();
            if room == 0 {
                break;
            }
            let take = room.min(first.len());
            let chunk = first.slc(0, take).expect("take <= first.len()");
            buf.extend(chunk).expect("take <= buf.remain()");
            self.inc_head(take);
            moved += take;
            if take < first.len() {
                break;
            }
        }
        moved
    }

    pub fn inc_tail(&mut self, inc: u16) {
        self.tail = self.wrap(self.tail + inc);
    }

    pub fn inc_head(&mut self, inc: u16) {
        self.head = self.wrap(self.head + inc);
    }

    /// The first contiguous readable run, from `head` to `tail` (or to the
    /// end of the backing buffer if wrapped).
    pub fn first(&self) -> Slc<'_> {
        if self.tail >= self.head {
            Slc::new(&self.dat[self.head as usize..self.tail as usize])
        } else {
            Slc::new(&self.dat[self.head as usize..])
        }
    }

    /// The second contiguous readable run (empty unless wrapped).
    pub fn second(&self) -> Slc<'_> {
        if self.tail >= self.head {
            Slc::empty()
        } else {
            Slc::new(&self.dat[..self.tail as usize])
        }
    }

    /// Compare the ring's full readable content against `s`.
    pub fn cmp_slc(&self, s: Slc) -> i32 {
        let first = self.first();
        let s_bytes = s.as_bytes();
        let first_len = first.len() as usize;
        if first_len > s_bytes.len() {
            return slc::cmp(first, s);
        }
        let cmp = slc::cmp(first, Slc::new(&s_bytes[..first_len]));
        if cmp != 0 {
            return cmp;
        }
        slc::cmp(self.second(), Slc::new(&s_bytes[first_len..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraparound_matches_reference_trace() {
        let mut dat = [0u8; 10];
        let mut r = Ring::new(&mut dat);
        assert_eq!(r.cap(), 9);
        assert!(r.is_empty());
        assert!(!r.is_full());
        assert_eq!(r.len(), 0);
        assert_eq!(r.avail().len(), 9);

        crate::assert_ok!(r.push(b'a'));
        assert!(!r.is_empty());
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(0).unwrap(), b'a');

        crate::assert_ok!(r.extend(Slc::from("bcde")));
        assert_eq!(r.cmp_slc(Slc::from("abcde")), 0);
        assert_eq!(r.get(4).unwrap(), b'e');

        assert_eq!(r.next(), Some(b'a'));
        assert_eq!(r.len(), 4);

        crate::assert_ok!(r.extend(Slc::from("ABCD")));
        assert_eq!(r.len(), 8);
        crate::assert_eq_test!(r.first().as_bytes(), b"bcdeABCD", "ring wrap: first() after two extends");
        crate::assert_eq_test!(r.second().as_bytes(), b"", "ring wrap: second() before any wrap");
        assert_eq!(r.cmp_slc(Slc::from("bcdeABCD")), 0);
        assert!(r.extend(Slc::from("WXY")).is_err());
        assert_eq!(r.len(), 8);

        // Consume "bcd" (head 1 -> 4) and extend across the wrap point.
        r.inc_head(3);
        crate::assert_ok!(r.extend(Slc::from("efgh")));
        crate::assert_eq_test!(r.first().as_bytes(), b"eABCDe", "ring wrap: first() after crossing the wrap point");
        crate::assert_eq_test!(r.second().as_bytes(), b"fgh", "ring wrap: second() after crossing the wrap point");
    }

    #[test]
    fn push_full_pop_empty_boundaries() {
        let mut dat = [0u8; 4];
        let mut r = Ring::new(&mut dat);
        assert_eq!(r.cap(), 3);
        r.extend(Slc::from("xyz")).unwrap();
        assert!(r.is_full());
        assert!(r.push(b'!').is_err());
        assert!(r.extend(Slc::from("a")).is_err());

        assert_eq!(r.pop().unwrap(), b'x');
        assert_eq!(r.pop().unwrap(), b'y');
        assert_eq!(r.pop().unwrap(), b'z');
        assert!(r.is_empty());
        assert!(r.pop().is_err());
        assert_eq!(r.next(), None);
    }
}
