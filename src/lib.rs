#![no_std]
#![cfg_attr(not(any(feature = "std", test)), allow(dead_code))]

#[cfg(any(feature = "alloc", feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod align;
pub mod arena;
pub mod bba;
pub mod block;
pub mod bst;
pub mod buf;
pub mod buffile;
pub mod cstr;
pub mod error;
pub mod file;
pub mod list;
pub mod logger;
pub mod plcbuf;
pub mod ring;
pub mod slc;
pub mod stk;

#[cfg(feature = "std")]
pub mod std_file;

#[cfg(test)]
pub mod testing;

pub use arena::{Arena, Resource};
pub use bba::Bba;
pub use block::{BLOCK_AVAIL, BLOCK_SIZE, BlockAllocator, BlockPool};
pub use buf::Buf;
pub use bst::BstNode;
pub use cstr::CStr;
pub use error::{BbaFreeError, CivError, CivResult};
pub use file::{BaseFile, File, FileCode, OpenOptions, Reader, SeekWhence, Writer};
pub use logger::{LogLevel, Logger};
pub use plcbuf::PlcBuf;
pub use ring::Ring;
pub use slc::Slc;
pub use stk::Stk;
