//! Error taxonomy for the whole crate.
//!
//! The original C library signals failures by longjmp-ing to the nearest
//! `Fiber` handler with a message slice. Here every fallible operation
//! returns a typed [`CivError`] through `Result` instead; there is nothing
//! left to unwind to.

use core::fmt;

/// Every way a container, allocator, or stream operation can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CivError {
    /// An index or slice range fell outside the bounds of the data it
    /// addresses (e.g. `Slc_slc`, `Stk` under/overflow, `Ring_get`).
    OutOfBounds { what: &'static str },

    /// A fixed-capacity container could not hold the requested data.
    Capacity { what: &'static str },

    /// A free, pop, or shift was requested out of the required order
    /// (e.g. a `Bba` free that isn't the most recent allocation).
    Ordering { what: &'static str },

    /// A stream (`File`) operation failed or was called out of sequence.
    Io { what: &'static str },

    /// A fetch/store size or alignment was not one this crate supports.
    Type { what: &'static str },

    /// A `CStr` payload exceeded the 255-byte length it can encode.
    CStrTooLong { len: usize },

    /// A `Bba` free call's (data, sz, alignment) didn't match any live
    /// allocation in the block it targets. Carries the original four
    /// distinct failure kinds as a nested reason.
    BbaFree(BbaFreeError),

    /// A requested `File::seek` whence value isn't implemented.
    Unsupported { what: &'static str },
}

/// The four distinct ways a block bump arena's `free` can be misused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BbaFreeError {
    /// `free` called on an arena holding no block at all.
    EmptyArena,
    /// The freed pointer lies before the arena's current block.
    BelowBlock,
    /// The freed pointer (plus its size) lies past the block's data.
    AboveBlock,
    /// The freed `(ptr, sz, alignment)` doesn't match the most recent
    /// allocation — frees must undo allocations in exact reverse order.
    UnorderedFree,
}

impl fmt::Display for CivError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CivError::OutOfBounds { what } => write!(f, "out of bounds: {what}"),
            CivError::Capacity { what } => write!(f, "capacity exceeded: {what}"),
            CivError::Ordering { what } => write!(f, "out of order: {what}"),
            CivError::Io { what } => write!(f, "io error: {what}"),
            CivError::Type { what } => write!(f, "invalid type/size: {what}"),
            CivError::CStrTooLong { len } => write!(f, "CStr max len is 255, got {len}"),
            CivError::BbaFree(reason) => write!(f, "bba free: {reason}"),
            CivError::Unsupported { what } => write!(f, "unsupported: {what}"),
        }
    }
}

impl fmt::Display for BbaFreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            BbaFreeError::EmptyArena => "Free empty BBA",
            BbaFreeError::BelowBlock => "Data below block",
            BbaFreeError::AboveBlock => "Data above block",
            BbaFreeError::UnorderedFree => "unordered free: sz",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CivError {}

pub type CivResult<T> = Result<T, CivError>;

/// The crate's default error-printer hook: prints `e` to stderr, with a
/// captured backtrace appended when the `backtrace` feature is enabled.
/// The direct replacement for `civ_unix`'s `SETUP_SIG`/`Trace_newSig`
/// signal-driven backtrace-on-crash — Rust has no SIGSEGV-on-longjmp
/// convention to hook, so this captures the trace eagerly at the call
/// site instead of after the fact.
#[cfg(feature = "std")]
pub fn report(e: &CivError) {
    #[cfg(feature = "backtrace")]
    {
        let trace = std::backtrace::Backtrace::force_capture();
        std::eprintln!("!! Error: {e}\n{trace}");
    }
    #[cfg(not(feature = "backtrace"))]
    {
        std::eprintln!("!! Error: {e}");
    }
}
