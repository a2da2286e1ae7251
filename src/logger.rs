//! `Logger`: a `Writer`-based leveled logger, grounded on `slopos-lib`'s
//! `klog` (`lib/src/klog.rs`) — the same five-level ordering and a
//! globally configured minimum level gating emission — composed with a
//! [`File`] the way the spec's role describes it, rather than `klog`'s
//! single global function-pointer backend. That lets more than one
//! independently-configured `Logger` coexist (one per stream); a
//! crate-level [`global`] slot (mirroring `klog_register_backend`) gives
//! callers who just want "the" logger a convenience macro family.

use core::fmt;

use crate::error::{CivError, CivResult};
use crate::file::{File, Writer};
use crate::slc::Slc;

/// `TRACE < DEBUG < INFO < WARN < ERROR`, matching the ordering spec §4.8
/// requires: a message is emitted when its level is at or above the
/// logger's configured minimum.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// The 4-character level tag `start` prefixes every message with.
    pub fn tag(self) -> &'static str {
        match self {
            LogLevel::Trace => "?TRC",
            LogLevel::Debug => "?DBG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "!ERR",
        }
    }
}

/// A [`File`]-backed leveled logger. Exactly one `start -> add* -> end`
/// cycle is legal per message; `start` returns `false` (and the caller
/// must skip `add`/`end`) when the message's level is below the
/// configured minimum.
pub struct Logger<F> {
    file: F,
    min_level: LogLevel,
    started: bool,
}

impl<F: File> Logger<F> {
    pub fn new(file: F, min_level: LogLevel) -> Self {
        Logger { file, min_level, started: false }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn set_min_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn file(&self) -> &F {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut F {
        &mut self.file
    }

    /// Write the `"[XXXX] "` level tag if `level` is at or above the
    /// configured minimum. Returns whether the caller should proceed with
    /// `add`/`end` for this message.
    pub fn start(&mut self, level: LogLevel) -> CivResult<bool> {
        if self.started {
            return Err(CivError::Ordering { what: "Logger::start called while already started" });
        }
        if level < self.min_level {
            return Ok(false);
        }
        self.started = true;
        let tag = level.tag();
        Writer::extend(&mut self.file, Slc::from("[")).and_then(|_| {
            Writer::extend(&mut self.file, Slc::new(tag.as_bytes())).and_then(|_| Writer::extend(&mut self.file, Slc::from("] ")))
        })?;
        Ok(true)
    }

    /// Append a chunk of message text. Caller must have checked `start`
    /// returned `true`.
    pub fn add(&mut self, s: Slc) -> CivResult<()> {
        if !self.started {
            return Err(CivError::Ordering { what: "Logger::add called without a started message" });
        }
        Writer::extend(&mut self.file, s)
    }

    /// Append a newline and flush, closing out the `start/add*/end` cycle.
    pub fn end(&mut self) -> CivResult<()> {
        if !self.started {
            return Err(CivError::Ordering { what: "Logger::end called without a started message" });
        }
        Writer::extend(&mut self.file, Slc::from("\n"))?;
        Writer::flush(&mut self.file)?;
        self.started = false;
        Ok(())
    }

    /// Run a `start/add(formatted text)/end` cycle in one call, formatting
    /// `args` through `core::fmt::Write`. A no-op (besides `Ok(())`) if
    /// `level` is below the configured minimum.
    pub fn log_args(&mut self, level: LogLevel, args: fmt::Arguments<'_>) -> CivResult<()> {
        if !self.start(level)? {
            return Ok(());
        }
        let mut w = FmtShim { logger: self, err: None };
        let _ = fmt::Write::write_fmt(&mut w, args);
        if let Some(e) = w.err.take() {
            self.started = false;
            return Err(e);
        }
        self.end()
    }
}

/// Adapts `Logger::add`'s `Slc`-based API to `core::fmt::Write`, which
/// the spec's `Fmt` role is simply re-derived as (see SPEC_FULL.md §5).
struct FmtShim<'a, F: File> {
    logger: &'a mut Logger<F>,
    err: Option<CivError>,
}

impl<'a, F: File> fmt::Write for FmtShim<'a, F> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.err.is_some() {
            return Err(fmt::Error);
        }
        match self.logger.add(Slc::new(s.as_bytes())) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.err = Some(e);
                Err(fmt::Error)
            }
        }
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_args($crate::logger::LogLevel::Trace, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_args($crate::logger::LogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_args($crate::logger::LogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_args($crate::logger::LogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_args($crate::logger::LogLevel::Error, ::core::format_args!($($arg)*))
    };
}

/// A crate-level "the logger" slot, mirroring `klog_register_backend`:
/// most embedders want one ambient logger rather than threading a
/// `Logger` handle through every call site.
///
/// Requires `alloc` (to own a boxed `dyn AnyLogger`) — a `no_std`,
/// no-`alloc` embedder still gets `Logger` itself, just not this
/// convenience slot, and must thread a `Logger` handle explicitly instead.
#[cfg(feature = "alloc")]
pub mod global {
    use super::{LogLevel, Logger};
    use crate::file::File;
    use spin::{Mutex, Once};

    /// Object-safe subset of `Logger` the global slot needs: boxing a
    /// concrete `Logger<F>` behind this trait lets callers register any
    /// `'static` `File` implementor without the global slot itself being
    /// generic over `F`.
    pub trait AnyLogger: Send {
        fn log_args(&mut self, level: LogLevel, args: core::fmt::Arguments<'_>) -> crate::error::CivResult<()>;
        fn set_min_level(&mut self, level: LogLevel);
    }

    impl<F: File + Send> AnyLogger for Logger<F> {
        fn log_args(&mut self, level: LogLevel, args: core::fmt::Arguments<'_>) -> crate::error::CivResult<()> {
            Logger::log_args(self, level, args)
        }
        fn set_min_level(&mut self, level: LogLevel) {
            Logger::set_min_level(self, level)
        }
    }

    static SLOT: Once<Mutex<Option<alloc::boxed::Box<dyn AnyLogger>>>> = Once::new();
    static SUPPRESSED: Once<Mutex<bool>> = Once::new();

    fn slot() -> &'static Mutex<Option<alloc::boxed::Box<dyn AnyLogger>>> {
        SLOT.call_once(|| Mutex::new(None))
    }

    fn suppressed() -> &'static Mutex<bool> {
        SUPPRESSED.call_once(|| Mutex::new(false))
    }

    /// Install `logger` as the process-wide default, replacing any
    /// previous one.
    pub fn register(logger: alloc::boxed::Box<dyn AnyLogger>) {
        *slot().lock() = Some(logger);
    }

    pub fn set_min_level(level: LogLevel) {
        if let Some(l) = slot().lock().as_mut() {
            l.set_min_level(level);
        }
    }

    /// Silence (or re-enable) [`log_args`] without touching the
    /// registered logger itself. Used by [`crate::testing::with_expect_err`]
    /// to keep an expected-failure path's error log out of test output.
    pub fn set_suppressed(value: bool) {
        *suppressed().lock() = value;
    }

    /// Used by the [`crate::klog_trace`]-style macros; a no-op if no
    /// logger has been [`register`]ed yet, or while [`set_suppressed`] is
    /// in effect.
    pub fn log_args(level: LogLevel, args: core::fmt::Arguments<'_>) {
        if *suppressed().lock() {
            return;
        }
        if let Some(l) = slot().lock().as_mut() {
            let _ = l.log_args(level, args);
        }
    }
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)*) => {
        $crate::logger::global::log_args($crate::logger::LogLevel::Trace, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::logger::global::log_args($crate::logger::LogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)*) => {
        $crate::logger::global::log_args($crate::logger::LogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::logger::global::log_args($crate::logger::LogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::logger::global::log_args($crate::logger::LogLevel::Error, ::core::format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffile::BufFile;
    use crate::plcbuf::PlcBuf;

    fn new_logger<'a>(ring: &'a mut [u8], backing: &'a mut [u8], min: LogLevel) -> Logger<BufFile<'a>> {
        let pb = PlcBuf::new(backing);
        Logger::new(BufFile::new(ring, pb), min)
    }

    #[test]
    fn start_writes_level_tag_and_gates_on_min_level() {
        let mut ring_dat = [0u8; 64];
        let mut backing_dat = [0u8; 128];
        let mut logger = new_logger(&mut ring_dat, &mut backing_dat, LogLevel::Info);

        assert!(!logger.start(LogLevel::Debug).unwrap());

        assert!(logger.start(LogLevel::Warn).unwrap());
        logger.add(Slc::from("disk almost full")).unwrap();
        logger.end().unwrap();

        assert_eq!(logger.file().backing().as_slc().as_bytes(), b"[WARN] disk almost full\n");
    }

    #[test]
    fn log_args_formats_and_gates_like_start() {
        let mut ring_dat = [0u8; 64];
        let mut backing_dat = [0u8; 128];
        let mut logger = new_logger(&mut ring_dat, &mut backing_dat, LogLevel::Info);

        logger.log_args(LogLevel::Trace, format_args!("ignored {}", 1)).unwrap();
        assert!(logger.file().backing().as_slc().is_empty());

        logger.log_args(LogLevel::Error, format_args!("boom {}", 42)).unwrap();
        assert_eq!(logger.file().backing().as_slc().as_bytes(), b"[!ERR] boom 42\n");
    }
}
