//! Test-only helpers shared across the crate's `#[cfg(test)]` modules.
//!
//! `with_expect_err` is the analogue of `civ.h`'s `EXPECT_ERR`/`HANDLE_ERR`
//! pair: the original installs a `Fiber` handler, runs a block expected to
//! longjmp into it, and fails the test if it falls through instead. A
//! `CivResult` already carries that outcome without any jump buffer, so the
//! only thing left to do here is keep the expected failure's log line out of
//! test output and turn a surprising `Ok` into a panic.
//!
//! `assert_eq_test!`/`assert_ok!` keep the shape of `slopos-lib`'s
//! `lib/src/testing/assertions.rs` macros for the handful of call sites
//! where a custom failure message earns its keep; everywhere else a plain
//! `assert_eq!`/`.unwrap()` reads just as well and this crate's tests use
//! that instead.

use crate::error::CivResult;
use crate::logger::global;

/// Run `f`, asserting its result is `Err`, while suppressing the global
/// logger so the expected failure doesn't spam test output. The logger's
/// suppression state is restored to what it was before the call, even if
/// `f` panics.
pub fn with_expect_err<T, F: FnOnce() -> CivResult<T>>(f: F) {
    struct Restore(bool);
    impl Drop for Restore {
        fn drop(&mut self) {
            global::set_suppressed(self.0);
        }
    }

    let _restore = Restore(false);
    global::set_suppressed(true);
    let result = f();
    assert!(result.is_err(), "with_expect_err: closure unexpectedly succeeded");
}

#[macro_export]
macro_rules! assert_eq_test {
    ($left:expr, $right:expr) => {{
        let left = $left;
        let right = $right;
        assert!(left == right, "expected {:?}, got {:?}", right, left);
    }};
    ($left:expr, $right:expr, $msg:expr) => {{
        let left = $left;
        let right = $right;
        assert!(left == right, "{}: expected {:?}, got {:?}", $msg, right, left);
    }};
}

#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {{
        match $result {
            Ok(v) => v,
            Err(e) => panic!("expected Ok, got Err({:?})", e),
        }
    }};
    ($result:expr, $msg:expr) => {{
        match $result {
            Ok(v) => v,
            Err(e) => panic!("{}: expected Ok, got Err({:?})", $msg, e),
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CivError;

    #[test]
    fn with_expect_err_passes_through_a_failing_closure() {
        with_expect_err(|| -> CivResult<()> { Err(CivError::Io { what: "expected in this test" }) });
    }

    #[test]
    #[should_panic(expected = "unexpectedly succeeded")]
    fn with_expect_err_panics_on_an_unexpected_ok() {
        with_expect_err(|| -> CivResult<()> { Ok(()) });
    }

    #[test]
    fn assert_eq_test_accepts_matching_values() {
        assert_eq_test!(2 + 2, 4);
    }

    #[test]
    fn assert_ok_unwraps_matching_result() {
        let v: CivResult<i32> = Ok(7);
        let unwrapped = assert_ok!(v);
        assert_eq!(unwrapped, 7);
    }
}
