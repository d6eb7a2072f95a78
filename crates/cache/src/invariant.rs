//! Fatal path for broken cache bookkeeping.
//!
//! A violated invariant means the cache itself (or a caller breaking the
//! handle contract) has corrupted the accounting. Carrying on would risk
//! handing out a resource that has already been released, so the failure is
//! logged and the thread panics.

use std::fmt;

use respool_common::units::SizeUnit;

/// Logs the violated condition for `cache` and panics.
#[cold]
#[inline(never)]
#[track_caller]
#[allow(clippy::panic)]
pub(crate) fn violated(cache: &str, condition: fmt::Arguments<'_>) -> ! {
    tracing::error!(cache, %condition, "resource cache invariant violated");
    panic!("resource cache '{cache}' invariant violated: {condition}");
}

/// `counter + by`, or a fatal error naming the counter on overflow.
#[track_caller]
pub(crate) fn grow<S: SizeUnit>(cache: &str, counter: &'static str, value: S, by: S) -> S {
    match value.checked_add(by) {
        Some(next) => next,
        None => violated(cache, format_args!("{counter} overflowed adding {by:?} to {value:?}")),
    }
}

/// `counter - by`, or a fatal error naming the counter on underflow.
#[track_caller]
pub(crate) fn shrink<S: SizeUnit>(cache: &str, counter: &'static str, value: S, by: S) -> S {
    match value.checked_sub(by) {
        Some(next) => next,
        None => {
            violated(cache, format_args!("{counter} underflowed removing {by:?} from {value:?}"))
        }
    }
}
