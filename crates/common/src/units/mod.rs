//! Storage quantities
//!
//! - **[`SizeUnit`]**: the minimal arithmetic a size-bounded container needs
//!   from its size type (ordering, a zero, checked addition and subtraction)
//! - **[`ByteSize`]**: a byte count with binary-unit text encoding

mod byte;

pub use byte::{ByteSize, ByteSizeParseError};

use std::fmt::Debug;

/// A totally ordered, summable quantity of storage.
///
/// Checked operations return `None` on overflow or when a subtraction would
/// go below zero; callers decide whether that is an error or a bug.
pub trait SizeUnit: Copy + Ord + Debug + Send + Sync + 'static {
    /// The additive identity.
    const ZERO: Self;

    /// `self + rhs`, or `None` on overflow.
    fn checked_add(self, rhs: Self) -> Option<Self>;

    /// `self - rhs`, or `None` when `rhs > self`.
    fn checked_sub(self, rhs: Self) -> Option<Self>;

    /// `self - rhs` clamped at zero.
    fn saturating_sub(self, rhs: Self) -> Self {
        self.checked_sub(rhs).unwrap_or(Self::ZERO)
    }
}

macro_rules! impl_size_unit_for_int {
    ($($t:ty),*) => {
        $(
            impl SizeUnit for $t {
                const ZERO: Self = 0;

                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_add(self, rhs)
                }

                fn checked_sub(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_sub(self, rhs)
                }
            }
        )*
    };
}

impl_size_unit_for_int!(u64, usize);

impl SizeUnit for ByteSize {
    const ZERO: Self = Self::ZERO;

    fn checked_add(self, rhs: Self) -> Option<Self> {
        ByteSize::checked_add(self, rhs)
    }

    fn checked_sub(self, rhs: Self) -> Option<Self> {
        ByteSize::checked_sub(self, rhs)
    }
}
