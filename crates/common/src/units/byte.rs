//! Byte quantities with binary (IEC) unit encoding.
//!
//! `ByteSize` serializes as a plain integer number of bytes and accepts
//! either that integer or a human-readable string such as `"0.5KiB"` or
//! `"64MiB"` when deserializing, so config files can use whichever reads
//! better.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// A non-negative number of bytes.
///
/// # Examples
///
/// ```
/// use respool_common::ByteSize;
///
/// let limit: ByteSize = "1.5MiB".parse().unwrap();
/// assert_eq!(limit.as_bytes(), 1_572_864);
/// assert_eq!(limit.to_string(), "1.5MiB");
/// assert_eq!(ByteSize::KIBIBYTE + ByteSize::from_bytes(1), ByteSize::from_bytes(1025));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

/// Binary unit suffixes from largest to smallest.
const UNITS: [(&str, ByteSize); 5] = [
    ("TiB", ByteSize::TEBIBYTE),
    ("GiB", ByteSize::GIBIBYTE),
    ("MiB", ByteSize::MEBIBYTE),
    ("KiB", ByteSize::KIBIBYTE),
    ("B", ByteSize::BYTE),
];

impl ByteSize {
    /// Zero bytes.
    pub const ZERO: Self = Self(0);
    /// One byte.
    pub const BYTE: Self = Self(1);
    /// 1024 bytes.
    pub const KIBIBYTE: Self = Self(1024);
    /// 1024 kibibytes.
    pub const MEBIBYTE: Self = Self(1024 * 1024);
    /// 1024 mebibytes.
    pub const GIBIBYTE: Self = Self(1024 * 1024 * 1024);
    /// 1024 gibibytes.
    pub const TEBIBYTE: Self = Self(1024 * 1024 * 1024 * 1024);

    /// Creates a size from a raw byte count.
    #[must_use]
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Creates a size of `kib` kibibytes, saturating at `u64::MAX` bytes.
    #[must_use]
    pub const fn from_kib(kib: u64) -> Self {
        Self(kib.saturating_mul(Self::KIBIBYTE.0))
    }

    /// Creates a size of `mib` mebibytes, saturating at `u64::MAX` bytes.
    #[must_use]
    pub const fn from_mib(mib: u64) -> Self {
        Self(mib.saturating_mul(Self::MEBIBYTE.0))
    }

    /// Creates a size of `gib` gibibytes, saturating at `u64::MAX` bytes.
    #[must_use]
    pub const fn from_gib(gib: u64) -> Self {
        Self(gib.saturating_mul(Self::GIBIBYTE.0))
    }

    /// Returns the size as an integer number of bytes.
    #[must_use]
    pub const fn as_bytes(self) -> u64 {
        self.0
    }

    /// Returns the size as a floating point number of kibibytes.
    #[must_use]
    pub fn as_kibibytes(self) -> f64 {
        self.0 as f64 / Self::KIBIBYTE.0 as f64
    }

    /// Returns the size as a floating point number of mebibytes.
    #[must_use]
    pub fn as_mebibytes(self) -> f64 {
        self.0 as f64 / Self::MEBIBYTE.0 as f64
    }

    /// Returns the size as a floating point number of gibibytes.
    #[must_use]
    pub fn as_gibibytes(self) -> f64 {
        self.0 as f64 / Self::GIBIBYTE.0 as f64
    }

    /// Returns the size as a floating point number of tebibytes.
    #[must_use]
    pub fn as_tebibytes(self) -> f64 {
        self.0 as f64 / Self::TEBIBYTE.0 as f64
    }

    /// Returns `true` for zero bytes.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self + rhs`, or `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(bytes) => Some(Self(bytes)),
            None => None,
        }
    }

    /// `self - rhs`, or `None` when `rhs` is larger.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(bytes) => Some(Self(bytes)),
            None => None,
        }
    }

    /// `self - rhs` clamped at zero.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl From<ByteSize> for u64 {
    fn from(size: ByteSize) -> Self {
        size.0
    }
}

impl Add for ByteSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for ByteSize {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for ByteSize {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for ByteSize {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<u64> for ByteSize {
    type Output = Self;

    fn mul(self, rhs: u64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Sum for ByteSize {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a ByteSize> for ByteSize {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for ByteSize {
    /// Formats with the largest unit that keeps the value at or above one,
    /// using at most two decimals (`1.5MiB`, `100B`). Use
    /// [`ByteSize::as_bytes`] when an exact value is needed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (suffix, unit) = UNITS
            .iter()
            .copied()
            .find(|(_, unit)| self.0 >= unit.0)
            .unwrap_or(("B", Self::BYTE));

        if unit == Self::BYTE {
            return write!(f, "{}B", self.0);
        }

        let scaled = format!("{:.2}", self.0 as f64 / unit.0 as f64);
        let trimmed = scaled.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{}{}", trimmed, suffix)
    }
}

/// Errors produced when parsing a [`ByteSize`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByteSizeParseError {
    #[error("Byte size is empty")]
    Empty,

    #[error("Invalid byte size number: '{0}'")]
    InvalidNumber(String),

    #[error("Unknown byte size unit: '{0}' (expected B, KiB, MiB, GiB or TiB)")]
    UnknownUnit(String),

    #[error("Byte size out of range: '{0}'")]
    OutOfRange(String),
}

impl ErrorClassification for ByteSizeParseError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        None
    }
}

impl FromStr for ByteSize {
    type Err = ByteSizeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ByteSizeParseError::Empty);
        }

        let split = text.find(|c: char| c != '.' && !c.is_ascii_digit()).unwrap_or(text.len());
        let (number, suffix) = text.split_at(split);
        let suffix = suffix.trim_start();

        let unit = match suffix {
            "" | "B" => Self::BYTE,
            other => UNITS
                .iter()
                .find(|(name, _)| *name == other)
                .map(|(_, unit)| *unit)
                .ok_or_else(|| ByteSizeParseError::UnknownUnit(other.to_string()))?,
        };

        // Integers take the exact path so large byte counts keep every digit.
        if let Ok(whole) = number.parse::<u64>() {
            return whole
                .checked_mul(unit.0)
                .map(Self)
                .ok_or_else(|| ByteSizeParseError::OutOfRange(text.to_string()));
        }

        let value: f64 = number
            .parse()
            .map_err(|_| ByteSizeParseError::InvalidNumber(number.to_string()))?;
        let bytes = value * unit.0 as f64;
        if !bytes.is_finite() || bytes >= u64::MAX as f64 {
            return Err(ByteSizeParseError::OutOfRange(text.to_string()));
        }

        Ok(Self(bytes as u64))
    }
}

impl Serialize for ByteSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ByteSizeVisitor)
    }
}

struct ByteSizeVisitor;

impl<'de> Visitor<'de> for ByteSizeVisitor {
    type Value = ByteSize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte count or a string like \"64MiB\"")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<ByteSize, E> {
        Ok(ByteSize(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<ByteSize, E> {
        u64::try_from(value)
            .map(ByteSize)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ByteSize, E> {
        value.parse().map_err(E::custom)
    }
}
