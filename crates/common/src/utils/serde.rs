//! Serialization utilities for common data types
//!
//! Reusable serde `with` modules for fields that should be written in a
//! human-friendly form while still accepting the compact one.

use serde::{Deserialize, Deserializer, Serializer};

use crate::units::ByteSize;

/// Custom serialization module for [`ByteSize`] as a unit string
///
/// `ByteSize` normally serializes as an integer byte count. Fields tagged
/// with this module are written as `"64MiB"`-style strings when the value is
/// an exact multiple of its display unit, and as the integer otherwise so no
/// precision is lost. Both forms are accepted when reading.
///
/// # Usage
/// ```rust
/// use respool_common::{byte_size_human, ByteSize};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "byte_size_human")]
///     limit: ByteSize,
/// }
/// ```
pub mod byte_size_human {
    use super::*;

    /// Serde serialization result type
    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize a ByteSize as a unit string when exact, else as bytes
    pub fn serialize<S>(size: &ByteSize, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        let text = size.to_string();
        match text.parse::<ByteSize>() {
            Ok(parsed) if parsed == *size => serializer.serialize_str(&text),
            _ => serializer.serialize_u64(size.as_bytes()),
        }
    }

    /// Deserialize a ByteSize from an integer or a unit string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<ByteSize, D::Error>
    where
        D: Deserializer<'de>,
    {
        ByteSize::deserialize(deserializer)
    }
}
