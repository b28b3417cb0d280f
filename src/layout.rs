//! MessagePack serialization strategy.
//!
//! Structs can be written either as maps keyed by field name or as arrays of field values. The
//! array form is smaller but depends on field order, so both sides must agree on it. The envelope
//! format is the same for both.

use crate::error::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// How structs are laid out when serialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructLayout {
    /// Structs are maps of field name to value.
    #[default]
    Map,
    /// Structs are arrays of values, in declaration order.
    Array,
}

impl StructLayout {
    /// Serialize `value` to raw MessagePack.
    pub fn to_vec<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let raw = match self {
            StructLayout::Map => rmp_serde::to_vec_named(value)?,
            StructLayout::Array => rmp_serde::to_vec(value)?,
        };
        Ok(raw)
    }

    /// Deserialize raw MessagePack.
    ///
    /// The deserializer reads structs from either layout, so this only fails if the data isn't
    /// valid for `T`.
    pub fn from_slice<T: DeserializeOwned>(&self, raw: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(raw)?)
    }
}
