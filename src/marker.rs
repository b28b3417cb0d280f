use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// MessagePack ext markers that open a framed envelope. The variant picks the width of the
/// big-endian length field that follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// 8-bit length field
    Ext8,
    /// 16-bit length field
    Ext16,
    /// 32-bit length field
    Ext32,
}

impl Marker {
    /// Try to read a byte as a Marker. Returns `None` for any byte that doesn't open an envelope.
    pub fn from_u8(n: u8) -> Option<Marker> {
        match n {
            0xc7 => Some(Marker::Ext8),
            0xc8 => Some(Marker::Ext16),
            0xc9 => Some(Marker::Ext32),
            _ => None,
        }
    }

    /// Return the byte this marker is written as.
    pub fn into_u8(self) -> u8 {
        match self {
            Marker::Ext8 => 0xc7,
            Marker::Ext16 => 0xc8,
            Marker::Ext32 => 0xc9,
        }
    }

    /// Pick the smallest marker whose length field can hold `len`. Fails if `len` doesn't fit in
    /// 32 bits.
    pub fn for_len(len: usize) -> Result<Marker> {
        if len <= u8::MAX as usize {
            Ok(Marker::Ext8)
        } else if len <= u16::MAX as usize {
            Ok(Marker::Ext16)
        } else if len <= u32::MAX as usize {
            Ok(Marker::Ext32)
        } else {
            Err(Error::CapacityExceeded {
                max: u32::MAX as u64,
                actual: len as u64,
            })
        }
    }

    /// Width of the length field, in bytes.
    pub fn len_width(self) -> usize {
        match self {
            Marker::Ext8 => 1,
            Marker::Ext16 => 2,
            Marker::Ext32 => 4,
        }
    }

    /// Bytes taken up by the marker and its length field together.
    pub fn header_width(self) -> usize {
        1 + self.len_width()
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}

/// Extension types used to tag a compressed container. Each compression engine gets its own tag,
/// and a decoder only accepts the tag of the engine it is set up for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtType {
    #[default]
    Lz4,
    Zstd,
}

impl ExtType {
    /// Return the assigned extension type.
    pub fn into_u8(self) -> u8 {
        match self {
            ExtType::Lz4 => 99,
            ExtType::Zstd => 100,
        }
    }

    /// Convert from assigned extension type. Returns `None` if type isn't recognized.
    pub fn from_u8(v: u8) -> Option<ExtType> {
        match v {
            99 => Some(ExtType::Lz4),
            100 => Some(ExtType::Zstd),
            _ => None,
        }
    }
}

impl From<ExtType> for u8 {
    fn from(val: ExtType) -> u8 {
        val.into_u8()
    }
}

/// Tag preceding the original length. This is the MessagePack int32 marker, so the ext data reads
/// as a 4-byte integer followed by the compressed bytes.
pub const FORMAT_TAG: u8 = 0xd2;

/// Size of the original-length field.
pub const ORIG_LEN_SIZE: usize = 4;

/// Largest possible header: marker, 32-bit length, ext type, format tag, original length.
pub const MAX_HEADER_SIZE: usize = 1 + 4 + 1 + 1 + ORIG_LEN_SIZE;
