//! Envelope decoding.
//!
//! The first byte decides the shape: anything other than an ext marker is plain MessagePack and
//! goes straight to the deserializer. A framed envelope has its header checked, its payload
//! decompressed into a buffer of exactly the recorded original length, and the result
//! deserialized.

use crate::{
    compress,
    error::{Error, Result},
    header::Header,
    layout::StructLayout,
    marker::{ExtType, Marker},
    DEFAULT_MAX_SIZE,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::borrow::Cow;
use tracing::trace;

/// Check if `buf` starts with an envelope marker, and so should be treated as framed.
pub fn is_framed(buf: &[u8]) -> bool {
    buf.first().and_then(|b| Marker::from_u8(*b)).is_some()
}

/// What an envelope holds, as read from its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeInfo {
    /// Plain serialized data of the given length.
    Raw { len: usize },
    /// Compressed data with a header.
    Framed {
        marker: Marker,
        ext_type: ExtType,
        orig_len: usize,
        compressed_len: usize,
    },
}

/// Settings for reading envelopes.
///
/// A decoder accepts framed envelopes from a single compression engine, LZ4 unless told
/// otherwise. Envelopes tagged for any other engine fail with [`Error::BadFormat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Decoder {
    engine: ExtType,
    layout: StructLayout,
    max_size: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            engine: ExtType::default(),
            layout: StructLayout::default(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl Decoder {
    /// Create a decoder for LZ4 envelopes, expecting structs laid out as maps, with the default
    /// maximum size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override which compression engine framed envelopes are expected to use.
    pub fn engine(mut self, engine: ExtType) -> Self {
        self.engine = engine;
        self
    }

    /// Override how structs are expected to be laid out.
    pub fn layout(mut self, layout: StructLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Override the largest original length a framed envelope may claim.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Get the compression engine framed envelopes must use.
    pub fn engine_setting(&self) -> ExtType {
        self.engine
    }

    /// Get the expected struct layout.
    pub fn struct_layout(&self) -> StructLayout {
        self.layout
    }

    /// Get the largest original length a framed envelope may claim.
    pub fn max_size_setting(&self) -> usize {
        self.max_size
    }

    /// Decode an envelope and deserialize the value inside.
    pub fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T> {
        let raw = self.unframe(buf)?;
        self.layout.from_slice(&raw)
    }

    /// Recover the serialized data from an envelope without deserializing it. Raw envelopes are
    /// borrowed as-is.
    pub fn unframe<'a>(&self, buf: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        if !is_framed(buf) {
            trace!(len = buf.len(), "raw envelope");
            return Ok(Cow::Borrowed(buf));
        }
        let mut data = buf;
        let header = Header::decode(&mut data, self.engine)?;
        let orig_len = header.orig_len as usize;
        if orig_len > self.max_size {
            return Err(Error::LengthTooLong {
                max: self.max_size,
                actual: orig_len,
            });
        }
        trace!(
            marker = ?header.marker,
            ext_type = ?header.ext_type,
            orig_len,
            compressed_len = data.len(),
            "framed envelope"
        );
        let raw = compress::decompress(header.ext_type, data, orig_len)?;
        Ok(Cow::Owned(raw))
    }

    /// Read an envelope's header without decompressing anything.
    pub fn inspect(&self, buf: &[u8]) -> Result<EnvelopeInfo> {
        if !is_framed(buf) {
            return Ok(EnvelopeInfo::Raw { len: buf.len() });
        }
        let header = Header::decode(&mut &buf[..], self.engine)?;
        Ok(EnvelopeInfo::Framed {
            marker: header.marker,
            ext_type: header.ext_type,
            orig_len: header.orig_len as usize,
            compressed_len: header.compressed_len(),
        })
    }
}
