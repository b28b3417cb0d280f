//! Envelope encoding.
//!
//! An [`Encoder`] serializes a value to MessagePack, then tries to compress it. The compressed
//! form is only kept if it, along with its header, is strictly smaller than the plain
//! serialized data. Otherwise the plain data is returned as-is.

use crate::{
    compress::Compress,
    error::{Error, Result},
    header::Header,
    layout::StructLayout,
    marker::{Marker, MAX_HEADER_SIZE},
    DEFAULT_MAX_SIZE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Settings for producing envelopes.
///
/// Payloads larger than the encoder's maximum size are never compressed. Keeping this at or
/// below the [`Decoder`][crate::Decoder]'s maximum size means every envelope written can be
/// read back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Encoder {
    compress: Compress,
    layout: StructLayout,
    max_size: usize,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            compress: Compress::default(),
            layout: StructLayout::default(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl Encoder {
    /// Create an encoder with LZ4 compression, structs laid out as maps, and the default maximum
    /// size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the compression setting.
    pub fn compression(mut self, setting: Compress) -> Self {
        self.compress = setting;
        self
    }

    /// Override how structs are laid out.
    pub fn layout(mut self, layout: StructLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Override the largest payload that will be compressed. Anything bigger is left raw.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Get the compression setting.
    pub fn compression_setting(&self) -> Compress {
        self.compress
    }

    /// Get the struct layout.
    pub fn struct_layout(&self) -> StructLayout {
        self.layout
    }

    /// Get the largest payload that will be compressed.
    pub fn max_size_setting(&self) -> usize {
        self.max_size
    }

    /// Serialize `value` and wrap it in an envelope. Only fails if serialization does.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let raw = self.layout.to_vec(value)?;
        self.frame(raw)
    }

    /// Wrap already-serialized data in an envelope.
    ///
    /// Fails if the data would be left uncompressed but starts with an envelope marker byte,
    /// since a decoder would mistake it for a framed envelope.
    pub fn frame(&self, raw: Vec<u8>) -> Result<Vec<u8>> {
        if let Some(framed) = self.try_frame(&raw) {
            return Ok(framed);
        }
        if let Some(&first) = raw.first() {
            if Marker::from_u8(first).is_some() {
                return Err(Error::AmbiguousPayload(first));
            }
        }
        Ok(raw)
    }

    /// Attempt to compress and frame `raw`. `None` means the raw data should be used instead.
    fn try_frame(&self, raw: &[u8]) -> Option<Vec<u8>> {
        let ext_type = self.compress.ext_type()?;
        if raw.len() > self.max_size {
            trace!(
                raw_len = raw.len(),
                max_size = self.max_size,
                "payload over maximum size, leaving raw"
            );
            return None;
        }

        // Compress after a block reserved for the largest header. The real header is written at
        // the end of that block, so it directly precedes the compressed data.
        let mut buf = vec![0u8; MAX_HEADER_SIZE + self.compress.bound(raw.len())];
        let compressed_len = match self.compress.compress(raw, &mut buf[MAX_HEADER_SIZE..]) {
            Ok(0) => {
                trace!(raw_len = raw.len(), "compressor produced no output, leaving raw");
                return None;
            }
            Ok(len) => len,
            Err(err) => {
                debug!(error = %err, raw_len = raw.len(), "compression failed, leaving raw");
                return None;
            }
        };

        let header = match Header::new(ext_type, compressed_len, raw.len()) {
            Ok(header) => header,
            Err(err) => {
                debug!(error = %err, raw_len = raw.len(), "can't frame payload, leaving raw");
                return None;
            }
        };

        if header.envelope_size() >= raw.len() {
            trace!(
                raw_len = raw.len(),
                framed_len = header.envelope_size(),
                "compression didn't shrink payload, leaving raw"
            );
            return None;
        }

        let start = MAX_HEADER_SIZE - header.size();
        header.encode(&mut buf[start..MAX_HEADER_SIZE]);
        // Copy out the envelope so the spare compression bound isn't kept alive
        let framed = buf[start..MAX_HEADER_SIZE + compressed_len].to_vec();
        trace!(
            raw_len = raw.len(),
            framed_len = framed.len(),
            marker = ?header.marker,
            ext_type = ?header.ext_type,
            "framed payload"
        );
        Some(framed)
    }
}
