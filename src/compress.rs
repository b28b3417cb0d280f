use crate::marker::ExtType;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, fmt};

thread_local! {
    static ZSTD_CCTX: RefCell<zstd_safe::CCtx<'static>> = RefCell::new(zstd_safe::CCtx::create());
    static ZSTD_DCTX: RefCell<zstd_safe::DCtx<'static>> = RefCell::new(zstd_safe::DCtx::create());
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    /// Decompressed output wasn't the length promised by the envelope header.
    SizeMismatch { expected: usize, actual: usize },
    Lz4(String),
    ZstdInner(usize),
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::SizeMismatch { expected, actual } => write!(
                f,
                "Decompressed size is {} bytes, but header promised {}",
                actual, expected
            ),
            CompressionError::Lz4(e) => write!(f, "lz4 failure: {}", e),
            CompressionError::ZstdInner(v) => {
                write!(f, "zstd failure, code {} ({})", v, zstd_safe::get_error_name(*v))
            }
        }
    }
}

impl std::error::Error for CompressionError {}

impl From<zstd_safe::ErrorCode> for CompressionError {
    fn from(value: zstd_safe::ErrorCode) -> Self {
        CompressionError::ZstdInner(value)
    }
}

/// Default zstd compression level.
pub const ZSTD_DEFAULT_LEVEL: i32 = 3;

/// Compression engine used when encoding.
///
/// Decoding doesn't need this: the engine is recorded in each envelope's ext type, so envelopes
/// from any engine can always be read back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Compress {
    /// Never compress. Every envelope is left as the raw serialized data.
    None,
    /// LZ4 block compression.
    Lz4,
    /// A single zstd frame at the given compression level.
    Zstd {
        /// The compression level
        level: i32,
    },
}

impl Compress {
    /// Create a new zstd setting with the given level.
    pub fn new_zstd(level: i32) -> Self {
        Compress::Zstd { level }
    }

    /// The ext type that envelopes made with this setting are tagged with.
    pub fn ext_type(&self) -> Option<ExtType> {
        match self {
            Compress::None => None,
            Compress::Lz4 => Some(ExtType::Lz4),
            Compress::Zstd { .. } => Some(ExtType::Zstd),
        }
    }

    /// Worst-case compressed size for `len` input bytes.
    pub(crate) fn bound(&self, len: usize) -> usize {
        match self {
            Compress::None => 0,
            Compress::Lz4 => lz4_flex::block::get_maximum_output_size(len),
            Compress::Zstd { .. } => zstd_safe::compress_bound(len),
        }
    }

    /// Compress `src` into `dst`, which must be at least [`bound`][Self::bound] bytes long.
    /// Returns the number of bytes written; zero means nothing was compressed.
    pub(crate) fn compress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CompressionError> {
        match self {
            Compress::None => Ok(0),
            Compress::Lz4 => lz4_flex::block::compress_into(src, dst)
                .map_err(|e| CompressionError::Lz4(e.to_string())),
            Compress::Zstd { level } => zstd_compress(src, dst, *level),
        }
    }
}

impl std::default::Default for Compress {
    fn default() -> Self {
        Compress::Lz4
    }
}

/// Decompress `src` with the engine named by `ext_type`. The result must be exactly `orig_len`
/// bytes long.
pub(crate) fn decompress(
    ext_type: ExtType,
    src: &[u8],
    orig_len: usize,
) -> Result<Vec<u8>, CompressionError> {
    let mut dst = vec![0u8; orig_len];
    let used_len = match ext_type {
        ExtType::Lz4 => lz4_flex::block::decompress_into(src, &mut dst)
            .map_err(|e| CompressionError::Lz4(e.to_string()))?,
        ExtType::Zstd => zstd_decompress(src, &mut dst)?,
    };
    if used_len != orig_len {
        return Err(CompressionError::SizeMismatch {
            expected: orig_len,
            actual: used_len,
        });
    }
    Ok(dst)
}

fn zstd_compress(input: &[u8], output: &mut [u8], level: i32) -> Result<usize, CompressionError> {
    use zstd_safe::*;
    ZSTD_CCTX.with_borrow_mut(|ctx| {
        // The envelope carries the original length, so the frame needs no magic number,
        // checksum, dictionary id, or content size.
        ctx.reset(ResetDirective::SessionAndParameters)?;
        ctx.set_parameter(CParameter::CompressionLevel(level))?;
        ctx.set_parameter(CParameter::DictIdFlag(false))?;
        ctx.set_parameter(CParameter::ChecksumFlag(false))?;
        ctx.set_parameter(CParameter::Format(FrameFormat::Magicless))?;
        ctx.set_parameter(CParameter::ContentSizeFlag(false))?;
        let used_len = ctx.compress2(output, input)?;
        Ok(used_len)
    })
}

fn zstd_decompress(input: &[u8], output: &mut [u8]) -> Result<usize, CompressionError> {
    use zstd_safe::*;
    ZSTD_DCTX.with_borrow_mut(|dtx| {
        dtx.reset(ResetDirective::SessionAndParameters)?;
        dtx.set_parameter(DParameter::Format(FrameFormat::Magicless))?;
        let used_len = dtx.decompress(output, input)?;
        Ok(used_len)
    })
}
