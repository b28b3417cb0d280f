//! packwrap wraps MessagePack data in a small self-describing envelope, compressing it when that
//! makes it smaller. A decoder can always tell whether compression was applied just by looking
//! at the first byte, so no out-of-band flag is needed.
//!
//! An envelope is one of two shapes:
//!
//! - Raw: plain MessagePack, exactly as the serializer produced it.
//! - Framed: a MessagePack ext value holding the compressed data:
//!
//! ```text
//! [0xc7|0xc8|0xc9][length: 1, 2 or 4 bytes][ext type][0xd2][original length: 4 bytes][compressed]
//! ```
//!
//! The marker byte picks the width of the length field, which counts every byte after the ext
//! type. The ext type names the compression engine (99 for LZ4, 100 for zstd), and the original
//! length lets the payload be decompressed into an exactly-sized buffer. All integers are
//! big-endian.
//!
//! Encoding only produces a framed envelope if it is strictly smaller than the raw data.
//! Otherwise the raw data is returned untouched. Ordinary MessagePack values never start with
//! an ext marker, so the two shapes can't be confused.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Post {
//!     id: u64,
//!     tags: Vec<String>,
//! }
//!
//! let post = Post { id: 7, tags: vec!["envelope".to_string(); 20] };
//! let enc = packwrap::to_vec(&post).unwrap();
//! assert!(enc.len() < rmp_serde::to_vec_named(&post).unwrap().len());
//! let dec: Post = packwrap::from_slice(&enc).unwrap();
//! assert_eq!(dec, post);
//! ```
//!
//! Structs can be laid out as maps ([`to_vec`]) or as arrays ([`to_vec_array`]); the envelope
//! is the same either way. For other settings, like picking zstd instead of LZ4, use an
//! [`Encoder`] and [`Decoder`] directly. A decoder only accepts envelopes from the engine it is
//! set up for, so both sides must agree on it.

mod compress;
mod decode;
mod encode;
mod error;
mod header;
mod layout;
mod marker;

pub use compress::{Compress, CompressionError, ZSTD_DEFAULT_LEVEL};
pub use decode::{is_framed, Decoder, EnvelopeInfo};
pub use encode::Encoder;
pub use error::{Error, Result};
pub use layout::StructLayout;
pub use marker::{ExtType, Marker, FORMAT_TAG, MAX_HEADER_SIZE};

use serde::{de::DeserializeOwned, Serialize};

/// The default size limit for both sides: 256 MiB. A [`Decoder`] rejects framed envelopes
/// claiming a bigger original length before allocating anything, and an [`Encoder`] leaves
/// bigger payloads raw, so the defaults always round-trip.
pub const DEFAULT_MAX_SIZE: usize = 1usize << 28;

/// Serialize `value` with structs as maps, compressing it with LZ4 if that helps.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Encoder::new().encode(value)
}

/// Serialize `value` with structs as arrays, compressing it with LZ4 if that helps.
pub fn to_vec_array<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Encoder::new().layout(StructLayout::Array).encode(value)
}

/// Decode an envelope produced by [`to_vec`], or any plain MessagePack data.
pub fn from_slice<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
    Decoder::new().decode(buf)
}

/// Decode an envelope produced by [`to_vec_array`], or any plain MessagePack data.
pub fn from_slice_array<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
    Decoder::new().layout(StructLayout::Array).decode(buf)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use serde::Deserialize;
    use serde_bytes::ByteBuf;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Data {
        a: i64,
        b: f32,
        c: Vec<String>,
    }

    fn data() -> Data {
        Data {
            a: 4578234323,
            b: 1.46437485,
            c: vec!["Hello World".to_string(); 5],
        }
    }

    #[test]
    fn record_map() {
        let data = data();
        let plain = rmp_serde::to_vec_named(&data).unwrap();
        let enc = to_vec(&data).unwrap();
        assert!(is_framed(&enc));
        assert!(enc.len() < plain.len(), "{} >= {}", enc.len(), plain.len());
        let dec: Data = from_slice(&enc).unwrap();
        assert_eq!(dec, data);
    }

    #[test]
    fn record_array() {
        let data = data();
        let plain = rmp_serde::to_vec(&data).unwrap();
        let enc = to_vec_array(&data).unwrap();
        assert!(is_framed(&enc));
        assert!(enc.len() < plain.len(), "{} >= {}", enc.len(), plain.len());
        let dec: Data = from_slice_array(&enc).unwrap();
        assert_eq!(dec, data);
    }

    #[test]
    fn plain_msgpack_decodes() {
        let data = data();
        let dec: Data = from_slice(&rmp_serde::to_vec_named(&data).unwrap()).unwrap();
        assert_eq!(dec, data);
        let dec: Data = from_slice_array(&rmp_serde::to_vec(&data).unwrap()).unwrap();
        assert_eq!(dec, data);
    }

    #[test]
    fn random_bytes_left_raw() {
        let mut rng = StdRng::seed_from_u64(3);
        for len in [16usize, 300, 5000, 70000] {
            let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let value = ByteBuf::from(bytes);
            let plain = rmp_serde::to_vec(&value).unwrap();
            let enc = to_vec(&value).unwrap();
            assert_eq!(enc.len(), plain.len());
            assert_eq!(enc, plain);
            assert!(!is_framed(&enc));
            let dec: ByteBuf = from_slice(&enc).unwrap();
            assert_eq!(dec, value);
        }
    }

    #[test]
    fn many_records() {
        let mut rng = StdRng::seed_from_u64(4);
        for i in 0..200 {
            let repeats = rng.gen_range(0..50);
            let data = Data {
                a: rng.gen(),
                b: rng.gen(),
                c: (0..repeats)
                    .map(|j| format!("item {}", (i + j) % 7))
                    .collect(),
            };
            for compress in [Compress::None, Compress::Lz4, Compress::new_zstd(3)] {
                for layout in [StructLayout::Map, StructLayout::Array] {
                    let enc = Encoder::new()
                        .compression(compress)
                        .layout(layout)
                        .encode(&data)
                        .unwrap();
                    let plain = layout.to_vec(&data).unwrap();
                    assert!(enc.len() <= plain.len());
                    let dec: Data = Decoder::new()
                        .engine(compress.ext_type().unwrap_or_default())
                        .layout(layout)
                        .decode(&enc)
                        .unwrap();
                    assert_eq!(dec, data);
                }
            }
        }
    }

    #[test]
    fn zstd_record() {
        let data = Data {
            c: vec!["Hello World".to_string(); 50],
            ..data()
        };
        let enc = Encoder::new()
            .compression(Compress::new_zstd(ZSTD_DEFAULT_LEVEL))
            .encode(&data)
            .unwrap();
        assert_eq!(enc[0], Marker::Ext8.into_u8());
        assert_eq!(enc[2], ExtType::Zstd.into_u8());
        let dec: Data = Decoder::new().engine(ExtType::Zstd).decode(&enc).unwrap();
        assert_eq!(dec, data);
        assert!(matches!(from_slice::<Data>(&enc), Err(Error::BadFormat { .. })));
    }

    #[test]
    fn threads() {
        let handles: Vec<_> = (0..4)
            .map(|t| {
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let data = Data {
                            a: t * 1000 + i,
                            ..data()
                        };
                        let enc = Encoder::new()
                            .compression(Compress::new_zstd(1))
                            .encode(&data)
                            .unwrap();
                        let dec: Data =
                            Decoder::new().engine(ExtType::Zstd).decode(&enc).unwrap();
                        assert_eq!(dec, data);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
