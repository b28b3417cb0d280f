use crate::compress::CompressionError;
use std::fmt;

use serde::{de, ser};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// Occurs when the container length doesn't fit in the widest (32-bit) length field.
    CapacityExceeded { max: u64, actual: u64 },
    /// Occurs when a framed envelope has an unexpected byte where a fixed tag was expected.
    BadFormat { step: &'static str, byte: u8 },
    /// Occurs when the header's declared lengths disagree with the bytes present.
    BadHeader(String),
    /// Envelope ended too early.
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Declared original length was greater than the maximum allowed size on decode
    LengthTooLong { max: usize, actual: usize },
    /// Serialized payload would start with an envelope marker byte if left uncompressed, and so
    /// couldn't be told apart from a framed envelope.
    AmbiguousPayload(u8),
    /// Occurs when the compression engine fails to decompress a framed envelope.
    FailDecompress(CompressionError),
    /// Occurs when serde serialization or deserialization fails
    SerdeFail(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::CapacityExceeded { max, actual } => write!(
                f,
                "Container too large: length is {} bytes, maximum encodable is {}",
                actual, max
            ),
            Error::BadFormat { step, byte } => {
                write!(f, "Unexpected byte 0x{:02x} on step [{}]", byte, step)
            }
            Error::BadHeader(ref err) => write!(f, "Envelope has bad header: {}", err),
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected data length {}, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::LengthTooLong { max, actual } => write!(
                f,
                "Data too long: was {} bytes, maximum allowed is {}",
                actual, max
            ),
            Error::AmbiguousPayload(byte) => write!(
                f,
                "Serialized payload starts with reserved marker byte 0x{:02x}",
                byte
            ),
            Error::FailDecompress(ref err) => write!(f, "Failed decompression step: {}", err),
            Error::SerdeFail(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::FailDecompress(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<CompressionError> for Error {
    fn from(e: CompressionError) -> Self {
        Self::FailDecompress(e)
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::SerdeFail(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Self::SerdeFail(e.to_string())
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}
