//! Envelope header encoding & decoding.
//!
//! A framed envelope is a MessagePack ext value:
//!
//! ```text
//! [marker][length: 1, 2 or 4 bytes][ext type][0xd2][original length: 4 bytes][compressed...]
//! ```
//!
//! All integers are big-endian. `length` counts everything after the ext type byte, as
//! MessagePack ext lengths do.

use crate::error::{Error, Result};
use crate::marker::{ExtType, Marker, FORMAT_TAG, ORIG_LEN_SIZE};
use byteorder::{BigEndian, ByteOrder};

/// Bytes after the ext type that aren't compressed data: the format tag and original length.
pub(crate) const FIXED_DATA_LEN: usize = 1 + ORIG_LEN_SIZE;

/// A parsed (or about to be written) envelope header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub marker: Marker,
    /// Length of the ext data: format tag, original length, and compressed bytes.
    pub len: u32,
    pub ext_type: ExtType,
    pub orig_len: u32,
}

impl Header {
    /// Build the header for `compressed_len` bytes of compressed data that expand to `orig_len`
    /// bytes. Fails if either length can't be represented.
    pub fn new(ext_type: ExtType, compressed_len: usize, orig_len: usize) -> Result<Self> {
        let len = compressed_len.saturating_add(FIXED_DATA_LEN);
        let marker = Marker::for_len(len)?;
        let orig_len = u32::try_from(orig_len).map_err(|_| Error::CapacityExceeded {
            max: u32::MAX as u64,
            actual: orig_len as u64,
        })?;
        Ok(Self {
            marker,
            len: len as u32,
            ext_type,
            orig_len,
        })
    }

    /// Total encoded size of this header.
    pub fn size(&self) -> usize {
        self.marker.header_width() + 1 + FIXED_DATA_LEN
    }

    /// Total size of the envelope this header opens.
    pub fn envelope_size(&self) -> usize {
        self.marker.header_width() + 1 + self.len as usize
    }

    /// Length of the compressed data following the header.
    pub fn compressed_len(&self) -> usize {
        self.len as usize - FIXED_DATA_LEN
    }

    /// Write the header into `buf`, which must be exactly [`size`][Self::size] bytes long.
    pub fn encode(&self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len(), self.size());
        let mut w = HeaderWriter::new(buf);
        w.marker(self.marker);
        w.length(self.marker, self.len);
        w.ext_type(self.ext_type);
        w.format_tag();
        w.orig_len(self.orig_len);
        debug_assert_eq!(w.pos, w.buf.len());
    }

    /// Read a header from the front of `buf`, advancing it to the compressed data. The ext type
    /// must be `expected`, and the remaining slice is checked against the declared length.
    pub fn decode(buf: &mut &[u8], expected: ExtType) -> Result<Self> {
        let mut r = HeaderReader { buf: *buf };
        let marker = r.marker()?;
        let len = r.length(marker)?;
        let ext_type = r.ext_type(expected)?;
        r.format_tag()?;
        let orig_len = r.orig_len()?;

        let len_usize = len as usize;
        if len_usize < FIXED_DATA_LEN {
            return Err(Error::BadHeader(format!(
                "container length {} is smaller than the fixed {} bytes",
                len, FIXED_DATA_LEN
            )));
        }
        let data_len = len_usize - FIXED_DATA_LEN;
        if r.buf.len() < data_len {
            return Err(Error::LengthTooShort {
                step: "get compressed data",
                actual: r.buf.len(),
                expected: data_len,
            });
        }
        if r.buf.len() > data_len {
            return Err(Error::BadHeader(format!(
                "{} trailing bytes after compressed data",
                r.buf.len() - data_len
            )));
        }

        *buf = r.buf;
        Ok(Self {
            marker,
            len,
            ext_type,
            orig_len,
        })
    }
}

struct HeaderWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> HeaderWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn next(&mut self, n: usize) -> &mut [u8] {
        let start = self.pos;
        self.pos += n;
        &mut self.buf[start..self.pos]
    }

    fn marker(&mut self, marker: Marker) {
        self.next(1)[0] = marker.into();
    }

    fn length(&mut self, marker: Marker, len: u32) {
        let field = self.next(marker.len_width());
        match marker {
            Marker::Ext8 => field[0] = len as u8,
            Marker::Ext16 => BigEndian::write_u16(field, len as u16),
            Marker::Ext32 => BigEndian::write_u32(field, len),
        }
    }

    fn ext_type(&mut self, ext_type: ExtType) {
        self.next(1)[0] = ext_type.into();
    }

    fn format_tag(&mut self) {
        self.next(1)[0] = FORMAT_TAG;
    }

    fn orig_len(&mut self, orig_len: u32) {
        BigEndian::write_u32(self.next(ORIG_LEN_SIZE), orig_len);
    }
}

struct HeaderReader<'a> {
    buf: &'a [u8],
}

impl<'a> HeaderReader<'a> {
    fn take(&mut self, n: usize, step: &'static str) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(Error::LengthTooShort {
                step,
                actual: self.buf.len(),
                expected: n,
            });
        }
        let (field, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(field)
    }

    fn byte(&mut self, step: &'static str) -> Result<u8> {
        Ok(self.take(1, step)?[0])
    }

    fn marker(&mut self) -> Result<Marker> {
        let step = "read marker";
        let byte = self.byte(step)?;
        Marker::from_u8(byte).ok_or(Error::BadFormat { step, byte })
    }

    fn length(&mut self, marker: Marker) -> Result<u32> {
        let field = self.take(marker.len_width(), "read container length")?;
        Ok(match marker {
            Marker::Ext8 => field[0] as u32,
            Marker::Ext16 => BigEndian::read_u16(field) as u32,
            Marker::Ext32 => BigEndian::read_u32(field),
        })
    }

    fn ext_type(&mut self, expected: ExtType) -> Result<ExtType> {
        let step = "read ext type";
        let byte = self.byte(step)?;
        if byte != expected.into_u8() {
            return Err(Error::BadFormat { step, byte });
        }
        Ok(expected)
    }

    fn format_tag(&mut self) -> Result<()> {
        let step = "read format tag";
        let byte = self.byte(step)?;
        if byte != FORMAT_TAG {
            return Err(Error::BadFormat { step, byte });
        }
        Ok(())
    }

    fn orig_len(&mut self) -> Result<u32> {
        let field = self.take(ORIG_LEN_SIZE, "read original length")?;
        Ok(BigEndian::read_u32(field))
    }
}
