//! Byte-order-aware reader over any seekable byte source.
//!
//! [`ByteReader`] is the capability the decode engine and user callbacks work against.
//! [`Reader`] implements it over any `Read + Seek` source. Views created with
//! [`ByteReader::with_order`] share the source and its position; only the byte order differs.

use std::cell::RefCell;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use log::debug;

use crate::errors::ReadError;

/// Byte order used for multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    Little,
    #[default]
    Big,
}

/// Primitive reads over a seekable byte stream.
///
/// Only [`order`](ByteReader::order), [`with_order`](ByteReader::with_order) and
/// [`read_bytes`](ByteReader::read_bytes) carry state; every typed read is built on top of them.
pub trait ByteReader: Read + Seek {
    fn order(&self) -> ByteOrder;

    /// A view of the same source and position that reads with `order`.
    fn with_order(&self, order: ByteOrder) -> Box<dyn ByteReader + '_>;

    /// Reads exactly `n` bytes.
    ///
    /// Returns [`ReadError::Eof`] when no byte was available and
    /// [`ReadError::UnexpectedEof`] when the input ended part way.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        read_full(self, n)
    }

    /// Reads until the end of the input.
    fn read_all(&mut self) -> Result<Vec<u8>, ReadError> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Returns the next `n` bytes without moving the position, even when the read fails.
    fn peek(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        let start = self.stream_position()?;
        let result = self.read_bytes(n);
        self.seek(SeekFrom::Start(start)).map_err(ReadError::Seek)?;
        result
    }

    fn position(&mut self) -> Result<u64, ReadError> {
        Ok(self.stream_position()?)
    }

    fn read_byte(&mut self) -> Result<u8, ReadError> {
        self.read_u8()
    }

    /// One byte, any nonzero value is `true`.
    fn read_bool(&mut self) -> Result<bool, ReadError> {
        Ok(self.read_u8()? != 0)
    }

    fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, ReadError> {
        Ok(self.read_uint_x(2)? as u16)
    }

    fn read_u32(&mut self) -> Result<u32, ReadError> {
        Ok(self.read_uint_x(4)? as u32)
    }

    fn read_u64(&mut self) -> Result<u64, ReadError> {
        self.read_uint_x(8)
    }

    /// Reads an unsigned integer `width` bytes wide (1..=8).
    fn read_uint_x(&mut self, width: usize) -> Result<u64, ReadError> {
        check_width(width)?;
        let buf = self.read_bytes(width)?;

        Ok(match self.order() {
            ByteOrder::Big => BigEndian::read_uint(&buf, width),
            ByteOrder::Little => LittleEndian::read_uint(&buf, width),
        })
    }

    fn read_i8(&mut self) -> Result<i8, ReadError> {
        Ok(self.read_u8()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16, ReadError> {
        Ok(self.read_u16()? as i16)
    }

    fn read_i32(&mut self) -> Result<i32, ReadError> {
        Ok(self.read_u32()? as i32)
    }

    fn read_i64(&mut self) -> Result<i64, ReadError> {
        Ok(self.read_u64()? as i64)
    }

    /// Reads a two's complement integer `width` bytes wide (1..=8), sign-extended to 64 bits.
    fn read_int_x(&mut self, width: usize) -> Result<i64, ReadError> {
        check_width(width)?;
        let buf = self.read_bytes(width)?;

        Ok(match self.order() {
            ByteOrder::Big => BigEndian::read_int(&buf, width),
            ByteOrder::Little => LittleEndian::read_int(&buf, width),
        })
    }

    fn read_f32(&mut self) -> Result<f32, ReadError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    fn read_f64(&mut self) -> Result<f64, ReadError> {
        Ok(f64::from_bits(self.read_u64()?))
    }
}

fn check_width(width: usize) -> Result<(), ReadError> {
    if (1..=8).contains(&width) {
        Ok(())
    } else {
        Err(ReadError::InvalidWidth(width as i64))
    }
}

/// Fills a buffer of `n` bytes, telling a clean end of input apart from a short one.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, n: usize) -> Result<Vec<u8>, ReadError> {
    // `n` may come straight from the input: only grow with what was actually read.
    let mut buf = Vec::new();
    Read::take(&mut *reader, n as u64).read_to_end(&mut buf)?;

    match buf.len() {
        got if got == n => Ok(buf),
        0 => Err(ReadError::Eof),
        got => Err(ReadError::UnexpectedEof { wanted: n, got }),
    }
}

/// [`ByteReader`] over any `Read + Seek` source.
///
/// Cloning the reader (or calling [`ByteReader::with_order`]) yields another handle on the same
/// source: reads through either handle move the shared position.
pub struct Reader<S> {
    source: Rc<RefCell<S>>,
    order: ByteOrder,
    debug: bool,
}

impl<S> Clone for Reader<S> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            order: self.order,
            debug: self.debug,
        }
    }
}

impl<S: Read + Seek> Reader<S> {
    pub fn new(source: S, order: ByteOrder) -> Self {
        Self {
            source: Rc::new(RefCell::new(source)),
            order,
            debug: false,
        }
    }

    /// When enabled, every read and seek is logged at `debug` level with its offset and a hex dump.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

impl<'a> Reader<Cursor<&'a [u8]>> {
    pub fn from_bytes(data: &'a [u8], order: ByteOrder) -> Self {
        Self::new(Cursor::new(data), order)
    }
}

impl<S: Read> Read for Reader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.source.borrow_mut().read(buf)
    }
}

impl<S: Seek> Seek for Reader<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let result = self.source.borrow_mut().seek(pos);

        if self.debug {
            match &result {
                Ok(at) => debug!("seek({pos:?}) -> position {at}"),
                Err(err) => debug!("seek({pos:?}) failed: {err}"),
            }
        }

        result
    }
}

impl<S: Read + Seek> ByteReader for Reader<S> {
    fn order(&self) -> ByteOrder {
        self.order
    }

    fn with_order(&self, order: ByteOrder) -> Box<dyn ByteReader + '_> {
        Box::new(Reader {
            source: Rc::clone(&self.source),
            order,
            debug: self.debug,
        })
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        if !self.debug {
            return read_full(self, n);
        }

        let at = self.source.borrow_mut().stream_position()?;
        let result = read_full(self, n);
        match &result {
            Ok(bytes) => debug!("read {n} bytes at {at:#x}: {}", hex::encode(bytes)),
            Err(err) => debug!("read {n} bytes at {at:#x} failed: {err}"),
        }

        result
    }
}
