//! Byte-order-aware writer, the counterpart of [`crate::reader`].
//!
//! Only primitive writes are provided. Encoding whole records is not supported.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use log::debug;

use crate::{errors::WriteError, reader::ByteOrder};

/// Primitive writes to a byte sink.
pub trait ByteWriter: Write {
    fn order(&self) -> ByteOrder;

    /// A view of the same sink that writes with `order`.
    fn with_order(&self, order: ByteOrder) -> Box<dyn ByteWriter + '_>;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        Ok(self.write_all(bytes)?)
    }

    /// One byte, `1` for `true`.
    fn write_bool(&mut self, v: bool) -> Result<(), WriteError> {
        self.write_u8(v as u8)
    }

    fn write_u8(&mut self, v: u8) -> Result<(), WriteError> {
        self.write_bytes(&[v])
    }

    fn write_u16(&mut self, v: u16) -> Result<(), WriteError> {
        self.write_uint_x(2, v as u64)
    }

    fn write_u32(&mut self, v: u32) -> Result<(), WriteError> {
        self.write_uint_x(4, v as u64)
    }

    fn write_u64(&mut self, v: u64) -> Result<(), WriteError> {
        self.write_uint_x(8, v)
    }

    /// Writes `v` as an unsigned integer `width` bytes wide (1..=8).
    fn write_uint_x(&mut self, width: usize, v: u64) -> Result<(), WriteError> {
        check_width(width)?;
        if width < 8 && v >> (width * 8) != 0 {
            return Err(WriteError::ValueTooWide {
                value: v as i128,
                width,
            });
        }

        let mut buf = [0u8; 8];
        match self.order() {
            ByteOrder::Big => BigEndian::write_uint(&mut buf, v, width),
            ByteOrder::Little => LittleEndian::write_uint(&mut buf, v, width),
        }

        self.write_bytes(&buf[..width])
    }

    fn write_i8(&mut self, v: i8) -> Result<(), WriteError> {
        self.write_u8(v as u8)
    }

    fn write_i16(&mut self, v: i16) -> Result<(), WriteError> {
        self.write_int_x(2, v as i64)
    }

    fn write_i32(&mut self, v: i32) -> Result<(), WriteError> {
        self.write_int_x(4, v as i64)
    }

    fn write_i64(&mut self, v: i64) -> Result<(), WriteError> {
        self.write_int_x(8, v)
    }

    /// Writes `v` as a two's complement integer `width` bytes wide (1..=8).
    fn write_int_x(&mut self, width: usize, v: i64) -> Result<(), WriteError> {
        check_width(width)?;
        if width < 8 {
            let bits = width * 8;
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if v < min || v > max {
                return Err(WriteError::ValueTooWide {
                    value: v as i128,
                    width,
                });
            }
        }

        let mut buf = [0u8; 8];
        match self.order() {
            ByteOrder::Big => BigEndian::write_int(&mut buf, v, width),
            ByteOrder::Little => LittleEndian::write_int(&mut buf, v, width),
        }

        self.write_bytes(&buf[..width])
    }

    fn write_f32(&mut self, v: f32) -> Result<(), WriteError> {
        self.write_u32(v.to_bits())
    }

    fn write_f64(&mut self, v: f64) -> Result<(), WriteError> {
        self.write_u64(v.to_bits())
    }
}

fn check_width(width: usize) -> Result<(), WriteError> {
    if (1..=8).contains(&width) {
        Ok(())
    } else {
        Err(WriteError::InvalidWidth(width))
    }
}

/// [`ByteWriter`] over any `Write` sink.
pub struct Writer<W> {
    sink: Rc<RefCell<W>>,
    order: ByteOrder,
    debug: bool,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W, order: ByteOrder) -> Self {
        Self {
            sink: Rc::new(RefCell::new(sink)),
            order,
            debug: false,
        }
    }

    /// When enabled, every write is logged at `debug` level with a hex dump.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Returns the sink, or the writer itself while other views are still alive.
    pub fn into_inner(self) -> Result<W, Self> {
        let Writer { sink, order, debug } = self;
        match Rc::try_unwrap(sink) {
            Ok(cell) => Ok(cell.into_inner()),
            Err(sink) => Err(Writer { sink, order, debug }),
        }
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.sink.borrow_mut().write(buf)?;

        if self.debug {
            debug!("write {written} bytes: {}", hex::encode(&buf[..written]));
        }

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.borrow_mut().flush()
    }
}

impl<W: Write> ByteWriter for Writer<W> {
    fn order(&self) -> ByteOrder {
        self.order
    }

    fn with_order(&self, order: ByteOrder) -> Box<dyn ByteWriter + '_> {
        Box::new(Writer {
            sink: Rc::clone(&self.sink),
            order,
            debug: self.debug,
        })
    }
}
