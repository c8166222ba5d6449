//! Decode engine: walks a record's schema and fills each field from a [`ByteReader`].
//!
//! For every field, in declaration order:
//!
//! 1. resolve the field's directives into a [`FieldPlan`], evaluating expressions against the
//!    fields decoded so far;
//! 2. stop if the field is ignored;
//! 3. apply the plan's seeks in order;
//! 4. switch to a byte-order view of the reader if the plan asks for one;
//! 5. if a callback is named, run it, searching the current record's schema first and then the
//!    enclosing records' schemas from the innermost outward;
//! 6. otherwise decode by the field's shape, recursing into containers and nested records.
//!
//! Errors abort the whole decode and come back wrapped with the record, field and element index
//! of every level they passed through.

use std::io::{Cursor, Read, Seek, SeekFrom};

use log::trace;

use crate::{
    errors::{DecodeError, ReadError},
    field::Slot,
    plan::{self, FieldPlan, Offset, Siblings},
    reader::{ByteOrder, ByteReader, Reader},
    record::Record,
    schema::{FieldSpec, Schema},
    tag::Anchor,
};

/// Decodes `data` into `record`, reading multi-byte values with `order`.
pub fn decode(data: &[u8], order: ByteOrder, record: &mut dyn Record) -> Result<(), DecodeError> {
    let mut reader = Reader::from_bytes(data, order);
    decode_from(&mut reader, record)
}

pub fn decode_le(data: &[u8], record: &mut dyn Record) -> Result<(), DecodeError> {
    decode(data, ByteOrder::Little, record)
}

pub fn decode_be(data: &[u8], record: &mut dyn Record) -> Result<(), DecodeError> {
    decode(data, ByteOrder::Big, record)
}

/// Decodes `record` from the reader's current position.
///
/// Callbacks can use this to decode a nested record with the reader they were handed.
pub fn decode_from(reader: &mut dyn ByteReader, record: &mut dyn Record) -> Result<(), DecodeError> {
    decode_record(reader, record, &[])
}

/// Reusable decoder over one stream: successive calls continue where the previous one stopped.
pub struct Decoder<S> {
    reader: Reader<S>,
}

impl<S: Read + Seek> Decoder<S> {
    pub fn new(source: S, order: ByteOrder) -> Self {
        Self {
            reader: Reader::new(source, order),
        }
    }

    /// Logs every read and seek at `debug` level.
    pub fn set_debug(&mut self, debug: bool) {
        self.reader.set_debug(debug);
    }

    pub fn reader(&mut self) -> &mut Reader<S> {
        &mut self.reader
    }

    pub fn decode(&mut self, record: &mut dyn Record) -> Result<(), DecodeError> {
        decode_from(&mut self.reader, record)
    }
}

impl<'a> Decoder<Cursor<&'a [u8]>> {
    pub fn from_bytes(data: &'a [u8], order: ByteOrder) -> Self {
        Self::new(Cursor::new(data), order)
    }
}

/// `parents` lists the schemas of the enclosing records, outermost first.
fn decode_record(
    reader: &mut dyn ByteReader,
    record: &mut dyn Record,
    parents: &[&'static Schema],
) -> Result<(), DecodeError> {
    let schema = record.schema();

    let mut scope = Vec::with_capacity(parents.len() + 1);
    scope.extend_from_slice(parents);
    scope.push(schema);

    for (index, spec) in schema.fields().iter().enumerate() {
        decode_field(reader, record, index, spec, &scope)
            .map_err(|err| err.in_field(schema.name(), spec.name()))?;
    }

    Ok(())
}

fn decode_field(
    reader: &mut dyn ByteReader,
    record: &mut dyn Record,
    index: usize,
    spec: &FieldSpec,
    scope: &[&'static Schema],
) -> Result<(), DecodeError> {
    let directives = spec.directives().map_err(|err| DecodeError::Tag(err.clone()))?;
    let plan = plan::resolve(&mut Siblings::new(record, index), directives)?;

    let record_name = record.type_name();
    trace!("{record_name}.{}: {plan:?}", spec.name());
    if plan.ignore {
        return Ok(());
    }

    let slot = record
        .field(spec.name())
        .ok_or_else(|| DecodeError::UnknownField {
            record: record_name.to_string(),
            field: spec.name().to_string(),
        })?;

    decode_value(reader, slot, &plan, scope)
}

/// Decodes one field or container element. `scope` ends with the schema of the record that owns
/// the field.
fn decode_value(
    reader: &mut dyn ByteReader,
    slot: Slot<'_>,
    plan: &FieldPlan,
    scope: &[&'static Schema],
) -> Result<(), DecodeError> {
    if plan.ignore {
        return Ok(());
    }

    for offset in &plan.offsets {
        seek(reader, offset)?;
    }

    let mut view;
    let reader: &mut dyn ByteReader = match plan.order {
        Some(order) if order != reader.order() => {
            view = reader.with_order(order);
            &mut *view
        }
        _ => reader,
    };

    if let Some(name) = &plan.callback {
        return call(reader, slot, name, scope);
    }

    match slot {
        Slot::I8(v) => *v = read_int(reader, plan, 1)? as i8,
        Slot::I16(v) => *v = read_int(reader, plan, 2)? as i16,
        Slot::I32(v) => *v = read_int(reader, plan, 4)? as i32,
        Slot::I64(v) => *v = read_int(reader, plan, 8)?,
        Slot::Isize(v) => {
            let width = sized(plan, "isize")?;
            *v = read_int(reader, plan, width)? as isize;
        }
        Slot::U8(v) => *v = read_uint(reader, plan, 1)? as u8,
        Slot::U16(v) => *v = read_uint(reader, plan, 2)? as u16,
        Slot::U32(v) => *v = read_uint(reader, plan, 4)? as u32,
        Slot::U64(v) => *v = read_uint(reader, plan, 8)?,
        Slot::Usize(v) => {
            let width = sized(plan, "usize")?;
            *v = read_uint(reader, plan, width)? as usize;
        }
        Slot::F32(v) => *v = reader.read_f32()?,
        Slot::F64(v) => *v = reader.read_f64()?,
        Slot::Bool(v) => *v = reader.read_bool()?,
        Slot::Str(s) => {
            let len = required_len(plan, "string")?;
            let bytes = reader.read_bytes(len)?;
            *s = String::from_utf8(bytes)?;
        }
        Slot::Seq(seq) => {
            let len = required_len(plan, "vector")?;
            let element_plan = plan.element_plan();

            seq.clear();
            for index in 0..len {
                seq.push_with(&mut |element| decode_value(reader, element, element_plan, scope))
                    .map_err(|err| err.at_index(index))?;
            }
        }
        Slot::Array(array) => {
            let capacity = array.capacity();
            let len = match plan.length {
                Some(len) => count(len)?,
                None => capacity,
            };
            if len > capacity {
                return Err(DecodeError::ArrayOverflow { len, capacity });
            }
            let element_plan = plan.element_plan();

            for index in 0..len {
                let element = array
                    .element(index)
                    .ok_or(DecodeError::ArrayOverflow { len, capacity })?;
                decode_value(reader, element, element_plan, scope)
                    .map_err(|err| err.at_index(index))?;
            }
        }
        Slot::Record(nested) => decode_record(reader, nested, scope)?,
        Slot::Other { type_name, .. } => return Err(DecodeError::Unsupported { type_name }),
    }

    Ok(())
}

fn seek(reader: &mut dyn ByteReader, offset: &Offset) -> Result<(), ReadError> {
    let delta = offset.delta;
    let pos = match offset.anchor {
        Anchor::Current => SeekFrom::Current(delta),
        Anchor::Start => {
            SeekFrom::Start(u64::try_from(delta).map_err(|_| ReadError::NegativeOffset(delta))?)
        }
        Anchor::End => SeekFrom::End(delta),
    };

    reader.seek(pos).map_err(ReadError::Seek)?;
    Ok(())
}

/// Runs callback `name` on the field, trying the owning record's schema first, then each
/// enclosing record's schema outward.
fn call(
    reader: &mut dyn ByteReader,
    slot: Slot<'_>,
    name: &str,
    scope: &[&'static Schema],
) -> Result<(), DecodeError> {
    let field_type = slot.type_name();
    let target = slot.into_any();

    for schema in scope.iter().rev() {
        if let Some(result) = schema.callbacks().call(name, reader, target) {
            trace!("callback {name} for `{field_type}` found on {}", schema.name());
            return result;
        }
    }

    Err(DecodeError::CallbackNotFound {
        name: name.to_string(),
        field_type,
        searched: scope.iter().rev().map(|s| s.name().to_string()).collect(),
    })
}

/// Width of an `isize`/`usize` field, which only a `len` directive can give.
fn sized(plan: &FieldPlan, type_name: &'static str) -> Result<usize, DecodeError> {
    match plan.length {
        Some(len) => Ok(width(len)?),
        None => Err(DecodeError::UnsizedInteger { type_name }),
    }
}

fn read_int(reader: &mut dyn ByteReader, plan: &FieldPlan, native: usize) -> Result<i64, ReadError> {
    let width = plan.length.map_or(Ok(native), width)?;
    reader.read_int_x(width)
}

fn read_uint(reader: &mut dyn ByteReader, plan: &FieldPlan, native: usize) -> Result<u64, ReadError> {
    let width = plan.length.map_or(Ok(native), width)?;
    reader.read_uint_x(width)
}

fn width(len: i64) -> Result<usize, ReadError> {
    match usize::try_from(len) {
        Ok(width @ 1..=8) => Ok(width),
        _ => Err(ReadError::InvalidWidth(len)),
    }
}

fn required_len(plan: &FieldPlan, shape: &'static str) -> Result<usize, DecodeError> {
    let len = plan.length.ok_or(DecodeError::MissingLength { shape })?;
    Ok(count(len)?)
}

fn count(len: i64) -> Result<usize, ReadError> {
    usize::try_from(len).map_err(|_| ReadError::NegativeCount(len))
}
