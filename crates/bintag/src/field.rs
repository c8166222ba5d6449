//! Decodable field shapes.
//!
//! The engine never sees concrete field types. Each field hands out a [`Slot`]: a mutable handle
//! tagged with the shape the engine knows how to fill.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use crate::{errors::DecodeError, record::Record};

/// Mutable handle on one field (or container element) being decoded.
pub enum Slot<'a> {
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    /// No natural width: needs a `len` directive.
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    /// No natural width: needs a `len` directive.
    Usize(&'a mut usize),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Bool(&'a mut bool),
    Str(&'a mut String),
    /// Growable container, decoded element by element.
    Seq(&'a mut dyn Sequence),
    /// Fixed-capacity container.
    Array(&'a mut dyn FixedArray),
    /// Nested record.
    Record(&'a mut dyn Record),
    /// Anything else; only a callback can decode it.
    Other {
        type_name: &'static str,
        value: &'a mut dyn Any,
    },
}

impl<'a> Slot<'a> {
    /// Name of the field's Rust type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Slot::I8(_) => "i8",
            Slot::I16(_) => "i16",
            Slot::I32(_) => "i32",
            Slot::I64(_) => "i64",
            Slot::Isize(_) => "isize",
            Slot::U8(_) => "u8",
            Slot::U16(_) => "u16",
            Slot::U32(_) => "u32",
            Slot::U64(_) => "u64",
            Slot::Usize(_) => "usize",
            Slot::F32(_) => "f32",
            Slot::F64(_) => "f64",
            Slot::Bool(_) => "bool",
            Slot::Str(_) => "String",
            Slot::Seq(seq) => seq.type_name(),
            Slot::Array(array) => array.type_name(),
            Slot::Record(record) => record.type_name(),
            Slot::Other { type_name, .. } => *type_name,
        }
    }

    /// The current value when the slot holds an integer.
    pub fn as_i64(&self) -> Option<i64> {
        Some(match self {
            Slot::I8(v) => **v as i64,
            Slot::I16(v) => **v as i64,
            Slot::I32(v) => **v as i64,
            Slot::I64(v) => **v,
            Slot::Isize(v) => **v as i64,
            Slot::U8(v) => **v as i64,
            Slot::U16(v) => **v as i64,
            Slot::U32(v) => **v as i64,
            Slot::U64(v) => **v as i64,
            Slot::Usize(v) => **v as i64,
            _ => return None,
        })
    }

    /// Type-erased access, used to hand the field to a callback.
    pub fn into_any(self) -> &'a mut dyn Any {
        match self {
            Slot::I8(v) => v,
            Slot::I16(v) => v,
            Slot::I32(v) => v,
            Slot::I64(v) => v,
            Slot::Isize(v) => v,
            Slot::U8(v) => v,
            Slot::U16(v) => v,
            Slot::U32(v) => v,
            Slot::U64(v) => v,
            Slot::Usize(v) => v,
            Slot::F32(v) => v,
            Slot::F64(v) => v,
            Slot::Bool(v) => v,
            Slot::Str(v) => v,
            Slot::Seq(seq) => seq.as_any_mut(),
            Slot::Array(array) => array.as_any_mut(),
            Slot::Record(record) => record.as_any_mut(),
            Slot::Other { value, .. } => value,
        }
    }
}

/// A type that can appear as a record field.
pub trait Field: Any {
    fn slot(&mut self) -> Slot<'_>;
}

/// Growable container of fields.
pub trait Sequence {
    fn type_name(&self) -> &'static str;

    fn clear(&mut self);

    /// Builds a default element, lets `decode` fill it, and appends it on success.
    fn push_with(
        &mut self,
        decode: &mut dyn FnMut(Slot<'_>) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError>;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Fixed-capacity container of fields.
pub trait FixedArray {
    fn type_name(&self) -> &'static str;

    fn capacity(&self) -> usize;

    fn element(&mut self, index: usize) -> Option<Slot<'_>>;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Field + Default> Sequence for Vec<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn push_with(
        &mut self,
        decode: &mut dyn FnMut(Slot<'_>) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        let mut element = T::default();
        decode(element.slot())?;
        self.push(element);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Field, const N: usize> FixedArray for [T; N] {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn capacity(&self) -> usize {
        N
    }

    fn element(&mut self, index: usize) -> Option<Slot<'_>> {
        self.get_mut(index).map(Field::slot)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Field + Default> Field for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Seq(self)
    }
}

impl<T: Field, const N: usize> Field for [T; N] {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Array(self)
    }
}

macro_rules! primitive_fields {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Field for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::$variant(self)
                }
            }
        )*
    };
}

primitive_fields! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => Str,
}

fn other<T: Any>(value: &mut T) -> Slot<'_> {
    Slot::Other {
        type_name: std::any::type_name::<T>(),
        value,
    }
}

impl<K: 'static, V: 'static, S: 'static> Field for HashMap<K, V, S> {
    fn slot(&mut self) -> Slot<'_> {
        other(self)
    }
}

impl<K: 'static, V: 'static> Field for BTreeMap<K, V> {
    fn slot(&mut self) -> Slot<'_> {
        other(self)
    }
}

impl<T: 'static> Field for Option<T> {
    fn slot(&mut self) -> Slot<'_> {
        other(self)
    }
}
