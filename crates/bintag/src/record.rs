//! Records: structs the decode engine fills field by field.

use std::any::Any;

use crate::{field::Slot, schema::Schema};

/// A struct decodable through its [`Schema`].
///
/// Usually implemented with [`record!`](crate::record!), which also makes the struct usable as a
/// nested field of another record.
pub trait Record: Any {
    /// Field layout and callbacks, shared by every instance of the type.
    fn schema(&self) -> &'static Schema;

    /// Mutable handle on the field called `name`, or `None` if the struct has no such field.
    fn field(&mut self, name: &str) -> Option<Slot<'_>>;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn type_name(&self) -> &'static str {
        self.schema().name()
    }
}

/// Implements [`Record`] and [`Field`](crate::field::Field) for a struct.
///
/// Fields are listed with their directive strings, in decode order. An optional `callbacks` block
/// registers named callbacks with [`SchemaBuilder::fill`](crate::schema::SchemaBuilder::fill) or
/// [`SchemaBuilder::value`](crate::schema::SchemaBuilder::value).
///
/// ```
/// use bintag::{DecodeError, ByteReader, record};
///
/// #[derive(Debug, Default)]
/// struct Chunk {
///     size: u16,
///     kind: String,
///     crc: u32,
/// }
///
/// fn read_crc(r: &mut dyn ByteReader) -> Result<u32, DecodeError> {
///     Ok(r.read_u32()?)
/// }
///
/// record!(Chunk {
///     size: "",
///     kind: "len:size",
///     crc: "ReadCrc",
/// } callbacks {
///     value "ReadCrc" => read_crc,
/// });
///
/// let mut chunk = Chunk::default();
/// bintag::decode_be(&[0, 2, b'o', b'k', 0, 0, 0, 9], &mut chunk).unwrap();
/// assert_eq!(chunk.kind, "ok");
/// assert_eq!(chunk.crc, 9);
/// ```
#[macro_export]
macro_rules! record {
    (
        $ty:ident {
            $($field:ident : $tag:literal),* $(,)?
        }
        $(callbacks {
            $($kind:ident $name:literal => $callback:expr),* $(,)?
        })?
    ) => {
        impl $crate::record::Record for $ty {
            fn schema(&self) -> &'static $crate::schema::Schema {
                static SCHEMA: ::std::sync::LazyLock<$crate::schema::Schema> =
                    ::std::sync::LazyLock::new(|| {
                        $crate::schema::Schema::builder(stringify!($ty))
                            $(.field(stringify!($field), $tag))*
                            $($(.$kind($name, $callback))*)?
                            .build()
                    });
                &SCHEMA
            }

            fn field(&mut self, name: &str) -> ::std::option::Option<$crate::field::Slot<'_>> {
                match name {
                    $(stringify!($field) => ::std::option::Option::Some(
                        $crate::field::Field::slot(&mut self.$field),
                    ),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl $crate::field::Field for $ty {
            fn slot(&mut self) -> $crate::field::Slot<'_> {
                $crate::field::Slot::Record(self)
            }
        }
    };
}
