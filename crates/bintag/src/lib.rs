//! # bintag
//!
//! Declarative binary decoding: describe how each field of a struct sits in a byte stream with a
//! short directive string, and decode raw bytes straight into the struct.
//!
//! Directives cover explicit lengths (`len:4`, or `len:Size - 2` computed from fields decoded
//! earlier), seeks relative to the current position, the start or the end of the stream
//! (`offset`, `offsetStart`, `offsetEnd`), byte order (`le`, `be`), ignored fields (`-`), element
//! directives for containers (`[len:2, le]`) and named callbacks for anything custom.
//!
//! ## Example
//!
//! ```
//! use bintag::record;
//!
//! #[derive(Debug, Default)]
//! struct Packet {
//!     version: u8,
//!     count: u16,
//!     values: Vec<i16>,
//!     name_len: u8,
//!     name: String,
//! }
//!
//! record!(Packet {
//!     version: "",
//!     count: "",
//!     values: "len:count, [le]",
//!     name_len: "",
//!     name: "len:name_len",
//! });
//!
//! let data = [0x01, 0x00, 0x02, 0xff, 0xff, 0x02, 0x00, 0x03, b'a', b'b', b'c'];
//! let mut packet = Packet::default();
//! bintag::decode_be(&data, &mut packet).unwrap();
//!
//! assert_eq!(packet.values, vec![-1, 2]);
//! assert_eq!(packet.name, "abc");
//! ```

pub mod decode;
pub mod errors;
pub mod expr;
pub mod field;
pub mod plan;
pub mod reader;
pub mod record;
pub mod schema;
pub mod tag;
pub mod writer;

#[cfg(feature = "serde")]
pub mod serde;

pub use decode::{Decoder, decode, decode_be, decode_from, decode_le};
pub use errors::{DecodeError, ExprError, ReadError, TagError, WriteError};
pub use field::{Field, Slot};
pub use reader::{ByteOrder, ByteReader, Reader};
pub use record::Record;
pub use schema::{Schema, SchemaBuilder};
pub use writer::{ByteWriter, Writer};
