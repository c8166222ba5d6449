//! Error types for directive parsing, expression evaluation, byte I/O and decoding.

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors produced when parsing a field's directive string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// A `[` has no matching `]`, or a `]` appears without an opening `[`.
    #[error("unbalanced square bracket in {tag:?}")]
    UnbalancedBracket { tag: String },
}

/// Errors produced when evaluating a `len`/`offset` expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The expression has no operands at all.
    #[error("empty expression")]
    Empty,
    /// An operator is not followed by an operand.
    #[error("operator `{0}` is missing its right operand")]
    DanglingOperator(char),
    /// A character that is neither an operand nor an operator.
    #[error("unexpected character {ch:?} at byte {at}")]
    UnexpectedChar { ch: char, at: usize },
    /// A numeric literal that does not fit in an `i64`.
    #[error("invalid integer literal {0:?}")]
    InvalidLiteral(String),
    /// The identifier does not name a field of the current record.
    #[error("no field named `{0}`")]
    UnknownField(String),
    /// The identifier names a field that is not an integer.
    #[error("field `{0}` is not an integer")]
    NotNumeric(String),
    /// The identifier names a field that has not been decoded yet.
    #[error("field `{0}` is declared at or after the field being decoded")]
    ForwardReference(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
}

/// Errors produced by a [`crate::reader::ByteReader`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// A read of a negative number of bytes was requested.
    #[error("negative byte count {0}")]
    NegativeCount(i64),
    /// No bytes were left at all.
    #[error("end of input")]
    Eof,
    /// Some, but not all, of the requested bytes were available.
    #[error("unexpected end of input: wanted {wanted} bytes, got {got}")]
    UnexpectedEof { wanted: usize, got: usize },
    /// Arbitrary-width integers must be 1 to 8 bytes wide.
    #[error("cannot read a {0}-byte integer, width must be 1..=8")]
    InvalidWidth(i64),
    /// An absolute offset from the start of the stream was negative.
    #[error("cannot seek to negative absolute offset {0}")]
    NegativeOffset(i64),
    #[error("seek failed: {0}")]
    Seek(#[source] io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors produced by a [`crate::writer::ByteWriter`].
#[derive(Debug, Error)]
pub enum WriteError {
    /// Arbitrary-width integers must be 1 to 8 bytes wide.
    #[error("cannot write a {0}-byte integer, width must be 1..=8")]
    InvalidWidth(usize),
    /// The value needs more bytes than the requested width.
    #[error("value {value} does not fit in {width} bytes")]
    ValueTooWide { value: i128, width: usize },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors returned by the decode entry points.
///
/// Failures deep inside nested records come back wrapped in [`DecodeError::Field`] and
/// [`DecodeError::Element`] layers, one per level, so the message reads as a path from the
/// top-level record down to the failing read.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error("invalid expression {expr:?}: {source}")]
    Expression {
        expr: String,
        #[source]
        source: ExprError,
    },
    #[error(transparent)]
    Read(#[from] ReadError),
    /// Strings and vectors have no natural size.
    #[error("{shape} field needs a `len` directive")]
    MissingLength { shape: &'static str },
    /// `isize`/`usize` fields have no fixed wire width.
    #[error("`{type_name}` has no fixed width, add a `len` directive or use a sized integer")]
    UnsizedInteger { type_name: &'static str },
    #[error("field type `{type_name}` is not supported")]
    Unsupported { type_name: &'static str },
    #[error("array of capacity {capacity} cannot hold {len} elements")]
    ArrayOverflow { len: usize, capacity: usize },
    #[error("string is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    /// The schema lists a field that the record's `field` does not expose.
    #[error("schema of `{record}` names field `{field}` but the record does not expose it")]
    UnknownField { record: String, field: String },
    #[error(
        "no callback `{name}` for a `{field_type}` field in {searched:?}, expected one of:\n\
         \tfill(&mut dyn ByteReader, &mut {field_type}) -> Result<(), DecodeError>\n\
         \tvalue(&mut dyn ByteReader) -> Result<{field_type}, DecodeError>"
    )]
    CallbackNotFound {
        name: String,
        field_type: &'static str,
        searched: Vec<String>,
    },
    /// Raised by user callbacks.
    #[error("{0}")]
    Custom(String),
    #[error("{record}.{field}: {source}")]
    Field {
        record: String,
        field: String,
        source: Box<DecodeError>,
    },
    #[error("[{index}]: {source}")]
    Element {
        index: usize,
        source: Box<DecodeError>,
    },
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        DecodeError::Read(ReadError::Io(err))
    }
}

impl DecodeError {
    /// Creates a [`DecodeError::Custom`] from any message.
    pub fn custom(message: impl Into<String>) -> Self {
        DecodeError::Custom(message.into())
    }

    pub(crate) fn in_field(self, record: &str, field: &str) -> Self {
        DecodeError::Field {
            record: record.to_string(),
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn at_index(self, index: usize) -> Self {
        DecodeError::Element {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost error, with every breadcrumb layer removed.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::Field { source, .. } | DecodeError::Element { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// The breadcrumb trail from the top-level record down to the failure,
    /// e.g. `["Outer.inner", "[1]", "Inner.name"]`.
    pub fn path(&self) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = self;

        loop {
            match current {
                DecodeError::Field {
                    record,
                    field,
                    source,
                } => {
                    path.push(format!("{record}.{field}"));
                    current = source;
                }
                DecodeError::Element { index, source } => {
                    path.push(format!("[{index}]"));
                    current = source;
                }
                _ => return path,
            }
        }
    }

    /// True when the input ran out before a single byte of the failing read was available.
    pub fn is_eof(&self) -> bool {
        matches!(self.root_cause(), DecodeError::Read(ReadError::Eof))
    }

    /// True when the input ran out in the middle of a read.
    pub fn is_unexpected_eof(&self) -> bool {
        match self.root_cause() {
            DecodeError::Read(ReadError::UnexpectedEof { .. }) => true,
            DecodeError::Read(ReadError::Io(err)) => err.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
