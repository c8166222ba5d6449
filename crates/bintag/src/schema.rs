//! Schema: the ordered field list of a record type plus its callback registry.
//!
//! Directive strings are parsed once, when the schema is built. A directive string that fails to
//! parse does not fail the build; the error is kept on the field and reported when that field is
//! decoded, so one bad field does not make the whole record type unusable at construction time.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::{errors::DecodeError, errors::TagError, reader::ByteReader, tag::Directive};

/// One declared field: its name, raw directive string and the parsed directives.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    tag: String,
    directives: Result<Vec<Directive>, TagError>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let directives = crate::tag::parse(&tag);

        Self {
            name: name.into(),
            tag,
            directives,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Parsed directives, or the syntax error found in [`FieldSpec::tag`].
    pub fn directives(&self) -> Result<&[Directive], &TagError> {
        self.directives.as_deref()
    }
}

/// Field layout and callbacks of one record type.
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
    callbacks: Callbacks,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            callbacks: Callbacks::default(),
        }
    }

    /// Record type name, used in error breadcrumbs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration (and decode) order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declaration index of the field called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Builder for [`Schema`]. Fields are decoded in the order they are added.
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    callbacks: Callbacks,
}

impl SchemaBuilder {
    /// Declares the next field with its directive string (`""` for none).
    pub fn field(mut self, name: impl Into<String>, tag: impl Into<String>) -> Self {
        self.fields.push(FieldSpec::new(name, tag));
        self
    }

    /// Registers a callback that decodes a `T` field in place.
    pub fn fill<T, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut dyn ByteReader, &mut T) -> Result<(), DecodeError> + Send + Sync + 'static,
    {
        self.callbacks.fill(name, f);
        self
    }

    /// Registers a callback that produces the value of a `T` field.
    pub fn value<T, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut dyn ByteReader) -> Result<T, DecodeError> + Send + Sync + 'static,
    {
        self.callbacks.value(name, f);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            name: self.name,
            fields: self.fields,
            callbacks: self.callbacks,
        }
    }
}

type Invoke =
    dyn Fn(&mut dyn ByteReader, &mut dyn Any) -> Option<Result<(), DecodeError>> + Send + Sync;

struct Callback {
    type_name: &'static str,
    invoke: Box<Invoke>,
}

/// Named user callbacks. One name may carry several entries for different field types; an entry
/// only applies to a field of exactly its type.
#[derive(Default)]
pub struct Callbacks {
    entries: HashMap<String, Vec<Callback>>,
}

impl Callbacks {
    pub fn fill<T, F>(&mut self, name: impl Into<String>, f: F)
    where
        T: Any,
        F: Fn(&mut dyn ByteReader, &mut T) -> Result<(), DecodeError> + Send + Sync + 'static,
    {
        self.insert::<T>(
            name.into(),
            Box::new(move |reader, target| {
                let target = target.downcast_mut::<T>()?;
                Some(f(reader, target))
            }),
        );
    }

    pub fn value<T, F>(&mut self, name: impl Into<String>, f: F)
    where
        T: Any,
        F: Fn(&mut dyn ByteReader) -> Result<T, DecodeError> + Send + Sync + 'static,
    {
        self.insert::<T>(
            name.into(),
            Box::new(move |reader, target| {
                let target = target.downcast_mut::<T>()?;
                Some(f(reader).map(|value| *target = value))
            }),
        );
    }

    fn insert<T: Any>(&mut self, name: String, invoke: Box<Invoke>) {
        self.entries.entry(name).or_default().push(Callback {
            type_name: std::any::type_name::<T>(),
            invoke,
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the callback `name` registered for `target`'s type.
    ///
    /// Returns `None` when no entry matches, so the caller can keep searching.
    pub fn call(
        &self,
        name: &str,
        reader: &mut dyn ByteReader,
        target: &mut dyn Any,
    ) -> Option<Result<(), DecodeError>> {
        self.entries
            .get(name)?
            .iter()
            .find_map(|callback| (callback.invoke)(reader, target))
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, callbacks)| {
                let types: Vec<_> = callbacks.iter().map(|c| c.type_name).collect();
                (name, types)
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::reader::{ByteOrder, Reader};

    #[test]
    fn test_builder_keeps_declaration_order() {
        let schema = Schema::builder("Header")
            .field("magic", "len:4")
            .field("size", "")
            .field("body", "len:size")
            .build();

        assert_eq!(schema.name(), "Header");
        let names: Vec<_> = schema.fields().iter().map(FieldSpec::name).collect();
        assert_eq!(names, vec!["magic", "size", "body"]);
        assert_eq!(schema.position("body"), Some(2));
        assert_eq!(schema.position("nope"), None);
        assert_eq!(schema.field("size").map(FieldSpec::tag), Some(""));
    }

    #[test]
    fn test_syntax_error_is_kept_on_the_field() {
        let schema = Schema::builder("Bad")
            .field("ok", "len:1")
            .field("broken", "[len:1")
            .build();

        assert!(schema.fields()[0].directives().is_ok());
        assert!(matches!(
            schema.fields()[1].directives(),
            Err(TagError::UnbalancedBracket { .. })
        ));
    }

    #[test]
    fn test_callbacks_match_by_type() {
        let schema = Schema::builder("Callbacks")
            .value("Read", |r: &mut dyn ByteReader| Ok(r.read_u8()? as u32))
            .fill("Read", |r: &mut dyn ByteReader, s: &mut String| {
                let mut buf = String::new();
                r.read_to_string(&mut buf)?;
                *s = buf;
                Ok(())
            })
            .build();
        let callbacks = schema.callbacks();
        assert!(callbacks.contains("Read"));

        let mut reader = Reader::from_bytes(&[0x07, b'h', b'i'], ByteOrder::Big);

        let mut number = 0u32;
        assert!(matches!(
            callbacks.call("Read", &mut reader, &mut number),
            Some(Ok(()))
        ));
        assert_eq!(number, 7);

        let mut text = String::new();
        assert!(matches!(
            callbacks.call("Read", &mut reader, &mut text),
            Some(Ok(()))
        ));
        assert_eq!(text, "hi");

        let mut other = 0i64;
        assert!(callbacks.call("Read", &mut reader, &mut other).is_none());
        assert!(callbacks.call("Missing", &mut reader, &mut number).is_none());
    }

    #[test]
    fn test_value_callback_error_leaves_target() {
        let schema = Schema::builder("Failing")
            .value("Fail", |_: &mut dyn ByteReader| -> Result<u8, DecodeError> {
                Err(DecodeError::custom("nope"))
            })
            .build();

        let mut reader = Reader::from_bytes(&[], ByteOrder::Big);
        let mut target = 3u8;
        let result = schema.callbacks().call("Fail", &mut reader, &mut target);
        assert!(matches!(result, Some(Err(DecodeError::Custom(_)))));
        assert_eq!(target, 3);
    }
}
