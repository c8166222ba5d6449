//! JSON-describable schema definitions.
//!
//! A [`SchemaDef`] carries the same information as a [`Schema`] built in code, minus callbacks,
//! which cannot be expressed as data. Load it from a file shipped with your application, convert it
//! with [`Schema::from`] and keep the result in a `static` so a hand-written
//! [`Record`](crate::record::Record) impl can return it.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldSpec, Schema};

/// Top-level schema definition: the record type name and its fields in decode order.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SchemaDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// One field and its directive string.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    /// Directive string, e.g. `"len:Size, le"`. Empty when omitted.
    #[serde(default)]
    pub tag: String,
}

impl From<SchemaDef> for Schema {
    fn from(def: SchemaDef) -> Self {
        def.fields
            .into_iter()
            .fold(Schema::builder(def.name), |builder, field| {
                builder.field(field.name, field.tag)
            })
            .build()
    }
}

impl From<&FieldSpec> for FieldDef {
    fn from(spec: &FieldSpec) -> Self {
        FieldDef {
            name: spec.name().to_string(),
            tag: spec.tag().to_string(),
        }
    }
}

impl From<&Schema> for SchemaDef {
    fn from(schema: &Schema) -> Self {
        SchemaDef {
            name: schema.name().to_string(),
            fields: schema.fields().iter().map(FieldDef::from).collect(),
        }
    }
}
