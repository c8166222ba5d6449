//! Plan resolution: turns a field's directives into the concrete steps for decoding it.
//!
//! Plans are resolved again for every field on every decode, since `len` and offset expressions
//! may read sibling fields decoded just before.

use log::trace;

use crate::{
    errors::{DecodeError, ExprError},
    expr::{self, Variables},
    reader::ByteOrder,
    record::Record,
    tag::{Anchor, Directive},
};

/// A seek applied before the field is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    pub anchor: Anchor,
    pub delta: i64,
}

/// Resolved decoding steps for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldPlan {
    /// Skip the field entirely: no seek, no read.
    pub ignore: bool,
    /// Byte width for integers and strings, element count for containers.
    pub length: Option<i64>,
    /// Seeks applied in order before reading.
    pub offsets: Vec<Offset>,
    pub order: Option<ByteOrder>,
    pub callback: Option<String>,
    /// Plan applied to every element of a container field.
    pub elements: Option<Box<FieldPlan>>,
}

/// Plan for container elements when the field has no `[...]` group.
static EMPTY_PLAN: FieldPlan = FieldPlan {
    ignore: false,
    length: None,
    offsets: Vec::new(),
    order: None,
    callback: None,
    elements: None,
};

impl FieldPlan {
    fn ignored() -> Self {
        FieldPlan {
            ignore: true,
            ..FieldPlan::default()
        }
    }

    /// Element plan, or an empty plan when none was given.
    pub fn element_plan(&self) -> &FieldPlan {
        self.elements.as_deref().unwrap_or(&EMPTY_PLAN)
    }
}

/// Folds `directives` into a [`FieldPlan`], evaluating expressions against `vars`.
///
/// An ignore directive anywhere wins over everything else. For `len`, byte order and callback, the
/// last directive of each kind is the one that counts; offsets accumulate.
pub fn resolve(vars: &mut dyn Variables, directives: &[Directive]) -> Result<FieldPlan, DecodeError> {
    if directives.contains(&Directive::Ignore) {
        return Ok(FieldPlan::ignored());
    }

    let mut plan = FieldPlan::default();

    for directive in directives {
        match directive {
            Directive::Ignore => {}
            Directive::Order(order) => plan.order = Some(*order),
            Directive::Len(expr) => plan.length = Some(evaluate(expr, vars)?),
            Directive::Offset(anchor, expr) => plan.offsets.push(Offset {
                anchor: *anchor,
                delta: evaluate(expr, vars)?,
            }),
            Directive::Callback(name) => plan.callback = Some(name.clone()),
            Directive::Elements(children) => {
                plan.elements = Some(Box::new(resolve(vars, children)?));
            }
            Directive::Other { name, value } => {
                trace!("ignoring unknown directive {name}:{value}");
            }
        }
    }

    Ok(plan)
}

fn evaluate(expr: &str, vars: &mut dyn Variables) -> Result<i64, DecodeError> {
    expr::evaluate(expr, vars).map_err(|source| DecodeError::Expression {
        expr: expr.to_string(),
        source,
    })
}

/// Resolves identifiers to integer fields of a record that were declared, and so decoded, before
/// field number `current`.
pub struct Siblings<'r> {
    record: &'r mut dyn Record,
    current: usize,
}

impl<'r> Siblings<'r> {
    pub fn new(record: &'r mut dyn Record, current: usize) -> Self {
        Self { record, current }
    }
}

impl Variables for Siblings<'_> {
    fn lookup(&mut self, name: &str) -> Result<i64, ExprError> {
        let unknown = || ExprError::UnknownField(name.to_string());

        let index = self.record.schema().position(name).ok_or_else(unknown)?;
        if index >= self.current {
            return Err(ExprError::ForwardReference(name.to_string()));
        }

        self.record
            .field(name)
            .ok_or_else(unknown)?
            .as_i64()
            .ok_or_else(|| ExprError::NotNumeric(name.to_string()))
    }
}
