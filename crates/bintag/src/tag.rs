//! Directive parser: turns a field's directive string into an ordered list of [`Directive`]s.
//!
//! Grammar (comma separated, case sensitive):
//!
//! | token             | directive                                   |
//! |-------------------|---------------------------------------------|
//! | `-`               | [`Directive::Ignore`]                       |
//! | `le` / `be`       | [`Directive::Order`]                        |
//! | `len:<expr>`      | [`Directive::Len`]                          |
//! | `offset:<expr>`   | [`Directive::Offset`] from current position |
//! | `offsetStart:<e>` | [`Directive::Offset`] from stream start     |
//! | `offsetEnd:<e>`   | [`Directive::Offset`] from stream end       |
//! | `[<list>]`        | [`Directive::Elements`]                     |
//! | `name:value`      | [`Directive::Other`]                        |
//! | `Name`            | [`Directive::Callback`]                     |
//!
//! Parsing is purely syntactic; expressions are kept as raw strings.

use crate::{errors::TagError, reader::ByteOrder};

/// Reference point of an offset directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    /// Relative to the current stream position (`offset`).
    Current,
    /// Absolute from the start of the stream (`offsetStart`).
    Start,
    /// Absolute from the end of the stream (`offsetEnd`).
    End,
}

/// One parsed instruction from a directive string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Directive {
    Ignore,
    Order(ByteOrder),
    /// Length expression: byte count for strings and integers, element count for containers.
    Len(String),
    Offset(Anchor, String),
    /// Name of a registered callback that decodes the field.
    Callback(String),
    /// Directives applied to each element of a container field.
    Elements(Vec<Directive>),
    /// A `name:value` pair with an unrecognized name. Kept, never acted upon.
    Other { name: String, value: String },
}

/// Parses a directive string. The only syntax error is an unbalanced bracket.
pub fn parse(tag: &str) -> Result<Vec<Directive>, TagError> {
    let mut directives = Vec::new();

    for token in split_top_level(tag)? {
        parse_token(token, &mut directives)?;
    }

    Ok(directives)
}

/// Splits on commas that are not enclosed in brackets.
fn split_top_level(tag: &str) -> Result<Vec<&str>, TagError> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in tag.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1).ok_or_else(|| unbalanced(tag))?;
            }
            ',' if depth == 0 => {
                tokens.push(&tag[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(unbalanced(tag));
    }

    tokens.push(&tag[start..]);
    Ok(tokens)
}

fn parse_token(token: &str, directives: &mut Vec<Directive>) -> Result<(), TagError> {
    let token = token.trim();

    match token {
        "" => {}
        "-" => directives.push(Directive::Ignore),
        "le" => directives.push(Directive::Order(ByteOrder::Little)),
        "be" => directives.push(Directive::Order(ByteOrder::Big)),
        _ if token.starts_with('[') => {
            let close = matching_bracket(token).ok_or_else(|| unbalanced(token))?;
            directives.push(Directive::Elements(parse(&token[1..close])?));

            // Text glued to the closing bracket reads as the next directive.
            parse_token(&token[close + 1..], directives)?;
        }
        _ => directives.push(named(token)),
    }

    Ok(())
}

fn named(token: &str) -> Directive {
    let Some((name, value)) = token.split_once(':') else {
        return Directive::Callback(token.to_string());
    };

    let value = value.trim().to_string();
    match name.trim() {
        "len" => Directive::Len(value),
        "offset" => Directive::Offset(Anchor::Current, value),
        "offsetStart" => Directive::Offset(Anchor::Start, value),
        "offsetEnd" => Directive::Offset(Anchor::End, value),
        other => Directive::Other {
            name: other.to_string(),
            value,
        },
    }
}

/// Byte index of the `]` closing the `[` at index 0.
fn matching_bracket(token: &str) -> Option<usize> {
    let mut depth = 0usize;

    for (i, ch) in token.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

fn unbalanced(tag: &str) -> TagError {
    TagError::UnbalancedBracket {
        tag: tag.to_string(),
    }
}
