//! Arithmetic used by `len` and `offset` directives.
//!
//! An expression is a sequence of operands joined by `+ - * /`. There is no precedence and no
//! grouping: the operators fold strictly left to right, so `2 + 3 * 4` is `20`. An operand is a
//! decimal literal with an optional sign, or the name of an integer field resolved through
//! [`Variables`]. Division truncates toward zero.

use crate::errors::ExprError;

/// Resolves identifiers to integer values.
pub trait Variables {
    fn lookup(&mut self, name: &str) -> Result<i64, ExprError>;
}

impl<F> Variables for F
where
    F: FnMut(&str) -> Result<i64, ExprError>,
{
    fn lookup(&mut self, name: &str) -> Result<i64, ExprError> {
        self(name)
    }
}

/// Resolver for expressions that must not reference any field.
pub struct NoVariables;

impl Variables for NoVariables {
    fn lookup(&mut self, name: &str) -> Result<i64, ExprError> {
        Err(ExprError::UnknownField(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn from_char(ch: char) -> Option<Op> {
        match ch {
            '+' => Some(Op::Add),
            '-' => Some(Op::Sub),
            '*' => Some(Op::Mul),
            '/' => Some(Op::Div),
            _ => None,
        }
    }

    fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Div => '/',
        }
    }

    fn apply(self, lhs: i64, rhs: i64) -> Result<i64, ExprError> {
        let result = match self {
            Op::Add => lhs.checked_add(rhs),
            Op::Sub => lhs.checked_sub(rhs),
            Op::Mul => lhs.checked_mul(rhs),
            Op::Div => {
                if rhs == 0 {
                    return Err(ExprError::DivisionByZero);
                }
                lhs.checked_div(rhs)
            }
        };

        result.ok_or(ExprError::Overflow)
    }
}

/// Evaluates `expr`, looking identifiers up in `vars`.
pub fn evaluate(expr: &str, vars: &mut dyn Variables) -> Result<i64, ExprError> {
    let mut cursor = Cursor { src: expr, pos: 0 };

    cursor.skip_whitespace();
    if cursor.at_end() {
        return Err(ExprError::Empty);
    }

    let mut result = cursor.operand(vars)?;

    loop {
        cursor.skip_whitespace();
        let Some((at, ch)) = cursor.peek() else {
            return Ok(result);
        };

        let op = Op::from_char(ch).ok_or(ExprError::UnexpectedChar { ch, at })?;
        cursor.bump(ch);

        cursor.skip_whitespace();
        if cursor.at_end() {
            return Err(ExprError::DanglingOperator(op.symbol()));
        }

        let rhs = cursor.operand(vars)?;
        result = op.apply(result, rhs)?;
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<(usize, char)> {
        self.src[self.pos..].chars().next().map(|ch| (self.pos, ch))
    }

    fn bump(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_whitespace(&mut self) {
        while let Some((_, ch)) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.bump(ch);
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some((_, ch)) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.bump(ch);
        }
        &self.src[start..self.pos]
    }

    /// `[+-]? (digits | identifier)`
    fn operand(&mut self, vars: &mut dyn Variables) -> Result<i64, ExprError> {
        let mut negative = false;
        if let Some((_, sign @ ('+' | '-'))) = self.peek() {
            negative = sign == '-';
            self.bump(sign);
            self.skip_whitespace();
        }

        let Some((at, ch)) = self.peek() else {
            return Err(ExprError::DanglingOperator(if negative { '-' } else { '+' }));
        };

        let value = if ch.is_ascii_digit() {
            let digits = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            digits
                .parse::<i64>()
                .map_err(|_| ExprError::InvalidLiteral(digits.to_string()))?
        } else if ch.is_alphabetic() || ch == '_' {
            let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
            vars.lookup(name)?
        } else {
            return Err(ExprError::UnexpectedChar { ch, at });
        };

        if negative {
            value.checked_neg().ok_or(ExprError::Overflow)
        } else {
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> Result<i64, ExprError> {
        evaluate(expr, &mut NoVariables)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("42"), Ok(42));
        assert_eq!(eval(" -8 "), Ok(-8));
        assert_eq!(eval("+3"), Ok(3));
    }

    #[test]
    fn test_left_to_right_fold() {
        assert_eq!(eval("10 + 5 - 2"), Ok(13));
        assert_eq!(eval("2 + 3 * 4"), Ok(20));
        assert_eq!(eval("20 / 3 * 3"), Ok(18));
        assert_eq!(eval("-7 / 2"), Ok(-3));
        assert_eq!(eval("4*-2"), Ok(-8));
    }

    #[test]
    fn test_identifiers() {
        let mut vars = |name: &str| -> Result<i64, ExprError> {
            match name {
                "Size" => Ok(10),
                "Header_Len" => Ok(4),
                other => Err(ExprError::UnknownField(other.to_string())),
            }
        };

        assert_eq!(evaluate("Size", &mut vars), Ok(10));
        assert_eq!(evaluate("Size - Header_Len * 2", &mut vars), Ok(12));
        assert_eq!(evaluate("-Size", &mut vars), Ok(-10));
        assert_eq!(
            evaluate("Size + Missing", &mut vars),
            Err(ExprError::UnknownField("Missing".to_string()))
        );
    }

    #[test]
    fn test_malformed() {
        assert_eq!(eval(""), Err(ExprError::Empty));
        assert_eq!(eval("   "), Err(ExprError::Empty));
        assert_eq!(eval("1 +"), Err(ExprError::DanglingOperator('+')));
        assert_eq!(eval("1 * -"), Err(ExprError::DanglingOperator('-')));
        assert_eq!(eval("1 % 2"), Err(ExprError::UnexpectedChar { ch: '%', at: 2 }));
        assert_eq!(eval("12ab"), Err(ExprError::InvalidLiteral("12ab".to_string())));
        assert_eq!(eval("1 2"), Err(ExprError::UnexpectedChar { ch: '2', at: 2 }));
    }

    #[test]
    fn test_arithmetic_errors() {
        assert_eq!(eval("1 / 0"), Err(ExprError::DivisionByZero));
        assert_eq!(eval("9223372036854775807 + 1"), Err(ExprError::Overflow));
        assert_eq!(
            eval("99999999999999999999"),
            Err(ExprError::InvalidLiteral("99999999999999999999".to_string()))
        );
    }
}
