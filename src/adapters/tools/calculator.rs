//! Infix arithmetic evaluator for the calculator tool.
//!
//! Supports `+ - * /`, parentheses, unary minus, and decimal literals.
//! Recursive descent; no external parser needed for this grammar.

use thiserror::Error;

/// Errors an expression evaluation can produce.
#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    /// The expression is empty.
    #[error("empty expression")]
    Empty,

    /// Unexpected character or token.
    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    /// Input ended while a value or closing parenthesis was expected.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.input.get(self.pos).copied()
    }

    fn expression(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expression()?;
                match self.peek() {
                    Some(b')') => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(_) => Err(CalcError::UnexpectedToken(self.pos)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            Some(_) => Err(CalcError::UnexpectedToken(self.pos)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        let mut seen_dot = false;
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !seen_dot => {
                    seen_dot = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| CalcError::UnexpectedToken(start))?;
        text.parse()
            .map_err(|_| CalcError::UnexpectedToken(start))
    }
}

/// Evaluates an infix arithmetic expression.
///
/// Integral results render without a fractional part (`"4"`, not `"4.0"`).
pub fn evaluate(expression: &str) -> Result<String, CalcError> {
    if expression.trim().is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser::new(expression);
    let value = parser.expression()?;
    if parser.peek().is_some() {
        return Err(CalcError::UnexpectedToken(parser.pos));
    }

    if value.fract() == 0.0 && value.abs() < 1e15 {
        Ok(format!("{}", value as i64))
    } else {
        Ok(format!("{}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(evaluate("2+2").unwrap(), "4");
        assert_eq!(evaluate("10 - 3").unwrap(), "7");
        assert_eq!(evaluate("6 * 7").unwrap(), "42");
        assert_eq!(evaluate("9 / 2").unwrap(), "4.5");
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), "14");
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), "20");
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), "21");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate("-5 + 3").unwrap(), "-2");
        assert_eq!(evaluate("2 * -3").unwrap(), "-6");
        assert_eq!(evaluate("--4").unwrap(), "4");
    }

    #[test]
    fn decimals() {
        assert_eq!(evaluate("1.5 + 2.5").unwrap(), "4");
        assert_eq!(evaluate("0.1 * 10").unwrap(), "1");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(evaluate("1 / 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("5 / (2 - 2)"), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert_eq!(evaluate("   "), Err(CalcError::Empty));
        assert!(matches!(evaluate("2 +"), Err(CalcError::UnexpectedEnd)));
        assert!(matches!(evaluate("(1 + 2"), Err(CalcError::UnexpectedEnd)));
        assert!(matches!(evaluate("2 + x"), Err(CalcError::UnexpectedToken(_))));
        assert!(matches!(evaluate("1 2"), Err(CalcError::UnexpectedToken(_))));
    }
}
