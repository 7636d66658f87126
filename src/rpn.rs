//! Postfix (reverse Polish) arithmetic used by the `calc` command.
//!
//! Numbers are decimal literals with an optional sign, fraction and exponent
//! (`2`, `-3.5`, `+1e3`). Operators are the single characters `+ - * /` and need no
//! surrounding whitespace: `3 4+` is fine. A sign directly followed by a digit is
//! always read as part of a number, so `2 -1` pushes `-1` instead of subtracting.

use crate::error::{ConsoleError, Result};
use crate::logging::LogPipeline;

/// Value `calc` reports when an expression cannot be evaluated.
pub const SENTINEL: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl TryFrom<char> for Operator {
    type Error = ConsoleError;

    fn try_from(ch: char) -> Result<Self> {
        match ch {
            '+' => Ok(Operator::Add),
            '-' => Ok(Operator::Sub),
            '*' => Ok(Operator::Mul),
            '/' => Ok(Operator::Div),
            other => Err(ConsoleError::InvalidOperation(other)),
        }
    }
}

impl Operator {
    fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            // Division by zero yields inf/NaN on purpose.
            Operator::Div => left / right,
        }
    }
}

/// Operand stack owned by a single evaluation.
#[derive(Debug)]
struct OperandStack {
    values: Vec<f64>,
}

impl OperandStack {
    fn new() -> Self {
        Self {
            values: Vec::with_capacity(4),
        }
    }

    fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    fn pop(&mut self) -> Result<f64> {
        self.values.pop().ok_or(ConsoleError::MalformedExpression)
    }

    /// The single remaining value, or an error if there are zero or several.
    fn finish(mut self) -> Result<f64> {
        match self.values.len() {
            1 => self.pop(),
            _ => Err(ConsoleError::MalformedExpression),
        }
    }
}

/// Evaluate a postfix expression.
///
/// ```
/// use dev_console::rpn::evaluate;
/// assert_eq!(evaluate("5 1 2 + 4 * + 3 -").unwrap(), 14.0);
/// ```
pub fn evaluate(expression: &str) -> Result<f64> {
    let mut stack = OperandStack::new();
    let mut pos = 0;

    while let Some(ch) = expression[pos..].chars().next() {
        let rest = &expression[pos..];
        if ch.is_whitespace() {
            pos += ch.len_utf8();
            continue;
        }

        if starts_number(rest) {
            let len = number_len(rest);
            let value = rest[..len]
                .parse::<f64>()
                .map_err(|_| ConsoleError::MalformedExpression)?;
            stack.push(value);
            pos += len;
            continue;
        }

        let operator = Operator::try_from(ch)?;
        let right = stack.pop()?;
        let left = stack.pop()?;
        stack.push(operator.apply(left, right));
        pos += ch.len_utf8();
    }

    stack.finish()
}

/// Evaluate for display: failures are logged as errors and yield [`SENTINEL`].
pub fn evaluate_or_log(expression: &str, log: &LogPipeline) -> f64 {
    match evaluate(expression) {
        Ok(value) => value,
        Err(err) => {
            log.error(err);
            SENTINEL
        }
    }
}

fn starts_number(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_digit() => true,
        Some(b'+' | b'-') => bytes.get(1).is_some_and(u8::is_ascii_digit),
        _ => false,
    }
}

/// Byte length of the longest numeric literal prefix of `s`.
fn number_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut i = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    i = digits_from(i);
    if bytes.get(i) == Some(&b'.') {
        i = digits_from(i + 1);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            i = digits_from(j);
        }
    }
    i
}
