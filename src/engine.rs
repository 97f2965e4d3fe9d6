use crate::keypad::{Key, Operation, Value};
use compact_str::{CompactString, ToCompactString};
use log::{debug, trace, warn};
use std::fmt;
use thiserror::Error;

pub const MAX_NUMBER_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Num(Value),
    Op(Operation),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(v) => write!(f, "{}", v),
            Token::Op(op) => write!(f, "{}", op),
        }
    }
}

/// The outcome of the last calculation.
///
/// Anything other than `Integer` locks the engine until it is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Integer(Value),
    PosInfinity,
    NegInfinity,
    NotANumber,
}

impl Answer {
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Answer::NotANumber
        } else if value == f64::INFINITY {
            Answer::PosInfinity
        } else if value == f64::NEG_INFINITY {
            Answer::NegInfinity
        } else {
            // `as` truncates toward zero and saturates at the integer bounds
            Answer::Integer(value as Value)
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Answer::Integer(_))
    }
}

impl Default for Answer {
    fn default() -> Self {
        Answer::Integer(0)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Integer(v) => write!(f, "{}", v),
            Answer::PosInfinity => f.write_str("Infinity"),
            Answer::NegInfinity => f.write_str("-Infinity"),
            Answer::NotANumber => f.write_str("NaN"),
        }
    }
}

/// Builds an expression from key presses and evaluates it on `=`.
///
/// The number being typed stays pending until an operator or `=` commits it
/// to the infix sequence. After a calculation the answer becomes the pending
/// number, so the next operator continues from it.
#[derive(Debug, Default)]
pub struct Engine {
    pending: Option<Value>,
    infix: Vec<Token>,
    answer: Answer,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_all(&mut self) {
        self.pending = None;
        self.infix.clear();
        self.answer = Answer::default();
    }

    /// Applies one key press. A rejected key leaves the engine untouched.
    pub fn push(&mut self, key: Key) -> Result<(), EngineError> {
        trace!("push {:?}", key);

        match key {
            Key::Clear => self.clear_all(),
            Key::Calculate => {
                self.validate(key)?;
                self.commit_pending();
                self.calculate();
            }
            Key::Digit(digit) => {
                self.validate(key)?;
                self.pending = Some(extend(self.pending, digit));
            }
            Key::Op(op) => {
                self.validate(key)?;
                self.commit_pending();
                self.infix.push(Token::Op(op));
            }
        }

        Ok(())
    }

    /// The last computed integer, or `None` while a non-finite answer locks
    /// the engine.
    pub fn result(&self) -> Option<Value> {
        match self.answer {
            Answer::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn answer(&self) -> Answer {
        self.answer
    }

    pub fn is_locked(&self) -> bool {
        !self.answer.is_integer()
    }

    /// Text of the number being typed, empty when nothing is pending.
    pub fn buffer(&self) -> CompactString {
        match self.pending {
            Some(v) => v.to_compact_string(),
            None if self.is_locked() => self.answer.to_compact_string(),
            None => CompactString::default(),
        }
    }

    pub fn infix(&self) -> &[Token] {
        &self.infix
    }

    fn validate(&self, key: Key) -> Result<(), EngineError> {
        if self.is_locked() {
            return Err(EngineError::NotANumber);
        }

        match key {
            Key::Digit(_) if self.buffer().len() >= MAX_NUMBER_LENGTH => {
                Err(EngineError::MaxLength)
            }
            Key::Op(_) if self.pending.is_none() => Err(EngineError::Syntax),
            _ => Ok(()),
        }
    }

    fn commit_pending(&mut self) {
        if let Some(v) = self.pending.take() {
            debug!("commit {}", v);
            self.infix.push(Token::Num(v));
        }
    }

    fn calculate(&mut self) {
        let postfix = convert_to_postfix(&self.infix);
        debug!("postfix {:?}", postfix);

        self.answer = Answer::from_f64(calculate_postfix(&postfix));
        self.infix.clear();
        self.pending = self.result();

        if self.is_locked() {
            warn!("answer {} locks the engine until cleared", self.answer);
        } else {
            debug!("answer {}", self.answer);
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.infix {
            write!(f, "{}", token)?;
        }
        f.write_str(&self.buffer())
    }
}

/// Appends a typed digit to the pending number, as if the digit were written
/// after its decimal text. Leading zeros disappear and negatives grow away
/// from zero (`-5` then `3` is `-53`).
fn extend(pending: Option<Value>, digit: u8) -> Value {
    let digit = Value::from(digit);
    match pending {
        Some(v) if v < 0 => v * 10 - digit,
        Some(v) => v * 10 + digit,
        None => digit,
    }
}

/// Reorders an infix sequence into postfix. Operators of equal precedence
/// pop each other, so they evaluate left to right.
pub fn convert_to_postfix(infix: &[Token]) -> Vec<Token> {
    let mut postfix = Vec::with_capacity(infix.len());
    let mut stack: Vec<Operation> = vec![];

    for &token in infix {
        match token {
            Token::Num(_) => postfix.push(token),
            Token::Op(op) => {
                while stack
                    .last()
                    .map(|top| top.precedence() >= op.precedence())
                    .unwrap_or(false)
                {
                    postfix.extend(stack.pop().map(Token::Op));
                }
                stack.push(op);
            }
        }
    }

    postfix.extend(stack.into_iter().rev().map(Token::Op));
    postfix
}

/// Evaluates a postfix sequence. An empty sequence is `0`; an operator
/// without two operands makes the whole expression `NaN`.
pub fn calculate_postfix(postfix: &[Token]) -> f64 {
    let mut stack: Vec<f64> = vec![];

    for &token in postfix {
        match token {
            Token::Num(v) => stack.push(v as f64),
            Token::Op(op) => {
                let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                    return f64::NAN;
                };
                stack.push(op.apply(lhs, rhs));
            }
        }
    }

    stack.first().copied().unwrap_or(0.0)
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("Enter a number before an operator")]
    Syntax,
    #[error("Numbers can have at most three digits")]
    MaxLength,
    #[error("Only numbers can be calculated, press AC to start over")]
    NotANumber,
}
