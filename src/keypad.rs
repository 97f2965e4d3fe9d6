use compact_str::{CompactString, ToCompactString};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type Value = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    pub fn precedence(self) -> u8 {
        match self {
            Operation::Add | Operation::Sub => 1,
            Operation::Mul | Operation::Div => 2,
        }
    }

    /// Computes `lhs OP rhs` with float semantics, so dividing by zero gives
    /// an infinity (or NaN for `0 / 0`) instead of panicking.
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operation::Add => lhs + rhs,
            Operation::Sub => lhs - rhs,
            Operation::Mul => lhs * rhs,
            Operation::Div => lhs / rhs,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Sub => '-',
            Operation::Mul => '×',
            Operation::Div => '/',
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single button press on the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Op(Operation),
    Clear,
    Calculate,
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(digit) = c.to_digit(10) {
                return Ok(Key::Digit(digit as u8));
            }
        }

        match s {
            "+" => Ok(Key::Op(Operation::Add)),
            "-" => Ok(Key::Op(Operation::Sub)),
            "×" | "X" | "x" | "*" => Ok(Key::Op(Operation::Mul)),
            "/" | "÷" => Ok(Key::Op(Operation::Div)),
            "=" => Ok(Key::Calculate),
            _ if s.eq_ignore_ascii_case("AC") => Ok(Key::Clear),
            _ => Err(KeyError::UnknownKey(s.to_compact_string())),
        }
    }
}

#[derive(Debug, Default)]
enum ReaderState {
    #[default]
    Clean,
    InSymbol(char),
    InWord(CompactString),
}

/// Reads typed text one character at a time and yields keys.
///
/// A key is only emitted once the character after it arrives (or on
/// `finalize`), which lets letters accumulate into words like `AC`.
#[derive(Debug, Default)]
pub struct KeyReader {
    state: ReaderState,
}

impl KeyReader {
    pub fn update(&mut self, c: char) -> Result<Option<Key>, KeyError> {
        use ReaderState::*;

        match self.state {
            InWord(ref mut word) if c.is_alphabetic() => {
                word.push(c);
                Ok(None)
            }
            _ => {
                let next = match c {
                    _ if c.is_whitespace() => Clean,
                    _ if c.is_alphabetic() => InWord(c.to_compact_string()),
                    '0'..='9' | '+' | '-' | '*' | '/' | '×' | '÷' | '=' => InSymbol(c),
                    _ => return Err(KeyError::UnexpectedCharacter(c)),
                };
                // The new character stays pending even when the previous word is rejected
                let previous = std::mem::replace(&mut self.state, next);
                Self::emit(previous)
            }
        }
    }

    pub fn finalize(&mut self) -> Result<Option<Key>, KeyError> {
        Self::emit(std::mem::take(&mut self.state))
    }

    fn emit(state: ReaderState) -> Result<Option<Key>, KeyError> {
        use ReaderState::*;
        let key = match state {
            Clean => None,
            InSymbol(c) => Some(c.to_compact_string().parse::<Key>()?),
            InWord(word) => Some(word.parse::<Key>()?),
        };
        Ok(key)
    }
}

/// Reads a whole string of typed input.
pub fn keys(text: &str) -> Result<Vec<Key>, KeyError> {
    let mut keys = vec![];
    let mut reader = KeyReader::default();
    for c in text.chars() {
        if let Some(key) = reader.update(c)? {
            keys.push(key)
        }
    }
    if let Some(key) = reader.finalize()? {
        keys.push(key)
    }
    Ok(keys)
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("Unexpected character: {0:?}")]
    UnexpectedCharacter(char),
    #[error("Unknown key: {0}")]
    UnknownKey(CompactString),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_keys() {
        assert_eq!("7".parse::<Key>(), Ok(Key::Digit(7)));
        assert_eq!("X".parse::<Key>(), Ok(Key::Op(Operation::Mul)));
        assert_eq!("×".parse::<Key>(), Ok(Key::Op(Operation::Mul)));
        assert_eq!("ac".parse::<Key>(), Ok(Key::Clear));
        assert_eq!("=".parse::<Key>(), Ok(Key::Calculate));
        assert_eq!(
            "12".parse::<Key>(),
            Err(KeyError::UnknownKey("12".into()))
        );
    }

    #[test]
    fn test_read_expression() {
        use Key::*;
        use Operation::*;

        let result = keys("12+3X4=");
        assert_eq!(
            result,
            Ok(vec![
                Digit(1),
                Digit(2),
                Op(Add),
                Digit(3),
                Op(Mul),
                Digit(4),
                Calculate
            ])
        );
    }

    #[test]
    fn test_read_words() {
        assert_eq!(
            keys("AC5 x 2"),
            Ok(vec![
                Key::Clear,
                Key::Digit(5),
                Key::Op(Operation::Mul),
                Key::Digit(2)
            ])
        );
        assert_eq!(keys("5 ACX"), Err(KeyError::UnknownKey("ACX".into())));
        assert_eq!(keys("1?"), Err(KeyError::UnexpectedCharacter('?')));
    }

    #[test]
    fn test_rejected_word_keeps_next_key() {
        let mut reader = KeyReader::default();
        let mut results: Vec<_> = "foo5".chars().map(|c| reader.update(c)).collect();
        results.push(reader.finalize());
        assert_eq!(
            results,
            vec![
                Ok(None),
                Ok(None),
                Ok(None),
                Err(KeyError::UnknownKey("foo".into())),
                Ok(Some(Key::Digit(5)))
            ]
        );
    }

    #[test]
    fn test_unexpected_character_keeps_pending_key() {
        let mut reader = KeyReader::default();
        assert_eq!(reader.update('1'), Ok(None));
        assert_eq!(reader.update('?'), Err(KeyError::UnexpectedCharacter('?')));
        assert_eq!(reader.update('+'), Ok(Some(Key::Digit(1))));
        assert_eq!(reader.finalize(), Ok(Some(Key::Op(Operation::Add))));
    }

    #[test]
    fn test_apply_keeps_operand_order() {
        assert_eq!(Operation::Sub.apply(3.0, 1.0), 2.0);
        assert_eq!(Operation::Div.apply(8.0, 2.0), 4.0);
        assert!(Operation::Div.apply(1.0, 0.0).is_infinite());
        assert!(Operation::Div.apply(0.0, 0.0).is_nan());
    }
}
