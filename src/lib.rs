//! A pocket-calculator engine: digits and operators are pushed one key at a
//! time and `=` evaluates the expression with the usual precedence.

pub mod engine;
pub mod keypad;

pub use engine::{calculate_postfix, convert_to_postfix, Answer, Engine, EngineError, Token};
pub use keypad::{keys, Key, KeyError, KeyReader, Operation, Value};
