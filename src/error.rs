//! Error taxonomy for all three pipeline stages: lexing, parsing, evaluation.

use std::error::Error as StdError;
use std::fmt;

use crate::token::{LexError, Position};

/// The kind of syntax error encountered while parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorType {
    /// An unexpected token was found where a statement or expression was expected.
    UnexpectedToken(String),
    /// A `[` was never matched by a `]`.
    UnclosedBracket,
    /// A `(` was never matched by a `)`.
    UnclosedParen,
    /// An operator or statement keyword had no operand following it.
    MissingOperand,
    /// A `to` procedure definition never reached a matching `end`.
    MissingEnd,
    /// A reserved keyword appeared where an expression was expected.
    KeywordInExpression(String),
    /// A construct that requires a word token (e.g. a procedure name) did not get one.
    ExpectedWord,
}

impl fmt::Display for ParseErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken(t) => write!(f, "unexpected token '{}'", t),
            Self::UnclosedBracket => f.write_str("unclosed '['"),
            Self::UnclosedParen => f.write_str("unclosed '('"),
            Self::MissingOperand => f.write_str("missing operand"),
            Self::MissingEnd => f.write_str("procedure definition missing 'end'"),
            Self::KeywordInExpression(w) => {
                write!(f, "keyword '{}' cannot appear in expression position", w)
            }
            Self::ExpectedWord => f.write_str("expected a word"),
        }
    }
}

/// A syntax error with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub error_type: ParseErrorType,
    pub pos: Position,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.error_type, self.pos)
    }
}

impl StdError for ParseError {}

/// The kind of error encountered while evaluating a parsed program.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalErrorType {
    /// A built-in or operator received an operand of the wrong shape.
    TypeError { expected: String, got: String },
    /// A user procedure was invoked with the wrong number of arguments.
    ArityError {
        name: String,
        expected: usize,
        got: usize,
    },
    /// A variable was read before it was ever bound, or was never bound.
    UndefinedVariable(String),
    /// A procedure name does not resolve to any definition.
    UndefinedProcedure(String),
    /// Division (or remainder) by zero.
    DivisionByZero,
    /// `item`/list access outside `[1, count]`.
    IndexOutOfBounds { len: usize, index: i64 },
    /// `stop`/`output` reached the top level without ever entering a procedure.
    TopLevelControlTransfer,
    /// A user-function call in expression position produced no value via `output`.
    NoValueProduced { name: String },
    /// Recursion exceeded the configured call-depth guard.
    RecursionLimit { limit: usize },
    /// A loop ran past the configured iteration guard.
    TooManyIterations { limit: usize },
}

impl fmt::Display for EvalErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeError { expected, got } => {
                write!(f, "type error: expected {}, got {}", expected, got)
            }
            Self::ArityError {
                name,
                expected,
                got,
            } => write!(
                f,
                "procedure '{}' expects {} argument(s), got {}",
                name, expected, got
            ),
            Self::UndefinedVariable(name) => write!(f, "variable not found: {}", name),
            Self::UndefinedProcedure(name) => write!(f, "procedure not found: {}", name),
            Self::DivisionByZero => f.write_str("division by zero"),
            Self::IndexOutOfBounds { len, index } => {
                write!(f, "index {} out of bounds for a list of {} item(s)", index, len)
            }
            Self::TopLevelControlTransfer => {
                f.write_str("'stop'/'output' used outside of any procedure")
            }
            Self::NoValueProduced { name } => write!(
                f,
                "procedure '{}' produced no value via 'output'",
                name
            ),
            Self::RecursionLimit { limit } => {
                write!(f, "recursion limit of {} call(s) exceeded", limit)
            }
            Self::TooManyIterations { limit } => {
                write!(f, "loop exceeded the {}-iteration guard", limit)
            }
        }
    }
}

/// A runtime error with its source location and, for errors inside a
/// procedure call, the name of the offending procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub error_type: EvalErrorType,
    pub pos: Position,
    pub context: Option<String>,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "{} (in {}) at {}", self.error_type, ctx, self.pos),
            None => write!(f, "{} at {}", self.error_type, self.pos),
        }
    }
}

impl StdError for EvalError {}

/// The union of all error kinds this crate's pipeline can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lex(LexError),
    Parse(ParseError),
    Eval(EvalError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(e) => write!(f, "lexical error: {}", e),
            Self::Parse(e) => write!(f, "syntax error: {}", e),
            Self::Eval(e) => write!(f, "runtime error: {}", e),
        }
    }
}

impl StdError for Error {}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self {
        Error::Lex(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        Error::Eval(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
