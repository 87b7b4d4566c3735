//! # logoscript
//!
//! A small Logo-family turtle-graphics language: a lexer, a recursive-descent
//! operator-precedence parser, and a tree-walking evaluator, driving a turtle
//! that records every pen-down move as a line segment.
//!
//! ## A quick example
//!
//! ```
//! use logoscript::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.run(r#"
//!     to square :side
//!         repeat 4 [forward :side right 90]
//!     end
//!     square 100
//! "#).unwrap();
//!
//! assert_eq!(interp.turtle().lines().len(), 4);
//! ```

mod ast;
mod engine;
mod error;
mod parse;
mod scope;
mod token;
mod turtle;
mod value;

pub use engine::{Interpreter, Limits};
pub use error::{Error, EvalError, EvalErrorType, ParseError, ParseErrorType, Result};
pub use token::{LexError, Position};
pub use turtle::{LineSegment, Turtle};
pub use value::Value;
