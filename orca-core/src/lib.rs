//! # Orca Core
//!
//! Lexer, parser and tree-walking interpreter for the Orca scripting
//! language: a small imperative language in which external commands are
//! first-class expressions whose output becomes a string value.
//!
//! ## Features
//!
//! - **serde**: Serialize/deserialize spans, tokens and the AST
//! - **colored**: Colored carets in rendered error diagnostics
//!
//! ## Example
//!
//! ```ignore
//! use orca_core::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! let value = interpreter.run_source("name = 'John'\n\"$name Doe\"")?;
//! assert_eq!(value.unwrap().to_string(), "John Doe");
//! ```

pub mod parser;
pub mod shell;
mod stack;
pub mod types;

// Re-export commonly used types
pub use parser::{parse_statements, Interpreter, OrcaError, Program, Result};
pub use shell::CommandSet;
pub use types::{InterpreterConfig, ShellConfig, Value};
