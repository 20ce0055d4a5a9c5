// orca-core/src/parser/mod.rs

pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod statement_parser;


pub use ast::{
    Expression, Program, ShellCommand, ShellPart, Statement, TemplatePart, VariableReading,
};
pub use environment::Environment;
pub use error::{OrcaError, Result};
pub use interpreter::{ControlFlow, Interpreter};
pub use lexer::{Lexer, Span, SpannedToken, Token, TokenKind};
pub use statement_parser::{parse_expression, parse_statements, parse_statements_with, StatementParser};
