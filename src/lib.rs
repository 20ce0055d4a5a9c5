//! # Orca
//!
//! Orca is a small scripting language meant as an alternative to shell
//! scripts: ordinary values, functions and control flow, with external
//! commands usable directly as expressions whose output becomes a string.
//!
//! The language itself lives in `orca-core`; this crate is the host around it.
//!
//! ## Modules
//!
//! - `commands`: REPL meta-commands (`help`, `vars`, `:reset`, `quit`).
//! - `repl`: The interactive Read-Eval-Print Loop.

pub mod commands;
pub mod repl;

// Re-export commonly used types and functions for convenience
pub use orca_core::{parse_statements, Interpreter, InterpreterConfig, OrcaError, ShellConfig, Value};
