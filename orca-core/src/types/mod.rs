// orca-core/src/types/mod.rs

pub mod config;
pub mod range;
pub mod value;

pub use config::{InterpreterConfig, ShellConfig};
pub use range::Range;
pub use value::{Function, Value};
