//! Interpreter configuration
//!
//! Plain data built by the host (CLI flags, environment) and handed to
//! [`Interpreter::with_config`](crate::parser::Interpreter::with_config).

/// How shell command lines are launched: `<program> <flag> <line>`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShellConfig {
    pub program: String,
    pub flag: String,
}

impl ShellConfig {
    pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }
}

impl Default for ShellConfig {
    /// POSIX shell: `sh -c <line>`
    fn default() -> Self {
        Self::new("sh", "-c")
    }
}

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Settings for one interpreter instance
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpreterConfig {
    pub shell: ShellConfig,
    /// Script arguments, exposed to programs as the `argv` list
    pub argv: Vec<String>,
    /// Nested function calls allowed before `RecursionLimit`
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            shell: ShellConfig::default(),
            argv: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl InterpreterConfig {
    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = argv;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InterpreterConfig::default();
        assert_eq!(config.shell.program, "sh");
        assert_eq!(config.shell.flag, "-c");
        assert!(config.argv.is_empty());
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }

    #[test]
    fn test_builders() {
        let config = InterpreterConfig::default()
            .with_shell(ShellConfig::new("bash", "-c"))
            .with_argv(vec!["one".to_string()]);
        assert_eq!(config.shell, ShellConfig::new("bash", "-c"));
        assert_eq!(config.argv, vec!["one".to_string()]);
    }
}
