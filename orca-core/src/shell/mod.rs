//! Shell bridge: turns a parsed command into a command line, runs it through
//! the configured launcher and hands back its output.

pub mod commands;

pub use commands::CommandSet;

use crate::parser::ast::{ShellCommand, ShellPart};
use crate::parser::environment::Environment;
use crate::parser::error::{OrcaError, Result};
use crate::types::config::ShellConfig;
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Where a command's standard output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collected and returned as a string value
    Capture,
    /// Written straight to the interpreter's stdout
    Inherit,
}

/// Runs command lines through `<program> <flag> <line>`
#[derive(Debug, Clone, Default)]
pub struct Shell {
    config: ShellConfig,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        Shell { config }
    }

    /// Substitute every `$name` with the template form of its value and join
    /// the words with single spaces
    pub fn render(command: &ShellCommand, env: &Environment) -> Result<String> {
        let mut words = Vec::with_capacity(command.words.len());

        for word in &command.words {
            let mut text = String::new();
            for part in word {
                match part {
                    ShellPart::Literal(literal) => text.push_str(literal),
                    ShellPart::Variable(name) => text.push_str(&env.lookup(name)?.template_form()),
                }
            }
            words.push(text);
        }

        Ok(words.join(" "))
    }

    /// Run a command line. Returns the captured stdout in [`OutputMode::Capture`],
    /// `None` otherwise.
    pub fn run(&self, line: &str, mode: OutputMode) -> Result<Option<String>> {
        debug!(command = %line, ?mode, "running shell command");

        let mut command = Command::new(&self.config.program);
        command
            .arg(&self.config.flag)
            .arg(line)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit());

        let spawn_error = |err: std::io::Error| OrcaError::Spawn {
            command: line.to_string(),
            message: err.to_string(),
        };

        match mode {
            OutputMode::Capture => {
                let output = command.stdout(Stdio::piped()).output().map_err(spawn_error)?;
                check_status(line, output.status)?;
                let text = String::from_utf8_lossy(&output.stdout);
                Ok(Some(strip_trailing_newline(&text).to_string()))
            }
            OutputMode::Inherit => {
                // keep our own buffered output ahead of the child's
                let _ = std::io::stdout().flush();
                let status = command.stdout(Stdio::inherit()).status().map_err(spawn_error)?;
                check_status(line, status)?;
                Ok(None)
            }
        }
    }

    pub fn capture(&self, line: &str) -> Result<String> {
        Ok(self.run(line, OutputMode::Capture)?.unwrap_or_default())
    }
}

fn check_status(line: &str, status: ExitStatus) -> Result<()> {
    debug!(command = %line, code = ?status.code(), "shell command finished");
    if status.success() {
        Ok(())
    } else {
        Err(OrcaError::ShellCommand {
            command: line.to_string(),
            code: status.code(),
        })
    }
}

/// Drop one trailing `\n` or `\r\n`
fn strip_trailing_newline(text: &str) -> &str {
    text.strip_suffix('\n')
        .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Value;

    fn word(text: &str) -> Vec<ShellPart> {
        vec![ShellPart::Literal(text.to_string())]
    }

    #[test]
    fn test_strip_trailing_newline() {
        assert_eq!(strip_trailing_newline("a\n"), "a");
        assert_eq!(strip_trailing_newline("a\r\n"), "a");
        assert_eq!(strip_trailing_newline("a\n\n"), "a\n");
        assert_eq!(strip_trailing_newline("a"), "a");
    }

    #[test]
    fn test_render_substitutes_template_forms() {
        let env = Environment::new();
        env.define("file", Value::from("a.txt"));
        env.define("n", Value::Number(2.0));
        env.define("nothing", Value::None);

        let command = ShellCommand::new(vec![
            word("cat"),
            vec![
                ShellPart::Literal("dir/".to_string()),
                ShellPart::Variable("file".to_string()),
            ],
            vec![ShellPart::Variable("n".to_string())],
            vec![ShellPart::Variable("nothing".to_string())],
        ]);

        assert_eq!(Shell::render(&command, &env).unwrap(), "cat dir/a.txt 2 ");
    }

    #[test]
    fn test_render_undefined_variable() {
        let env = Environment::new();
        let command = ShellCommand::new(vec![word("echo"), vec![ShellPart::Variable("x".to_string())]]);
        assert_eq!(
            Shell::render(&command, &env),
            Err(OrcaError::UndefinedVariable("x".to_string()))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_output() {
        let shell = Shell::default();
        assert_eq!(shell.capture("echo hello").unwrap(), "hello");
        assert_eq!(shell.capture("printf 'a\\nb\\n'").unwrap(), "a\nb");
        assert_eq!(shell.capture("true").unwrap(), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit() {
        let shell = Shell::default();
        assert_eq!(
            shell.capture("exit 3"),
            Err(OrcaError::ShellCommand {
                command: "exit 3".to_string(),
                code: Some(3),
            })
        );
        assert!(shell.run("false", OutputMode::Inherit).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_inherit_returns_none() {
        let shell = Shell::default();
        assert_eq!(shell.run("true", OutputMode::Inherit).unwrap(), None);
    }

    #[test]
    fn test_spawn_failure() {
        let shell = Shell::new(ShellConfig::new("/no/such/launcher", "-c"));
        assert!(matches!(
            shell.capture("echo hi"),
            Err(OrcaError::Spawn { .. })
        ));
    }
}
