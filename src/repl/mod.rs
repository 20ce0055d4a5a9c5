//! REPL (Read-Eval-Print Loop) for the Orca language

use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use anyhow::Result;
use colored::*;
use orca_core::{parse_statements, Interpreter, InterpreterConfig, Value};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use tracing::debug;

/// Interactive REPL for the Orca language
pub struct Repl {
    editor: DefaultEditor,
    interpreter: Interpreter,
    registry: CommandRegistry,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(config: InterpreterConfig) -> RustylineResult<Self> {
        Ok(Repl {
            editor: DefaultEditor::new()?,
            interpreter: Interpreter::with_config(config),
            registry: create_registry(),
        })
    }

    /// Read lines until `quit` or end of input
    pub fn run(&mut self) -> Result<()> {
        println!("{}", "Orca REPL".bright_cyan().bold());
        println!("Type {} for help, {} to exit.", "help".bright_green(), "quit".bright_red());

        let mut buffer = String::new();
        loop {
            let prompt = if buffer.is_empty() { "orca> " } else { "  ... " };
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !buffer.is_empty() {
                        buffer.push('\n');
                    }
                    buffer.push_str(&line);

                    if needs_continuation(&buffer) {
                        continue;
                    }

                    let input = std::mem::take(&mut buffer);
                    if input.trim().is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(input.as_str());

                    if !self.handle_input(&input) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C drops a pending multi-line entry first
                    if !buffer.is_empty() {
                        buffer.clear();
                        continue;
                    }
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    println!(
                        "{} {}",
                        "Error reading input:".bright_red().bold(),
                        err.to_string().red()
                    );
                    break;
                }
            }
        }

        Ok(())
    }

    /// Dispatch one complete entry. Returns `false` when the session ends.
    pub fn handle_input(&mut self, input: &str) -> bool {
        let mut ctx = CommandContext::new(&mut self.interpreter);
        match self.registry.execute(input, &mut ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => {
                println!("{}", "Goodbye!".bright_cyan());
                return false;
            }
            CommandResult::Error(e) => {
                println!("{} {}", "Error:".bright_red().bold(), e.red());
            }
            CommandResult::NotACommand => self.evaluate(input),
        }
        true
    }

    fn evaluate(&mut self, input: &str) {
        let program = match parse_statements(input) {
            Ok(program) => program,
            Err(e) => {
                println!("{}", e.render(input).red());
                return;
            }
        };

        debug!(statements = program.statements.len(), "running REPL entry");
        match self.interpreter.run_program(&program) {
            Ok(Some(Value::None)) | Ok(None) => {}
            Ok(Some(value)) => println!("{}", value),
            Err(e) => println!("{} {}", "Error:".bright_red().bold(), e.to_string().red()),
        }
    }
}

/// Whether `source` has unclosed `(`, `[` or `{` outside strings and comments
pub fn needs_continuation(source: &str) -> bool {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' && q == '"' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '\\' => {
                    chars.next();
                }
                '#' => {
                    // comment runs to the end of the line
                    for next in chars.by_ref() {
                        if next == '\n' {
                            break;
                        }
                    }
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            },
        }
    }

    depth > 0
}

/// Convenience function to start the REPL
pub fn start(config: InterpreterConfig) -> Result<()> {
    let mut repl =
        Repl::new(config).map_err(|e| anyhow::anyhow!("Failed to initialize REPL: {}", e))?;
    repl.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_lines_complete() {
        assert!(!needs_continuation("x = 1"));
        assert!(!needs_continuation("func f() { return 1 }"));
        assert!(!needs_continuation("xs = [1, (2)]"));
        assert!(!needs_continuation(""));
    }

    #[test]
    fn test_open_brackets_continue() {
        assert!(needs_continuation("func f() {"));
        assert!(needs_continuation("xs = [1,"));
        assert!(needs_continuation("for i in 0..3 {\n  if i > 1 {\n  }"));
        assert!(!needs_continuation("for i in 0..3 {\n  x = i\n}"));
    }

    #[test]
    fn test_brackets_in_strings_and_comments_ignored() {
        assert!(!needs_continuation("s = '{'"));
        assert!(!needs_continuation("s = \"\\\"(\""));
        assert!(!needs_continuation("x = 1 # {"));
        assert!(needs_continuation("if x { # }\n"));
    }

    #[test]
    fn test_stray_closers_do_not_continue() {
        assert!(!needs_continuation(")"));
    }
}
