use crate::parser::lexer::Span;
use thiserror::Error;

/// Result alias used throughout the core
pub type Result<T> = std::result::Result<T, OrcaError>;

/// Every failure the lexer, parser and interpreter can report.
///
/// Errors are never caught inside the language; the first one aborts the
/// current evaluation unit (a script, or one REPL entry).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrcaError {
    #[error("Lex error at {span}: {message}")]
    Lex { message: String, span: Span },

    #[error("Parse error at {span}: {message}")]
    Parse { message: String, span: Span },

    #[error("Type error: {0}")]
    Type(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("{name}() takes {expected} argument(s), {found} given")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{kind} has no member '{name}'")]
    UnknownMethod { kind: String, name: String },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Command `{command}` {}", exit_description(.code))]
    ShellCommand { command: String, code: Option<i32> },

    #[error("Failed to launch `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("Maximum call depth of {0} exceeded")]
    RecursionLimit(usize),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl OrcaError {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        OrcaError::Lex {
            message: message.into(),
            span,
        }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        OrcaError::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        OrcaError::Type(message.into())
    }

    pub fn index(message: impl Into<String>) -> Self {
        OrcaError::Index(message.into())
    }

    /// Source position, for errors raised before evaluation
    pub fn span(&self) -> Option<Span> {
        match self {
            OrcaError::Lex { span, .. } | OrcaError::Parse { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// Format the error with the offending source line and a caret under the
    /// reported column. Errors without a span render as their message.
    pub fn render(&self, source: &str) -> String {
        let span = match self.span() {
            Some(span) => span,
            None => return self.to_string(),
        };

        let line_text = source.lines().nth(span.line.saturating_sub(1)).unwrap_or("");
        let gutter = format!("{} | ", span.line);
        let caret_width = span.end.saturating_sub(span.start).max(1);
        let caret = format!(
            "{}{}",
            " ".repeat(gutter.len() + span.column.saturating_sub(1)),
            "^".repeat(caret_width.min(line_text.chars().count().max(1)))
        );

        format!("{}\n{}{}\n{}", self, gutter, line_text, paint_caret(caret))
    }
}

#[cfg(feature = "colored")]
fn paint_caret(caret: String) -> String {
    use colored::Colorize;
    caret.red().bold().to_string()
}

#[cfg(not(feature = "colored"))]
fn paint_caret(caret: String) -> String {
    caret
}
