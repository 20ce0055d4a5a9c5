//! Lazy tokenizer for Orca source text.
//!
//! The lexer runs in two modes. The normal mode produces the tokens of the
//! expression/statement grammar. The shell mode is entered on request by the
//! parser and turns the rest of a line into [`Token::ShellWord`]s, keeping the
//! raw text and its `$name` markers for later substitution.

use crate::parser::ast::{ShellPart, TemplatePart};
use crate::parser::error::{OrcaError, Result};
use std::fmt;

/// Position of a token in the source.
///
/// `start` and `end` are character offsets; `line` and `column` are 1-based and
/// point at the first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Span {
            start,
            end,
            line,
            column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Coarse classification of tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    String,
    TemplateString,
    Ident,
    Keyword,
    Operator,
    Punct,
    ShellWord,
    Newline,
    Stray,
    Eof,
}

/// Represents different types of tokens in the Orca language
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    // Literals
    Number(f64),                 // 12, 1.5
    Str(String),                 // 'raw text'
    Template(Vec<TemplatePart>), // "hello $name"
    Identifier(String),

    // Keywords
    If,
    Else,
    Func,
    For,
    In,
    Return,
    True,
    False,
    None,

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Caret,        // ^
    Bang,         // !
    EqualEqual,   // ==
    NotEqual,     // !=
    Less,         // <
    Greater,      // >
    LessEqual,    // <=
    GreaterEqual, // >=
    OrOr,         // ||
    AndAnd,       // &&
    Equals,       // =
    DotDot,       // ..

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Dot,          // .
    Semicolon,    // ;

    Newline,

    /// One whitespace-separated word of a shell command line
    ShellWord(Vec<ShellPart>),

    /// A character with no meaning in the expression grammar (`$`, `|`, `~`, ...)
    Stray(char),

    Eof,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Number(_) => TokenKind::Number,
            Token::Str(_) => TokenKind::String,
            Token::Template(_) => TokenKind::TemplateString,
            Token::Identifier(_) => TokenKind::Ident,
            Token::If
            | Token::Else
            | Token::Func
            | Token::For
            | Token::In
            | Token::Return
            | Token::True
            | Token::False
            | Token::None => TokenKind::Keyword,
            Token::Plus
            | Token::Minus
            | Token::Star
            | Token::Slash
            | Token::Caret
            | Token::Bang
            | Token::EqualEqual
            | Token::NotEqual
            | Token::Less
            | Token::Greater
            | Token::LessEqual
            | Token::GreaterEqual
            | Token::OrOr
            | Token::AndAnd
            | Token::Equals
            | Token::DotDot => TokenKind::Operator,
            Token::LeftParen
            | Token::RightParen
            | Token::LeftBrace
            | Token::RightBrace
            | Token::LeftBracket
            | Token::RightBracket
            | Token::Comma
            | Token::Dot
            | Token::Semicolon => TokenKind::Punct,
            Token::Newline => TokenKind::Newline,
            Token::ShellWord(_) => TokenKind::ShellWord,
            Token::Stray(_) => TokenKind::Stray,
            Token::Eof => TokenKind::Eof,
        }
    }

    /// Look up the keyword token for an identifier, if it is one
    fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "if" => Token::If,
            "else" => Token::Else,
            "func" => Token::Func,
            "for" => Token::For,
            "in" => Token::In,
            "return" => Token::Return,
            "true" => Token::True,
            "false" => Token::False,
            "none" => Token::None,
            _ => return None,
        };
        Some(token)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Template(parts) => {
                write!(f, "\"")?;
                for part in parts {
                    write!(f, "{}", part)?;
                }
                write!(f, "\"")
            }
            Token::Identifier(name) => write!(f, "{}", name),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Func => write!(f, "func"),
            Token::For => write!(f, "for"),
            Token::In => write!(f, "in"),
            Token::Return => write!(f, "return"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::None => write!(f, "none"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Bang => write!(f, "!"),
            Token::EqualEqual => write!(f, "=="),
            Token::NotEqual => write!(f, "!="),
            Token::Less => write!(f, "<"),
            Token::Greater => write!(f, ">"),
            Token::LessEqual => write!(f, "<="),
            Token::GreaterEqual => write!(f, ">="),
            Token::OrOr => write!(f, "||"),
            Token::AndAnd => write!(f, "&&"),
            Token::Equals => write!(f, "="),
            Token::DotDot => write!(f, ".."),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Semicolon => write!(f, ";"),
            Token::Newline => write!(f, "newline"),
            Token::ShellWord(parts) => {
                for part in parts {
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            Token::Stray(ch) => write!(f, "{}", ch),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

/// A token together with where it came from
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl SpannedToken {
    pub fn new(token: Token, span: Span) -> Self {
        SpannedToken { token, span }
    }

    /// Source text of the token, as it would be printed back
    pub fn lexeme(&self) -> String {
        self.token.to_string()
    }
}

/// Tokenizes input strings into tokens
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
    line: usize,
    column: usize,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Lexer {
            input: chars,
            position: 0,
            current_char,
            line: 1,
            column: 1,
        }
    }

    /// Move the lexer back (or forward) to the start of a previously produced span
    pub fn reset_to(&mut self, span: Span) {
        self.position = span.start;
        self.line = span.line;
        self.column = span.column;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Advance to the next character
    fn advance(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn span_from(&self, start: usize, line: usize, column: usize) -> Span {
        Span::new(start, self.position, line, column)
    }

    fn here(&self) -> Span {
        Span::new(self.position, self.position, self.line, self.column)
    }

    /// Skip blanks and `#` comments, stopping at newlines
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char {
            match ch {
                ' ' | '\t' | '\r' => self.advance(),
                '#' => {
                    while let Some(c) = self.current_char {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an integer or decimal literal
    fn read_number(&mut self) -> Result<Token> {
        let start = self.here();
        let mut text = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.current_char == Some('.') {
            match self.peek() {
                // range operator, leave it for the next token
                Some('.') => {}
                Some(next) if next.is_ascii_digit() => {
                    text.push('.');
                    self.advance();
                    while let Some(ch) = self.current_char {
                        if ch.is_ascii_digit() {
                            text.push(ch);
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                _ => {
                    return Err(OrcaError::lex(
                        format!("invalid numeric literal '{}.'", text),
                        start,
                    ))
                }
            }
        }

        if let Some(ch) = self.current_char {
            if is_ident_start(ch) {
                return Err(OrcaError::lex(
                    format!("invalid numeric literal '{}{}'", text, ch),
                    start,
                ));
            }
        }

        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| OrcaError::lex(format!("invalid numeric literal '{}'", text), start))
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut result = String::new();

        while let Some(ch) = self.current_char {
            if is_ident_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword(&result).unwrap_or(Token::Identifier(result))
    }

    /// Read a `$name` or `${name}` reference; the cursor is on the `$`.
    /// Returns `None` (without consuming anything) if no name follows.
    fn read_variable_marker(&mut self) -> Option<String> {
        match self.peek() {
            Some(ch) if is_ident_start(ch) => {
                self.advance(); // $
                let mut name = String::new();
                while let Some(c) = self.current_char {
                    if is_ident_char(c) {
                        name.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(name)
            }
            Some('{') => {
                let close = (self.position + 2..self.input.len())
                    .find(|&i| !is_ident_char(self.input[i]))
                    .filter(|&i| self.input[i] == '}' && i > self.position + 2)?;
                if !is_ident_start(self.input[self.position + 2]) {
                    return None;
                }
                let name: String = self.input[self.position + 2..close].iter().collect();
                while self.position <= close {
                    self.advance();
                }
                Some(name)
            }
            _ => None,
        }
    }

    /// Read a single-quoted string: raw text, no escapes
    fn read_raw_string(&mut self) -> Result<Token> {
        let start = self.here();
        self.advance(); // opening '
        let mut value = String::new();

        loop {
            match self.current_char {
                None => return Err(OrcaError::lex("unterminated string literal", start)),
                Some('\'') => {
                    self.advance();
                    return Ok(Token::Str(value));
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Read a double-quoted template string into literal and variable segments
    fn read_template(&mut self) -> Result<Token> {
        let start = self.here();
        self.advance(); // opening "
        let mut parts = Vec::new();
        let mut literal = String::new();

        loop {
            match self.current_char {
                None => return Err(OrcaError::lex("unterminated string literal", start)),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let escaped = match self.peek() {
                        Some('"') => Some('"'),
                        Some('\\') => Some('\\'),
                        Some('$') => Some('$'),
                        Some('n') => Some('\n'),
                        Some('t') => Some('\t'),
                        _ => None,
                    };
                    match escaped {
                        Some(ch) => {
                            literal.push(ch);
                            self.advance();
                            self.advance();
                        }
                        None => {
                            literal.push('\\');
                            self.advance();
                        }
                    }
                }
                Some('$') => match self.read_variable_marker() {
                    Some(name) => {
                        if !literal.is_empty() {
                            parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                        }
                        parts.push(TemplatePart::Variable(name));
                    }
                    None => {
                        literal.push('$');
                        self.advance();
                    }
                },
                Some(ch) => {
                    literal.push(ch);
                    self.advance();
                }
            }
        }

        if !literal.is_empty() {
            parts.push(TemplatePart::Literal(literal));
        }

        Ok(Token::Template(parts))
    }

    /// Produce a one- or two-character operator depending on the next character
    fn pair(&mut self, second: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.current_char == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<SpannedToken> {
        self.skip_trivia();

        let (start, line, column) = (self.position, self.line, self.column);

        let token = match self.current_char {
            None => Token::Eof,
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if is_ident_start(ch) => self.read_identifier(),
            Some('\'') => self.read_raw_string()?,
            Some('"') => self.read_template()?,
            Some('=') => self.pair('=', Token::EqualEqual, Token::Equals),
            Some('!') => self.pair('=', Token::NotEqual, Token::Bang),
            Some('<') => self.pair('=', Token::LessEqual, Token::Less),
            Some('>') => self.pair('=', Token::GreaterEqual, Token::Greater),
            Some('|') => self.pair('|', Token::OrOr, Token::Stray('|')),
            Some('&') => self.pair('&', Token::AndAnd, Token::Stray('&')),
            Some('.') => self.pair('.', Token::DotDot, Token::Dot),
            Some(ch) => {
                self.advance();
                match ch {
                    '\n' => Token::Newline,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '^' => Token::Caret,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    '{' => Token::LeftBrace,
                    '}' => Token::RightBrace,
                    '[' => Token::LeftBracket,
                    ']' => Token::RightBracket,
                    ',' => Token::Comma,
                    ';' => Token::Semicolon,
                    other => Token::Stray(other),
                }
            }
        };

        Ok(SpannedToken::new(token, self.span_from(start, line, column)))
    }

    /// Tokenize the entire input into a vector of tokens (ending with EOF)
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.token == Token::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Scan the rest of the current line as a shell command.
    ///
    /// Words are split on unquoted blanks. Quotes and backslash escapes are
    /// kept verbatim for the launcher; `$name` and `${name}` become variable
    /// parts everywhere except after a backslash. The terminating newline is
    /// not consumed. With `stop_at_brace`, an unquoted `}` also ends the line
    /// and is left in place for the enclosing block.
    pub fn read_shell_line(&mut self, stop_at_brace: bool) -> Result<Vec<SpannedToken>> {
        let mut words = Vec::new();

        loop {
            while matches!(self.current_char, Some(' ' | '\t' | '\r')) {
                self.advance();
            }

            match self.current_char {
                None | Some('\n') => break,
                Some('}') if stop_at_brace => break,
                Some('#') => {
                    self.skip_trivia();
                    break;
                }
                _ => {}
            }

            let (start, line, column) = (self.position, self.line, self.column);
            let parts = self.read_shell_word(stop_at_brace)?;
            words.push(SpannedToken::new(
                Token::ShellWord(parts),
                self.span_from(start, line, column),
            ));
        }

        Ok(words)
    }

    fn read_shell_word(&mut self, stop_at_brace: bool) -> Result<Vec<ShellPart>> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut quote: Option<(char, Span)> = None;

        loop {
            let ch = match self.current_char {
                Some(ch) => ch,
                None => break,
            };

            match (ch, quote) {
                (' ' | '\t' | '\r' | '\n', None) => break,
                ('}', None) if stop_at_brace => break,
                ('\'' | '"', None) => {
                    quote = Some((ch, self.here()));
                    literal.push(ch);
                    self.advance();
                }
                (q, Some((open, _))) if q == open => {
                    quote = None;
                    literal.push(ch);
                    self.advance();
                }
                ('\\', _) => {
                    literal.push('\\');
                    self.advance();
                    if let Some(next) = self.current_char {
                        literal.push(next);
                        self.advance();
                    }
                }
                ('$', _) => match self.read_variable_marker() {
                    Some(name) => {
                        if !literal.is_empty() {
                            parts.push(ShellPart::Literal(std::mem::take(&mut literal)));
                        }
                        parts.push(ShellPart::Variable(name));
                    }
                    None => {
                        literal.push('$');
                        self.advance();
                    }
                },
                _ => {
                    literal.push(ch);
                    self.advance();
                }
            }
        }

        if let Some((_, opened)) = quote {
            return Err(OrcaError::lex("unterminated quote in shell command", opened));
        }

        if !literal.is_empty() {
            parts.push(ShellPart::Literal(literal));
        }

        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_arithmetic_tokens() {
        assert_eq!(
            tokens("1+ 2 -1.2"),
            vec![
                Token::Number(1.0),
                Token::Plus,
                Token::Number(2.0),
                Token::Minus,
                Token::Number(1.2),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_newlines_are_tokens() {
        assert_eq!(
            tokens("1+2\n"),
            vec![
                Token::Number(1.0),
                Token::Plus,
                Token::Number(2.0),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_assignment_and_keywords() {
        assert_eq!(
            tokens("foo = none"),
            vec![
                Token::Identifier("foo".to_string()),
                Token::Equals,
                Token::None,
                Token::Eof,
            ]
        );
        assert_eq!(
            tokens("func for in return if else true false"),
            vec![
                Token::Func,
                Token::For,
                Token::In,
                Token::Return,
                Token::If,
                Token::Else,
                Token::True,
                Token::False,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("== != <= >= < > || && ! ^ = .."),
            vec![
                Token::EqualEqual,
                Token::NotEqual,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::Less,
                Token::Greater,
                Token::OrOr,
                Token::AndAnd,
                Token::Bang,
                Token::Caret,
                Token::Equals,
                Token::DotDot,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_range_does_not_eat_dots() {
        assert_eq!(
            tokens("1..3..-1"),
            vec![
                Token::Number(1.0),
                Token::DotDot,
                Token::Number(3.0),
                Token::DotDot,
                Token::Minus,
                Token::Number(1.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = Lexer::new("1.").tokenize().unwrap_err();
        assert!(matches!(err, OrcaError::Lex { .. }));
        assert!(err.to_string().contains("invalid numeric literal"));

        assert!(Lexer::new("12abc").tokenize().is_err());
    }

    #[test]
    fn test_raw_string() {
        assert_eq!(
            tokens("x='foo $bar'"),
            vec![
                Token::Identifier("x".to_string()),
                Token::Equals,
                Token::Str("foo $bar".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_template_string_segments() {
        assert_eq!(
            tokens(r#""$name Doe, ${n}th \$5""#),
            vec![
                Token::Template(vec![
                    TemplatePart::Variable("name".to_string()),
                    TemplatePart::Literal(" Doe, ".to_string()),
                    TemplatePart::Variable("n".to_string()),
                    TemplatePart::Literal("th $5".to_string()),
                ]),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        assert_eq!(
            tokens(r#""cost: $ 5""#),
            vec![
                Token::Template(vec![TemplatePart::Literal("cost: $ 5".to_string())]),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("x = \"abc").tokenize().unwrap_err();
        match err {
            OrcaError::Lex { message, span } => {
                assert!(message.contains("unterminated"));
                assert_eq!(span.line, 1);
                assert_eq!(span.column, 5);
            }
            other => panic!("Expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_are_discarded() {
        assert_eq!(
            tokens("x # the answer\ny"),
            vec![
                Token::Identifier("x".to_string()),
                Token::Newline,
                Token::Identifier("y".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_stray_characters() {
        assert_eq!(
            tokens("ls | wc $x"),
            vec![
                Token::Identifier("ls".to_string()),
                Token::Stray('|'),
                Token::Identifier("wc".to_string()),
                Token::Stray('$'),
                Token::Identifier("x".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let toks = Lexer::new("a\n  bb").tokenize().unwrap();
        assert_eq!(toks[2].span, Span::new(4, 6, 2, 3));
        assert_eq!(toks[2].lexeme(), "bb");
    }

    #[test]
    fn test_token_kinds() {
        assert_eq!(Token::Number(1.0).kind(), TokenKind::Number);
        assert_eq!(Token::If.kind(), TokenKind::Keyword);
        assert_eq!(Token::DotDot.kind(), TokenKind::Operator);
        assert_eq!(Token::Comma.kind(), TokenKind::Punct);
        assert_eq!(Token::ShellWord(vec![]).kind(), TokenKind::ShellWord);
    }

    fn shell_words(input: &str, stop_at_brace: bool) -> Vec<Vec<ShellPart>> {
        Lexer::new(input)
            .read_shell_line(stop_at_brace)
            .unwrap()
            .into_iter()
            .map(|t| match t.token {
                Token::ShellWord(parts) => parts,
                other => panic!("Expected shell word, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_shell_line_words() {
        assert_eq!(
            shell_words("ls $path | grep '..tmp'\nnext", false),
            vec![
                vec![ShellPart::Literal("ls".to_string())],
                vec![ShellPart::Variable("path".to_string())],
                vec![ShellPart::Literal("|".to_string())],
                vec![ShellPart::Literal("grep".to_string())],
                vec![ShellPart::Literal("'..tmp'".to_string())],
            ]
        );
    }

    #[test]
    fn test_shell_quotes_group_words() {
        assert_eq!(
            shell_words(r#"env "FOO=$x bar" cmd"#, false),
            vec![
                vec![ShellPart::Literal("env".to_string())],
                vec![
                    ShellPart::Literal("\"FOO=".to_string()),
                    ShellPart::Variable("x".to_string()),
                    ShellPart::Literal(" bar\"".to_string()),
                ],
                vec![ShellPart::Literal("cmd".to_string())],
            ]
        );
    }

    #[test]
    fn test_shell_escaped_dollar() {
        assert_eq!(
            shell_words(r"echo \$HOME", false),
            vec![
                vec![ShellPart::Literal("echo".to_string())],
                vec![ShellPart::Literal(r"\$HOME".to_string())],
            ]
        );
    }

    #[test]
    fn test_shell_line_stops_at_brace() {
        let mut lexer = Lexer::new("echo $i }");
        let words = lexer.read_shell_line(true).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(lexer.next_token().unwrap().token, Token::RightBrace);
    }

    #[test]
    fn test_shell_unterminated_quote() {
        let result = Lexer::new("echo 'oops").read_shell_line(false);
        assert!(result.is_err());
    }
}
