//! Statement parser
//!
//! Parses statements like:
//! - `x = 1 + 2` and `list[0] = 'a'`
//! - `files = ls -la` (shell command in value position)
//! - `if cond { ... } else if other { ... } else { ... }`
//! - `for i in 0..10 { ... }`
//! - `func add(x, y) { return x + y }`
//! - `echo "hello $name"` (shell command statement)
//!
//! Tokens are pulled from the lexer on demand. When a line turns out to be a
//! shell command, the lexer is rewound to the start of the line and rescanned
//! in shell mode.

use crate::parser::ast::{
    BinaryOp, Expression, Program, ShellCommand, ShellPart, Statement, UnaryOp,
};
use crate::parser::error::{OrcaError, Result};
use crate::parser::lexer::{Lexer, Span, SpannedToken, Token};
use crate::shell::CommandSet;
use crate::stack::ensure_sufficient_stack;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

/// Deepest nesting of groups, unary operators and blocks accepted
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parses statements and programs (sequences of statements)
pub struct StatementParser<'a> {
    lexer: Lexer,
    /// Buffered tokens; never empty once constructed
    lookahead: VecDeque<SpannedToken>,
    commands: &'a CommandSet,
    /// Open `(`/`[` groups; newlines inside them are insignificant
    nesting: usize,
    /// Open `{` blocks; an unquoted `}` ends a shell line inside one
    block_depth: usize,
    /// First lexer failure; sticky until the line is rescanned as a command
    lex_error: Option<OrcaError>,
    /// Current syntactic nesting, capped at `MAX_NESTING_DEPTH`
    depth: usize,
}

impl StatementParser<'static> {
    /// Create a parser that recognizes the commands found on `PATH`
    pub fn new(input: &str) -> Result<Self> {
        StatementParser::with_commands(input, CommandSet::from_env())
    }
}

impl<'a> StatementParser<'a> {
    /// Create a parser with an explicit command set
    pub fn with_commands(input: &str, commands: &'a CommandSet) -> Result<Self> {
        let mut parser = StatementParser {
            lexer: Lexer::new(input),
            lookahead: VecDeque::new(),
            commands,
            nesting: 0,
            block_depth: 0,
            lex_error: None,
            depth: 0,
        };
        parser.fill(0)?;
        Ok(parser)
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    /// Make sure at least `n + 1` tokens are buffered
    fn fill(&mut self, n: usize) -> Result<()> {
        while self.lookahead.len() <= n {
            if let Some(err) = &self.lex_error {
                return Err(err.clone());
            }
            let token = match self.lexer.next_token() {
                Ok(token) => token,
                Err(err) => {
                    self.lex_error = Some(err.clone());
                    return Err(err);
                }
            };
            if self.nesting > 0 && token.token == Token::Newline {
                continue;
            }
            self.lookahead.push_back(token);
        }
        Ok(())
    }

    /// Current token
    fn current(&self) -> &Token {
        self.lookahead
            .front()
            .map(|st| &st.token)
            .unwrap_or(&Token::Eof)
    }

    /// Current span (position in source)
    fn current_span(&self) -> Span {
        self.lookahead
            .front()
            .map(|st| st.span)
            .unwrap_or_default()
    }

    /// Peek `n` tokens past the current one
    fn peek(&mut self, n: usize) -> Result<Token> {
        self.fill(n)?;
        Ok(self
            .lookahead
            .get(n)
            .map(|st| st.token.clone())
            .unwrap_or(Token::Eof))
    }

    /// Advance to the next token
    fn advance(&mut self) -> Result<()> {
        self.lookahead.pop_front();
        self.drop_grouped_newlines();
        self.fill(0)
    }

    fn drop_grouped_newlines(&mut self) {
        while self.nesting > 0 && self.current() == &Token::Newline {
            self.lookahead.pop_front();
        }
    }

    fn open_group(&mut self) -> Result<()> {
        self.nesting += 1;
        self.advance()
    }

    fn close_group(&mut self, closer: &Token) -> Result<()> {
        if !self.check(closer) {
            return Err(self.unexpected(&format!("'{}'", closer)));
        }
        self.nesting -= 1;
        self.advance()
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(OrcaError::parse(
                format!("Nesting deeper than {} levels", MAX_NESTING_DEPTH),
                self.current_span(),
            ));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.depth -= 1;
        result
    }

    /// Expect a specific token
    fn expect(&mut self, expected: &Token) -> Result<()> {
        if self.check(expected) {
            self.advance()
        } else {
            Err(self.unexpected(&format!("'{}'", expected)))
        }
    }

    /// Check if current token matches (without consuming)
    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn unexpected(&self, wanted: &str) -> OrcaError {
        OrcaError::parse(
            format!("Expected {}, found '{}'", wanted, self.current()),
            self.current_span(),
        )
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn is_separator(&self) -> bool {
        matches!(self.current(), Token::Newline | Token::Semicolon)
    }

    fn skip_separators(&mut self) -> Result<()> {
        while self.is_separator() {
            self.advance()?;
        }
        Ok(())
    }

    /// Whether the current token can end a simple statement
    fn at_statement_end(&self) -> bool {
        match self.current() {
            Token::Newline | Token::Semicolon | Token::Eof => true,
            Token::RightBrace => self.block_depth > 0,
            _ => false,
        }
    }

    fn expect_statement_end(&mut self) -> Result<()> {
        if !self.at_statement_end() {
            return Err(self.unexpected("end of statement"));
        }
        if self.is_separator() {
            self.advance()?;
        }
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse a complete program (sequence of statements)
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut program = Program::new();

        loop {
            self.skip_separators()?;
            if self.check(&Token::Eof) {
                break;
            }
            if self.check(&Token::RightBrace) {
                return Err(self.unexpected("statement"));
            }
            program.push(self.parse_statement()?);
        }

        Ok(program)
    }

    /// Parse a single statement
    pub fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::If => return self.parse_if_statement(),
            Token::For => return self.parse_for_statement(),
            Token::Func => return self.parse_function_def(),
            Token::LeftBrace => return self.parse_block_statement(),
            _ => {}
        }

        let statement = match self.current().clone() {
            Token::Return => self.parse_return_statement()?,
            Token::Identifier(name) if self.peek(1).ok() == Some(Token::Equals) => {
                self.advance()?; // identifier
                self.advance()?; // =
                let value = self.parse_value()?;
                Statement::Assign { name, value }
            }
            _ => {
                let expr = self.parse_value()?;
                match expr {
                    Expression::Index { target, index } if self.check(&Token::Equals) => {
                        self.advance()?;
                        let value = self.parse_value()?;
                        Statement::IndexAssign {
                            target: *target,
                            index: *index,
                            value,
                        }
                    }
                    expr => Statement::Expression(expr),
                }
            }
        };

        self.expect_statement_end()?;
        Ok(statement)
    }

    /// Parse: if <condition> { ... } [else if <condition> { ... }]* [else { ... }]
    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.expect(&Token::If)?;

        let mut branches = Vec::new();
        let condition = self.parse_expression()?;
        branches.push((condition, self.parse_block()?));

        let mut else_body = None;
        loop {
            // `else` may start on the next line
            if !self.skip_to_else()? {
                break;
            }
            self.expect(&Token::Else)?;

            if self.check(&Token::If) {
                self.advance()?;
                let condition = self.parse_expression()?;
                branches.push((condition, self.parse_block()?));
            } else {
                else_body = Some(self.parse_block()?);
                break;
            }
        }

        Ok(Statement::If {
            branches,
            else_body,
        })
    }

    /// Skip newlines only if an `else` follows them
    fn skip_to_else(&mut self) -> Result<bool> {
        let mut n = 0;
        loop {
            match self.peek(n)? {
                Token::Newline => n += 1,
                Token::Else => break,
                _ => return Ok(false),
            }
        }
        for _ in 0..n {
            self.advance()?;
        }
        Ok(true)
    }

    /// Parse: for <ident> in <expression> { ... }
    fn parse_for_statement(&mut self) -> Result<Statement> {
        self.expect(&Token::For)?;
        let var = self.expect_identifier("loop variable")?;
        self.expect(&Token::In)?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;

        Ok(Statement::For {
            var,
            iterable,
            body,
        })
    }

    /// Parse: func name(param1, param2, ...) { body }
    fn parse_function_def(&mut self) -> Result<Statement> {
        self.expect(&Token::Func)?;
        let name = self.expect_identifier("function name")?;

        self.expect(&Token::LeftParen)?;
        self.nesting += 1;
        self.drop_grouped_newlines();

        let mut params = Vec::new();
        while !self.check(&Token::RightParen) {
            let param = self.expect_identifier("parameter name")?;
            if params.contains(&param) {
                return Err(OrcaError::parse(
                    format!("Duplicate parameter '{}'", param),
                    self.current_span(),
                ));
            }
            params.push(param);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance()?;
        }
        self.close_group(&Token::RightParen)?;

        let body = self.parse_block()?;

        Ok(Statement::FunctionDef {
            name,
            params,
            body: Rc::new(body),
        })
    }

    /// Parse: return [value]
    fn parse_return_statement(&mut self) -> Result<Statement> {
        self.expect(&Token::Return)?;

        if self.at_statement_end() {
            Ok(Statement::Return(None))
        } else {
            Ok(Statement::Return(Some(self.parse_value()?)))
        }
    }

    /// Parse: { statements }
    fn parse_block_statement(&mut self) -> Result<Statement> {
        Ok(Statement::Block(self.parse_block()?))
    }

    /// Parse a block: { statement* }
    fn parse_block(&mut self) -> Result<Vec<Statement>> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Vec<Statement>> {
        self.expect(&Token::LeftBrace)?;
        self.block_depth += 1;

        let mut statements = Vec::new();
        loop {
            self.skip_separators()?;
            if self.check(&Token::RightBrace) {
                break;
            }
            if self.check(&Token::Eof) {
                return Err(self.unexpected("'}'"));
            }
            statements.push(self.parse_statement()?);
        }

        self.block_depth -= 1;
        self.expect(&Token::RightBrace)?;

        Ok(statements)
    }

    // =========================================================================
    // Shell commands
    // =========================================================================

    /// Parse the value of a statement, an assignment or a `return`, which may
    /// be either an expression or a shell command line
    ///
    /// A line led by a known command name is a command. When the same line
    /// also reads as an expression, that reading rides along and wins at run
    /// time if the name is bound as a variable, so `sum + i` still adds.
    fn parse_value(&mut self) -> Result<Expression> {
        let start = self.current_span();
        let first = self.current().clone();

        let known_command = match &first {
            Token::Identifier(name)
                if self.commands.contains(name)
                    && !matches!(
                        self.peek(1).ok(),
                        Some(Token::Equals | Token::LeftParen | Token::Dot | Token::LeftBracket)
                    ) =>
            {
                Some(name.clone())
            }
            _ => None,
        };

        let may_be_command = matches!(
            first,
            Token::Identifier(_) | Token::Dot | Token::Slash | Token::Stray(_)
        );
        let nesting = self.nesting;

        let attempt = self.parse_expression();
        let complete = match &attempt {
            Ok(Expression::Index { .. }) => self.at_statement_end() || self.check(&Token::Equals),
            Ok(_) => self.at_statement_end(),
            Err(_) => false,
        };

        if let Some(name) = known_command {
            trace!(command = %name, "known command starts shell line");
            // A shell line runs to the end of the line, past any `;`
            let alternative = match attempt {
                Ok(expr) if complete && !self.check(&Token::Semicolon) => Some(expr),
                _ => None,
            };
            self.nesting = nesting;
            let command = self.parse_shell_command(start)?;
            return Ok(Expression::Shell(match alternative {
                Some(expr) => command.with_alternative(name, expr),
                None => command,
            }));
        }

        if complete {
            return attempt;
        }

        if may_be_command {
            debug!(line = start.line, "not an expression, reading as shell command");
            self.nesting = nesting;
            return self.parse_shell_command(start).map(Expression::Shell);
        }

        attempt?;
        Err(self.unexpected("end of statement"))
    }

    /// Rescan the source from `start` to the end of the line as a command
    fn parse_shell_command(&mut self, start: Span) -> Result<ShellCommand> {
        self.lexer.reset_to(start);
        self.lookahead.clear();
        self.lex_error = None;

        let words: Vec<Vec<ShellPart>> = self
            .lexer
            .read_shell_line(self.block_depth > 0)?
            .into_iter()
            .filter_map(|st| match st.token {
                Token::ShellWord(parts) => Some(parts),
                _ => None,
            })
            .collect();

        if words.is_empty() {
            return Err(OrcaError::parse("Expected command", start));
        }

        self.fill(0)?;
        Ok(ShellCommand::new(words))
    }

    // =========================================================================
    // Expression Parsing
    // =========================================================================

    /// Parse an expression (handles operator precedence)
    /// Grammar: expression = logical_or_expr
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_logical_or_expression()
    }

    /// Grammar: logical_or_expr = logical_and_expr ('||' logical_and_expr)*
    fn parse_logical_or_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_and_expression()?;

        while self.check(&Token::OrOr) {
            self.advance()?;
            let right = self.parse_logical_and_expression()?;
            left = Expression::binary(left, BinaryOp::Or, right);
        }

        Ok(left)
    }

    /// Grammar: logical_and_expr = comparison_expr ('&&' comparison_expr)*
    fn parse_logical_and_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_comparison_expression()?;

        while self.check(&Token::AndAnd) {
            self.advance()?;
            let right = self.parse_comparison_expression()?;
            left = Expression::binary(left, BinaryOp::And, right);
        }

        Ok(left)
    }

    /// Grammar: comparison_expr = range_expr (('==' | '!=' | '<' | '>' | '<=' | '>=') range_expr)*
    fn parse_comparison_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_range_expression()?;

        loop {
            let op = match self.current() {
                Token::EqualEqual => BinaryOp::Equal,
                Token::NotEqual => BinaryOp::NotEqual,
                Token::Less => BinaryOp::Less,
                Token::Greater => BinaryOp::Greater,
                Token::LessEqual => BinaryOp::LessEqual,
                Token::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_range_expression()?;
            left = Expression::binary(left, op, right);
        }

        Ok(left)
    }

    /// Grammar: range_expr = additive_expr ('..' additive_expr ('..' additive_expr)?)?
    fn parse_range_expression(&mut self) -> Result<Expression> {
        let start = self.parse_additive_expression()?;

        if !self.check(&Token::DotDot) {
            return Ok(start);
        }
        self.advance()?;
        let end = self.parse_additive_expression()?;

        let step = if self.check(&Token::DotDot) {
            self.advance()?;
            Some(Box::new(self.parse_additive_expression()?))
        } else {
            None
        };

        Ok(Expression::Range {
            start: Box::new(start),
            end: Box::new(end),
            step,
        })
    }

    /// Grammar: additive_expr = multiplicative_expr (('+' | '-') multiplicative_expr)*
    fn parse_additive_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let op = match self.current() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative_expression()?;
            left = Expression::binary(left, op, right);
        }

        Ok(left)
    }

    /// Grammar: multiplicative_expr = unary_expr (('*' | '/') unary_expr)*
    fn parse_multiplicative_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary_expression()?;

        loop {
            let op = match self.current() {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary_expression()?;
            left = Expression::binary(left, op, right);
        }

        Ok(left)
    }

    /// Grammar: unary_expr = ('-' | '!') unary_expr | power_expr
    fn parse_unary_expression(&mut self) -> Result<Expression> {
        self.nested(Self::parse_unary_operand)
    }

    fn parse_unary_operand(&mut self) -> Result<Expression> {
        let op = match self.current() {
            Token::Minus => UnaryOp::Negate,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_power_expression(),
        };
        self.advance()?;
        let operand = self.parse_unary_expression()?;
        Ok(Expression::unary(op, operand))
    }

    /// Grammar: power_expr = postfix_expr ('^' unary_expr)?
    ///
    /// Right associative, and tighter than a leading minus: `-2 ^ 2` is -4.
    fn parse_power_expression(&mut self) -> Result<Expression> {
        let base = self.parse_postfix_expression()?;

        if self.check(&Token::Caret) {
            self.advance()?;
            let exponent = self.parse_unary_expression()?;
            return Ok(Expression::binary(base, BinaryOp::Power, exponent));
        }

        Ok(base)
    }

    /// Grammar: postfix_expr = primary ('.' ident ('(' args ')')? | '[' expr ']' | '(' args ')')*
    fn parse_postfix_expression(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            match self.current() {
                Token::Dot => {
                    self.advance()?;
                    let name = self.expect_identifier("member name")?;
                    let args = if self.check(&Token::LeftParen) {
                        self.parse_arguments()?
                    } else {
                        Vec::new()
                    };
                    expr = Expression::MemberCall {
                        receiver: Box::new(expr),
                        name,
                        args,
                    };
                }
                Token::LeftBracket => {
                    self.open_group()?;
                    let index = self.parse_expression()?;
                    self.close_group(&Token::RightBracket)?;
                    expr = Expression::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Token::LeftParen => {
                    let args = self.parse_arguments()?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse `(a, b, ...)`, allowing a trailing comma
    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        self.parse_delimited(&Token::LeftParen, &Token::RightParen)
    }

    fn parse_delimited(&mut self, open: &Token, close: &Token) -> Result<Vec<Expression>> {
        if !self.check(open) {
            return Err(self.unexpected(&format!("'{}'", open)));
        }
        self.open_group()?;

        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_expression()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance()?;
        }

        self.close_group(close)?;
        Ok(items)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression> {
        let expr = match self.current().clone() {
            Token::Number(n) => Expression::Number(n),
            Token::Str(s) => Expression::String(s),
            Token::Template(parts) => Expression::Template(parts),
            Token::True => Expression::Boolean(true),
            Token::False => Expression::Boolean(false),
            Token::None => Expression::None,
            Token::Identifier(name) => Expression::Variable(name),
            Token::LeftParen => {
                self.open_group()?;
                let inner = self.parse_expression()?;
                self.close_group(&Token::RightParen)?;
                return Ok(inner);
            }
            Token::LeftBracket => {
                let items = self.parse_delimited(&Token::LeftBracket, &Token::RightBracket)?;
                return Ok(Expression::List(items));
            }
            _ => return Err(self.unexpected("expression")),
        };

        self.advance()?;
        Ok(expr)
    }
}

/// Parse a program, recognizing the commands found on `PATH`
pub fn parse_statements(input: &str) -> Result<Program> {
    StatementParser::new(input)?.parse_program()
}

/// Parse a program against an explicit command set
pub fn parse_statements_with(input: &str, commands: &CommandSet) -> Result<Program> {
    StatementParser::with_commands(input, commands)?.parse_program()
}

/// Parse a single expression (no shell commands)
pub fn parse_expression(input: &str) -> Result<Expression> {
    let commands = CommandSet::empty();
    let mut parser = StatementParser::with_commands(input, &commands)?;
    let expr = parser.parse_expression()?;
    parser.skip_separators()?;
    if !parser.check(&Token::Eof) {
        return Err(parser.unexpected("end of input"));
    }
    Ok(expr)
}
