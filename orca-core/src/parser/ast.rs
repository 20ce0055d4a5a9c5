use std::fmt;
use std::rc::Rc;

// ============================================================================
// Program and Statement AST
// ============================================================================

/// A program is a sequence of statements
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Program {
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, stmt: Statement) {
        self.statements.push(stmt);
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

/// Statement types
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    /// Variable binding or re-assignment: x = 1 + 2, files = ls
    Assign { name: String, value: Expression },

    /// Element assignment: list[0] = 'a'
    IndexAssign {
        target: Expression,
        index: Expression,
        value: Expression,
    },

    /// Expression statement: [1, 2].len, greet('bob'), ls -la
    Expression(Expression),

    /// Conditional chain: if a { ... } else if b { ... } else { ... }
    If {
        branches: Vec<(Expression, Vec<Statement>)>,
        else_body: Option<Vec<Statement>>,
    },

    /// Loop over a range, list or string: for i in 0..10 { ... }
    For {
        var: String,
        iterable: Expression,
        body: Vec<Statement>,
    },

    /// Function definition: func add(x, y) { return x + y }
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Rc<Vec<Statement>>,
    },

    /// Return from the enclosing function (or end the program at top level)
    Return(Option<Expression>),

    /// Bare block with its own scope: { ... }
    Block(Vec<Statement>),
}

// ============================================================================
// Expressions
// ============================================================================

/// Segment of a double-quoted template string
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemplatePart {
    Literal(String),
    Variable(String),
}

/// Segment of one shell word
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShellPart {
    Literal(String),
    Variable(String),
}

/// An external command line, kept as raw words until it runs
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShellCommand {
    pub words: Vec<Vec<ShellPart>>,
    /// Expression reading of the same line, used instead of the command
    /// when its leading name is bound as a variable at run time
    pub alternative: Option<VariableReading>,
}

/// A line that starts with a command name but also parses as an expression
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableReading {
    pub variable: String,
    pub expression: Box<Expression>,
}

impl ShellCommand {
    pub fn new(words: Vec<Vec<ShellPart>>) -> Self {
        ShellCommand {
            words,
            alternative: None,
        }
    }

    pub fn with_alternative(mut self, variable: impl Into<String>, expression: Expression) -> Self {
        self.alternative = Some(VariableReading {
            variable: variable.into(),
            expression: Box::new(expression),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Negate,
    Not,
}

/// Expression types
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expression {
    /// Numeric literal: 42, 1.5
    Number(f64),

    /// Raw string literal: 'hello'
    String(String),

    /// Interpolated string: "hello $name"
    Template(Vec<TemplatePart>),

    /// Boolean literal: true, false
    Boolean(bool),

    /// The none literal
    None,

    /// Variable reference
    Variable(String),

    /// List literal: [1, 'a', x]
    List(Vec<Expression>),

    /// Range: 0..10 or 10..0..-2
    Range {
        start: Box<Expression>,
        end: Box<Expression>,
        step: Option<Box<Expression>>,
    },

    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    /// Function call: add(1, 2)
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },

    /// Built-in member access: s.trim, list.push(4)
    MemberCall {
        receiver: Box<Expression>,
        name: String,
        args: Vec<Expression>,
    },

    /// Element access: list[0], s[2]
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },

    /// External command whose output becomes the value: cat $file
    Shell(ShellCommand),
}

impl Expression {
    pub fn binary(left: Expression, op: BinaryOp, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}

// ============================================================================
// Display (source-like rendering, used by --dump-ast)
// ============================================================================

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Negate => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

impl fmt::Display for TemplatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplatePart::Literal(text) => write!(f, "{}", text),
            TemplatePart::Variable(name) => write!(f, "${}", name),
        }
    }
}

impl fmt::Display for ShellPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellPart::Literal(text) => write!(f, "{}", text),
            ShellPart::Variable(name) => write!(f, "${}", name),
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            for part in word {
                write!(f, "{}", part)?;
            }
        }
        Ok(())
    }
}

fn write_comma_separated<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{}", n),
            Expression::String(s) => write!(f, "'{}'", s),
            Expression::Template(parts) => {
                write!(f, "\"")?;
                for part in parts {
                    write!(f, "{}", part)?;
                }
                write!(f, "\"")
            }
            Expression::Boolean(b) => write!(f, "{}", b),
            Expression::None => write!(f, "none"),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::List(items) => {
                write!(f, "[")?;
                write_comma_separated(f, items)?;
                write!(f, "]")
            }
            Expression::Range { start, end, step } => {
                write!(f, "{}..{}", start, end)?;
                if let Some(step) = step {
                    write!(f, "..{}", step)?;
                }
                Ok(())
            }
            Expression::Binary { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expression::Unary { op, operand } => write!(f, "{}{}", op, operand),
            Expression::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_comma_separated(f, args)?;
                write!(f, ")")
            }
            Expression::MemberCall {
                receiver,
                name,
                args,
            } => {
                write!(f, "{}.{}(", receiver, name)?;
                write_comma_separated(f, args)?;
                write!(f, ")")
            }
            Expression::Index { target, index } => write!(f, "{}[{}]", target, index),
            Expression::Shell(command) => write!(f, "`{}`", command),
        }
    }
}

impl Statement {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "    ".repeat(depth);
        match self {
            Statement::Assign { name, value } => writeln!(f, "{}{} = {}", pad, name, value),
            Statement::IndexAssign {
                target,
                index,
                value,
            } => writeln!(f, "{}{}[{}] = {}", pad, target, index, value),
            Statement::Expression(expr) => writeln!(f, "{}{}", pad, expr),
            Statement::If {
                branches,
                else_body,
            } => {
                for (i, (condition, body)) in branches.iter().enumerate() {
                    if i == 0 {
                        writeln!(f, "{}if {} {{", pad, condition)?;
                    } else {
                        writeln!(f, "{}}} else if {} {{", pad, condition)?;
                    }
                    fmt_body(f, body, depth + 1)?;
                }
                if let Some(body) = else_body {
                    writeln!(f, "{}}} else {{", pad)?;
                    fmt_body(f, body, depth + 1)?;
                }
                writeln!(f, "{}}}", pad)
            }
            Statement::For {
                var,
                iterable,
                body,
            } => {
                writeln!(f, "{}for {} in {} {{", pad, var, iterable)?;
                fmt_body(f, body, depth + 1)?;
                writeln!(f, "{}}}", pad)
            }
            Statement::FunctionDef { name, params, body } => {
                writeln!(f, "{}func {}({}) {{", pad, name, params.join(", "))?;
                fmt_body(f, body, depth + 1)?;
                writeln!(f, "{}}}", pad)
            }
            Statement::Return(Some(expr)) => writeln!(f, "{}return {}", pad, expr),
            Statement::Return(None) => writeln!(f, "{}return", pad),
            Statement::Block(body) => {
                writeln!(f, "{}{{", pad)?;
                fmt_body(f, body, depth + 1)?;
                writeln!(f, "{}}}", pad)
            }
        }
    }
}

fn fmt_body(f: &mut fmt::Formatter<'_>, body: &[Statement], depth: usize) -> fmt::Result {
    for stmt in body {
        stmt.fmt_indented(f, depth)?;
    }
    Ok(())
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_body(f, &self.statements, 0)
    }
}
