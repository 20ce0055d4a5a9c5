//! Interpreter for executing Orca programs
//!
//! Runs statements against a chain of scopes. Expression evaluation lives in
//! `evaluator.rs`.

use crate::parser::ast::{Expression, Program, ShellCommand, Statement};
use crate::parser::builtins;
use crate::parser::environment::Environment;
use crate::parser::error::{OrcaError, Result};
use crate::parser::statement_parser::parse_statements;
use crate::shell::{OutputMode, Shell};
use crate::stack::ensure_sufficient_stack;
use crate::types::config::InterpreterConfig;
use crate::types::value::{Function, Value};
use std::rc::Rc;
use tracing::{debug, trace};

/// Control flow signal propagated out of statements
#[derive(Debug)]
pub enum ControlFlow {
    Normal,
    Return(Value),
}

/// Interpreter for executing Orca statements
pub struct Interpreter {
    /// Root scope, holding `argv` and top-level bindings
    globals: Environment,
    /// Scope statements currently run in
    pub(crate) current: Environment,
    pub(crate) shell: Shell,
    config: InterpreterConfig,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create a new interpreter with default settings
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        let globals = Environment::new();
        let mut interpreter = Interpreter {
            current: globals.clone(),
            globals,
            shell: Shell::new(config.shell.clone()),
            config,
            call_depth: 0,
        };
        interpreter.define_globals();
        interpreter
    }

    fn define_globals(&mut self) {
        let argv = self.config.argv.iter().map(|arg| Value::from(arg.as_str())).collect();
        self.globals.define("argv", Value::list(argv));
    }

    /// The root scope
    pub fn environment(&self) -> &Environment {
        &self.globals
    }

    /// Drop every binding and start over with a fresh root scope
    pub fn reset(&mut self) {
        let old = std::mem::replace(&mut self.globals, Environment::new());
        self.current = self.globals.clone();
        self.call_depth = 0;
        self.define_globals();
        old.release();
    }

    /// Parse and run source text, recognizing the commands found on `PATH`
    pub fn run_source(&mut self, source: &str) -> Result<Option<Value>> {
        let program = parse_statements(source)?;
        self.run_program(&program)
    }

    /// Run a complete program in the root scope.
    ///
    /// Returns the value of the last statement when it is an expression, or
    /// the value of a top-level `return`.
    pub fn run_program(&mut self, program: &Program) -> Result<Option<Value>> {
        self.current = self.globals.clone();
        let mut last_value = None;

        for stmt in &program.statements {
            last_value = None;
            match stmt {
                Statement::Expression(expr) => {
                    last_value = Some(self.run_expression_statement(expr)?);
                }
                stmt => {
                    if let ControlFlow::Return(value) = self.run_statement(stmt)? {
                        debug!("program returned at top level");
                        return Ok(Some(value));
                    }
                }
            }
        }

        Ok(last_value)
    }

    /// Run a single statement
    pub fn run_statement(&mut self, stmt: &Statement) -> Result<ControlFlow> {
        ensure_sufficient_stack(|| self.run_statement_inner(stmt))
    }

    fn run_statement_inner(&mut self, stmt: &Statement) -> Result<ControlFlow> {
        match stmt {
            Statement::Assign { name, value } => {
                let val = self.eval_expression(value)?;
                self.current.assign(name, val);
                Ok(ControlFlow::Normal)
            }

            Statement::IndexAssign {
                target,
                index,
                value,
            } => {
                let target = self.eval_expression(target)?;
                let index = self.eval_expression(index)?;
                let value = self.eval_expression(value)?;
                self.assign_index(&target, &index, value)?;
                Ok(ControlFlow::Normal)
            }

            Statement::Expression(expr) => {
                self.run_expression_statement(expr)?;
                Ok(ControlFlow::Normal)
            }

            Statement::If {
                branches,
                else_body,
            } => {
                for (condition, body) in branches {
                    if self.eval_expression(condition)?.is_truthy() {
                        return self.run_block(body, self.current.child());
                    }
                }
                match else_body {
                    Some(body) => self.run_block(body, self.current.child()),
                    None => Ok(ControlFlow::Normal),
                }
            }

            Statement::For {
                var,
                iterable,
                body,
            } => {
                let iterable = self.eval_expression(iterable)?;
                self.run_for(var, &iterable, body)
            }

            Statement::FunctionDef { name, params, body } => {
                let function = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: self.current.clone(),
                };
                self.current.define(name.as_str(), Value::Function(Rc::new(function)));
                Ok(ControlFlow::Normal)
            }

            Statement::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expression(expr)?,
                    None => Value::None,
                };
                Ok(ControlFlow::Return(value))
            }

            Statement::Block(body) => self.run_block(body, self.current.child()),
        }
    }

    /// Statement-level shell commands stream their output instead of
    /// capturing it
    fn run_expression_statement(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Shell(command) if self.bound_alternative(command).is_none() => {
                let line = Shell::render(command, &self.current)?;
                self.shell.run(&line, OutputMode::Inherit)?;
                Ok(Value::None)
            }
            expr => self.eval_expression(expr),
        }
    }

    /// The expression reading of a command line whose leading name is
    /// currently bound as a variable
    pub(crate) fn bound_alternative<'c>(&self, command: &'c ShellCommand) -> Option<&'c Expression> {
        command
            .alternative
            .as_ref()
            .filter(|alternative| self.current.is_defined(&alternative.variable))
            .map(|alternative| alternative.expression.as_ref())
    }

    /// Run statements in `scope`, restoring the current scope afterwards
    /// (also on error)
    pub(crate) fn run_block(&mut self, body: &[Statement], scope: Environment) -> Result<ControlFlow> {
        let saved = std::mem::replace(&mut self.current, scope);
        let result = self.run_statements(body);
        let finished = std::mem::replace(&mut self.current, saved);
        finished.release();
        result
    }

    fn run_statements(&mut self, body: &[Statement]) -> Result<ControlFlow> {
        for stmt in body {
            if let ControlFlow::Return(value) = self.run_statement(stmt)? {
                return Ok(ControlFlow::Return(value));
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// One iteration: bind the loop variable in a fresh scope and run the body
    fn run_iteration(&mut self, var: &str, item: Value, body: &[Statement]) -> Result<ControlFlow> {
        let scope = self.current.child();
        scope.define(var, item);
        self.run_block(body, scope)
    }

    fn run_for(&mut self, var: &str, iterable: &Value, body: &[Statement]) -> Result<ControlFlow> {
        match iterable {
            Value::Range(range) => {
                for n in range.iter() {
                    if let flow @ ControlFlow::Return(_) = self.run_iteration(var, Value::Number(n), body)? {
                        return Ok(flow);
                    }
                }
            }

            Value::List(items) => {
                // length fixed at entry; elements read live, stopping if the list shrank
                let len = items.borrow().len();
                for i in 0..len {
                    let item = match items.borrow().get(i) {
                        Some(item) => item.clone(),
                        None => break,
                    };
                    if let flow @ ControlFlow::Return(_) = self.run_iteration(var, item, body)? {
                        return Ok(flow);
                    }
                }
            }

            Value::String(text) => {
                let chars: Vec<char> = text.borrow().chars().collect();
                for ch in chars {
                    if let flow @ ControlFlow::Return(_) = self.run_iteration(var, Value::string(ch), body)? {
                        return Ok(flow);
                    }
                }
            }

            other => {
                return Err(OrcaError::type_error(format!(
                    "cannot iterate over {}",
                    other.type_name()
                )))
            }
        }

        Ok(ControlFlow::Normal)
    }

    /// Call a user-defined function with already evaluated arguments
    pub fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>) -> Result<Value> {
        if args.len() != function.params.len() {
            return Err(OrcaError::Arity {
                name: function.name.clone(),
                expected: function.params.len(),
                found: args.len(),
            });
        }

        if self.call_depth >= self.config.max_call_depth {
            return Err(OrcaError::RecursionLimit(self.config.max_call_depth));
        }

        trace!(function = %function.name, depth = self.call_depth, "call");

        let scope = function.closure.child();
        for (param, arg) in function.params.iter().zip(args) {
            scope.define(param.as_str(), arg);
        }

        self.call_depth += 1;
        let result = self.run_block(&function.body, scope);
        self.call_depth -= 1;

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Normal => Ok(Value::None),
        }
    }

    /// `target[index] = value` on lists and strings
    fn assign_index(&self, target: &Value, index: &Value, value: Value) -> Result<()> {
        match target {
            Value::List(items) => {
                let i = builtins::to_index(index, items.borrow().len(), false)?;
                items.borrow_mut()[i] = value;
                Ok(())
            }
            Value::String(text) => {
                let i = builtins::to_index(index, text.borrow().chars().count(), false)?;
                let ch = builtins::single_char(&value)?;
                let mut text = text.borrow_mut();
                let start = builtins::byte_offset(&text, i);
                let end = builtins::byte_offset(&text, i + 1);
                text.replace_range(start..end, ch.encode_utf8(&mut [0; 4]));
                Ok(())
            }
            other => Err(OrcaError::type_error(format!(
                "{} does not support index assignment",
                other.type_name()
            ))),
        }
    }
}
