//! Expression evaluation
//!
//! Evaluates expressions to values in the interpreter's current scope.

use crate::parser::ast::{BinaryOp, Expression, TemplatePart, UnaryOp};
use crate::parser::builtins::{self, get_registry};
use crate::parser::error::{OrcaError, Result};
use crate::parser::interpreter::Interpreter;
use crate::shell::Shell;
use crate::stack::ensure_sufficient_stack;
use crate::types::range::Range;
use crate::types::value::Value;
use std::cmp::Ordering;

impl Interpreter {
    /// Evaluate an expression to a value
    pub fn eval_expression(&mut self, expr: &Expression) -> Result<Value> {
        ensure_sufficient_stack(|| self.eval_expression_inner(expr))
    }

    fn eval_expression_inner(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Number(n) => Ok(Value::Number(*n)),
            // fresh string per evaluation; strings are mutable
            Expression::String(s) => Ok(Value::string(s.as_str())),
            Expression::Template(parts) => self.render_template(parts).map(Value::string),
            Expression::Boolean(b) => Ok(Value::Boolean(*b)),
            Expression::None => Ok(Value::None),
            Expression::Variable(name) => self.current.lookup(name),

            Expression::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expression(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::list(values))
            }

            Expression::Range { start, end, step } => {
                let start = self.eval_number(start, "range start")?;
                let end = self.eval_number(end, "range end")?;
                let step = match step {
                    Some(step) => Some(self.eval_number(step, "range step")?),
                    None => None,
                };
                Ok(Value::Range(Range::new(start, end, step)?))
            }

            Expression::Binary { left, op, right } => match op {
                BinaryOp::And => {
                    let left = self.eval_expression(left)?;
                    if left.is_truthy() {
                        self.eval_expression(right)
                    } else {
                        Ok(left)
                    }
                }
                BinaryOp::Or => {
                    let left = self.eval_expression(left)?;
                    if left.is_truthy() {
                        Ok(left)
                    } else {
                        self.eval_expression(right)
                    }
                }
                op => {
                    let left = self.eval_expression(left)?;
                    let right = self.eval_expression(right)?;
                    binary_op(*op, &left, &right)
                }
            },

            Expression::Unary { op, operand } => {
                let value = self.eval_expression(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
                    UnaryOp::Negate => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(OrcaError::type_error(format!(
                            "cannot negate {}",
                            other.type_name()
                        ))),
                    },
                }
            }

            Expression::Call { callee, args } => {
                let callee = self.eval_expression(callee)?;
                let args = self.eval_arguments(args)?;
                match callee {
                    Value::Function(function) => self.call_function(&function, args),
                    other => Err(OrcaError::type_error(format!(
                        "{} is not callable",
                        other.type_name()
                    ))),
                }
            }

            Expression::MemberCall {
                receiver,
                name,
                args,
            } => {
                let receiver = self.eval_expression(receiver)?;
                let args = self.eval_arguments(args)?;
                get_registry().call(&receiver, name, &args)
            }

            Expression::Index { target, index } => {
                let target = self.eval_expression(target)?;
                let index = self.eval_expression(index)?;
                index_value(&target, &index)
            }

            Expression::Shell(command) => match self.bound_alternative(command) {
                Some(alternative) => self.eval_expression(alternative),
                None => {
                    let line = Shell::render(command, &self.current)?;
                    self.shell.capture(&line).map(Value::string)
                }
            },
        }
    }

    fn eval_arguments(&mut self, args: &[Expression]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.eval_expression(arg)).collect()
    }

    fn eval_number(&mut self, expr: &Expression, what: &str) -> Result<f64> {
        match self.eval_expression(expr)? {
            Value::Number(n) => Ok(n),
            other => Err(OrcaError::type_error(format!(
                "{} must be a Number, got {}",
                what,
                other.type_name()
            ))),
        }
    }

    /// Substitute `$name` segments with the template form of their values
    pub fn render_template(&self, parts: &[TemplatePart]) -> Result<String> {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Variable(name) => {
                    out.push_str(&self.current.lookup(name)?.template_form())
                }
            }
        }
        Ok(out)
    }
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> OrcaError {
    OrcaError::type_error(format!(
        "cannot apply '{}' to {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

/// Apply a strict (non short-circuit) binary operator
pub fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::string(
                left.template_form() + &right.template_form(),
            )),
            (Value::List(a), Value::List(b)) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(Value::list(items))
            }
            _ => Err(mismatch(op, left, right)),
        },

        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Power => {
            let (a, b) = match (left, right) {
                (Value::Number(a), Value::Number(b)) => (*a, *b),
                _ => return Err(mismatch(op, left, right)),
            };
            let result = match op {
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Divide => a / b,
                _ => a.powf(b),
            };
            Ok(Value::Number(result))
        }

        BinaryOp::Equal => Ok(Value::Boolean(left == right)),
        BinaryOp::NotEqual => Ok(Value::Boolean(left != right)),

        BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
            let ordering = match (left, right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.borrow().as_str().cmp(b.borrow().as_str())),
                _ => return Err(mismatch(op, left, right)),
            };
            // NaN compares false both ways
            let result = match ordering {
                None => false,
                Some(ordering) => match op {
                    BinaryOp::Less => ordering == Ordering::Less,
                    BinaryOp::Greater => ordering == Ordering::Greater,
                    BinaryOp::LessEqual => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
            };
            Ok(Value::Boolean(result))
        }

        BinaryOp::And | BinaryOp::Or => {
            let result = if op == BinaryOp::And {
                if left.is_truthy() { right } else { left }
            } else if left.is_truthy() {
                left
            } else {
                right
            };
            Ok(result.clone())
        }
    }
}

/// `target[index]` on lists and strings
pub fn index_value(target: &Value, index: &Value) -> Result<Value> {
    match target {
        Value::List(items) => {
            let items = items.borrow();
            let i = builtins::to_index(index, items.len(), false)?;
            Ok(items[i].clone())
        }
        Value::String(text) => {
            let text = text.borrow();
            let i = builtins::to_index(index, text.chars().count(), false)?;
            Ok(text
                .chars()
                .nth(i)
                .map(Value::string)
                .unwrap_or(Value::None))
        }
        other => Err(OrcaError::type_error(format!(
            "{} is not indexable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_mixed_kinds() {
        assert_eq!(
            binary_op(BinaryOp::Add, &Value::from("n="), &Value::Number(3.0)).unwrap(),
            Value::from("n=3")
        );
        assert_eq!(
            binary_op(BinaryOp::Add, &Value::None, &Value::from("x")).unwrap(),
            Value::from("x")
        );
        assert!(matches!(
            binary_op(BinaryOp::Add, &Value::Number(1.0), &Value::Boolean(true)),
            Err(OrcaError::Type(_))
        ));
    }

    #[test]
    fn test_list_concatenation_copies() {
        let a = Value::list(vec![Value::Number(1.0)]);
        let b = Value::list(vec![Value::Number(2.0)]);
        let c = binary_op(BinaryOp::Add, &a, &b).unwrap();
        assert_eq!(c.to_string(), "[1, 2]");
        assert_eq!(a.to_string(), "[1]");
    }

    #[test]
    fn test_arithmetic() {
        let n = |x: f64| Value::Number(x);
        assert_eq!(binary_op(BinaryOp::Power, &n(2.0), &n(10.0)).unwrap(), n(1024.0));
        assert_eq!(binary_op(BinaryOp::Divide, &n(1.0), &n(0.0)).unwrap(), n(f64::INFINITY));
        assert!(binary_op(BinaryOp::Subtract, &n(1.0), &Value::from("1")).is_err());
    }

    #[test]
    fn test_comparisons() {
        let t = Value::Boolean(true);
        assert_eq!(
            binary_op(BinaryOp::Less, &Value::from("abc"), &Value::from("abd")).unwrap(),
            t
        );
        assert_eq!(
            binary_op(BinaryOp::GreaterEqual, &Value::Number(2.0), &Value::Number(2.0)).unwrap(),
            t
        );
        assert_eq!(
            binary_op(BinaryOp::Less, &Value::Number(f64::NAN), &Value::Number(1.0)).unwrap(),
            Value::Boolean(false)
        );
        assert!(binary_op(BinaryOp::Less, &Value::Number(1.0), &Value::from("2")).is_err());
    }

    #[test]
    fn test_index_value() {
        let list = Value::list(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(index_value(&list, &Value::Number(1.0)).unwrap(), Value::from("b"));
        assert!(matches!(
            index_value(&list, &Value::Number(2.0)),
            Err(OrcaError::Index(_))
        ));
        assert_eq!(
            index_value(&Value::from("héllo"), &Value::Number(1.0)).unwrap(),
            Value::from("é")
        );
        assert!(matches!(
            index_value(&Value::Number(1.0), &Value::Number(0.0)),
            Err(OrcaError::Type(_))
        ));
    }
}
