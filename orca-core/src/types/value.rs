use crate::parser::ast::Statement;
use crate::parser::environment::Environment;
use crate::stack::ensure_sufficient_stack;
use crate::types::range::Range;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A user-defined function together with the scope it was defined in
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Vec<Statement>>,
    pub closure: Environment,
}

impl fmt::Debug for Function {
    // the closure may hold this function, so it is left out
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Runtime values.
///
/// Strings and lists are shared: cloning a `Value` clones the handle, so a
/// mutation through one alias is seen by all of them. Everything else is
/// copied.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(Rc<RefCell<String>>),
    Boolean(bool),
    List(Rc<RefCell<Vec<Value>>>),
    Range(Range),
    None,
    Function(Rc<Function>),
}

impl Value {
    pub fn string(text: impl Into<String>) -> Self {
        Value::String(Rc::new(RefCell::new(text.into())))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Name of the value's kind, as used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::List(_) => "List",
            Value::Range(_) => "Range",
            Value::None => "None",
            Value::Function(_) => "Function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.borrow().is_empty(),
            Value::Boolean(b) => *b,
            Value::List(items) => !items.borrow().is_empty(),
            Value::Range(range) => !range.is_empty(),
            Value::None => false,
            Value::Function(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text substituted for `$name` in templates and shell commands.
    ///
    /// Identical to the display form except that `none` renders as nothing.
    pub fn template_form(&self) -> String {
        match self {
            Value::None => String::new(),
            other => other.to_string(),
        }
    }
}

/// Canonical text of a number: shortest round-trip, no trailing `.0`, and
/// negative zero printed as `0`
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

type ListPtr = *const RefCell<Vec<Value>>;

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value, open: &mut Vec<ListPtr>) -> fmt::Result {
    match value {
        Value::Number(n) => write!(f, "{}", format_number(*n)),
        Value::String(s) => write!(f, "{}", s.borrow()),
        Value::Boolean(b) => write!(f, "{}", b),
        Value::Range(range) => write!(f, "{}", range),
        Value::None => write!(f, "none"),
        Value::Function(func) => write!(f, "func {}({})", func.name, func.params.join(", ")),
        Value::List(items) => {
            let ptr = Rc::as_ptr(items);
            if open.contains(&ptr) {
                return write!(f, "[...]");
            }
            open.push(ptr);

            write!(f, "[")?;
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                match item {
                    Value::String(s) => write!(f, "'{}'", s.borrow())?,
                    other => write_value(f, other, open)?,
                }
            }
            write!(f, "]")?;

            open.pop();
            Ok(())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other, &mut Vec::new())
    }
}

/// Structural equality. A pair of lists met again while it is still being
/// compared counts as equal, so self-containing lists terminate.
fn values_equal(a: &Value, b: &Value, open: &mut Vec<(ListPtr, ListPtr)>) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
            if open.contains(&pair) {
                return true;
            }

            let (items, others) = (a.borrow(), b.borrow());
            if items.len() != others.len() {
                return false;
            }
            open.push(pair);
            let equal = ensure_sufficient_stack(|| {
                items
                    .iter()
                    .zip(others.iter())
                    .all(|(x, y)| values_equal(x, y, open))
            });
            open.pop();
            equal
        }
        (Value::Range(a), Value::Range(b)) => a == b,
        (Value::None, Value::None) => true,
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<Range> for Value {
    fn from(range: Range) -> Self {
        Value::Range(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_forms() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(Value::Number(-7.0).template_form(), "-7");
    }

    #[test]
    fn test_none_forms() {
        assert_eq!(Value::None.to_string(), "none");
        assert_eq!(Value::None.template_form(), "");
    }

    #[test]
    fn test_list_form() {
        let list = Value::list(vec![
            Value::Number(1.0),
            Value::from("a"),
            Value::Boolean(true),
            Value::None,
            Value::list(vec![Value::from("b")]),
        ]);
        assert_eq!(list.to_string(), "[1, 'a', true, none, ['b']]");
        assert_eq!(list.template_form(), "[1, 'a', true, none, ['b']]");
    }

    #[test]
    fn test_self_referencing_list_display() {
        let list = Value::list(vec![Value::Number(1.0)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(list.to_string(), "[1, [...]]");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(!Value::Range(Range::new(2.0, 2.0, None).unwrap()).is_truthy());
        assert!(Value::Range(Range::new(0.0, 2.0, None).unwrap()).is_truthy());
    }

    #[test]
    fn test_structural_equality() {
        let a = Value::list(vec![Value::Number(1.0), Value::from("x")]);
        let b = Value::list(vec![Value::Number(1.0), Value::from("x")]);
        assert_eq!(a, b);

        if let Value::List(items) = &b {
            items.borrow_mut().push(Value::None);
        }
        assert_ne!(a, b);

        assert_ne!(Value::Number(1.0), Value::from("1"));
        assert_eq!(Value::None, Value::None);
    }

    fn self_containing(first: f64) -> Value {
        let list = Value::list(vec![Value::Number(first)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        list
    }

    #[test]
    fn test_self_containing_lists_compare() {
        let (a, b) = (self_containing(1.0), self_containing(1.0));
        assert_eq!(a, b);
        assert_ne!(a, self_containing(2.0));
        assert_ne!(a, Value::list(vec![Value::Number(1.0), Value::list(vec![])]));

        for list in [&a, &b] {
            if let Value::List(items) = list {
                items.borrow_mut().clear();
            }
        }
    }

    #[test]
    fn test_strings_are_shared() {
        let a = Value::from("ab");
        let b = a.clone();
        if let Value::String(s) = &b {
            s.borrow_mut().push('c');
        }
        assert_eq!(a.to_string(), "abc");
    }

    #[test]
    fn test_function_form() {
        let func = Function {
            name: "add".to_string(),
            params: vec!["x".to_string(), "y".to_string()],
            body: Rc::new(Vec::new()),
            closure: Environment::new(),
        };
        let value = Value::Function(Rc::new(func));
        assert_eq!(value.to_string(), "func add(x, y)");
        assert_eq!(value, value.clone());
        assert_eq!(value.type_name(), "Function");
    }
}
