//! Built-in members of strings and lists (`s.trim`, `list.push(x)`, ...).
//!
//! Members live in a process-wide registry keyed by receiver kind and name,
//! which also feeds the REPL's help listing.

use crate::parser::error::{OrcaError, Result};
use crate::types::value::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Receiver kinds that carry members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Receiver {
    List,
    String,
}

impl Receiver {
    pub fn of(value: &Value) -> Option<Receiver> {
        match value {
            Value::List(_) => Some(Receiver::List),
            Value::String(_) => Some(Receiver::String),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Receiver::List => "List",
            Receiver::String => "String",
        }
    }
}

pub type MethodHandler = fn(&Value, &[Value]) -> Result<Value>;

pub struct BuiltinMethod {
    pub name: &'static str,
    pub receiver: Receiver,
    pub arity: usize,
    pub signature: &'static str,
    pub description: &'static str,
    pub handler: MethodHandler,
}

pub struct DocItem {
    pub receiver: &'static str,
    pub signature: &'static str,
    pub description: &'static str,
}

static REGISTRY: OnceLock<MethodRegistry> = OnceLock::new();

pub fn get_registry() -> &'static MethodRegistry {
    REGISTRY.get_or_init(MethodRegistry::new)
}

pub struct MethodRegistry {
    methods: HashMap<Receiver, HashMap<&'static str, BuiltinMethod>>,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodRegistry {
    pub fn new() -> Self {
        let mut registry = MethodRegistry {
            methods: HashMap::new(),
        };
        registry.register_all();
        registry
    }

    fn register(
        &mut self,
        receiver: Receiver,
        name: &'static str,
        arity: usize,
        signature: &'static str,
        description: &'static str,
        handler: MethodHandler,
    ) {
        self.methods.entry(receiver).or_default().insert(
            name,
            BuiltinMethod {
                name,
                receiver,
                arity,
                signature,
                description,
                handler,
            },
        );
    }

    pub fn get(&self, receiver: Receiver, name: &str) -> Option<&BuiltinMethod> {
        self.methods.get(&receiver)?.get(name)
    }

    /// Signatures and descriptions of every member, grouped by receiver
    pub fn get_documentation(&self) -> Vec<DocItem> {
        let mut methods: Vec<&BuiltinMethod> = self.methods.values().flat_map(|m| m.values()).collect();
        methods.sort_by_key(|m| (m.receiver, m.name));
        methods
            .into_iter()
            .map(|m| DocItem {
                receiver: m.receiver.name(),
                signature: m.signature,
                description: m.description,
            })
            .collect()
    }

    /// Invoke `receiver.name(args)`
    pub fn call(&self, receiver: &Value, name: &str, args: &[Value]) -> Result<Value> {
        let unknown = || OrcaError::UnknownMethod {
            kind: receiver.type_name().to_string(),
            name: name.to_string(),
        };

        let kind = Receiver::of(receiver).ok_or_else(unknown)?;
        let method = self.get(kind, name).ok_or_else(unknown)?;

        if args.len() != method.arity {
            return Err(OrcaError::Arity {
                name: name.to_string(),
                expected: method.arity,
                found: args.len(),
            });
        }

        (method.handler)(receiver, args)
    }

    fn register_all(&mut self) {
        use Receiver::{List, String};

        self.register(List, "len", 0, "list.len", "Number of elements", list_len);
        self.register(String, "len", 0, "str.len", "Number of characters", str_len);

        self.register(
            List,
            "pop",
            0,
            "list.pop",
            "Remove and return the last element (none when empty)",
            list_pop,
        );
        self.register(
            String,
            "pop",
            0,
            "str.pop",
            "Remove and return the last character (none when empty)",
            str_pop,
        );

        self.register(
            List,
            "push",
            1,
            "list.push(value)",
            "Append a value, returning the new length",
            list_push,
        );
        self.register(
            String,
            "push",
            1,
            "str.push(char)",
            "Append one character, returning the new length",
            str_push,
        );

        self.register(
            List,
            "remove",
            1,
            "list.remove(index)",
            "Remove and return the element at index",
            list_remove,
        );
        self.register(
            String,
            "remove",
            1,
            "str.remove(index)",
            "Remove and return the character at index",
            str_remove,
        );

        self.register(
            List,
            "contains",
            1,
            "list.contains(value)",
            "Whether an equal element is present",
            list_contains,
        );
        self.register(
            String,
            "contains",
            1,
            "str.contains(text)",
            "Whether text occurs as a substring",
            str_contains,
        );

        self.register(
            List,
            "insert",
            2,
            "list.insert(index, value)",
            "Insert a value before index (index may equal len)",
            list_insert,
        );
        self.register(
            String,
            "insert",
            2,
            "str.insert(index, char)",
            "Insert one character before index (index may equal len)",
            str_insert,
        );

        self.register(
            String,
            "trim",
            0,
            "str.trim",
            "Copy without leading and trailing whitespace",
            str_trim,
        );
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

/// Convert an index value into a position. `len` is exclusive unless
/// `allow_end` is set (insertion points).
pub(crate) fn to_index(index: &Value, len: usize, allow_end: bool) -> Result<usize> {
    let n = index.as_number().ok_or_else(|| {
        OrcaError::type_error(format!("index must be a Number, got {}", index.type_name()))
    })?;

    let limit = if allow_end { len + 1 } else { len };
    if n.fract() != 0.0 || n < 0.0 || n >= limit as f64 {
        return Err(OrcaError::index(format!(
            "index {} out of bounds for length {}",
            index, len
        )));
    }

    Ok(n as usize)
}

/// A value that must be a one-character string
pub(crate) fn single_char(value: &Value) -> Result<char> {
    if let Value::String(s) = value {
        let s = s.borrow();
        let mut chars = s.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Ok(ch);
        }
    }
    Err(OrcaError::type_error(format!(
        "expected a single character, got {}",
        describe(value)
    )))
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.borrow()),
        other => other.type_name().to_string(),
    }
}

/// Byte offset of the character at `index`, or the string's end
pub(crate) fn byte_offset(s: &str, index: usize) -> usize {
    s.char_indices().nth(index).map(|(i, _)| i).unwrap_or(s.len())
}

// ============================================================================
// List members
// ============================================================================

fn list_items(value: &Value) -> &std::rc::Rc<std::cell::RefCell<Vec<Value>>> {
    match value {
        Value::List(items) => items,
        // registry keys guarantee the receiver kind
        _ => unreachable!("list member called on {}", value.type_name()),
    }
}

fn list_len(receiver: &Value, _args: &[Value]) -> Result<Value> {
    Ok(Value::Number(list_items(receiver).borrow().len() as f64))
}

fn list_pop(receiver: &Value, _args: &[Value]) -> Result<Value> {
    Ok(list_items(receiver).borrow_mut().pop().unwrap_or(Value::None))
}

fn list_push(receiver: &Value, args: &[Value]) -> Result<Value> {
    let mut items = list_items(receiver).borrow_mut();
    items.push(args[0].clone());
    Ok(Value::Number(items.len() as f64))
}

fn list_remove(receiver: &Value, args: &[Value]) -> Result<Value> {
    let items = list_items(receiver);
    let index = to_index(&args[0], items.borrow().len(), false)?;
    Ok(items.borrow_mut().remove(index))
}

fn list_contains(receiver: &Value, args: &[Value]) -> Result<Value> {
    let found = list_items(receiver).borrow().iter().any(|item| *item == args[0]);
    Ok(Value::Boolean(found))
}

fn list_insert(receiver: &Value, args: &[Value]) -> Result<Value> {
    let items = list_items(receiver);
    let index = to_index(&args[0], items.borrow().len(), true)?;
    items.borrow_mut().insert(index, args[1].clone());
    Ok(Value::None)
}

// ============================================================================
// String members
// ============================================================================

fn str_text(value: &Value) -> &std::rc::Rc<std::cell::RefCell<String>> {
    match value {
        Value::String(text) => text,
        _ => unreachable!("string member called on {}", value.type_name()),
    }
}

fn str_len(receiver: &Value, _args: &[Value]) -> Result<Value> {
    Ok(Value::Number(str_text(receiver).borrow().chars().count() as f64))
}

fn str_pop(receiver: &Value, _args: &[Value]) -> Result<Value> {
    Ok(str_text(receiver)
        .borrow_mut()
        .pop()
        .map(|ch| Value::string(ch))
        .unwrap_or(Value::None))
}

fn str_push(receiver: &Value, args: &[Value]) -> Result<Value> {
    let ch = single_char(&args[0])?;
    let mut text = str_text(receiver).borrow_mut();
    text.push(ch);
    Ok(Value::Number(text.chars().count() as f64))
}

fn str_remove(receiver: &Value, args: &[Value]) -> Result<Value> {
    let text = str_text(receiver);
    let index = to_index(&args[0], text.borrow().chars().count(), false)?;
    let mut text = text.borrow_mut();
    let offset = byte_offset(&text, index);
    Ok(Value::string(text.remove(offset)))
}

fn str_contains(receiver: &Value, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::String(needle) => {
            let found = str_text(receiver).borrow().contains(needle.borrow().as_str());
            Ok(Value::Boolean(found))
        }
        other => Err(OrcaError::type_error(format!(
            "contains expects a String, got {}",
            other.type_name()
        ))),
    }
}

fn str_insert(receiver: &Value, args: &[Value]) -> Result<Value> {
    let text = str_text(receiver);
    let index = to_index(&args[0], text.borrow().chars().count(), true)?;
    let ch = single_char(&args[1])?;
    let mut text = text.borrow_mut();
    let offset = byte_offset(&text, index);
    text.insert(offset, ch);
    Ok(Value::None)
}

fn str_trim(receiver: &Value, _args: &[Value]) -> Result<Value> {
    Ok(Value::string(str_text(receiver).borrow().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(receiver: &Value, name: &str, args: &[Value]) -> Result<Value> {
        get_registry().call(receiver, name, args)
    }

    fn numbers(items: &[f64]) -> Value {
        Value::list(items.iter().map(|n| Value::Number(*n)).collect())
    }

    #[test]
    fn test_push_then_pop_restores_list() {
        let list = numbers(&[1.0, 2.0]);
        assert_eq!(call(&list, "push", &[Value::from("x")]).unwrap(), Value::Number(3.0));
        assert_eq!(call(&list, "pop", &[]).unwrap(), Value::from("x"));
        assert_eq!(list, numbers(&[1.0, 2.0]));
    }

    #[test]
    fn test_insert_then_remove_restores_list() {
        let list = numbers(&[1.0, 2.0, 3.0]);
        for i in 0..=3 {
            call(&list, "insert", &[Value::Number(i as f64), Value::None]).unwrap();
            assert_eq!(call(&list, "remove", &[Value::Number(i as f64)]).unwrap(), Value::None);
            assert_eq!(list, numbers(&[1.0, 2.0, 3.0]));
        }
    }

    #[test]
    fn test_pop_empty_is_none() {
        assert_eq!(call(&numbers(&[]), "pop", &[]).unwrap(), Value::None);
        assert_eq!(call(&Value::from(""), "pop", &[]).unwrap(), Value::None);
    }

    #[test]
    fn test_index_bounds() {
        let list = numbers(&[1.0]);
        assert!(matches!(
            call(&list, "remove", &[Value::Number(1.0)]),
            Err(OrcaError::Index(_))
        ));
        assert!(matches!(
            call(&list, "insert", &[Value::Number(2.0), Value::None]),
            Err(OrcaError::Index(_))
        ));
        assert!(matches!(
            call(&list, "remove", &[Value::Number(-1.0)]),
            Err(OrcaError::Index(_))
        ));
        assert!(matches!(
            call(&list, "remove", &[Value::Number(0.5)]),
            Err(OrcaError::Index(_))
        ));
        assert!(matches!(
            call(&list, "remove", &[Value::from("0")]),
            Err(OrcaError::Type(_))
        ));
    }

    #[test]
    fn test_list_contains_is_structural() {
        let list = Value::list(vec![numbers(&[1.0]), Value::from("a")]);
        assert_eq!(call(&list, "contains", &[numbers(&[1.0])]).unwrap(), Value::Boolean(true));
        assert_eq!(call(&list, "contains", &[Value::from("b")]).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_string_members() {
        let s = Value::from("héllo");
        assert_eq!(call(&s, "len", &[]).unwrap(), Value::Number(5.0));
        assert_eq!(call(&s, "push", &[Value::from("!")]).unwrap(), Value::Number(6.0));
        assert_eq!(call(&s, "remove", &[Value::Number(1.0)]).unwrap(), Value::from("é"));
        call(&s, "insert", &[Value::Number(0.0), Value::from("¡")]).unwrap();
        assert_eq!(s, Value::from("¡hllo!"));
        assert_eq!(call(&s, "pop", &[]).unwrap(), Value::from("!"));
        assert_eq!(call(&s, "contains", &[Value::from("hl")]).unwrap(), Value::Boolean(true));
        assert_eq!(
            call(&Value::from("  x \n"), "trim", &[]).unwrap(),
            Value::from("x")
        );
    }

    #[test]
    fn test_string_push_requires_one_char() {
        let s = Value::from("ab");
        assert!(matches!(call(&s, "push", &[Value::from("cd")]), Err(OrcaError::Type(_))));
        assert!(matches!(call(&s, "push", &[Value::Number(1.0)]), Err(OrcaError::Type(_))));
        assert!(matches!(
            call(&s, "insert", &[Value::Number(0.0), Value::from("")]),
            Err(OrcaError::Type(_))
        ));
        assert!(matches!(call(&s, "contains", &[Value::Number(1.0)]), Err(OrcaError::Type(_))));
        assert_eq!(s, Value::from("ab"));
    }

    #[test]
    fn test_trim_does_not_mutate() {
        let s = Value::from(" a ");
        call(&s, "trim", &[]).unwrap();
        assert_eq!(s, Value::from(" a "));
    }

    #[test]
    fn test_unknown_member_and_arity() {
        assert_eq!(
            call(&Value::Number(1.0), "len", &[]),
            Err(OrcaError::UnknownMethod {
                kind: "Number".to_string(),
                name: "len".to_string(),
            })
        );
        assert!(matches!(
            call(&numbers(&[]), "trim", &[]),
            Err(OrcaError::UnknownMethod { .. })
        ));
        assert_eq!(
            call(&numbers(&[]), "push", &[]),
            Err(OrcaError::Arity {
                name: "push".to_string(),
                expected: 1,
                found: 0,
            })
        );
    }

    #[test]
    fn test_documentation_lists_every_member() {
        let docs = get_registry().get_documentation();
        assert_eq!(docs.len(), 13);
        assert_eq!(docs[0].receiver, "List");
        assert!(docs.iter().any(|d| d.signature == "str.trim"));
    }
}
