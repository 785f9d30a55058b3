//! Reference `NativeObject` implementations: sequences-with-identity,
//! mutable records, raised-error values, and callable wrappers around a
//! plain Rust function. None of this is part of the core language -- it's
//! the minimal "value system" collaborator (spec §6.1) a host needs to
//! make the core runnable end to end.

use crate::error::EvalError;
use crate::value::{NativeObject, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A mutable, attribute-bearing record: the host's stand-in for "records
/// with attributes" (spec §2, collaborator 1).
#[derive(Debug)]
pub struct Record {
    fields: RefCell<HashMap<String, Value>>,
}

impl Record {
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Record {
            fields: RefCell::new(fields),
        }
    }
}

impl NativeObject for Record {
    fn type_name(&self) -> &'static str {
        "record"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: Value) -> Result<(), EvalError> {
        self.fields.borrow_mut().insert(name.to_string(), value);
        Ok(())
    }

    fn delete_attribute(&self, name: &str) -> Result<(), EvalError> {
        if self.fields.borrow_mut().remove(name).is_some() {
            Ok(())
        } else {
            Err(EvalError::AttributeError {
                object: self.type_name().to_string(),
                attribute: name.to_string(),
            })
        }
    }

    fn display(&self) -> String {
        let fields = self.fields.borrow();
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();
        let body = names
            .iter()
            .map(|n| format!("{n}={:?}", fields[*n]))
            .collect::<Vec<_>>()
            .join(" ");
        format!("#<record {body}>")
    }
}

/// A module namespace: a fixed, read-only set of attributes, used both for
/// the host-builtins module seeded into the root scope's module cache and
/// for whatever `import_module` resolves.
#[derive(Debug)]
pub struct Module {
    name: String,
    members: HashMap<String, Value>,
}

impl Module {
    pub fn new(name: impl Into<String>, members: HashMap<String, Value>) -> Self {
        Module {
            name: name.into(),
            members,
        }
    }
}

impl NativeObject for Module {
    fn type_name(&self) -> &'static str {
        "module"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        self.members.get(name).cloned()
    }

    fn display(&self) -> String {
        format!("#<module {}>", self.name)
    }
}

/// The value carried by an `EvalError` surfaced to `run-catching`'s handler
/// (spec §7 "Recoverable vs fatal"): a plain host-native value exposing the
/// cause's rendered message and, when known, its source position.
#[derive(Debug)]
pub struct RaisedError {
    message: String,
    position: Option<usize>,
}

impl RaisedError {
    pub fn new(message: String, position: Option<usize>) -> Self {
        RaisedError { message, position }
    }
}

impl NativeObject for RaisedError {
    fn type_name(&self) -> &'static str {
        "error"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "message" => Some(Value::Str(self.message.as_str().into())),
            "position" => self.position.map(|p| Value::Int(p as i64)),
            _ => None,
        }
    }

    fn display(&self) -> String {
        format!("#<error {}>", self.message)
    }
}

/// Wraps a Rust closure as a callable `NativeObject`, so it can sit in the
/// predefined table as an ordinary `Value` (spec §6.1, collaborator 3). A
/// trait object rather than a bare `fn` pointer because some required
/// predefined members (`import-module`, `predefined`) close over host state
/// (an importer, a name snapshot) that a plain function pointer can't carry.
pub struct Builtin {
    name: &'static str,
    doc: &'static str,
    func: Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl Builtin {
    pub fn new(
        name: &'static str,
        doc: &'static str,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Builtin {
            name,
            doc,
            func: Rc::new(func),
        }
    }
}

impl NativeObject for Builtin {
    fn type_name(&self) -> &'static str {
        "builtin"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "__doc__" => Some(Value::Str(self.doc.into())),
            "__name__" => Some(Value::Str(self.name.into())),
            _ => None,
        }
    }

    fn is_callable(&self) -> bool {
        true
    }

    fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }

    fn display(&self) -> String {
        format!("#<builtin {}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_attributes_round_trip() {
        let record = Record::new(HashMap::new());
        record.set_attribute("a", Value::Int(1)).unwrap();
        assert!(record.get_attribute("a").unwrap().equals(&Value::Int(1)));
        record.delete_attribute("a").unwrap();
        assert!(record.get_attribute("a").is_none());
    }

    #[test]
    fn builtin_exposes_doc_as_an_attribute() {
        fn identity(args: &[Value]) -> Result<Value, EvalError> {
            Ok(args[0].clone())
        }
        let b = Builtin::new("id", "returns its argument", identity);
        assert!(b.is_callable());
        assert!(b
            .get_attribute("__doc__")
            .unwrap()
            .equals(&Value::Str("returns its argument".into())));
    }
}
