// ABOUTME: Lexically nested environment: typed bindings, predefined overlay, module cache

use crate::error::EvalError;
use crate::keywords::is_keyword;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Resolves a module name to a host value -- the "module importer"
/// collaborator from spec §6.
pub trait ModuleImporter {
    fn import(&self, name: &str) -> Result<Value, EvalError>;
}

/// Fixed key under which the root scope's module cache holds the
/// host-builtins module (spec §3 "Scope": "its module cache pre-contains
/// the host-builtins module under a fixed name").
pub const HOST_BUILTINS_MODULE: &str = "builtins";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingKind {
    Variable,
    Constant,
}

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    kind: BindingKind,
}

struct ScopeInner {
    bindings: RefCell<HashMap<String, Binding>>,
    module_cache: RefCell<HashMap<String, Value>>,
    /// Only set on the root scope. Kept as a table distinct from
    /// `bindings` rather than baked in as literal Constant entries: the
    /// "predefined resilience" testable property (spec §8) requires that
    /// `let`-shadowing a predefined name and then `delete`-ing the shadow
    /// restores the original, which a literal Constant binding of the same
    /// name would reject outright. See DESIGN.md.
    predefined: Option<HashMap<String, Value>>,
    importer: Option<Rc<dyn ModuleImporter>>,
    outer: Option<Scope>,
}

/// A lexically nested environment (spec §3 "Scope"). Cheap to clone; all
/// state lives behind the shared `Rc`.
#[derive(Clone)]
pub struct Scope(Rc<ScopeInner>);

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scope(..)")
    }
}

struct NullImporter;

impl ModuleImporter for NullImporter {
    fn import(&self, name: &str) -> Result<Value, EvalError> {
        Err(EvalError::HostError(format!("module not found: {name}")))
    }
}

impl Scope {
    /// Builds the root scope of a fresh evaluation: `predefined` overlays
    /// lookups once the binding-chain is exhausted, `host_builtins` is
    /// pre-seeded into the module cache, `importer` backs `import_module`.
    pub fn root(
        predefined: HashMap<String, Value>,
        host_builtins: Value,
        importer: Rc<dyn ModuleImporter>,
    ) -> Scope {
        let mut module_cache = HashMap::new();
        module_cache.insert(HOST_BUILTINS_MODULE.to_string(), host_builtins);
        Scope(Rc::new(ScopeInner {
            bindings: RefCell::new(HashMap::new()),
            module_cache: RefCell::new(module_cache),
            predefined: Some(predefined),
            importer: Some(importer),
            outer: None,
        }))
    }

    /// An empty root scope with no predefined table and an importer that
    /// always fails -- used by unit tests that only exercise bindings.
    #[cfg(test)]
    pub fn for_testing() -> Scope {
        Scope::root(HashMap::new(), Value::Null, Rc::new(NullImporter))
    }

    /// Constructs a fresh scope whose outer link is `self`. The derived
    /// scope shares no bindings or module cache entries with its parent
    /// but delegates lookups and imports upward (spec §4.3 `derive`).
    pub fn derive(&self) -> Scope {
        Scope(Rc::new(ScopeInner {
            bindings: RefCell::new(HashMap::new()),
            module_cache: RefCell::new(HashMap::new()),
            predefined: None,
            importer: None,
            outer: Some(self.clone()),
        }))
    }

    /// Lookup (spec §4.3 "Lookup"): current bindings, then outward, then
    /// (at the root) the predefined overlay, then the host-builtins module
    /// as an attribute namespace.
    pub fn value(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(binding) = self.0.bindings.borrow().get(name) {
            return Ok(binding.value.clone());
        }
        if let Some(outer) = &self.0.outer {
            return outer.value(name);
        }
        if let Some(predefined) = &self.0.predefined {
            if let Some(v) = predefined.get(name) {
                return Ok(v.clone());
            }
        }
        if let Some(builtins) = self.0.module_cache.borrow().get(HOST_BUILTINS_MODULE) {
            if let Ok(v) = crate::value::get_attr(builtins, name) {
                return Ok(v);
            }
        }
        Err(EvalError::NameError(name.to_string()))
    }

    pub fn let_(&self, name: &str, value: Value) -> Result<(), EvalError> {
        self.bind_name(name, value, BindingKind::Variable)
    }

    pub fn const_(&self, name: &str, value: Value) -> Result<(), EvalError> {
        self.bind_name(name, value, BindingKind::Constant)
    }

    pub fn bind(&self, name: &str, value: Value, mutable: bool) -> Result<(), EvalError> {
        let kind = if mutable {
            BindingKind::Variable
        } else {
            BindingKind::Constant
        };
        self.bind_name(name, value, kind)
    }

    fn bind_name(&self, name: &str, value: Value, kind: BindingKind) -> Result<(), EvalError> {
        if is_keyword(name) {
            return Err(EvalError::invalid_binding_target(
                name,
                "cannot bind to keyword",
            ));
        }
        let mut bindings = self.0.bindings.borrow_mut();
        if let Some(existing) = bindings.get(name) {
            if existing.kind == BindingKind::Constant {
                return Err(EvalError::invalid_binding_target(
                    name,
                    "cannot rebind constant",
                ));
            }
        }
        bindings.insert(name.to_string(), Binding { value, kind });
        Ok(())
    }

    /// Writes to the nearest enclosing scope in which `name` is already
    /// bound, subject to Constant protection; raises *name error* if no
    /// such binding exists anywhere on the chain (spec §4.3 `rebind`).
    pub fn rebind(&self, name: &str, value: Value, mutable: bool) -> Result<(), EvalError> {
        if is_keyword(name) {
            return Err(EvalError::invalid_binding_target(
                name,
                "cannot bind to keyword",
            ));
        }
        let kind = if mutable {
            BindingKind::Variable
        } else {
            BindingKind::Constant
        };

        let mut cursor = self.clone();
        loop {
            let existing_kind = cursor.0.bindings.borrow().get(name).map(|b| b.kind);
            if let Some(existing_kind) = existing_kind {
                if existing_kind == BindingKind::Constant {
                    return Err(EvalError::invalid_binding_target(
                        name,
                        "cannot rebind constant",
                    ));
                }
                cursor
                    .0
                    .bindings
                    .borrow_mut()
                    .insert(name.to_string(), Binding { value, kind });
                return Ok(());
            }
            let Some(outer) = cursor.0.outer.clone() else {
                break;
            };
            cursor = outer;
        }

        if let Some(predefined) = &cursor.0.predefined {
            if predefined.contains_key(name) {
                return Err(EvalError::invalid_binding_target(
                    name,
                    "cannot rebind constant",
                ));
            }
        }
        Err(EvalError::NameError(name.to_string()))
    }

    /// Removes `name` from the *current* scope only (spec §4.3 `delete`).
    /// A name that exists only in an outer scope is untouched. A predefined
    /// name that has never been locally shadowed cannot be deleted from the
    /// root; a local shadow of one can, falling back to the predefined
    /// value.
    pub fn delete(&self, name: &str) -> Result<(), EvalError> {
        if is_keyword(name) {
            return Err(EvalError::invalid_binding_target(
                name,
                "cannot unbind keyword",
            ));
        }
        if self.0.bindings.borrow_mut().remove(name).is_some() {
            return Ok(());
        }
        if let Some(predefined) = &self.0.predefined {
            if predefined.contains_key(name) {
                return Err(EvalError::invalid_binding_target(
                    name,
                    "cannot unbind predefined",
                ));
            }
        }
        Ok(())
    }

    /// Resolves and memoizes a module import. The local cache is checked
    /// first; a miss forwards outward, and only the root actually imports
    /// (spec §4.3 `derive`, last sentence).
    pub fn import_module(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(v) = self.0.module_cache.borrow().get(name) {
            return Ok(v.clone());
        }
        let imported = match (&self.0.outer, &self.0.importer) {
            (Some(outer), _) => outer.import_module(name)?,
            (None, Some(importer)) => importer.import(name)?,
            (None, None) => {
                return Err(EvalError::HostError(
                    "scope chain has no module importer configured".to_string(),
                ))
            }
        };
        self.0
            .module_cache
            .borrow_mut()
            .insert(name.to_string(), imported.clone());
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn let_then_value_round_trips() {
        let scope = Scope::for_testing();
        scope.let_("x", Value::Int(42)).unwrap();
        assert!(scope.value("x").unwrap().equals(&Value::Int(42)));
    }

    #[test]
    fn let_twice_rebinds_a_variable_in_place() {
        let scope = Scope::for_testing();
        scope.let_("x", Value::Int(1)).unwrap();
        scope.let_("x", Value::Int(2)).unwrap();
        assert!(scope.value("x").unwrap().equals(&Value::Int(2)));
    }

    #[test]
    fn binding_a_keyword_is_rejected() {
        let scope = Scope::for_testing();
        assert!(scope.let_("let", Value::Null).is_err());
        assert!(scope.delete("let").is_err());
    }

    #[test]
    fn constant_cannot_be_overwritten_in_the_same_scope() {
        let scope = Scope::for_testing();
        scope.const_("x", Value::Int(1)).unwrap();
        assert!(scope.let_("x", Value::Int(2)).is_err());
    }

    #[test]
    fn derived_scope_shadows_without_mutating_parent() {
        let parent = Scope::for_testing();
        parent.let_("x", Value::Int(1)).unwrap();
        let child = parent.derive();
        child.let_("x", Value::Int(2)).unwrap();
        assert!(parent.value("x").unwrap().equals(&Value::Int(1)));
        assert!(child.value("x").unwrap().equals(&Value::Int(2)));
    }

    #[test]
    fn rebind_writes_through_to_the_defining_scope() {
        let parent = Scope::for_testing();
        parent.let_("x", Value::Int(1)).unwrap();
        let child = parent.derive();
        child.rebind("x", Value::Int(2), true).unwrap();
        assert!(parent.value("x").unwrap().equals(&Value::Int(2)));
    }

    #[test]
    fn rebind_with_no_enclosing_binding_is_a_name_error() {
        let scope = Scope::for_testing();
        assert!(matches!(
            scope.rebind("nope", Value::Null, true),
            Err(EvalError::NameError(_))
        ));
    }

    #[test]
    fn predefined_resilience() {
        let mut predefined = HashMap::new();
        predefined.insert(
            "print".to_string(),
            Value::Str("original-print".into()),
        );
        let scope = Scope::root(predefined, Value::Null, Rc::new(NullImporter));

        assert!(scope
            .value("print")
            .unwrap()
            .equals(&Value::Str("original-print".into())));

        scope
            .let_("print", Value::Str("shadow".into()))
            .unwrap();
        assert!(scope
            .value("print")
            .unwrap()
            .equals(&Value::Str("shadow".into())));

        scope.delete("print").unwrap();
        assert!(scope
            .value("print")
            .unwrap()
            .equals(&Value::Str("original-print".into())));
    }

    #[test]
    fn deleting_an_unshadowed_predefined_name_is_forbidden() {
        let mut predefined = HashMap::new();
        predefined.insert("print".to_string(), Value::Null);
        let scope = Scope::root(predefined, Value::Null, Rc::new(NullImporter));
        assert!(scope.delete("print").is_err());
    }

    #[test]
    fn module_import_is_memoized_and_visible_to_derived_scopes() {
        struct CountingImporter(RefCell<usize>);
        impl ModuleImporter for CountingImporter {
            fn import(&self, name: &str) -> Result<Value, EvalError> {
                *self.0.borrow_mut() += 1;
                Ok(Value::Str(name.into()))
            }
        }
        let importer = Rc::new(CountingImporter(RefCell::new(0)));
        let root = Scope::root(HashMap::new(), Value::Null, importer.clone());
        let child = root.derive();

        child.import_module("math").unwrap();
        child.import_module("math").unwrap();
        assert_eq!(*importer.0.borrow(), 1);
    }
}
