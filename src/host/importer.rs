//! A minimal, fixed module registry: the "module importer" collaborator
//! (spec §6.1, collaborator 2). Real embeddings resolve modules however
//! they like; this one just serves a handful of constant modules so the
//! reference host is runnable end to end.

use super::value::Module;
use crate::error::EvalError;
use crate::scope::ModuleImporter;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Resolves module names from a fixed table built at construction time.
/// Unknown names fail with a `HostError` distinguishable from other lookup
/// failures (spec §12 "the error is distinguishable as module-not-found").
pub struct FixedModuleImporter {
    modules: HashMap<String, Value>,
}

impl FixedModuleImporter {
    pub fn new(modules: HashMap<String, Value>) -> Self {
        FixedModuleImporter { modules }
    }

    /// The default registry: a `math` module with a couple of constants and
    /// a `string` module with a couple of helpers.
    pub fn with_standard_modules() -> Self {
        let mut modules = HashMap::new();

        let mut math = HashMap::new();
        math.insert("pi".to_string(), Value::Float(std::f64::consts::PI));
        math.insert("e".to_string(), Value::Float(std::f64::consts::E));
        modules.insert(
            "math".to_string(),
            Value::Native(Rc::new(Module::new("math", math))),
        );

        let string = HashMap::new();
        modules.insert(
            "string".to_string(),
            Value::Native(Rc::new(Module::new("string", string))),
        );

        FixedModuleImporter::new(modules)
    }
}

impl ModuleImporter for FixedModuleImporter {
    fn import(&self, name: &str) -> Result<Value, EvalError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::HostError(format!("module not found: {name}")))
    }
}
