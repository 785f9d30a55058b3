//! A minimal reference host: one concrete choice for each of the three
//! collaborator seams spec §6.1 requires (a value system, a module
//! importer, a predefined table), wired together so the core is runnable
//! end to end. None of this module is part of the core language itself --
//! an embedder is free to swap any piece of it out.

pub mod importer;
pub mod predefined;
pub mod value;

use crate::scope::Scope;
use crate::value::Value as CoreValue;
use importer::FixedModuleImporter;
use std::collections::HashMap;
use std::rc::Rc;
use value::Module;

/// Builds a root scope wired with the reference predefined table, the
/// standard module importer, and a host-builtins module exposing the same
/// callables as ordinary module attributes (spec §3 "Scope": the
/// host-builtins module is an attribute namespace over the predefined
/// table, not a separate implementation of it).
pub fn build_root_scope() -> Scope {
    let importer: Rc<dyn crate::scope::ModuleImporter> =
        Rc::new(FixedModuleImporter::with_standard_modules());
    let table = predefined::build_predefined_table(importer.clone());

    let builtins_members: HashMap<String, CoreValue> = table.clone();
    let host_builtins = CoreValue::Native(Rc::new(Module::new("builtins", builtins_members)));

    Scope::root(table, host_builtins, importer)
}
