//! A type checker for the toy language.
//!
//! Checking resolves every reference against the package's own declarations,
//! its imports and a handful of builtins. It reports redeclarations (with a
//! secondary error at the first declaration), undeclared names, unknown
//! qualified names, failed imports and unused imports.

use kiln_cache::{
    CheckInput, CheckOutput, Importer, PackagePath, TypeChecker, TypeError, TypeErrorKind,
    TypeInfo, Types,
};
use kiln_source::{DeclKind, Location};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

const BUILTINS: &[&str] = &["bool", "error", "int", "string"];

struct Import {
    path: String,
    location: Location,
    types: Option<Arc<Types>>,
    used: bool,
}

/// The toy checker. Records every package it checks.
#[derive(Default)]
pub struct ToyChecker {
    inputs: Mutex<HashMap<String, Vec<CheckInput>>>,
}

impl ToyChecker {
    /// Creates a checker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many times the package at `path` was checked.
    pub fn invocations(&self, path: &str) -> usize {
        self.inputs.lock().unwrap().get(path).map_or(0, Vec::len)
    }

    /// Returns the total number of checks.
    pub fn total_invocations(&self) -> usize {
        self.inputs.lock().unwrap().values().map(Vec::len).sum()
    }

    /// Returns the input of the most recent check of `path`.
    pub fn last_input(&self, path: &str) -> Option<CheckInput> {
        self.inputs
            .lock()
            .unwrap()
            .get(path)
            .and_then(|inputs| inputs.last().cloned())
    }
}

impl TypeChecker for ToyChecker {
    fn check(
        &self,
        input: CheckInput,
        importer: &dyn Importer,
        errors: &mut dyn FnMut(TypeError),
    ) -> CheckOutput {
        self.inputs
            .lock()
            .unwrap()
            .entry(input.path.as_str().to_string())
            .or_default()
            .push(input.clone());

        let mut imports: Vec<Import> = Vec::new();
        for file in &input.files {
            for spec in &file.imports {
                if imports.iter().any(|imp| imp.path == spec.path) {
                    continue;
                }
                let location = Location::new(file.uri.clone(), spec.span);
                let types = match importer.import(&spec.path) {
                    Ok(types) => Some(types),
                    Err(e) => {
                        errors(TypeError::new(
                            location.clone(),
                            format!("could not import {} ({e})", spec.path),
                        ));
                        None
                    }
                };
                imports.push(Import {
                    path: spec.path.clone(),
                    location,
                    types,
                    used: false,
                });
            }
        }

        let mut info = TypeInfo::default();
        let mut first: HashMap<&str, Location> = HashMap::new();
        let mut types = Types::new(input.path.clone(), input.name.clone());
        for file in &input.files {
            for decl in &file.decls {
                let location = Location::new(file.uri.clone(), decl.span);
                if let Some(prev) = first.get(decl.name.as_str()) {
                    errors(TypeError::new(
                        location,
                        format!("{} redeclared in this block", decl.name),
                    ));
                    errors(TypeError::new(
                        prev.clone(),
                        format!("\tother declaration of {}", decl.name),
                    ));
                    continue;
                }
                first.insert(&decl.name, location);
                info.defs.insert(decl.name.clone());
                if decl.exported {
                    types.exports.insert(decl.name.clone());
                }
            }
        }

        for file in &input.files {
            for decl in &file.decls {
                let location = Location::new(file.uri.clone(), decl.span);
                let body = decl
                    .body
                    .as_ref()
                    .filter(|_| !(decl.kind == DeclKind::Func && input.ignore_func_bodies));
                let refs = decl
                    .signature_refs
                    .iter()
                    .chain(body.into_iter().flat_map(|b| &b.refs));
                for name in refs {
                    if let Some(err) = resolve(name, &info.defs, &mut imports, &mut info.uses, &location) {
                        errors(err);
                    }
                }
            }
        }

        if !input.disable_unused_import_check {
            for imp in imports.iter().filter(|imp| imp.types.is_some() && !imp.used) {
                let mut err = TypeError::new(
                    imp.location.clone(),
                    format!("\"{}\" imported and not used", imp.path),
                );
                err.soft = true;
                errors(err);
            }
        }

        CheckOutput {
            types: Arc::new(types),
            info,
        }
    }

    fn unsafe_package(&self) -> Arc<Types> {
        let mut types = Types::new(PackagePath::new("unsafe"), "unsafe");
        types.exports.extend(["Pointer", "Sizeof"].map(str::to_string));
        Arc::new(types)
    }
}

/// Resolves one reference, recording it as used. Returns the error if it
/// cannot be resolved.
fn resolve(
    name: &str,
    defs: &BTreeSet<String>,
    imports: &mut [Import],
    uses: &mut BTreeSet<String>,
    location: &Location,
) -> Option<TypeError> {
    let Some((qualifier, member)) = name.split_once('.') else {
        if BUILTINS.contains(&name) || defs.contains(name) {
            uses.insert(name.to_string());
            return None;
        }
        return Some(undeclared(name, location));
    };
    let Some(imp) = imports.iter_mut().find(|imp| match &imp.types {
        Some(types) => types.name == qualifier,
        None => imp.path.rsplit('/').next() == Some(qualifier),
    }) else {
        return Some(undeclared(qualifier, location));
    };
    imp.used = true;
    // References into a package that failed to import were already reported.
    let types = imp.types.as_ref()?;
    if !types.exports.contains(member) {
        return Some(TypeError::new(location.clone(), format!("undefined: {name}")));
    }
    uses.insert(name.to_string());
    None
}

fn undeclared(name: &str, location: &Location) -> TypeError {
    TypeError {
        location: location.clone(),
        message: format!("undeclared name: {name}"),
        soft: false,
        kind: TypeErrorKind::Undeclared {
            name: name.to_string(),
        },
    }
}
