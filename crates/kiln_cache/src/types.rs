//! Values exchanged with the external type checker.

use crate::metadata::PackagePath;
use kiln_source::{Location, ParsedFile};
use std::collections::BTreeSet;
use std::sync::Arc;

/// The type-level view of a checked package, as seen by its importers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Types {
    /// The package import path.
    pub path: PackagePath,
    /// The package name.
    pub name: String,
    /// Names the package exposes to importers.
    pub exports: BTreeSet<String>,
}

impl Types {
    /// Creates an empty package scope.
    pub fn new(path: PackagePath, name: impl Into<String>) -> Self {
        Self {
            path,
            name: name.into(),
            exports: BTreeSet::new(),
        }
    }
}

/// Per-package tables recorded by the checker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeInfo {
    /// Names defined by the package.
    pub defs: BTreeSet<String>,
    /// Names referenced and resolved, qualified by package where imported.
    pub uses: BTreeSet<String>,
}

/// Classification of a type error, as far as the cache cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeErrorKind {
    /// A name was used but never declared.
    Undeclared {
        /// The missing name.
        name: String,
    },
    /// A function can fall off its end without returning.
    MissingReturn,
    /// Anything else.
    Other,
}

/// One error reported by the checker.
///
/// A message starting with a tab is a secondary error continuing the
/// preceding primary one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeError {
    /// Where the error applies.
    pub location: Location,
    /// The error message.
    pub message: String,
    /// `true` if the error does not prevent further checking.
    pub soft: bool,
    /// The error classification.
    pub kind: TypeErrorKind,
}

impl TypeError {
    /// Creates an error of kind [`TypeErrorKind::Other`].
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            soft: false,
            kind: TypeErrorKind::Other,
        }
    }

    /// Returns `true` if this error continues the preceding one.
    pub fn is_secondary(&self) -> bool {
        self.message.starts_with('\t')
    }
}

/// Everything the checker needs for one package.
#[derive(Clone, Debug)]
pub struct CheckInput {
    /// The package import path.
    pub path: PackagePath,
    /// The package name.
    pub name: String,
    /// The compiled files, possibly trimmed.
    pub files: Vec<Arc<ParsedFile>>,
    /// The validated language version, if the module declares a usable one.
    pub lang_version: Option<String>,
    /// Skip checking function bodies.
    pub ignore_func_bodies: bool,
    /// Do not report unused imports.
    pub disable_unused_import_check: bool,
}

/// The checker's result for one package.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    /// The package's type-level view.
    pub types: Arc<Types>,
    /// The checker's tables.
    pub info: TypeInfo,
}
