//! Package handles and their recursive construction.

use crate::check::type_check;
use crate::error::CacheError;
use crate::key::{compute_package_key, PackageKey};
use crate::metadata::{KnownMetadata, PackageId, PackagePath};
use crate::package::Package;
use crate::snapshot::{PackageData, Snapshot};
use kiln_common::CancelToken;
use kiln_config::MemoryMode;
use kiln_memoize::{Computation, Generation, Handle, MemoizeError};
use kiln_source::{FileHandle, ParseMode, Uri};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// The future result of type checking one package in one parse mode.
///
/// Immutable once built. The check itself is memoized by [`key`](Self::key)
/// and runs on the first call to [`check`](Self::check).
pub struct PackageHandle {
    handle: Arc<Handle<Snapshot, PackageData>>,
    go_files: Vec<FileHandle>,
    compiled_files: Vec<FileHandle>,
    mode: ParseMode,
    metadata: KnownMetadata,
    key: PackageKey,
    deps: BTreeMap<PackagePath, Arc<PackageHandle>>,
    dropped_deps: bool,
}

impl PackageHandle {
    /// Returns the package id.
    pub fn id(&self) -> &PackageId {
        &self.metadata.id
    }

    /// Returns the composite key.
    pub fn key(&self) -> PackageKey {
        self.key
    }

    /// Returns the parse mode.
    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Returns the metadata the handle was built from.
    pub fn metadata(&self) -> &KnownMetadata {
        &self.metadata
    }

    /// Returns the URIs of the files fed to the checker.
    pub fn compiled_files(&self) -> &[Uri] {
        &self.metadata.compiled_files
    }

    /// Returns the handles of the dependencies that could be built, by path.
    pub fn deps(&self) -> &BTreeMap<PackagePath, Arc<PackageHandle>> {
        &self.deps
    }

    /// Returns `true` if any declared dependency was left out of the key.
    pub fn has_dropped_deps(&self) -> bool {
        self.dropped_deps
    }

    pub(crate) fn memo(&self) -> &Arc<Handle<Snapshot, PackageData>> {
        &self.handle
    }

    pub(crate) fn file_uris(&self) -> impl Iterator<Item = &Uri> {
        self.go_files
            .iter()
            .chain(&self.compiled_files)
            .map(FileHandle::uri)
    }

    /// Returns the checked package, running the check if no caller has.
    pub fn check(&self, cancel: &CancelToken, snapshot: &Snapshot) -> Result<Arc<Package>, CacheError> {
        self.handle.get(cancel, snapshot.generation(), snapshot)?
    }

    /// Returns the checked package without running the check, provided
    /// `generation` holds this handle and a result is available.
    pub fn cached(&self, generation: &Generation<Snapshot, PackageData>) -> Result<Arc<Package>, CacheError> {
        match self.handle.cached(generation) {
            Some(data) => data,
            None => Err(CacheError::NoCachedTypes {
                path: self.metadata.path.clone(),
            }),
        }
    }

    /// Returns the sorted, de-duplicated import paths of the package's files.
    ///
    /// Files that fail to parse are skipped.
    pub fn imports(&self, snapshot: &Snapshot) -> Vec<String> {
        let mut result = BTreeSet::new();
        for fh in &self.go_files {
            let Ok((file, _)) = snapshot.parse_file(fh, ParseMode::Header) else {
                continue;
            };
            result.extend(file.import_paths().map(str::to_owned));
        }
        result.into_iter().collect()
    }
}

impl fmt::Debug for PackageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageHandle")
            .field("id", self.id())
            .field("mode", &self.mode)
            .field("key", &self.key)
            .finish()
    }
}

impl Snapshot {
    /// Returns the parse mode dependencies named `id` are checked in.
    ///
    /// Workspace packages are checked in full unless the memory mode limits
    /// that to packages with open files; everything else is checked for its
    /// exported surface only.
    pub fn workspace_parse_mode(&self, id: &PackageId) -> ParseMode {
        let metadata = &self.services().metadata;
        if !metadata.is_workspace_package(id) {
            return ParseMode::Exported;
        }
        if self.options().memory_mode == MemoryMode::Normal || metadata.is_active(id) {
            ParseMode::Full
        } else {
            ParseMode::Exported
        }
    }

    /// Returns the handle for `id` in `mode`, building it and its
    /// dependencies' handles if this snapshot has none yet.
    ///
    /// Metadata is never reloaded here; an unknown id fails with
    /// [`CacheError::NoMetadata`]. A dependency that fails to build, or whose
    /// metadata is invalid while this package's is valid, is dropped from
    /// the handle. Cancellation aborts the whole build.
    pub fn build_package_handle(
        &self,
        cancel: &CancelToken,
        id: &PackageId,
        mode: ParseMode,
    ) -> Result<Arc<PackageHandle>, CacheError> {
        if let Some(ph) = self.get_package(id, mode) {
            return Ok(ph);
        }
        let services = self.services();
        let metadata = services
            .metadata
            .metadata(id)
            .ok_or_else(|| CacheError::NoMetadata { id: id.clone() })?;

        // Dependencies are built one at a time; siblings often share most of
        // their transitive closure.
        let mut deps = BTreeMap::new();
        let mut dep_keys = Vec::with_capacity(metadata.deps.len());
        for dep_id in &metadata.deps {
            match self.build_package_handle(cancel, dep_id, self.workspace_parse_mode(dep_id)) {
                Ok(dep) if !(metadata.valid && !dep.metadata.valid) => {
                    dep_keys.push(Some(dep.key));
                    deps.insert(dep.metadata.path.clone(), dep);
                }
                Ok(_) => {
                    tracing::debug!(package = %id, dep = %dep_id, "dropping dependency with invalid metadata");
                    dep_keys.push(None);
                }
                Err(err) if err.is_transient() => return Err(err),
                Err(err) => {
                    cancel.check()?;
                    tracing::warn!(package = %id, dep = %dep_id, error = %err, "dropping dependency");
                    dep_keys.push(None);
                }
            }
        }

        let fetch = |uris: &[Uri]| -> Result<Vec<FileHandle>, CacheError> {
            uris.par_iter()
                .map(|uri| services.files.get_file(uri, cancel))
                .collect()
        };
        let (go_files, compiled_files) = rayon::join(
            || fetch(&metadata.go_files),
            || fetch(&metadata.compiled_files),
        );
        let (go_files, compiled_files) = (go_files?, compiled_files?);

        let key = compute_package_key(
            id,
            &compiled_files,
            &metadata,
            &dep_keys,
            mode,
            self.options().experimental_package_cache_key,
        );
        let computation = check_computation(&go_files, &compiled_files, &metadata, mode, &deps);
        let (handle, lease) = self.generation().get_handle(key.hash(), computation)?;

        let ph = Arc::new(PackageHandle {
            handle,
            go_files,
            compiled_files,
            mode,
            metadata,
            key,
            dropped_deps: dep_keys.iter().any(Option::is_none),
            deps,
        });
        Ok(self.add_package_handle(ph, lease))
    }
}

/// Builds the memoized check for one handle.
///
/// Every direct dependency is started on its own scoped thread before the
/// checker runs. Their results are ignored here: the importer waits on the
/// same memoized checks when the checker reaches each import, so the threads
/// only let independent subtrees progress in parallel. The scope joins them
/// before the computation returns.
///
/// Cancellation and generation destruction abandon the run instead of
/// storing a result.
fn check_computation(
    go_files: &[FileHandle],
    compiled_files: &[FileHandle],
    metadata: &KnownMetadata,
    mode: ParseMode,
    deps: &BTreeMap<PackagePath, Arc<PackageHandle>>,
) -> Computation<Snapshot, PackageData> {
    let go_files = go_files.to_vec();
    let compiled_files = compiled_files.to_vec();
    let metadata = Arc::clone(&metadata.metadata);
    let deps = deps.clone();
    Arc::new(move |cancel: &CancelToken, snapshot: &Snapshot| {
        std::thread::scope(|scope| {
            for dep in deps.values() {
                scope.spawn(move || {
                    let _ = dep.check(cancel, snapshot);
                });
            }
            match type_check(cancel, snapshot, &go_files, &compiled_files, &metadata, mode, &deps) {
                Err(CacheError::Cancelled(cancelled)) => Err(MemoizeError::Cancelled(cancelled)),
                Err(CacheError::GenerationDestroyed {
                    generation,
                    destroyed_by,
                }) => Err(MemoizeError::GenerationDestroyed {
                    generation,
                    destroyed_by,
                }),
                result => Ok(result),
            }
        })
    })
}
