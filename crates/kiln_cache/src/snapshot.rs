//! The cache and its snapshots.

use crate::error::CacheError;
use crate::handle::PackageHandle;
use crate::metadata::PackageId;
use crate::package::Package;
use crate::services::Services;
use kiln_common::CancelToken;
use kiln_config::CacheOptions;
use kiln_memoize::{Generation, Lease, Store};
use kiln_source::{FileHandle, FileIdentity, ParseMode, ParsedFile, Uri};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The memoized outcome of checking one package key.
pub type PackageData = Result<Arc<Package>, CacheError>;

type PackageStore = Store<Snapshot, PackageData>;

/// Owns the memoization store shared by all snapshots.
pub struct Cache {
    store: Arc<PackageStore>,
    services: Services,
    options: Arc<CacheOptions>,
    next_snapshot: Arc<AtomicU64>,
}

impl Cache {
    /// Creates a cache over the given collaborators.
    pub fn new(services: Services, options: CacheOptions) -> Self {
        Self {
            store: Arc::new(Store::new()),
            services,
            options: Arc::new(options),
            next_snapshot: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Opens a snapshot with no package handles.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            Arc::clone(&self.store),
            self.services.clone(),
            Arc::clone(&self.options),
            Arc::clone(&self.next_snapshot),
        )
    }

    /// Returns the number of memoized checks some snapshot still holds.
    pub fn handle_count(&self) -> usize {
        self.store.handle_count()
    }

    /// Returns the cache options.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }
}

struct PackageEntry {
    handle: Arc<PackageHandle>,
    _lease: Lease<Snapshot, PackageData>,
}

#[derive(Clone)]
struct CachedParse {
    file: Arc<ParsedFile>,
    fixed: bool,
}

/// One immutable view of the workspace.
///
/// Each snapshot owns a generation of the store; package handles built
/// through it are leased by that generation until the snapshot is destroyed
/// or dropped.
pub struct Snapshot {
    id: u64,
    store: Arc<PackageStore>,
    generation: Arc<Generation<Snapshot, PackageData>>,
    services: Services,
    options: Arc<CacheOptions>,
    next_snapshot: Arc<AtomicU64>,
    packages: Mutex<HashMap<(PackageId, ParseMode), PackageEntry>>,
    parses: Mutex<HashMap<(FileIdentity, ParseMode), CachedParse>>,
}

impl Snapshot {
    fn new(
        store: Arc<PackageStore>,
        services: Services,
        options: Arc<CacheOptions>,
        next_snapshot: Arc<AtomicU64>,
    ) -> Self {
        let id = next_snapshot.fetch_add(1, Ordering::Relaxed);
        let generation = store.generation(format!("snapshot {id}"));
        Self {
            id,
            store,
            generation,
            services,
            options,
            next_snapshot,
            packages: Mutex::new(HashMap::new()),
            parses: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the snapshot's sequence number.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the generation backing this snapshot.
    pub fn generation(&self) -> &Arc<Generation<Snapshot, PackageData>> {
        &self.generation
    }

    /// Returns the collaborators.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Returns the cache options.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Returns the number of package handles in the snapshot.
    pub fn package_handle_count(&self) -> usize {
        self.lock_packages().len()
    }

    fn lock_packages(&self) -> MutexGuard<'_, HashMap<(PackageId, ParseMode), PackageEntry>> {
        self.packages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_parses(&self) -> MutexGuard<'_, HashMap<(FileIdentity, ParseMode), CachedParse>> {
        self.parses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds the handle for `id` in `mode` and checks it.
    pub fn package(
        &self,
        cancel: &CancelToken,
        id: &PackageId,
        mode: ParseMode,
    ) -> Result<Arc<Package>, CacheError> {
        let ph = self.build_package_handle(cancel, id, mode)?;
        ph.check(cancel, self)
    }

    /// Returns the handle published for `id` in `mode`, if any.
    pub fn get_package(&self, id: &PackageId, mode: ParseMode) -> Option<Arc<PackageHandle>> {
        self.lock_packages()
            .get(&(id.clone(), mode))
            .map(|entry| Arc::clone(&entry.handle))
    }

    /// Publishes `ph`, or returns the handle another caller published first.
    pub(crate) fn add_package_handle(
        &self,
        ph: Arc<PackageHandle>,
        lease: Lease<Snapshot, PackageData>,
    ) -> Arc<PackageHandle> {
        let mut packages = self.lock_packages();
        let key = (ph.id().clone(), ph.mode());
        if let Some(existing) = packages.get(&key) {
            let winner = Arc::clone(&existing.handle);
            drop(packages);
            tracing::trace!(package = %ph.id(), mode = %ph.mode(), "lost publish race");
            drop(lease);
            return winner;
        }
        packages.insert(
            key,
            PackageEntry {
                handle: Arc::clone(&ph),
                _lease: lease,
            },
        );
        ph
    }

    /// Parses `file` at `mode`, reusing an earlier parse of the same content.
    ///
    /// Returns the tree and whether the parser repaired it.
    pub fn parse_file(&self, file: &FileHandle, mode: ParseMode) -> Result<(Arc<ParsedFile>, bool), CacheError> {
        let key = (file.identity().clone(), mode);
        if let Some(cached) = self.lock_parses().get(&key) {
            return Ok((Arc::clone(&cached.file), cached.fixed));
        }
        let output = self.services.parser.parse(file, mode)?;
        let parsed = CachedParse {
            file: Arc::new(output.file),
            fixed: output.fixed,
        };
        let cached = self.lock_parses().entry(key).or_insert(parsed).clone();
        Ok((cached.file, cached.fixed))
    }

    /// Opens the successor snapshot after `changed` files were edited.
    ///
    /// Handles whose files, metadata and dependencies are untouched are
    /// carried into the successor under a new lease; the rest are rebuilt on
    /// demand there, reusing any memoized check whose key did not change.
    pub fn clone_with_changes(&self, changed: &[Uri]) -> Snapshot {
        let changed: HashSet<&Uri> = changed.iter().collect();
        let next = Snapshot::new(
            Arc::clone(&self.store),
            self.services.clone(),
            Arc::clone(&self.options),
            Arc::clone(&self.next_snapshot),
        );

        let packages = self.lock_packages();
        let mut verdicts: HashMap<(PackageId, ParseMode), bool> = HashMap::new();
        let mut carried = Vec::new();
        for entry in packages.values() {
            if self.unaffected(&entry.handle, &changed, &mut verdicts) {
                carried.push(Arc::clone(&entry.handle));
            }
        }
        drop(packages);

        let mut next_packages = next.lock_packages();
        for ph in carried {
            match next.generation.inherit(ph.memo()) {
                Ok(lease) => {
                    next_packages.insert(
                        (ph.id().clone(), ph.mode()),
                        PackageEntry {
                            handle: ph,
                            _lease: lease,
                        },
                    );
                }
                Err(err) => tracing::warn!(error = %err, "cannot carry package handle"),
            }
        }
        let carried_count = next_packages.len();
        drop(next_packages);

        let parses: HashMap<_, _> = self
            .lock_parses()
            .iter()
            .filter(|((identity, _), _)| !changed.contains(&identity.uri))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        *next.lock_parses() = parses;

        tracing::debug!(
            from = self.id,
            to = next.id,
            carried = carried_count,
            changed = changed.len(),
            "cloned snapshot"
        );
        next
    }

    fn unaffected(
        &self,
        ph: &Arc<PackageHandle>,
        changed: &HashSet<&Uri>,
        verdicts: &mut HashMap<(PackageId, ParseMode), bool>,
    ) -> bool {
        let key = (ph.id().clone(), ph.mode());
        if let Some(&verdict) = verdicts.get(&key) {
            return verdict;
        }
        let current = self.services.metadata.metadata(ph.id());
        let verdict = !ph.has_dropped_deps()
            && current.is_some_and(|m| {
                Arc::ptr_eq(&m.metadata, &ph.metadata().metadata) && m.valid == ph.metadata().valid
            })
            && !ph.file_uris().any(|uri| changed.contains(uri))
            && ph
                .deps()
                .values()
                .all(|dep| self.unaffected(dep, changed, verdicts));
        verdicts.insert(key, verdict);
        verdict
    }

    /// Destroys the snapshot's generation and releases its handles.
    ///
    /// Later checks through this snapshot fail with
    /// [`CacheError::GenerationDestroyed`]. A check already running on it
    /// keeps going; if it reaches a dependency it is abandoned unstored.
    pub fn destroy(&self, destroyed_by: impl Into<String>) {
        self.generation.destroy(destroyed_by);
        self.lock_packages().clear();
        self.lock_parses().clear();
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .finish()
    }
}
