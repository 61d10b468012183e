//! An in-memory metadata source.

use kiln_cache::{KnownMetadata, MetadataSource, PackageId};
use kiln_source::Uri;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    packages: HashMap<PackageId, KnownMetadata>,
    workspace: HashSet<PackageId>,
    active: HashSet<PackageId>,
    manifests: Vec<(String, Uri)>,
    initialization_error: Option<String>,
}

/// Package metadata held in memory.
#[derive(Default)]
pub struct MemoryMetadata {
    state: Mutex<State>,
}

impl MemoryMetadata {
    /// Creates an empty metadata source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a package's metadata.
    pub fn insert(&self, metadata: KnownMetadata) {
        let mut state = self.state.lock().unwrap();
        state.packages.insert(metadata.id.clone(), metadata);
    }

    /// Forgets a package.
    pub fn remove(&self, id: &PackageId) {
        self.state.lock().unwrap().packages.remove(id);
    }

    /// Marks `id` as part of the editable workspace.
    pub fn set_workspace(&self, id: PackageId, workspace: bool) {
        let mut state = self.state.lock().unwrap();
        if workspace {
            state.workspace.insert(id);
        } else {
            state.workspace.remove(&id);
        }
    }

    /// Marks `id` as having an open file.
    pub fn set_active(&self, id: PackageId, active: bool) {
        let mut state = self.state.lock().unwrap();
        if active {
            state.active.insert(id);
        } else {
            state.active.remove(&id);
        }
    }

    /// Makes `manifest` govern every file whose URI starts with `prefix`.
    pub fn set_manifest(&self, prefix: &str, manifest: Uri) {
        self.state
            .lock()
            .unwrap()
            .manifests
            .push((prefix.to_string(), manifest));
    }

    /// Sets the workspace initialization error.
    pub fn set_initialization_error(&self, err: Option<&str>) {
        self.state.lock().unwrap().initialization_error = err.map(str::to_string);
    }
}

impl MetadataSource for MemoryMetadata {
    fn metadata(&self, id: &PackageId) -> Option<KnownMetadata> {
        self.state.lock().unwrap().packages.get(id).cloned()
    }

    fn is_workspace_package(&self, id: &PackageId) -> bool {
        self.state.lock().unwrap().workspace.contains(id)
    }

    fn is_active(&self, id: &PackageId) -> bool {
        self.state.lock().unwrap().active.contains(id)
    }

    fn module_manifest_for(&self, uri: &Uri) -> Option<Uri> {
        self.state
            .lock()
            .unwrap()
            .manifests
            .iter()
            .find(|(prefix, _)| uri.as_str().starts_with(prefix.as_str()))
            .map(|(_, manifest)| manifest.clone())
    }

    fn initialization_error(&self) -> Option<String> {
        self.state.lock().unwrap().initialization_error.clone()
    }
}
