//! Configuration types deserialized from `kiln.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// The top-level configuration parsed from `kiln.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KilnConfig {
    /// Package cache behavior.
    #[serde(default)]
    pub cache: CacheOptions,
    /// How the workspace resolves dependencies.
    #[serde(default)]
    pub workspace: WorkspaceOptions,
}

/// Options controlling the package cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Leave the build-configuration hash out of composite package keys.
    ///
    /// The build configuration (working directory, environment, flags) has
    /// already shaped the package's file list and dependency set, so omitting
    /// it raises the hit rate across otherwise identical environments at the
    /// cost of sensitivity to configuration-only changes.
    pub experimental_package_cache_key: bool,
    /// Which workspace packages are checked with full fidelity.
    pub memory_mode: MemoryMode,
    /// Whether the client renders structured related information.
    pub related_information_supported: bool,
    /// How the workspace resolves dependencies.
    #[serde(skip)]
    pub workspace: WorkspaceOptions,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            experimental_package_cache_key: true,
            memory_mode: MemoryMode::Normal,
            related_information_supported: false,
            workspace: WorkspaceOptions::default(),
        }
    }
}

/// Parse-mode policy for workspace packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryMode {
    /// Every workspace package is checked in full.
    #[default]
    Normal,
    /// Only workspace packages with open files are checked in full; the rest
    /// are checked for their exported surface only.
    DegradeClosed,
}

/// How import paths are resolved to packages in this workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyMode {
    /// Dependencies come from required modules.
    #[default]
    Module,
    /// Dependencies are found by searching source roots.
    Legacy,
}

/// Workspace dependency configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkspaceOptions {
    /// The dependency resolution mode.
    pub mode: DependencyMode,
    /// Root of the toolchain's standard packages (searched first in legacy mode).
    pub toolchain_root: PathBuf,
    /// Additional source roots searched in legacy mode, in order.
    pub search_paths: Vec<PathBuf>,
}
