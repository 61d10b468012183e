//! Composite keys for package handles.

use crate::metadata::{BuildConfig, KnownMetadata, PackageId};
use kiln_common::{ContentHash, ContentHasher};
use kiln_source::{FileHandle, ParseMode};
use std::fmt;

/// The composite key of one package handle.
///
/// Equal keys imply equal type-check results; the cache never checks the
/// same key twice while any generation holds it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PackageKey(ContentHash);

impl PackageKey {
    /// Returns the underlying digest.
    pub fn hash(&self) -> ContentHash {
        self.0
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Computes the key for checking package `id` over `compiled_files` in `mode`.
///
/// Fields are folded in a fixed order: id, module language version, build
/// configuration hash (unless `experimental_key`), mode, dependency keys and
/// compiled-file identities. `deps` holds one slot per declared dependency;
/// a dropped dependency is `None` and is encoded as such.
pub fn compute_package_key(
    id: &PackageId,
    compiled_files: &[FileHandle],
    metadata: &KnownMetadata,
    deps: &[Option<PackageKey>],
    mode: ParseMode,
    experimental_key: bool,
) -> PackageKey {
    let mut hasher = ContentHasher::new();
    hasher.write_str(id.as_str());
    match &metadata.module {
        Some(module) => hasher.write_u8(1).write_str(&module.lang_version),
        None => hasher.write_u8(0),
    };
    if experimental_key {
        hasher.write_u8(0);
    } else {
        hasher.write_u8(1).write_hash(&hash_config(&metadata.config));
    }
    hasher.write_u8(mode.as_byte());

    hasher.write_field(&(deps.len() as u64).to_le_bytes());
    for dep in deps {
        match dep {
            Some(key) => hasher.write_u8(1).write_hash(&key.0),
            None => hasher.write_u8(0),
        };
    }

    hasher.write_field(&(compiled_files.len() as u64).to_le_bytes());
    for file in compiled_files {
        hasher.write_str(&file.identity().to_string());
    }
    PackageKey(hasher.finish())
}

/// Hashes the parts of the build configuration that can vary.
pub fn hash_config(config: &BuildConfig) -> ContentHash {
    let mut hasher = ContentHasher::new();
    hasher
        .write_str(&config.dir.to_string_lossy())
        .write_field(&config.mode.to_le_bytes());
    hasher.write_field(&(config.env.len() as u64).to_le_bytes());
    for entry in &config.env {
        hasher.write_str(entry);
    }
    hasher.write_field(&(config.build_flags.len() as u64).to_le_bytes());
    for flag in &config.build_flags {
        hasher.write_str(flag);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Metadata, ModuleInfo, PackagePath};
    use kiln_source::Uri;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn metadata(config: BuildConfig) -> KnownMetadata {
        KnownMetadata {
            metadata: Arc::new(Metadata {
                id: PackageId::new("a"),
                path: PackagePath::new("a"),
                name: "a".to_string(),
                go_files: vec![],
                compiled_files: vec![],
                deps: vec![],
                module: Some(ModuleInfo {
                    path: "example.com".to_string(),
                    version: String::new(),
                    lang_version: "1.18".to_string(),
                }),
                errors: vec![],
                deps_errors: vec![],
                config: Arc::new(config),
            }),
            valid: true,
        }
    }

    fn file(content: &str) -> FileHandle {
        FileHandle::new(Uri::new("file:///a/a.k"), content.as_bytes())
    }

    fn dep_key(n: u8) -> PackageKey {
        PackageKey(ContentHash::from_bytes(&[n]))
    }

    #[test]
    fn deterministic() {
        let m = metadata(BuildConfig::default());
        let id = PackageId::new("a");
        let files = [file("package a")];
        let deps = [Some(dep_key(1))];
        let k1 = compute_package_key(&id, &files, &m, &deps, ParseMode::Full, true);
        let k2 = compute_package_key(&id, &files, &m, &deps, ParseMode::Full, true);
        assert_eq!(k1, k2);
    }

    #[test]
    fn every_input_matters() {
        let m = metadata(BuildConfig::default());
        let id = PackageId::new("a");
        let files = [file("package a")];
        let deps = [Some(dep_key(1))];
        let base = compute_package_key(&id, &files, &m, &deps, ParseMode::Full, true);

        let other_id = PackageId::new("b");
        assert_ne!(base, compute_package_key(&other_id, &files, &m, &deps, ParseMode::Full, true));
        assert_ne!(base, compute_package_key(&id, &[file("package a // edited")], &m, &deps, ParseMode::Full, true));
        assert_ne!(base, compute_package_key(&id, &files, &m, &[Some(dep_key(2))], ParseMode::Full, true));
        assert_ne!(base, compute_package_key(&id, &files, &m, &[None], ParseMode::Full, true));
        assert_ne!(base, compute_package_key(&id, &files, &m, &deps, ParseMode::Exported, true));
        assert_ne!(base, compute_package_key(&id, &files, &m, &deps, ParseMode::Full, false));
    }

    #[test]
    fn dropped_slot_position_matters() {
        let m = metadata(BuildConfig::default());
        let id = PackageId::new("a");
        let a = compute_package_key(&id, &[], &m, &[None, Some(dep_key(1))], ParseMode::Full, true);
        let b = compute_package_key(&id, &[], &m, &[Some(dep_key(1)), None], ParseMode::Full, true);
        assert_ne!(a, b);
    }

    #[test]
    fn config_only_counts_without_experimental_key() {
        let id = PackageId::new("a");
        let files = [file("package a")];
        let m1 = metadata(BuildConfig::default());
        let m2 = metadata(BuildConfig {
            dir: PathBuf::from("/elsewhere"),
            ..BuildConfig::default()
        });
        assert_eq!(
            compute_package_key(&id, &files, &m1, &[], ParseMode::Full, true),
            compute_package_key(&id, &files, &m2, &[], ParseMode::Full, true)
        );
        assert_ne!(
            compute_package_key(&id, &files, &m1, &[], ParseMode::Full, false),
            compute_package_key(&id, &files, &m2, &[], ParseMode::Full, false)
        );
    }

    #[test]
    fn config_fields_do_not_run_together() {
        let a = BuildConfig {
            env: vec!["AB".to_string(), "C".to_string()],
            ..BuildConfig::default()
        };
        let b = BuildConfig {
            env: vec!["A".to_string(), "BC".to_string()],
            ..BuildConfig::default()
        };
        let c = BuildConfig {
            env: vec!["A".to_string()],
            build_flags: vec!["BC".to_string()],
            ..BuildConfig::default()
        };
        assert_ne!(hash_config(&a), hash_config(&b));
        assert_ne!(hash_config(&b), hash_config(&c));
    }
}
