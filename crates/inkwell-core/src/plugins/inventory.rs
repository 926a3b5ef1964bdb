use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use thiserror::Error;
use tokio::fs;
use tracing::warn;

use super::types::{PluginManifest, PluginRecord};

/// Name of the manifest file inside a plugin package directory.
const MANIFEST_FILE: &str = "plugin.toml";

/// Behavior when two installed plugins derive the same slug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlugCollisionPolicy {
    /// The first record in enumeration order wins.
    #[default]
    FirstWins,
    /// Ambiguous lookups are refused.
    Reject,
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read plugins directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("slug '{slug}' matches more than one installed plugin")]
    AmbiguousSlug { slug: String },
}

#[derive(Debug, Error)]
pub enum UninstallError {
    #[error("plugin files are no longer present at {path}")]
    Missing { path: PathBuf },
    #[error("filesystem permission denied while removing {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("removal of {path} aborted before completion")]
    Aborted { path: PathBuf },
    #[error("removal of {path} could not be confirmed by the inventory")]
    Incomplete { path: PathBuf },
}

/// Inventory of plugin packages installed under a single root directory.
///
/// A package is either a subdirectory containing a `plugin.toml` manifest
/// or a top-level `*.toml` file that is itself the manifest. The inventory
/// holds no state between calls; every operation re-reads the filesystem,
/// so results always reflect the current on-disk packages.
#[derive(Debug, Clone)]
pub struct PluginInventory {
    root: PathBuf,
    collision_policy: SlugCollisionPolicy,
}

impl PluginInventory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            collision_policy: SlugCollisionPolicy::default(),
        }
    }

    pub fn with_collision_policy(mut self, policy: SlugCollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate all installed plugins.
    ///
    /// Entries that fail to parse or declare no name are skipped with a
    /// warning and the collection continues. A missing root directory is
    /// an empty inventory. Records sort by install path, so order is
    /// deterministic across calls.
    pub async fn enumerate(&self) -> Result<Vec<PluginRecord>, InventoryError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let scan_error = |source| InventoryError::Scan {
            path: self.root.clone(),
            source,
        };
        let mut dir = fs::read_dir(&self.root).await.map_err(scan_error)?;

        let mut records = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(scan_error)? {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };

            let manifest_path = if file_type.is_dir() {
                let candidate = entry.path().join(MANIFEST_FILE);
                if !candidate.is_file() {
                    continue;
                }
                candidate
            } else if entry.path().extension().is_some_and(|ext| ext == "toml") {
                entry.path()
            } else {
                continue;
            };

            match read_manifest(&manifest_path).await {
                Ok(manifest) => {
                    let install_path = manifest_path
                        .strip_prefix(&self.root)
                        .unwrap_or(&manifest_path)
                        .to_path_buf();
                    records.push(PluginRecord {
                        install_path,
                        manifest,
                    });
                }
                Err(err) => {
                    warn!(
                        "Skipping plugin entry {}: {:#}",
                        manifest_path.display(),
                        err
                    );
                }
            }
        }

        records.sort_by(|a, b| a.install_path.cmp(&b.install_path));
        Ok(records)
    }

    /// Find the installed plugin whose derived slug matches `slug`.
    ///
    /// The slug is recomputed from each record's declared name on every
    /// call; nothing is cached between lookups. Collisions resolve per the
    /// inventory's [`SlugCollisionPolicy`].
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<PluginRecord>, InventoryError> {
        let mut matched: Option<PluginRecord> = None;

        for record in self.enumerate().await? {
            if record.slug() != slug {
                continue;
            }
            match self.collision_policy {
                SlugCollisionPolicy::FirstWins => return Ok(Some(record)),
                SlugCollisionPolicy::Reject => {
                    if matched.is_some() {
                        return Err(InventoryError::AmbiguousSlug {
                            slug: slug.to_string(),
                        });
                    }
                    matched = Some(record);
                }
            }
        }

        Ok(matched)
    }

    /// Remove an installed plugin's files.
    ///
    /// The deletion runs on a blocking worker; a panicking filesystem
    /// primitive surfaces as [`UninstallError::Aborted`] instead of
    /// unwinding the calling process. Success is reported only after the
    /// record is confirmed gone from a fresh enumeration.
    pub async fn remove(&self, record: &PluginRecord) -> Result<(), UninstallError> {
        let manifest_path = self.root.join(&record.install_path);

        // Directory packages are removed whole; a single-file package is
        // just its manifest.
        let target = match record.install_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.root.join(parent),
            _ => manifest_path,
        };

        if !target.exists() {
            return Err(UninstallError::Missing {
                path: record.install_path.clone(),
            });
        }

        let is_dir = target.is_dir();
        let removal_target = target.clone();
        let result = tokio::task::spawn_blocking(move || {
            if is_dir {
                std::fs::remove_dir_all(&removal_target)
            } else {
                std::fs::remove_file(&removal_target)
            }
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(source)) if source.kind() == io::ErrorKind::NotFound => {
                return Err(UninstallError::Missing {
                    path: record.install_path.clone(),
                });
            }
            Ok(Err(source)) if source.kind() == io::ErrorKind::PermissionDenied => {
                return Err(UninstallError::PermissionDenied {
                    path: record.install_path.clone(),
                    source,
                });
            }
            Ok(Err(source)) => {
                return Err(UninstallError::Io {
                    path: record.install_path.clone(),
                    source,
                });
            }
            // The blocking task panicked or was cancelled. The process
            // keeps running; the caller sees a normal error.
            Err(join_error) => {
                warn!(
                    "Removal task for {} did not complete: {}",
                    record.install_path.display(),
                    join_error
                );
                return Err(UninstallError::Aborted {
                    path: record.install_path.clone(),
                });
            }
        }

        // Report success only once the package no longer enumerates.
        match self.enumerate().await {
            Ok(survivors)
                if survivors
                    .iter()
                    .any(|r| r.install_path == record.install_path) =>
            {
                Err(UninstallError::Incomplete {
                    path: record.install_path.clone(),
                })
            }
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(
                    "Could not confirm removal of {}: {}",
                    record.install_path.display(),
                    err
                );
                Err(UninstallError::Incomplete {
                    path: record.install_path.clone(),
                })
            }
        }
    }
}

async fn read_manifest(path: &Path) -> anyhow::Result<PluginManifest> {
    let contents = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: PluginManifest = toml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if manifest.name.trim().is_empty() {
        bail!("manifest declares no plugin name");
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn write_package(root: &Path, dir: &str, manifest: &str) {
        let package_dir = root.join(dir);
        fs::create_dir_all(&package_dir).await.expect("package dir");
        fs::write(package_dir.join(MANIFEST_FILE), manifest)
            .await
            .expect("write manifest");
    }

    #[tokio::test]
    async fn enumerates_directory_and_single_file_packages() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();

        write_package(root, "hello-world", "name = \"Hello World\"\nversion = \"1.0\"\n").await;
        fs::write(root.join("standalone.toml"), "name = \"Standalone\"\n")
            .await
            .expect("write single-file package");

        let inventory = PluginInventory::new(root.to_path_buf());
        let records = inventory.enumerate().await.expect("enumerate");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].install_path, PathBuf::from("hello-world/plugin.toml"));
        assert_eq!(records[0].manifest.name, "Hello World");
        assert_eq!(records[1].install_path, PathBuf::from("standalone.toml"));
    }

    #[tokio::test]
    async fn missing_root_is_an_empty_inventory() {
        let temp = tempdir().expect("tempdir");
        let inventory = PluginInventory::new(temp.path().join("does-not-exist"));
        assert!(inventory.enumerate().await.expect("enumerate").is_empty());
    }

    #[tokio::test]
    async fn skips_invalid_entries_and_continues() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();

        write_package(root, "good", "name = \"Good Plugin\"\n").await;
        write_package(root, "nameless", "version = \"2.0\"\n").await;
        write_package(root, "broken", "name = \"unterminated\n").await;
        fs::create_dir_all(root.join("no-manifest"))
            .await
            .expect("bare dir");

        let inventory = PluginInventory::new(root.to_path_buf());
        let records = inventory.enumerate().await.expect("enumerate");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].manifest.name, "Good Plugin");
    }

    #[tokio::test]
    async fn finds_by_recomputed_slug() {
        let temp = tempdir().expect("tempdir");
        write_package(temp.path(), "caching", "name = \"My Plugin\"\n").await;

        let inventory = PluginInventory::new(temp.path().to_path_buf());
        let record = inventory
            .find_by_slug("my-plugin")
            .await
            .expect("lookup")
            .expect("record present");
        assert_eq!(record.manifest.name, "My Plugin");

        assert!(inventory
            .find_by_slug("nonexistent")
            .await
            .expect("lookup")
            .is_none());
    }

    #[tokio::test]
    async fn first_record_in_enumeration_order_wins_on_collision() {
        let temp = tempdir().expect("tempdir");
        write_package(temp.path(), "a-first", "name = \"Shared Name\"\nversion = \"1.0\"\n").await;
        write_package(temp.path(), "b-second", "name = \"Shared Name\"\nversion = \"2.0\"\n").await;

        let inventory = PluginInventory::new(temp.path().to_path_buf());
        let record = inventory
            .find_by_slug("shared-name")
            .await
            .expect("lookup")
            .expect("record present");
        assert_eq!(record.install_path, PathBuf::from("a-first/plugin.toml"));
    }

    #[tokio::test]
    async fn reject_policy_refuses_ambiguous_slugs() {
        let temp = tempdir().expect("tempdir");
        write_package(temp.path(), "a-first", "name = \"Shared Name\"\n").await;
        write_package(temp.path(), "b-second", "name = \"Shared Name\"\n").await;

        let inventory = PluginInventory::new(temp.path().to_path_buf())
            .with_collision_policy(SlugCollisionPolicy::Reject);
        let err = inventory
            .find_by_slug("shared-name")
            .await
            .expect_err("ambiguous lookup should fail");
        assert!(matches!(err, InventoryError::AmbiguousSlug { .. }));
    }

    #[tokio::test]
    async fn removes_directory_package_and_confirms() {
        let temp = tempdir().expect("tempdir");
        write_package(temp.path(), "hello-world", "name = \"Hello World\"\n").await;
        fs::write(temp.path().join("hello-world").join("extra.txt"), "data")
            .await
            .expect("extra file");

        let inventory = PluginInventory::new(temp.path().to_path_buf());
        let record = inventory
            .find_by_slug("hello-world")
            .await
            .expect("lookup")
            .expect("record present");

        inventory.remove(&record).await.expect("remove");
        assert!(!temp.path().join("hello-world").exists());
        assert!(inventory.enumerate().await.expect("enumerate").is_empty());

        // A second delete of the same record observes Missing.
        let err = inventory.remove(&record).await.expect_err("already gone");
        assert!(matches!(err, UninstallError::Missing { .. }));
    }

    #[tokio::test]
    async fn removes_single_file_package() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("standalone.toml"), "name = \"Standalone\"\n")
            .await
            .expect("write single-file package");

        let inventory = PluginInventory::new(temp.path().to_path_buf());
        let record = inventory
            .find_by_slug("standalone")
            .await
            .expect("lookup")
            .expect("record present");

        inventory.remove(&record).await.expect("remove");
        assert!(!temp.path().join("standalone.toml").exists());
        // The root itself survives single-file removal.
        assert!(temp.path().is_dir());
    }
}
