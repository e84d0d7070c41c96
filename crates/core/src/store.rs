//! Registry persistence.
//!
//! The core never decides *when* to persist; the surrounding
//! application calls [`StateStore::save`] after mutations and
//! [`StateStore::load`] at startup.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::warn;

use crate::registry::Registry;

/// Directory under the user's config dir holding application state.
pub const DEFAULT_STATE_DIR: &str = "peloton";
/// File name of the persisted registry blob.
pub const STATE_FILE: &str = "registry.json";

/// Reads and writes the registry blob on disk.
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STATE_DIR)
    }

    /// Path of the registry blob.
    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    /// Load the persisted registry. A missing file yields an empty
    /// registry; an unreadable blob is reported, not silently dropped.
    pub fn load(&self) -> Result<Registry> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(Registry::new());
        }

        let blob = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let registry = Registry::deserialize(&blob)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(registry)
    }

    /// Like [`StateStore::load`] but falls back to an empty registry on
    /// a corrupt blob, logging the problem.
    pub fn load_or_default(&self) -> Registry {
        match self.load() {
            Ok(registry) => registry,
            Err(err) => {
                warn!("starting with empty registry: {err:#}");
                Registry::new()
            }
        }
    }

    /// Persist the registry, creating directories as needed.
    pub fn save(&self, registry: &Registry) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.state_path();
        write_blob(&path, &registry.serialize())
    }
}

fn write_blob(path: &Path, blob: &str) -> Result<()> {
    fs::write(path, blob).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Catalog, roster::RosterRules};
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = StateStore::new(dir.path());

        let rules = RosterRules::default();
        let catalog = Catalog::builtin();
        let mut registry = Registry::new();
        registry
            .get_or_create("alice", "Alice")
            .add_rider(catalog.find_by_name("PHILIPSEN Jasper").expect("rider"), &rules)
            .expect("add");

        store.save(&registry)?;
        assert!(store.state_path().exists());

        let restored = store.load()?;
        assert_eq!(restored, registry);
        Ok(())
    }

    #[test]
    fn missing_file_loads_empty_registry() -> Result<()> {
        let dir = tempdir()?;
        let store = StateStore::new(dir.path().join("never-written"));
        assert!(store.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn corrupt_blob_errors_but_default_path_recovers() -> Result<()> {
        let dir = tempdir()?;
        let store = StateStore::new(dir.path());
        fs::create_dir_all(dir.path())?;
        fs::write(store.state_path(), "{ not json")?;

        assert!(store.load().is_err());
        assert!(store.load_or_default().is_empty());
        Ok(())
    }
}
