//! Integration source loaders.
//!
//! A loader supplies the registry with `{id, code, metadata}` records
//! wholesale — on initial load and on each reload. The filesystem layout
//! for [`DirectoryLoader`] is one directory per integration:
//!
//! ```text
//! integrations/
//!   gh-deploys/
//!     metadata.json    # IntegrationMetadata (camelCase)
//!     index.js         # entry script (any `index.*` extension)
//!     helper.js        # sibling imports resolve here
//!     data/            # optional static files passed to the module
//!       regions.json
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use glance_core::{DataFile, Integration, IntegrationMetadata, SourceLocation};

use crate::errors::LoaderError;

/// Supplies the full integration set. Implementations are expected to be
/// re-invoked on reload; the registry replaces its snapshot wholesale.
#[async_trait]
pub trait IntegrationLoader: Send + Sync {
    /// Produce every loadable integration.
    async fn load(&self) -> Result<Vec<Integration>, LoaderError>;
}

/// Loads integrations from one directory per module.
///
/// Problems inside a single integration directory (missing metadata,
/// unreadable entry, malformed JSON) are logged and skip that integration
/// only. An unreadable root is a hard error.
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    /// Loader rooted at the given integrations directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load_one(dir: &Path) -> Result<Integration, String> {
        let id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let metadata_path = dir.join("metadata.json");
        let metadata_text = std::fs::read_to_string(&metadata_path)
            .map_err(|e| format!("missing or unreadable metadata.json: {e}"))?;
        let metadata: IntegrationMetadata = serde_json::from_str(&metadata_text)
            .map_err(|e| format!("malformed metadata.json: {e}"))?;

        let entry = find_entry(dir).ok_or("no index.* entry script found")?;
        let code = std::fs::read_to_string(&entry)
            .map_err(|e| format!("unreadable entry script {}: {e}", entry.display()))?;

        let data_files = load_data_files(&dir.join("data"));

        Ok(Integration {
            id,
            code,
            metadata,
            data_files,
            source: Some(SourceLocation {
                dir: dir.to_path_buf(),
                entry,
            }),
        })
    }
}

/// First `index.*` file in the directory, name-sorted for determinism.
fn find_entry(dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let is_entry =
                path.is_file() && path.file_stem().and_then(|s| s.to_str()) == Some("index");
            is_entry.then_some(path)
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Read every regular file under `data/`, name-sorted. Missing dir ⇒ empty.
fn load_data_files(data_dir: &Path) -> Vec<DataFile> {
    let Ok(entries) = std::fs::read_dir(data_dir) else {
        return Vec::new();
    };
    let mut files: Vec<DataFile> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if !path.is_file() {
                return None;
            }
            let name = path.file_name()?.to_string_lossy().into_owned();
            match std::fs::read_to_string(&path) {
                Ok(content) => Some(DataFile { name, content }),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable data file");
                    None
                }
            }
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

#[async_trait]
impl IntegrationLoader for DirectoryLoader {
    async fn load(&self) -> Result<Vec<Integration>, LoaderError> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|source| LoaderError::RootUnreadable {
                path: self.root.clone(),
                source,
            })?;

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                path.is_dir().then_some(path)
            })
            .collect();
        // Directory enumeration order is platform-dependent; sort so load
        // order (and therefore equal-priority tie-breaks) is stable.
        dirs.sort();

        let mut integrations = Vec::with_capacity(dirs.len());
        for dir in dirs {
            match Self::load_one(&dir) {
                Ok(integration) => {
                    debug!(id = %integration.id, "loaded integration");
                    integrations.push(integration);
                }
                Err(reason) => {
                    warn!(dir = %dir.display(), reason, "skipping integration directory");
                }
            }
        }
        Ok(integrations)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
