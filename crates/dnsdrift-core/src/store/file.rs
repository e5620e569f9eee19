// # File Baseline Store
//
// File-backed implementation of BaselineStore with crash recovery.
//
// ## Purpose
//
// Remembers the most recently observed value set per record across daemon
// restarts, so the first cycle after a restart compares against what was
// last seen instead of the static expected values.
//
// ## Crash Recovery
//
// - Atomic writes: new state goes to a temporary file, then rename
// - Corruption detection: JSON validated on load
// - Automatic backup: last known good state kept in a `.backup` file
// - Recovery: falls back to the backup if the main file is corrupted
//
// ## File Format
//
// ```json
// {
//   "version": "1",
//   "entries": {
//     "example.com:A": ["1.1.1.1"],
//     "example.com:MX": ["mail.example.com."]
//   }
// }
// ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::config::{RecordType, StoreConfig};
use crate::error::{Error, Result};
use crate::traits::store::{BaselineStore, StoreFactory};

/// Baseline file format version
const BASELINE_FILE_VERSION: &str = "1";

/// Serializable baseline file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct BaselineFileFormat {
    version: String,
    entries: HashMap<String, Vec<String>>,
}

/// File-backed baseline store with atomic writes and backup recovery
#[derive(Debug)]
pub struct FileBaselineStore {
    path: PathBuf,
    key_prefix: Option<String>,
    entries: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl FileBaselineStore {
    /// Open or create a file baseline store
    ///
    /// Loads existing entries, recovering from the backup file if the main
    /// file is corrupted; both unreadable means starting empty. The load is
    /// synchronous because it happens once, before any cycle runs.
    pub fn open<P: AsRef<Path>>(path: P, key_prefix: Option<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::store(format!(
                    "failed to create baseline directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let entries = Self::load_with_recovery(&path)?;

        Ok(Self {
            path,
            key_prefix,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    fn load_with_recovery(path: &Path) -> Result<HashMap<String, Vec<String>>> {
        match Self::load(path) {
            Ok(entries) => {
                tracing::debug!("loaded {} baseline entries from {}", entries.len(), path.display());
                Ok(entries)
            }
            Err(e) => {
                tracing::warn!(
                    "baseline file {} unreadable ({e}), attempting backup recovery",
                    path.display()
                );

                let backup = Self::backup_path(path);
                if backup.exists() {
                    match Self::load(&backup) {
                        Ok(entries) => {
                            tracing::info!(
                                "recovered {} baseline entries from backup",
                                entries.len()
                            );
                            Ok(entries)
                        }
                        Err(backup_err) => {
                            tracing::error!(
                                "backup also unreadable ({backup_err}), starting with empty baseline"
                            );
                            Ok(HashMap::new())
                        }
                    }
                } else {
                    tracing::warn!("no backup file found, starting with empty baseline");
                    Ok(HashMap::new())
                }
            }
        }
    }

    fn load(path: &Path) -> Result<HashMap<String, Vec<String>>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::store(format!("failed to read {}: {e}", path.display())))?;

        let file: BaselineFileFormat = serde_json::from_str(&content)
            .map_err(|e| Error::store(format!("failed to parse {}: {e}", path.display())))?;

        if file.version != BASELINE_FILE_VERSION {
            tracing::warn!(
                "baseline file version mismatch: expected {BASELINE_FILE_VERSION}, got {}",
                file.version
            );
        }

        Ok(file.entries)
    }

    /// Write the current entries to disk atomically
    async fn write_state(&self) -> Result<()> {
        let entries = self.entries.read().await.clone();

        let file = BaselineFileFormat {
            version: BASELINE_FILE_VERSION.to_string(),
            entries,
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::store(format!("failed to serialize baseline: {e}")))?;

        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!("failed to create {}: {e}", temp_path.display()))
            })?;
            temp.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!("failed to write {}: {e}", temp_path.display()))
            })?;
            temp.flush().await.map_err(|e| {
                Error::store(format!("failed to flush {}: {e}", temp_path.display()))
            })?;
        }

        if self.path.exists() {
            let backup = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup).await {
                tracing::warn!("failed to refresh baseline backup: {e}");
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "failed to rename {} to {}: {e}",
                temp_path.display(),
                self.path.display()
            ))
        })?;

        tracing::trace!("baseline written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    fn entry_key(&self, fqdn: &str, record_type: RecordType) -> String {
        super::entry_key(self.key_prefix.as_deref(), fqdn, record_type)
    }
}

#[async_trait]
impl BaselineStore for FileBaselineStore {
    async fn get(&self, fqdn: &str, record_type: RecordType) -> Result<Vec<String>> {
        let guard = self.entries.read().await;
        Ok(guard
            .get(&self.entry_key(fqdn, record_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn set(&self, fqdn: &str, record_type: RecordType, values: &[String]) -> Result<()> {
        let key = self.entry_key(fqdn, record_type);
        {
            let mut guard = self.entries.write().await;
            guard.remove(&key);
            guard.insert(key, values.to_vec());
        }

        // immediate write for durability
        self.write_state().await
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for file baseline stores
pub struct FileStoreFactory;

impl StoreFactory for FileStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn BaselineStore>> {
        match config {
            StoreConfig::File { path, key_prefix } => Ok(Box::new(FileBaselineStore::open(
                path,
                key_prefix.clone(),
            )?)),
            other => Err(Error::config(format!(
                "file store factory cannot build '{}' store",
                other.type_name()
            ))),
        }
    }
}
