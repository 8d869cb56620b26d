//! JSON-file backed store
//!
//! All entries live in one JSON object on disk. Writes go to a temp file in
//! the same directory and are renamed into place so readers never observe a
//! partial file. This backend keeps the device key in the clear on disk and
//! is meant for development hosts and the CLI; devices should use the
//! keychain backend.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aura_core::{VaultError, VaultResult};
use tokio::sync::Mutex;

use crate::store::KeyValueStore;

pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> VaultResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                VaultError::StoreIo(format!("parsing {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(VaultError::StoreIo(format!(
                "reading {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> VaultResult<()> {
        let json = serde_json::to_string_pretty(entries)?;
        atomic_replace(&self.path, json.as_bytes())
            .await
            .map_err(|e| VaultError::StoreIo(format!("writing {}: {e}", self.path.display())))
    }
}

/// Write to `.<name>.tmp` next to `path`, restrict it to the owner, then
/// rename over `path`.
async fn atomic_replace(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    if !parent.as_os_str().is_empty() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    tokio::fs::write(&tmp_path, content).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    tokio::fs::rename(&tmp_path, path).await
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> VaultResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await?;
        tracing::debug!(key, path = %self.path.display(), "stored entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> VaultResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
            tracing::debug!(key, path = %self.path.display(), "deleted entry");
        }
        Ok(())
    }
}
