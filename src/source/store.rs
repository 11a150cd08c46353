use super::{SourceError, VersionId, VersionSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;
use xxhash_rust::xxh64::xxh64;

const BLOB_DIR: &str = "blobs";
const HISTORY_DIR: &str = "history";
const INDEX_FILE: &str = "files.json";

/// Represents a single version entry in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: VersionId,
    /// Content hash, or `None` if the file was deleted at this version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Content-addressed store of file versions.
///
/// Blobs are keyed by XXHash64 and shared between files. Each tracked file
/// gets a UUID and a JSON history listing its versions in order.
pub struct BlobStore {
    data_dir: PathBuf,
    blobs_dir: PathBuf,
    history_dir: PathBuf,
}

impl BlobStore {
    /// Open a store rooted at `data_dir`, creating its directories
    pub fn open(data_dir: &Path) -> Result<Self, SourceError> {
        let blobs_dir = data_dir.join(BLOB_DIR);
        let history_dir = data_dir.join(HISTORY_DIR);

        fs::create_dir_all(&blobs_dir)?;
        fs::create_dir_all(&history_dir)?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            blobs_dir,
            history_dir,
        })
    }

    /// Calculate XXHash64 of content and return as hex string
    fn calculate_hash(content: &[u8]) -> String {
        let hash = xxh64(content, 0);
        format!("{:016x}", hash)
    }

    /// Save blob to storage if it doesn't already exist
    fn save_blob(&self, hash: &str, content: &[u8]) -> Result<(), SourceError> {
        let blob_path = self.blobs_dir.join(hash);
        if !blob_path.exists() {
            fs::write(blob_path, content)?;
        }
        Ok(())
    }

    fn load_index(&self) -> Result<BTreeMap<String, String>, SourceError> {
        let index_path = self.data_dir.join(INDEX_FILE);
        if !index_path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(index_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_index(&self, index: &BTreeMap<String, String>) -> Result<(), SourceError> {
        let content = serde_json::to_string_pretty(index)?;
        fs::write(self.data_dir.join(INDEX_FILE), content)?;
        Ok(())
    }

    fn file_id(&self, file: &str) -> Result<Option<String>, SourceError> {
        Ok(self.load_index()?.get(file).cloned())
    }

    fn get_or_create_file_id(&self, file: &str) -> Result<String, SourceError> {
        let mut index = self.load_index()?;
        if let Some(uuid) = index.get(file) {
            return Ok(uuid.clone());
        }

        let uuid = Uuid::new_v4().to_string();
        index.insert(file.to_string(), uuid.clone());
        self.save_index(&index)?;
        debug!("Tracking {} as {}", file, uuid);
        Ok(uuid)
    }

    fn load_history_by_uuid(&self, uuid: &str) -> Result<Vec<HistoryEntry>, SourceError> {
        let history_path = self.history_dir.join(format!("{}.json", uuid));
        if !history_path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(history_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_history(&self, uuid: &str, entries: &[HistoryEntry]) -> Result<(), SourceError> {
        let history_path = self.history_dir.join(format!("{}.json", uuid));
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(history_path, content)?;
        Ok(())
    }

    fn append(&self, file: &str, hash: Option<String>) -> Result<VersionId, SourceError> {
        let uuid = self.get_or_create_file_id(file)?;
        let mut history = self.load_history_by_uuid(&uuid)?;
        let id = Uuid::new_v4().to_string();
        history.push(HistoryEntry {
            id: id.clone(),
            hash,
            timestamp: Utc::now(),
        });
        self.save_history(&uuid, &history)?;
        Ok(id)
    }

    /// Record a new version of `file`
    pub fn save(&self, file: &str, content: &[u8]) -> Result<VersionId, SourceError> {
        let hash = Self::calculate_hash(content);
        self.save_blob(&hash, content)?;
        self.append(file, Some(hash))
    }

    /// Record that `file` no longer exists
    pub fn delete(&self, file: &str) -> Result<VersionId, SourceError> {
        self.append(file, None)
    }

    /// Version history of a file, oldest first
    pub fn load_history(&self, file: &str) -> Result<Vec<HistoryEntry>, SourceError> {
        let uuid = self
            .file_id(file)?
            .ok_or_else(|| SourceError::FileNotFound(file.to_string()))?;
        self.load_history_by_uuid(&uuid)
    }

    /// Read back the content stored under a hash
    pub fn restore_version(&self, hash: &str) -> Result<Vec<u8>, SourceError> {
        let blob_path = self.blobs_dir.join(hash);
        if !blob_path.exists() {
            return Err(SourceError::InvalidHash(format!(
                "Blob not found for hash: {}",
                hash
            )));
        }
        Ok(fs::read(blob_path)?)
    }

    /// All tracked file names
    pub fn files(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.load_index()?.into_keys().collect())
    }
}

impl VersionSource for BlobStore {
    fn versions(&self, file: &str) -> Result<Vec<VersionId>, SourceError> {
        Ok(self
            .load_history(file)?
            .into_iter()
            .map(|entry| entry.id)
            .collect())
    }

    fn content(&self, file: &str, version: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let entry = self
            .load_history(file)?
            .into_iter()
            .find(|entry| entry.id == version)
            .ok_or_else(|| SourceError::VersionNotFound {
                file: file.to_string(),
                version: version.to_string(),
            })?;

        match entry.hash {
            Some(hash) => Ok(Some(self.restore_version(&hash)?)),
            None => Ok(None),
        }
    }
}
