use super::{SourceError, VersionId, VersionSource};
use std::collections::HashMap;

/// Version source held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<(VersionId, Option<Vec<u8>>)>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a version; `None` records that the file does not exist
    pub fn add_version(&mut self, file: &str, version: &str, content: Option<Vec<u8>>) {
        self.files
            .entry(file.to_string())
            .or_default()
            .push((version.to_string(), content));
    }

    /// Build a file's history from text versions, numbered from 1
    pub fn with_text_versions(mut self, file: &str, versions: &[Option<&str>]) -> Self {
        for (i, text) in versions.iter().enumerate() {
            let id = (i + 1).to_string();
            self.add_version(file, &id, text.map(|t| t.as_bytes().to_vec()));
        }
        self
    }

    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.files.keys().cloned().collect();
        files.sort();
        files
    }
}

impl VersionSource for MemorySource {
    fn versions(&self, file: &str) -> Result<Vec<VersionId>, SourceError> {
        let history = self
            .files
            .get(file)
            .ok_or_else(|| SourceError::FileNotFound(file.to_string()))?;
        Ok(history.iter().map(|(id, _)| id.clone()).collect())
    }

    fn content(&self, file: &str, version: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let history = self
            .files
            .get(file)
            .ok_or_else(|| SourceError::FileNotFound(file.to_string()))?;
        history
            .iter()
            .find(|(id, _)| id == version)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| SourceError::VersionNotFound {
                file: file.to_string(),
                version: version.to_string(),
            })
    }
}
