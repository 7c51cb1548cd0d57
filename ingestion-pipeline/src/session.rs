use std::path::Path;

use common::{
    error::AppError,
    storage::{
        store::ChunkStore,
        types::{
            collection::Collection,
            qa_record::{QaPairsArtifact, QaRecord},
        },
    },
};
use tracing::debug;

/// State carried across the operations of one run: generated records and the
/// collection list last fetched from the store.
#[derive(Debug, Default)]
pub struct Session {
    records: Vec<QaRecord>,
    collections: Option<Vec<Collection>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<QaRecord>) -> Self {
        Self {
            records,
            collections: None,
        }
    }

    pub fn records(&self) -> &[QaRecord] {
        &self.records
    }

    pub fn replace_records(&mut self, records: Vec<QaRecord>) {
        self.records = records;
    }

    /// Drops records and the cached collection list.
    pub fn clear(&mut self) {
        self.records.clear();
        self.collections = None;
    }

    pub fn preview(&self, count: usize) -> &[QaRecord] {
        &self.records[..count.min(self.records.len())]
    }

    pub async fn collections(&mut self, store: &dyn ChunkStore) -> Result<&[Collection], AppError> {
        if self.collections.is_none() {
            return self.refresh_collections(store).await;
        }
        Ok(self.collections.as_deref().unwrap_or_default())
    }

    pub async fn refresh_collections(
        &mut self,
        store: &dyn ChunkStore,
    ) -> Result<&[Collection], AppError> {
        let collections = store.list_collections().await?;
        debug!(count = collections.len(), "collection list refreshed");
        Ok(self.collections.insert(collections).as_slice())
    }

    /// Finds a collection by id or name, refreshing the cache once on a miss.
    pub async fn resolve_collection(
        &mut self,
        store: &dyn ChunkStore,
        key: &str,
    ) -> Result<Collection, AppError> {
        if let Some(found) = Collection::resolve(self.collections(store).await?, key) {
            return Ok(found.clone());
        }
        Collection::resolve(self.refresh_collections(store).await?, key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("collection '{key}'")))
    }

    pub async fn write_records(&self, path: &Path) -> Result<(), AppError> {
        let artifact = QaPairsArtifact {
            qa_pairs: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&artifact)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub async fn read_records(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let artifact: QaPairsArtifact = serde_json::from_str(&raw)?;
        for record in &artifact.qa_pairs {
            record.validate()?;
        }
        Ok(Self::with_records(artifact.qa_pairs))
    }
}
