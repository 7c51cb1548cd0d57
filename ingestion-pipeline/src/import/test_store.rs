use std::sync::Mutex;

use async_trait::async_trait;
use common::{
    error::AppError,
    storage::{
        store::ChunkStore,
        types::{
            chunk::{Chunk, ChunkPage, ChunkSummary},
            collection::{Collection, NewCollection},
        },
    },
};
use serde_json::Map;

#[derive(Default)]
struct StoreState {
    collections: Vec<Collection>,
    chunks: Vec<Chunk>,
    detail_fetches: usize,
    list_calls: usize,
}

/// In-memory chunk store with failure injection.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    state: Mutex<StoreState>,
    failing_collection_names: Vec<String>,
    failing_content: Vec<String>,
    failing_details: Vec<String>,
    failing_list_call: Option<usize>,
}

impl InMemoryStore {
    pub(crate) fn with_collection(collection_id: &str, name: &str) -> Self {
        let store = Self::default();
        store.lock().collections.push(collection(collection_id, name, 1000));
        store
    }

    pub(crate) fn failing_collection(mut self, name: &str) -> Self {
        self.failing_collection_names.push(name.to_string());
        self
    }

    pub(crate) fn failing_content(mut self, needle: &str) -> Self {
        self.failing_content.push(needle.to_string());
        self
    }

    pub(crate) fn failing_detail(mut self, chunk_id: &str) -> Self {
        self.failing_details.push(chunk_id.to_string());
        self
    }

    /// Fails the `call`-th chunk listing (1-based).
    pub(crate) fn failing_list_call(mut self, call: usize) -> Self {
        self.failing_list_call = Some(call);
        self
    }

    pub(crate) fn seed_chunks(&self, collection_id: &str, contents: &[&str]) {
        let mut state = self.lock();
        for content in contents {
            let chunk = new_chunk(state.chunks.len() + 1, collection_id, content);
            state.chunks.push(chunk);
        }
    }

    pub(crate) fn collections(&self) -> Vec<Collection> {
        self.lock().collections.clone()
    }

    pub(crate) fn contents(&self, collection_id: &str) -> Vec<String> {
        self.lock()
            .chunks
            .iter()
            .filter(|c| c.collection_id == collection_id)
            .map(|c| c.content.clone())
            .collect()
    }

    pub(crate) fn detail_fetches(&self) -> usize {
        self.lock().detail_fetches
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("store lock")
    }
}

fn collection(collection_id: &str, name: &str, capacity: u64) -> Collection {
    Collection {
        collection_id: collection_id.to_string(),
        name: name.to_string(),
        embedding_model_id: "model".to_string(),
        capacity,
        num_chunks: None,
        created_timestamp: None,
        updated_timestamp: None,
    }
}

fn new_chunk(number: usize, collection_id: &str, content: &str) -> Chunk {
    Chunk {
        chunk_id: format!("chunk-{number}"),
        record_id: None,
        collection_id: collection_id.to_string(),
        content: content.to_string(),
        num_tokens: Some(content.chars().count() as u64),
        metadata: Map::new(),
        updated_timestamp: Some(number as i64),
        created_timestamp: Some(number as i64),
    }
}

fn rejected(operation: &str) -> AppError {
    AppError::remote(operation, Some(500), "injected failure")
}

#[async_trait]
impl ChunkStore for InMemoryStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, AppError> {
        Ok(self.collections())
    }

    async fn create_collection(&self, request: &NewCollection) -> Result<Collection, AppError> {
        if self.failing_collection_names.contains(&request.name) {
            return Err(rejected("create collection"));
        }
        let mut state = self.lock();
        let created = collection(
            &format!("col-{}", state.collections.len() + 1),
            &request.name,
            request.capacity,
        );
        state.collections.push(created.clone());
        Ok(created)
    }

    async fn get_collection(&self, collection_id: &str) -> Result<Collection, AppError> {
        Collection::resolve(&self.lock().collections, collection_id)
            .cloned()
            .ok_or_else(|| AppError::remote("get collection", Some(404), "no such collection"))
    }

    async fn create_chunk(&self, collection_id: &str, content: &str) -> Result<Chunk, AppError> {
        if self.failing_content.iter().any(|needle| content.contains(needle)) {
            return Err(rejected("create chunk"));
        }
        let mut state = self.lock();
        let chunk = new_chunk(state.chunks.len() + 1, collection_id, content);
        state.chunks.push(chunk.clone());
        Ok(chunk)
    }

    async fn list_chunks(
        &self,
        collection_id: &str,
        page: &ChunkPage,
    ) -> Result<Vec<ChunkSummary>, AppError> {
        let mut state = self.lock();
        state.list_calls += 1;
        if self.failing_list_call == Some(state.list_calls) {
            return Err(rejected("list chunks"));
        }

        let newest_first = state
            .chunks
            .iter()
            .rev()
            .filter(|c| c.collection_id == collection_id);
        let page_items: Vec<ChunkSummary> = match &page.after {
            Some(cursor) => newest_first
                .skip_while(|c| &c.chunk_id != cursor)
                .skip(1)
                .take(page.limit)
                .map(|c| ChunkSummary {
                    chunk_id: c.chunk_id.clone(),
                })
                .collect(),
            None => newest_first
                .take(page.limit)
                .map(|c| ChunkSummary {
                    chunk_id: c.chunk_id.clone(),
                })
                .collect(),
        };
        Ok(page_items)
    }

    async fn get_chunk(&self, collection_id: &str, chunk_id: &str) -> Result<Chunk, AppError> {
        let mut state = self.lock();
        state.detail_fetches += 1;
        if self.failing_details.iter().any(|id| id == chunk_id) {
            return Err(rejected("get chunk"));
        }
        state
            .chunks
            .iter()
            .find(|c| c.collection_id == collection_id && c.chunk_id == chunk_id)
            .cloned()
            .ok_or_else(|| AppError::remote("get chunk", Some(404), "no such chunk"))
    }
}
