use async_trait::async_trait;

use crate::error::AppError;

use super::types::{
    chunk::{Chunk, ChunkPage, ChunkSummary},
    collection::{Collection, NewCollection},
};

/// Operations consumed from the remote chunk store.
///
/// Every method is a single awaited round-trip; callers classify failures per item.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<Collection>, AppError>;

    async fn create_collection(&self, request: &NewCollection) -> Result<Collection, AppError>;

    async fn get_collection(&self, collection_id: &str) -> Result<Collection, AppError>;

    async fn create_chunk(&self, collection_id: &str, content: &str) -> Result<Chunk, AppError>;

    async fn list_chunks(
        &self,
        collection_id: &str,
        page: &ChunkPage,
    ) -> Result<Vec<ChunkSummary>, AppError>;

    async fn get_chunk(&self, collection_id: &str, chunk_id: &str) -> Result<Chunk, AppError>;
}
