use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Reads an explicit `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A stored record inside a collection. Field order is the export layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub chunk_id: String,
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collection_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub num_tokens: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub updated_timestamp: Option<i64>,
    #[serde(default)]
    pub created_timestamp: Option<i64>,
}

/// List-page form of a chunk; only the id is relied upon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSummary {
    pub chunk_id: String,
}

/// Request body for chunk creation.
#[derive(Debug, Clone, Serialize)]
pub struct NewChunk<'a> {
    pub collection_id: &'a str,
    pub content: &'a str,
}

/// Cursor-based page request for chunk listing, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPage {
    pub limit: usize,
    pub after: Option<String>,
}

impl ChunkPage {
    pub fn first(limit: usize) -> Self {
        Self { limit, after: None }
    }

    pub fn after(limit: usize, cursor: impl Into<String>) -> Self {
        Self {
            limit,
            after: Some(cursor.into()),
        }
    }
}
