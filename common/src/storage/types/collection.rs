use serde::{Deserialize, Serialize};

/// A capacity-bounded remote container of chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collection {
    pub collection_id: String,
    pub name: String,
    #[serde(default)]
    pub embedding_model_id: String,
    #[serde(default)]
    pub capacity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_chunks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_timestamp: Option<i64>,
}

/// Request body for collection creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCollection {
    pub name: String,
    pub embedding_model_id: String,
    pub capacity: u64,
}

impl Collection {
    /// Looks a collection up by id first, then by name.
    pub fn resolve<'a>(collections: &'a [Collection], key: &str) -> Option<&'a Collection> {
        collections
            .iter()
            .find(|c| c.collection_id == key)
            .or_else(|| collections.iter().find(|c| c.name == key))
    }
}
