use serde::Deserialize;

pub mod chunk;
pub mod collection;
pub mod passage;
pub mod qa_record;

/// Every chunk-store response wraps its payload in a `data` field.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

/// List responses; `data` may be missing or `null` when there is nothing to list.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Option<Vec<T>>,
}
