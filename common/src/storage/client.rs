use std::{fmt, str::FromStr};

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{error::AppError, utils::config::AppConfig};

use super::{
    store::ChunkStore,
    types::{
        chunk::{Chunk, ChunkPage, ChunkSummary, NewChunk},
        collection::{Collection, NewCollection},
        ApiEnvelope, ListEnvelope,
    },
};

/// Candidate paths for chunk creation, tried in the configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkEndpoint {
    /// `chunks`
    Generic,
    /// `collections/{id}/chunks`
    Collection,
    /// `embeddings`
    Embeddings,
}

impl ChunkEndpoint {
    pub fn path(self, collection_id: &str) -> String {
        match self {
            Self::Generic => "chunks".to_string(),
            Self::Collection => format!("collections/{collection_id}/chunks"),
            Self::Embeddings => "embeddings".to_string(),
        }
    }
}

impl fmt::Display for ChunkEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Collection => write!(f, "collection"),
            Self::Embeddings => write!(f, "embeddings"),
        }
    }
}

impl FromStr for ChunkEndpoint {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "chunks" => Ok(Self::Generic),
            "collection" | "collection-scoped" => Ok(Self::Collection),
            "embeddings" => Ok(Self::Embeddings),
            other => Err(AppError::Validation(format!(
                "unknown chunk endpoint '{other}'. Expected 'generic', 'collection', or 'embeddings'."
            ))),
        }
    }
}

/// Cuts `content` to its first `limit` characters. Never splits a UTF-8 sequence.
pub fn truncate_content(content: &str, limit: usize) -> &str {
    content
        .char_indices()
        .nth(limit)
        .and_then(|(byte_idx, _)| content.get(..byte_idx))
        .unwrap_or(content)
}

/// REST client for the chunk store.
#[derive(Clone)]
pub struct ChunkStoreClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    chunk_endpoints: Vec<ChunkEndpoint>,
    content_char_limit: usize,
}

impl ChunkStoreClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url,
            api_key: api_key.to_string(),
            chunk_endpoints: vec![ChunkEndpoint::Collection],
            content_char_limit: crate::utils::config::default_content_char_limit(),
        })
    }

    /// Builds a client from configuration; the store URL and API key must be set.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        if config.chunk_store_base_url.trim().is_empty() {
            return Err(AppError::Validation(
                "chunk_store_base_url is required for chunk store commands".into(),
            ));
        }
        if config.chunk_store_api_key.trim().is_empty() {
            return Err(AppError::Validation(
                "chunk_store_api_key is required for chunk store commands".into(),
            ));
        }
        Ok(
            Self::new(&config.chunk_store_base_url, &config.chunk_store_api_key)?
                .with_chunk_endpoints(config.chunk_endpoints.clone())
                .with_content_char_limit(config.content_char_limit),
        )
    }

    #[must_use]
    pub fn with_chunk_endpoints(mut self, endpoints: Vec<ChunkEndpoint>) -> Self {
        self.chunk_endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn with_content_char_limit(mut self, limit: usize) -> Self {
        self.content_char_limit = limit;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base_url.join(path)?)
    }

    /// Sends an authorized request; transport failures and non-2xx statuses are errors.
    async fn dispatch(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response, AppError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| AppError::remote(operation, None, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::remote(operation, Some(status.as_u16()), body));
        }

        Ok(response)
    }

    async fn decode<B: DeserializeOwned>(
        operation: &str,
        response: Response,
    ) -> Result<B, AppError> {
        let status = response.status();
        response.json().await.map_err(|err| {
            AppError::remote(
                operation,
                Some(status.as_u16()),
                format!("unexpected response body: {err}"),
            )
        })
    }

    async fn send_raw<B: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<B, AppError> {
        let response = self.dispatch(operation, request).await?;
        Self::decode(operation, response).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, AppError> {
        let envelope: ApiEnvelope<T> = self.send_raw(operation, request).await?;
        Ok(envelope.data)
    }

    async fn send_list<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>, AppError> {
        let envelope: ListEnvelope<T> = self.send_raw(operation, request).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl ChunkStore for ChunkStoreClient {
    async fn list_collections(&self) -> Result<Vec<Collection>, AppError> {
        let url = self.url("collections")?;
        self.send_list("list collections", self.http.get(url)).await
    }

    async fn create_collection(&self, request: &NewCollection) -> Result<Collection, AppError> {
        let url = self.url("collections")?;
        let collection: Collection = self
            .send("create collection", self.http.post(url).json(request))
            .await?;
        debug!(
            collection_id = %collection.collection_id,
            name = %collection.name,
            "collection created"
        );
        Ok(collection)
    }

    async fn get_collection(&self, collection_id: &str) -> Result<Collection, AppError> {
        let url = self.url(&format!("collections/{collection_id}"))?;
        self.send("get collection", self.http.get(url)).await
    }

    async fn create_chunk(&self, collection_id: &str, content: &str) -> Result<Chunk, AppError> {
        let truncated = truncate_content(content, self.content_char_limit);
        if truncated.len() < content.len() {
            debug!(
                collection_id,
                limit = self.content_char_limit,
                "chunk content truncated before upload"
            );
        }
        let body = NewChunk {
            collection_id,
            content: truncated,
        };

        let mut failures: Vec<String> = Vec::new();
        for endpoint in &self.chunk_endpoints {
            let url = self.url(&endpoint.path(collection_id))?;
            let response = match self
                .dispatch("create chunk", self.http.post(url).json(&body))
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    debug!(collection_id, %endpoint, error = %err, "chunk endpoint candidate failed");
                    failures.push(format!("{endpoint}: {err}"));
                    continue;
                }
            };

            // A 2xx ends failover even when its body is unreadable.
            let envelope: ApiEnvelope<Chunk> = Self::decode("create chunk", response)
                .await
                .inspect_err(|err| {
                    warn!(
                        collection_id,
                        %endpoint,
                        error = %err,
                        "chunk accepted but the response could not be read"
                    );
                })?;
            if !failures.is_empty() {
                warn!(
                    collection_id,
                    %endpoint,
                    failed_candidates = %failures.join("; "),
                    "chunk created on a fallback endpoint"
                );
            }
            return Ok(envelope.data);
        }

        Err(AppError::remote(
            "create chunk",
            None,
            format!(
                "all {} endpoint candidates failed [{}]",
                self.chunk_endpoints.len(),
                failures.join("; ")
            ),
        ))
    }

    async fn list_chunks(
        &self,
        collection_id: &str,
        page: &ChunkPage,
    ) -> Result<Vec<ChunkSummary>, AppError> {
        let url = self.url(&format!("collections/{collection_id}/chunks"))?;
        let mut query: Vec<(&str, String)> = vec![
            ("limit", page.limit.to_string()),
            ("order", "desc".to_string()),
        ];
        if let Some(after) = &page.after {
            query.push(("after", after.clone()));
        }

        self.send_list("list chunks", self.http.get(url).query(&query))
            .await
    }

    async fn get_chunk(&self, collection_id: &str, chunk_id: &str) -> Result<Chunk, AppError> {
        let url = self.url(&format!("collections/{collection_id}/chunks/{chunk_id}"))?;
        self.send("get chunk", self.http.get(url)).await
    }
}
