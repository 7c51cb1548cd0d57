use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{
    error::AppError,
    storage::{client::ChunkEndpoint, types::qa_record::ContentTemplate},
};

/// Language of the instruction block wrapped around each passage.
#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptLanguage {
    #[default]
    English,
    Chinese,
}

/// How extracted documents are turned into passages.
#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationMode {
    /// Overlapping character windows.
    #[default]
    Window,
    /// One passage per structural element (paragraph, list item, ...).
    Structural,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub chunk_store_base_url: String,
    #[serde(default)]
    pub chunk_store_api_key: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_completion_model")]
    pub completion_model: String,
    #[serde(default)]
    pub embedding_model_id: Option<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_records_per_collection")]
    pub records_per_collection: usize,
    #[serde(default = "default_content_char_limit")]
    pub content_char_limit: usize,
    #[serde(default = "default_chunk_list_page_size")]
    pub chunk_list_page_size: usize,
    #[serde(default = "default_chunk_endpoints")]
    pub chunk_endpoints: Vec<ChunkEndpoint>,
    #[serde(default)]
    pub prompt_language: PromptLanguage,
    #[serde(default)]
    pub content_template: ContentTemplate,
    #[serde(default)]
    pub segmentation_mode: SegmentationMode,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

pub const fn default_chunk_size() -> usize {
    2_000
}

pub const fn default_chunk_overlap() -> usize {
    500
}

pub const fn default_records_per_collection() -> usize {
    1_000
}

pub const fn default_content_char_limit() -> usize {
    4_000
}

pub const fn default_chunk_list_page_size() -> usize {
    20
}

fn default_chunk_endpoints() -> Vec<ChunkEndpoint> {
    vec![ChunkEndpoint::Collection]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chunk_store_base_url: String::new(),
            chunk_store_api_key: String::new(),
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            completion_model: default_completion_model(),
            embedding_model_id: None,
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            records_per_collection: default_records_per_collection(),
            content_char_limit: default_content_char_limit(),
            chunk_list_page_size: default_chunk_list_page_size(),
            chunk_endpoints: default_chunk_endpoints(),
            prompt_language: PromptLanguage::default(),
            content_template: ContentTemplate::default(),
            segmentation_mode: SegmentationMode::default(),
        }
    }
}

impl AppConfig {
    /// Checks the numeric knobs that would otherwise only fail deep inside a run.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::Validation("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.records_per_collection == 0 {
            return Err(AppError::Validation(
                "records_per_collection must be positive".into(),
            ));
        }
        if self.content_char_limit == 0 {
            return Err(AppError::Validation(
                "content_char_limit must be positive".into(),
            ));
        }
        if self.chunk_list_page_size == 0 {
            return Err(AppError::Validation(
                "chunk_list_page_size must be positive".into(),
            ));
        }
        if self.chunk_endpoints.is_empty() {
            return Err(AppError::Validation(
                "chunk_endpoints must name at least one endpoint".into(),
            ));
        }
        Ok(())
    }
}

pub fn get_config() -> Result<AppConfig, AppError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::default()
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("chunk_endpoints"),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
