use common::utils::config::{
    default_chunk_overlap, default_chunk_size, AppConfig, PromptLanguage, SegmentationMode,
};

use crate::utils::text_segmentation::SegmenterConfig;

#[derive(Debug, Clone)]
pub struct IngestionTuning {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestionTuning {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl IngestionTuning {
    pub fn segmenter(&self) -> SegmenterConfig {
        SegmenterConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestionConfig {
    pub tuning: IngestionTuning,
    pub segmentation_mode: SegmentationMode,
    pub prompt_language: PromptLanguage,
}

impl IngestionConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tuning: IngestionTuning {
                chunk_size: config.chunk_size,
                chunk_overlap: config.chunk_overlap,
            },
            segmentation_mode: config.segmentation_mode,
            prompt_language: config.prompt_language,
        }
    }
}
