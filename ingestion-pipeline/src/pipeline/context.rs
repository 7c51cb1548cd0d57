use common::{
    error::AppError,
    storage::types::{passage::Passage, qa_record::QaRecord},
    utils::progress::{ProgressSink, ProgressSummary},
};
use tracing::error;

use crate::utils::file_text_extraction::ExtractedDocument;

use super::{config::IngestionConfig, services::PipelineServices};

/// A document that could not be turned into passages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

pub struct PipelineContext<'a> {
    pub run_id: String,
    pub pipeline_config: &'a IngestionConfig,
    pub services: &'a dyn PipelineServices,
    pub progress_sink: &'a dyn ProgressSink,
    pub documents: Vec<ExtractedDocument>,
    pub passages: Vec<Passage>,
    pub records: Vec<QaRecord>,
    pub source_failures: Vec<SourceFailure>,
    pub synthesis: Option<ProgressSummary>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        run_id: String,
        pipeline_config: &'a IngestionConfig,
        services: &'a dyn PipelineServices,
        progress_sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            run_id,
            pipeline_config,
            services,
            progress_sink,
            documents: Vec::new(),
            passages: Vec::new(),
            records: Vec::new(),
            source_failures: Vec::new(),
            synthesis: None,
        }
    }

    pub fn record_source_failure(&mut self, source: String, err: &AppError) {
        self.source_failures.push(SourceFailure {
            source,
            reason: err.to_string(),
        });
    }

    pub fn take_synthesis(&mut self) -> Result<ProgressSummary, AppError> {
        self.synthesis.take().ok_or_else(|| {
            AppError::InternalError("synthesis summary expected to be available".into())
        })
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(
            run_id = %self.run_id,
            error = %err,
            "generation pipeline aborted"
        );
        err
    }
}
