mod config;
mod context;
mod services;
mod stages;
mod state;
pub mod synthesis;

pub use config::{IngestionConfig, IngestionTuning};
pub use context::SourceFailure;
#[allow(clippy::module_name_repetitions)]
pub use services::{DefaultPipelineServices, PipelineServices};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::{
    error::AppError,
    utils::{
        config::AppConfig,
        progress::{ProgressSink, ProgressSummary, TracingProgressSink},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{session::Session, utils::file_text_extraction::DocumentSource};

use self::{
    context::PipelineContext,
    stages::{extract, segment, synthesize},
    state::ready,
};

/// Outcome of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub run_id: String,
    pub documents: usize,
    pub passages: usize,
    pub source_failures: Vec<SourceFailure>,
    pub synthesis: ProgressSummary,
}

#[allow(clippy::module_name_repetitions)]
pub struct IngestionPipeline {
    pipeline_config: IngestionConfig,
    services: Arc<dyn PipelineServices>,
    progress_sink: Arc<dyn ProgressSink>,
}

impl IngestionPipeline {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let services = DefaultPipelineServices::from_config(config)?;
        Self::with_services(
            IngestionConfig::from_app_config(config),
            Arc::new(services),
        )
    }

    pub fn with_services(
        pipeline_config: IngestionConfig,
        services: Arc<dyn PipelineServices>,
    ) -> Result<Self, AppError> {
        pipeline_config.tuning.segmenter().validate()?;
        Ok(Self {
            pipeline_config,
            services,
            progress_sink: Arc::new(TracingProgressSink),
        })
    }

    #[must_use]
    pub fn with_progress_sink(mut self, progress_sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_sink = progress_sink;
        self
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.pipeline_config
    }

    fn duration_millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }

    /// Extracts, segments and synthesizes QA pairs, replacing the session's records.
    ///
    /// Unreadable files and unparseable completions are skipped and counted; the run fails only
    /// when no passage can be produced at all.
    #[tracing::instrument(skip_all, fields(sources = sources.len()))]
    pub async fn generate(
        &self,
        sources: &[DocumentSource],
        session: &mut Session,
    ) -> Result<GenerationReport, AppError> {
        let run_id = Uuid::new_v4().to_string();
        let mut ctx = PipelineContext::new(
            run_id.clone(),
            &self.pipeline_config,
            self.services.as_ref(),
            self.progress_sink.as_ref(),
        );

        let machine = ready();
        let pipeline_started = Instant::now();

        let stage_start = Instant::now();
        let machine = extract(machine, &mut ctx, sources)
            .await
            .map_err(|err| ctx.abort(err))?;
        let extract_ms = Self::duration_millis(stage_start.elapsed());

        let stage_start = Instant::now();
        let machine = segment(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let segment_ms = Self::duration_millis(stage_start.elapsed());

        let stage_start = Instant::now();
        let _machine = synthesize(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let synthesize_ms = Self::duration_millis(stage_start.elapsed());

        let synthesis = ctx.take_synthesis().map_err(|err| ctx.abort(err))?;
        let report = GenerationReport {
            run_id,
            documents: ctx.documents.len(),
            passages: ctx.passages.len(),
            source_failures: std::mem::take(&mut ctx.source_failures),
            synthesis,
        };
        session.replace_records(std::mem::take(&mut ctx.records));

        info!(
            run_id = %report.run_id,
            documents = report.documents,
            passages = report.passages,
            records = session.records().len(),
            total_ms = Self::duration_millis(pipeline_started.elapsed()),
            extract_ms,
            segment_ms,
            synthesize_ms,
            "generation pipeline finished"
        );

        Ok(report)
    }
}
