use common::{error::AppError, utils::progress::ProgressReporter};
use state_machines::core::GuardError;
use tracing::{debug, instrument, warn};

use crate::utils::{file_text_extraction::DocumentSource, text_segmentation::segment_document};

use super::{
    context::PipelineContext,
    state::{Extracted, GenerationMachine, Ready, Segmented, Synthesized},
    synthesis::synthesize_records,
};

#[instrument(
    level = "trace",
    skip_all,
    fields(run_id = %ctx.run_id, sources = sources.len())
)]
pub async fn extract(
    machine: GenerationMachine<(), Ready>,
    ctx: &mut PipelineContext<'_>,
    sources: &[DocumentSource],
) -> Result<GenerationMachine<(), Extracted>, AppError> {
    for source in sources {
        match ctx.services.extract_document(source).await {
            Ok(document) => {
                debug!(
                    run_id = %ctx.run_id,
                    source = %document.source,
                    chars = document.text.chars().count(),
                    "document extracted"
                );
                ctx.documents.push(document);
            }
            Err(err) => {
                warn!(
                    run_id = %ctx.run_id,
                    source = %source.name(),
                    error = %err,
                    "document skipped"
                );
                ctx.record_source_failure(source.name(), &err);
            }
        }
    }

    machine
        .extract()
        .map_err(|(_, guard)| map_guard_error("extract", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn segment(
    machine: GenerationMachine<(), Extracted>,
    ctx: &mut PipelineContext<'_>,
) -> Result<GenerationMachine<(), Segmented>, AppError> {
    let segmenter = ctx.pipeline_config.tuning.segmenter();
    segmenter.validate()?;
    let mode = ctx.pipeline_config.segmentation_mode;

    let documents = std::mem::take(&mut ctx.documents);
    for document in &documents {
        match segment_document(document, mode, &segmenter) {
            Ok(passages) => {
                debug!(
                    run_id = %ctx.run_id,
                    source = %document.source,
                    passages = passages.len(),
                    "document segmented"
                );
                ctx.passages.extend(passages);
            }
            Err(err) => {
                warn!(
                    run_id = %ctx.run_id,
                    source = %document.source,
                    error = %err,
                    "document produced no passages"
                );
                ctx.record_source_failure(document.source.clone(), &err);
            }
        }
    }
    ctx.documents = documents;

    if ctx.passages.is_empty() {
        return Err(AppError::Extraction(format!(
            "no passages could be produced from {} document(s)",
            ctx.documents.len() + ctx.source_failures.len()
        )));
    }

    machine
        .segment()
        .map_err(|(_, guard)| map_guard_error("segment", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn synthesize(
    machine: GenerationMachine<(), Segmented>,
    ctx: &mut PipelineContext<'_>,
) -> Result<GenerationMachine<(), Synthesized>, AppError> {
    let mut reporter = ProgressReporter::new(
        "qa synthesis",
        ctx.passages.len(),
        ctx.progress_sink,
    );

    let records = synthesize_records(
        ctx.services,
        &ctx.passages,
        ctx.pipeline_config.prompt_language,
        &mut reporter,
    )
    .await;

    ctx.records = records;
    ctx.synthesis = Some(reporter.finish());

    machine
        .synthesize()
        .map_err(|(_, guard)| map_guard_error("synthesize", &guard))
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid generation pipeline transition during {event}: {guard:?}"
    ))
}
