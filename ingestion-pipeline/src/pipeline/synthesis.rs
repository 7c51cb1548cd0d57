use common::{
    error::AppError,
    storage::types::{passage::Passage, qa_record::QaRecord},
    utils::{config::PromptLanguage, progress::ProgressReporter},
};
use tracing::{debug, warn};

use crate::utils::llm_instructions::{build_synthesis_prompt, ANSWER_MARKER, QUESTION_MARKER};

use super::services::PipelineServices;

/// Parses a completion into a record: split on the first `A:`, strip `Q:` from the question part.
pub fn parse_qa_response(response: &str, passage: &str) -> Result<QaRecord, AppError> {
    let Some((question_part, answer_part)) = response.split_once(ANSWER_MARKER) else {
        return Err(AppError::LLMParsing(format!(
            "response has no '{ANSWER_MARKER}' marker"
        )));
    };

    let question = question_part.replace(QUESTION_MARKER, "");
    let question = question.trim();
    let answer = answer_part.trim();

    if question.is_empty() {
        return Err(AppError::LLMParsing("response has an empty question block".into()));
    }
    if answer.is_empty() {
        return Err(AppError::LLMParsing("response has an empty answer block".into()));
    }

    QaRecord::new(question, answer, passage)
}

/// One completion attempt per passage, in order. Failed passages are counted and skipped.
pub async fn synthesize_records(
    services: &dyn PipelineServices,
    passages: &[Passage],
    language: PromptLanguage,
    reporter: &mut ProgressReporter<'_>,
) -> Vec<QaRecord> {
    let mut records = Vec::with_capacity(passages.len());

    for (index, passage) in passages.iter().enumerate() {
        let prompt = build_synthesis_prompt(&passage.text, language);

        let outcome = match services.complete(&prompt).await {
            Ok(response) => parse_qa_response(&response, &passage.text).inspect_err(|err| {
                warn!(
                    source = %passage.source,
                    passage_index = passage.index,
                    error = %err,
                    "completion could not be parsed into a QA pair"
                );
            }),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(record) => {
                debug!(
                    source = %passage.source,
                    passage_index = passage.index,
                    question_chars = record.question.chars().count(),
                    "QA pair synthesized"
                );
                records.push(record);
                reporter.record_success();
            }
            Err(err) => reporter.record_failure(index, &err),
        }
    }

    records
}
