use common::{
    error::AppError,
    storage::{
        store::ChunkStore,
        types::qa_record::{ContentTemplate, QaRecord},
    },
    utils::progress::{ProgressReporter, ProgressSink, ProgressSummary},
};
use tracing::{debug, instrument};

/// Uploads each record as one chunk, sequentially. Failures are counted, never fatal.
#[instrument(skip_all, fields(collection_id, records = records.len()))]
pub async fn insert_records(
    store: &dyn ChunkStore,
    records: &[QaRecord],
    collection_id: &str,
    template: ContentTemplate,
    sink: &dyn ProgressSink,
) -> ProgressSummary {
    let mut reporter = ProgressReporter::new("insert qa pairs", records.len(), sink);
    upload_records(store, records, 0, collection_id, template, &mut reporter).await;
    reporter.finish()
}

/// `offset` is the position of `records[0]` in the caller's full item list, for reporting.
pub(crate) async fn upload_records(
    store: &dyn ChunkStore,
    records: &[QaRecord],
    offset: usize,
    collection_id: &str,
    template: ContentTemplate,
    reporter: &mut ProgressReporter<'_>,
) {
    for (position, record) in records.iter().enumerate() {
        let index = offset + position;
        let outcome = match record.validate() {
            Ok(()) => store
                .create_chunk(collection_id, &record.render(template))
                .await
                .map(|chunk| chunk.chunk_id),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(chunk_id) => {
                debug!(collection_id, item = index + 1, %chunk_id, "chunk uploaded");
                reporter.record_success();
            }
            Err(err) => reporter.record_failure(index, &err),
        }
    }
}

/// Same as [`upload_records`] for pre-rendered content; `Err` items carry the reason they are invalid.
pub(crate) async fn upload_contents(
    store: &dyn ChunkStore,
    contents: &[Result<String, String>],
    offset: usize,
    collection_id: &str,
    reporter: &mut ProgressReporter<'_>,
) {
    for (position, content) in contents.iter().enumerate() {
        let index = offset + position;
        let outcome = match content {
            Ok(content) => store.create_chunk(collection_id, content).await.map(|_| ()),
            Err(reason) => Err(AppError::Validation(reason.clone())),
        };

        match outcome {
            Ok(()) => reporter.record_success(),
            Err(err) => reporter.record_failure(index, &err),
        }
    }
}
