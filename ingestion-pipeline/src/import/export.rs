use std::path::{Path, PathBuf};

use common::{
    error::AppError,
    storage::{
        store::ChunkStore,
        types::chunk::{Chunk, ChunkPage, ChunkSummary},
    },
    utils::progress::{ProgressReporter, ProgressSink, ProgressSummary},
};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{info, instrument, warn};

/// File layout of an exported collection: `{"chunks": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkExport {
    pub chunks: Vec<Chunk>,
}

/// Walks every page of a collection, newest first, then resolves each listed chunk.
///
/// A failed first page is an error. A failed later page ends the walk with what was listed;
/// a failed detail fetch counts as one failed item.
#[instrument(skip_all, fields(collection_id, page_size))]
pub async fn fetch_all_chunks(
    store: &dyn ChunkStore,
    collection_id: &str,
    page_size: usize,
    sink: &dyn ProgressSink,
) -> Result<(ChunkExport, ProgressSummary), AppError> {
    if page_size == 0 {
        return Err(AppError::Validation("chunk_list_page_size must be positive".into()));
    }

    let listed = list_all_chunks(store, collection_id, page_size).await?;

    let mut reporter = ProgressReporter::new("export chunks", listed.len(), sink);
    let mut chunks = Vec::with_capacity(listed.len());
    for (index, summary) in listed.iter().enumerate() {
        match store.get_chunk(collection_id, &summary.chunk_id).await {
            Ok(chunk) => {
                chunks.push(chunk);
                reporter.record_success();
            }
            Err(err) => reporter.record_failure(index, &err),
        }
    }

    Ok((ChunkExport { chunks }, reporter.finish()))
}

async fn list_all_chunks(
    store: &dyn ChunkStore,
    collection_id: &str,
    page_size: usize,
) -> Result<Vec<ChunkSummary>, AppError> {
    let mut listed = Vec::new();
    let mut page = ChunkPage::first(page_size);

    loop {
        let summaries = match store.list_chunks(collection_id, &page).await {
            Ok(summaries) => summaries,
            Err(err) if page.after.is_none() => return Err(err),
            Err(err) => {
                warn!(
                    collection_id,
                    after = page.after.as_deref().unwrap_or_default(),
                    error = %err,
                    "chunk listing failed, keeping the pages fetched so far"
                );
                break;
            }
        };

        let full_page = summaries.len() >= page_size;
        let cursor = summaries.last().map(|last| last.chunk_id.clone());
        listed.extend(summaries);

        if !full_page {
            break;
        }
        let Some(cursor) = cursor else {
            break;
        };
        if page.after.as_deref() == Some(cursor.as_str()) {
            warn!(collection_id, %cursor, "chunk cursor did not advance");
            break;
        }
        page = ChunkPage::after(page_size, cursor);
    }

    Ok(listed)
}

/// `{collection_name}.json` with anything unsafe for a file name replaced by `_`.
pub fn export_file_name(collection_name: &str) -> String {
    let stem: String = collection_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    let stem = if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "collection".to_string()
    } else {
        stem
    };
    format!("{stem}.json")
}

/// Serializes with four-space indentation, non-ASCII text kept verbatim.
pub fn render_export(export: &ChunkExport) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    export.serialize(&mut serializer)?;
    Ok(buffer)
}

pub async fn write_export(
    export: &ChunkExport,
    dir: &Path,
    collection_name: &str,
) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(export_file_name(collection_name));
    tokio::fs::write(&path, render_export(export)?).await?;
    info!(path = %path.display(), chunks = export.chunks.len(), "collection exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use common::utils::progress::{ProgressUpdate, TracingProgressSink};

    use super::*;
    use crate::import::test_store::InMemoryStore;

    #[derive(Default)]
    struct RecordingSink {
        fractions: Mutex<Vec<f64>>,
    }

    impl ProgressSink for RecordingSink {
        fn update(&self, update: &ProgressUpdate<'_>) {
            self.fractions
                .lock()
                .expect("sink lock")
                .push(update.fraction);
        }
    }

    fn seeded(count: usize) -> InMemoryStore {
        let store = InMemoryStore::with_collection("c1", "handbook");
        let contents: Vec<String> = (1..=count).map(|i| format!("content {i}")).collect();
        let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
        store.seed_chunks("c1", &refs);
        store
    }

    #[tokio::test]
    async fn walks_every_page_newest_first() {
        let store = seeded(45);

        let (export, summary) = fetch_all_chunks(&store, "c1", 20, &TracingProgressSink)
            .await
            .expect("export");

        assert_eq!(export.chunks.len(), 45);
        assert_eq!(export.chunks[0].chunk_id, "chunk-45");
        assert_eq!(export.chunks[44].chunk_id, "chunk-1");
        assert_eq!(summary.total, 45);
        assert_eq!(summary.success, 45);
        assert_eq!(store.detail_fetches(), 45);
    }

    #[tokio::test]
    async fn exact_page_multiple_ends_on_an_empty_page() {
        let store = seeded(40);

        let (export, summary) = fetch_all_chunks(&store, "c1", 20, &TracingProgressSink)
            .await
            .expect("export");

        assert_eq!(export.chunks.len(), 40);
        assert_eq!(summary.attempted(), 40);
    }

    #[tokio::test]
    async fn detail_failures_are_counted() {
        let store = seeded(5).failing_detail("chunk-3");

        let (export, summary) = fetch_all_chunks(&store, "c1", 20, &TracingProgressSink)
            .await
            .expect("export");

        assert_eq!(export.chunks.len(), 4);
        assert_eq!(summary.fail, 1);
        assert_eq!(summary.attempted(), summary.total);
    }

    #[tokio::test]
    async fn paged_export_progress_never_moves_backwards() {
        let store = seeded(5);
        let sink = RecordingSink::default();

        let (export, summary) = fetch_all_chunks(&store, "c1", 2, &sink)
            .await
            .expect("export");

        assert_eq!(export.chunks.len(), 5);
        assert_eq!(summary.total, 5);
        let fractions = sink.fractions.lock().expect("sink lock").clone();
        assert_eq!(fractions, vec![0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[tokio::test]
    async fn later_page_failure_keeps_partial_results() {
        let store = seeded(30).failing_list_call(2);

        let (export, summary) = fetch_all_chunks(&store, "c1", 20, &TracingProgressSink)
            .await
            .expect("partial export");

        assert_eq!(export.chunks.len(), 20);
        assert_eq!(summary.total, 20);
    }

    #[tokio::test]
    async fn first_page_failure_is_an_error() {
        let store = seeded(3).failing_list_call(1);
        let result = fetch_all_chunks(&store, "c1", 20, &TracingProgressSink).await;
        assert!(matches!(result, Err(AppError::RemoteRequest { .. })));
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(export_file_name("handbook"), "handbook.json");
        assert_eq!(export_file_name("a/b:c"), "a_b_c.json");
        assert_eq!(export_file_name(" .. "), "collection.json");
        assert_eq!(export_file_name("知识库"), "知识库.json");
    }

    #[tokio::test]
    async fn writes_indented_utf8_json() {
        let store = InMemoryStore::with_collection("c1", "handbook");
        store.seed_chunks("c1", &["问题：什么是X？"]);
        let (export, _) = fetch_all_chunks(&store, "c1", 20, &TracingProgressSink)
            .await
            .expect("export");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_export(&export, dir.path(), "知识库")
            .await
            .expect("written");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("知识库.json"));

        let written = tokio::fs::read_to_string(&path).await.expect("read back");
        assert!(written.starts_with("{\n    \"chunks\": [\n        {\n            \"chunk_id\""));
        assert!(written.contains("问题：什么是X？"));

        let parsed: ChunkExport = serde_json::from_str(&written).expect("parse back");
        assert_eq!(parsed, export);
    }
}
