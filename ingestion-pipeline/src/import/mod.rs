pub mod batch;
pub mod export;
pub mod insert;
#[cfg(test)]
pub(crate) mod test_store;

use std::path::Path;

use common::{
    error::AppError,
    storage::{
        store::ChunkStore,
        types::{
            collection::{Collection, NewCollection},
            qa_record::{ContentTemplate, QaRecord},
        },
    },
    utils::{
        config::default_records_per_collection,
        progress::{ProgressReporter, ProgressSink, ProgressSummary},
    },
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use self::{batch::plan_batches, insert::upload_contents};

/// Items read from a bulk-import file.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSource {
    /// `{"qa_pairs": [{question, answer}, ...]}`
    QaPairs(Vec<Value>),
    /// `{"chunks": [{content, ...}, ...]}`
    Chunks(Vec<Value>),
}

impl ImportSource {
    /// Fails when neither top-level key holds an array; individual items are checked later.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(raw)?;

        if let Some(items) = value.get("qa_pairs") {
            return items
                .as_array()
                .map(|items| Self::QaPairs(items.clone()))
                .ok_or_else(|| AppError::Validation("'qa_pairs' must be an array".into()));
        }
        if let Some(items) = value.get("chunks") {
            return items
                .as_array()
                .map(|items| Self::Chunks(items.clone()))
                .ok_or_else(|| AppError::Validation("'chunks' must be an array".into()));
        }

        Err(AppError::Validation(
            "import file has neither a 'qa_pairs' nor a 'chunks' key".into(),
        ))
    }

    pub async fn read(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::QaPairs(items) | Self::Chunks(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunk content per item, or the reason the item cannot be imported.
    pub fn contents(&self, template: ContentTemplate) -> Vec<Result<String, String>> {
        match self {
            Self::QaPairs(items) => items
                .iter()
                .map(|item| {
                    serde_json::from_value::<QaRecord>(item.clone())
                        .map_err(|err| format!("qa pair is missing a field: {err}"))
                        .and_then(|record| {
                            record.validate().map_err(|err| err.to_string())?;
                            Ok(record.render(template))
                        })
                })
                .collect(),
            Self::Chunks(items) => items
                .iter()
                .map(|item| {
                    item.get("content")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| "chunk is missing its 'content' key".to_string())
                })
                .collect(),
        }
    }
}

/// Where imported items go.
#[derive(Debug, Clone)]
pub enum ImportTarget {
    /// One new collection per batch, named `{name_prefix}_part{n}`.
    NewCollections {
        name_prefix: String,
        embedding_model_id: String,
    },
    /// Every batch goes into this collection.
    Existing(Collection),
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub batches: usize,
    pub collections: Vec<Collection>,
    pub summary: ProgressSummary,
}

pub struct BulkImporter<'a> {
    store: &'a dyn ChunkStore,
    sink: &'a dyn ProgressSink,
    records_per_collection: usize,
    template: ContentTemplate,
}

impl<'a> BulkImporter<'a> {
    pub fn new(store: &'a dyn ChunkStore, sink: &'a dyn ProgressSink) -> Self {
        Self {
            store,
            sink,
            records_per_collection: default_records_per_collection(),
            template: ContentTemplate::Plain,
        }
    }

    #[must_use]
    pub fn with_records_per_collection(mut self, records_per_collection: usize) -> Self {
        self.records_per_collection = records_per_collection;
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: ContentTemplate) -> Self {
        self.template = template;
        self
    }

    /// Uploads every item batch by batch. Item and collection failures are counted;
    /// only an invalid plan is returned as an error.
    #[instrument(skip_all, fields(items = source.len(), capacity = self.records_per_collection))]
    pub async fn run(
        &self,
        source: &ImportSource,
        target: &ImportTarget,
    ) -> Result<ImportReport, AppError> {
        let contents = source.contents(self.template);
        let batches = plan_batches(contents.len(), self.records_per_collection)?;
        let mut reporter = ProgressReporter::new("bulk import", contents.len(), self.sink);
        let mut collections = Vec::new();

        info!(
            total = contents.len(),
            records_per_collection = self.records_per_collection,
            batches = batches.len(),
            "bulk import planned"
        );

        for batch in &batches {
            let collection = match target {
                ImportTarget::NewCollections {
                    name_prefix,
                    embedding_model_id,
                } => {
                    let request = NewCollection {
                        name: format!("{name_prefix}_part{}", batch.index + 1),
                        embedding_model_id: embedding_model_id.clone(),
                        capacity: u64::try_from(self.records_per_collection).unwrap_or(u64::MAX),
                    };
                    match self.create_collection(&request).await {
                        Ok(created) => created,
                        Err(err) => {
                            warn!(
                                batch = batch.index + 1,
                                name = %request.name,
                                error = %err,
                                "collection could not be created, batch skipped"
                            );
                            for index in batch.range.clone() {
                                reporter.record_failure(index, &err);
                            }
                            continue;
                        }
                    }
                }
                ImportTarget::Existing(collection) => collection.clone(),
            };

            info!(
                batch = batch.index + 1,
                of = batches.len(),
                collection_id = %collection.collection_id,
                first_item = batch.range.start + 1,
                last_item = batch.range.end,
                "importing batch"
            );
            upload_contents(
                self.store,
                &contents[batch.range.clone()],
                batch.range.start,
                &collection.collection_id,
                &mut reporter,
            )
            .await;

            if !collections
                .iter()
                .any(|c: &Collection| c.collection_id == collection.collection_id)
            {
                collections.push(collection);
            }
        }

        Ok(ImportReport {
            batches: batches.len(),
            collections,
            summary: reporter.finish(),
        })
    }

    async fn create_collection(&self, request: &NewCollection) -> Result<Collection, AppError> {
        let created = self.store.create_collection(request).await?;
        match self.store.get_collection(&created.collection_id).await {
            Ok(detail) => info!(
                collection_id = %detail.collection_id,
                name = %detail.name,
                capacity = detail.capacity,
                embedding_model_id = %detail.embedding_model_id,
                "collection created"
            ),
            Err(err) => warn!(
                collection_id = %created.collection_id,
                error = %err,
                "collection created but its details could not be fetched"
            ),
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use common::utils::progress::TracingProgressSink;
    use serde_json::json;

    use super::*;
    use crate::import::test_store::InMemoryStore;

    fn qa_pairs(count: usize) -> ImportSource {
        ImportSource::QaPairs(
            (0..count)
                .map(|i| json!({"question": format!("Q{i}?"), "answer": format!("A{i}.")}))
                .collect(),
        )
    }

    fn new_collections() -> ImportTarget {
        ImportTarget::NewCollections {
            name_prefix: "handbook".into(),
            embedding_model_id: "model".into(),
        }
    }

    #[test]
    fn reads_either_top_level_key() {
        let qa = ImportSource::from_json(r#"{"qa_pairs": [{"question": "Q?", "answer": "A."}]}"#)
            .expect("qa pairs");
        assert_eq!(qa.len(), 1);
        assert_eq!(qa.contents(ContentTemplate::Plain), vec![Ok("Q?\nA.".to_string())]);

        let chunks = ImportSource::from_json(r#"{"chunks": [{"content": "text", "chunk_id": "x"}]}"#)
            .expect("chunks");
        assert_eq!(chunks.contents(ContentTemplate::Plain), vec![Ok("text".to_string())]);
    }

    #[test]
    fn missing_top_level_key_is_fatal() {
        assert!(matches!(
            ImportSource::from_json(r#"{"records": []}"#),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ImportSource::from_json(r#"{"qa_pairs": {}}"#),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ImportSource::from_json("not json"),
            Err(AppError::Json(_))
        ));
    }

    #[test]
    fn malformed_items_become_reasons() {
        let source = ImportSource::QaPairs(vec![
            json!({"question": "Q?"}),
            json!({"question": "Q?", "answer": " "}),
            json!({"question": "Q?", "answer": "A."}),
        ]);
        let contents = source.contents(ContentTemplate::Labeled);
        assert!(contents[0].is_err());
        assert!(contents[1].is_err());
        assert_eq!(contents[2], Ok("Question: Q?\nAnswer: A.".to_string()));
    }

    #[tokio::test]
    async fn creates_one_collection_per_batch() {
        let store = InMemoryStore::default();
        let importer = BulkImporter::new(&store, &TracingProgressSink);

        let report = importer
            .run(&qa_pairs(2_500), &new_collections())
            .await
            .expect("import");

        assert_eq!(report.batches, 3);
        let names: Vec<&str> = report.collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["handbook_part1", "handbook_part2", "handbook_part3"]);
        let sizes: Vec<usize> = report
            .collections
            .iter()
            .map(|c| store.contents(&c.collection_id).len())
            .collect();
        assert_eq!(sizes, vec![1_000, 1_000, 500]);
        assert!(report.collections.iter().all(|c| c.capacity == 1_000));
        assert_eq!(report.summary.success, 2_500);
        assert_eq!(report.summary.fail, 0);
        assert_eq!(store.contents("col-1")[0], "Q0?\nA0.");
    }

    #[tokio::test]
    async fn failed_collection_counts_its_whole_batch() {
        let store = InMemoryStore::default().failing_collection("handbook_part2");
        let importer =
            BulkImporter::new(&store, &TracingProgressSink).with_records_per_collection(10);

        let report = importer
            .run(&qa_pairs(25), &new_collections())
            .await
            .expect("import");

        assert_eq!(report.collections.len(), 2);
        assert_eq!(report.summary.success, 15);
        assert_eq!(report.summary.fail, 10);
        assert_eq!(report.summary.attempted(), report.summary.total);
    }

    #[tokio::test]
    async fn existing_collection_receives_every_batch() {
        let store = InMemoryStore::with_collection("c1", "handbook").failing_content("Q3?");
        let target = ImportTarget::Existing(store.collections()[0].clone());
        let source = ImportSource::Chunks(vec![
            json!({"content": "Q1?\nA1."}),
            json!({"no_content": true}),
            json!({"content": "Q3?\nA3."}),
            json!({"content": "Q4?\nA4."}),
        ]);

        let report = BulkImporter::new(&store, &TracingProgressSink)
            .with_records_per_collection(2)
            .run(&source, &target)
            .await
            .expect("import");

        assert_eq!(report.batches, 2);
        assert_eq!(report.collections.len(), 1);
        assert_eq!(store.contents("c1"), vec!["Q1?\nA1.", "Q4?\nA4."]);
        assert_eq!(report.summary.success, 2);
        assert_eq!(report.summary.fail, 2);
        assert_eq!(store.collections().len(), 1);
    }

    #[tokio::test]
    async fn zero_capacity_is_rejected_before_any_call() {
        let store = InMemoryStore::default();
        let result = BulkImporter::new(&store, &TracingProgressSink)
            .with_records_per_collection(0)
            .run(&qa_pairs(3), &new_collections())
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.collections().is_empty());
    }
}
