#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod import;
pub mod pipeline;
pub mod session;
pub mod utils;

pub use import::{BulkImporter, ImportReport, ImportSource, ImportTarget};
pub use pipeline::{GenerationReport, IngestionConfig, IngestionPipeline, IngestionTuning};
pub use session::Session;
