use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use common::{
    storage::types::qa_record::ContentTemplate,
    utils::config::{AppConfig, PromptLanguage, SegmentationMode},
};

#[derive(Debug, Parser)]
#[command(
    name = "qaforge",
    version,
    about = "Synthesize QA pairs from documents and load them into a remote chunk store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split documents into passages and synthesize one QA pair per passage
    Generate(GenerateArgs),
    /// List, inspect or create collections
    #[command(subcommand)]
    Collections(CollectionsCommand),
    /// Upload a QA-pairs file into an existing collection
    Insert(InsertArgs),
    /// Generate QA pairs and insert them into a collection in one go
    Run(RunArgs),
    /// Bulk import a `qa_pairs` or `chunks` JSON file, batched across collections
    Import(ImportArgs),
    /// Download every chunk of a collection as `{collection_name}.json`
    Export(ExportArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LanguageArg {
    English,
    Chinese,
}

impl From<LanguageArg> for PromptLanguage {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::English => Self::English,
            LanguageArg::Chinese => Self::Chinese,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DocumentArgs {
    /// Documents to process; `-` reads one document from stdin
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// File name (and so format) given to a document read from stdin
    #[arg(long, default_value = "stdin.txt")]
    pub stdin_name: String,

    /// Maximum passage length in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive passages
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// One passage per paragraph instead of overlapping windows
    #[arg(long, action = clap::ArgAction::SetTrue, default_value_t = false)]
    pub structural: bool,

    /// Language of the synthesis instructions
    #[arg(long)]
    pub language: Option<LanguageArg>,
}

impl DocumentArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(chunk_overlap) = self.chunk_overlap {
            config.chunk_overlap = chunk_overlap;
        }
        if self.structural {
            config.segmentation_mode = SegmentationMode::Structural;
        }
        if let Some(language) = self.language {
            config.prompt_language = language.into();
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub documents: DocumentArgs,

    /// Where the generated QA pairs are written
    #[arg(long, short, default_value = "qa_pairs.json")]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CollectionsCommand {
    /// List collections on the chunk store
    List,
    /// Show one collection by id or name
    Show {
        collection: String,
    },
    /// Create a new collection
    Create {
        name: String,

        /// Maximum number of chunks (defaults to records_per_collection)
        #[arg(long)]
        capacity: Option<u64>,

        /// Embedding model id (defaults to embedding_model_id from config)
        #[arg(long)]
        embedding_model: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct InsertArgs {
    /// QA-pairs file produced by `generate`
    pub input: PathBuf,

    /// Target collection id or name
    #[arg(long, short)]
    pub collection: String,

    /// How each record is rendered into chunk content
    #[arg(long)]
    pub template: Option<ContentTemplate>,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub documents: DocumentArgs,

    /// Target collection id or name
    #[arg(long, short)]
    pub collection: String,

    /// How each record is rendered into chunk content
    #[arg(long)]
    pub template: Option<ContentTemplate>,

    /// Also keep the generated QA pairs in this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// JSON file with a top-level `qa_pairs` or `chunks` array
    pub input: PathBuf,

    /// Import everything into this collection instead of creating new ones
    #[arg(long, short, conflicts_with = "name_prefix")]
    pub collection: Option<String>,

    /// Prefix for created collections, named `{prefix}_part{n}`
    #[arg(long)]
    pub name_prefix: Option<String>,

    /// Items per created collection
    #[arg(long)]
    pub records_per_collection: Option<usize>,

    /// Embedding model for created collections
    #[arg(long)]
    pub embedding_model: Option<String>,

    /// How QA pairs are rendered into chunk content
    #[arg(long, default_value = "plain")]
    pub template: ContentTemplate,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Collection id or name
    #[arg(long, short)]
    pub collection: String,

    /// Directory the export file is written to
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_overrides() {
        let cli = Cli::try_parse_from([
            "qaforge",
            "generate",
            "a.txt",
            "b.pdf",
            "--chunk-size",
            "1000",
            "--structural",
            "--language",
            "chinese",
        ])
        .expect("parsed");

        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.documents.files.len(), 2);
        assert_eq!(args.output, PathBuf::from("qa_pairs.json"));
        assert_eq!(args.documents.language, Some(LanguageArg::Chinese));
        assert!(args.documents.structural);
    }

    #[test]
    fn parses_templates_and_collection_commands() {
        let cli = Cli::try_parse_from([
            "qaforge",
            "insert",
            "qa.json",
            "--collection",
            "handbook",
            "--template",
            "labeled-with-source",
        ])
        .expect("parsed");
        let Command::Insert(args) = cli.command else {
            panic!("expected insert");
        };
        assert_eq!(args.template, Some(ContentTemplate::LabeledWithSource));

        let cli = Cli::try_parse_from(["qaforge", "collections", "create", "kb", "--capacity", "500"])
            .expect("parsed");
        assert!(matches!(
            cli.command,
            Command::Collections(CollectionsCommand::Create {
                capacity: Some(500),
                ..
            })
        ));
    }

    #[test]
    fn import_target_flags_conflict() {
        let result = Cli::try_parse_from([
            "qaforge",
            "import",
            "data.json",
            "--collection",
            "c1",
            "--name-prefix",
            "kb",
        ]);
        assert!(result.is_err());
    }
}
