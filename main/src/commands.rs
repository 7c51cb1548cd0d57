use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use common::{
    storage::{
        client::ChunkStoreClient,
        store::ChunkStore,
        types::collection::{Collection, NewCollection},
    },
    utils::{config::AppConfig, progress::TracingProgressSink},
};
use ingestion_pipeline::{
    import::{
        export::{fetch_all_chunks, write_export},
        insert::insert_records,
    },
    utils::file_text_extraction::DocumentSource,
    BulkImporter, GenerationReport, ImportSource, ImportTarget, IngestionPipeline, Session,
};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::args::{
    CollectionsCommand, Command, DocumentArgs, ExportArgs, GenerateArgs, ImportArgs, InsertArgs,
    RunArgs,
};

const PREVIEW_RECORDS: usize = 3;

pub async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Generate(args) => generate(args, config).await,
        Command::Collections(command) => collections(command, config).await,
        Command::Insert(args) => insert(args, config).await,
        Command::Run(args) => generate_and_insert(args, config).await,
        Command::Import(args) => import(args, config).await,
        Command::Export(args) => export(args, config).await,
    }
}

fn store_client(config: &AppConfig) -> Result<ChunkStoreClient> {
    ChunkStoreClient::from_config(config).context("failed to build chunk store client")
}

async fn read_sources(args: &DocumentArgs) -> Result<Vec<DocumentSource>> {
    let mut sources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        if path.as_os_str() == "-" {
            let mut bytes = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut bytes)
                .await
                .context("failed to read document from stdin")?;
            sources.push(DocumentSource::Upload {
                file_name: args.stdin_name.clone(),
                bytes,
            });
        } else {
            sources.push(DocumentSource::Path(path.clone()));
        }
    }
    Ok(sources)
}

async fn synthesize(
    documents: &DocumentArgs,
    config: &mut AppConfig,
    session: &mut Session,
) -> Result<GenerationReport> {
    documents.apply(config);
    config.validate()?;

    let pipeline = IngestionPipeline::new(config)?;
    let sources = read_sources(documents).await?;
    let report = pipeline.generate(&sources, session).await?;

    println!(
        "{} document(s) split into {} passage(s)",
        report.documents, report.passages
    );
    for failure in &report.source_failures {
        println!("skipped {}: {}", failure.source, failure.reason);
    }
    println!("{}", report.synthesis);
    print_preview(session);

    Ok(report)
}

fn print_preview(session: &Session) {
    for (i, record) in session.preview(PREVIEW_RECORDS).iter().enumerate() {
        println!("\n#{}\nQ: {}\nA: {}", i + 1, record.question, record.answer);
    }
}

async fn generate(args: GenerateArgs, mut config: AppConfig) -> Result<()> {
    let mut session = Session::new();
    synthesize(&args.documents, &mut config, &mut session).await?;

    session
        .write_records(&args.output)
        .await
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "\nsaved {} QA pair(s) to {}",
        session.records().len(),
        args.output.display()
    );
    Ok(())
}

async fn collections(command: CollectionsCommand, config: AppConfig) -> Result<()> {
    config.validate()?;
    let client = store_client(&config)?;
    let mut session = Session::new();

    match command {
        CollectionsCommand::List => {
            let collections = session.refresh_collections(&client).await?;
            if collections.is_empty() {
                println!("no collections");
            }
            for collection in collections {
                print_collection_line(collection);
            }
        }
        CollectionsCommand::Show { collection } => {
            let found = session.resolve_collection(&client, &collection).await?;
            let detail = client.get_collection(&found.collection_id).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        CollectionsCommand::Create {
            name,
            capacity,
            embedding_model,
        } => {
            let request = NewCollection {
                name,
                embedding_model_id: embedding_model_id(embedding_model, &config)?,
                capacity: capacity
                    .unwrap_or_else(|| u64::try_from(config.records_per_collection).unwrap_or(u64::MAX)),
            };
            let created = client.create_collection(&request).await?;
            info!(collection_id = %created.collection_id, "collection created");
            print_collection_line(&created);
        }
    }
    Ok(())
}

fn print_collection_line(collection: &Collection) {
    println!(
        "{}\t{}\tcapacity {}\tmodel {}",
        collection.collection_id, collection.name, collection.capacity, collection.embedding_model_id
    );
}

fn embedding_model_id(flag: Option<String>, config: &AppConfig) -> Result<String> {
    match flag.or_else(|| config.embedding_model_id.clone()) {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => bail!("an embedding model id is required: pass --embedding-model or set embedding_model_id"),
    }
}

async fn insert(args: InsertArgs, config: AppConfig) -> Result<()> {
    config.validate()?;
    let client = store_client(&config)?;
    let mut session = Session::read_records(&args.input)
        .await
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let collection = session.resolve_collection(&client, &args.collection).await?;
    let summary = insert_records(
        &client,
        session.records(),
        &collection.collection_id,
        args.template.unwrap_or(config.content_template),
        &TracingProgressSink,
    )
    .await;

    println!("{summary}");
    Ok(())
}

async fn generate_and_insert(args: RunArgs, mut config: AppConfig) -> Result<()> {
    config.validate()?;
    let client = store_client(&config)?;
    let mut session = Session::new();
    let collection = session.resolve_collection(&client, &args.collection).await?;

    synthesize(&args.documents, &mut config, &mut session).await?;
    if let Some(output) = &args.output {
        session
            .write_records(output)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
    }

    let summary = insert_records(
        &client,
        session.records(),
        &collection.collection_id,
        args.template.unwrap_or(config.content_template),
        &TracingProgressSink,
    )
    .await;

    println!("\n{summary}");
    Ok(())
}

async fn import(args: ImportArgs, mut config: AppConfig) -> Result<()> {
    if let Some(records_per_collection) = args.records_per_collection {
        config.records_per_collection = records_per_collection;
    }
    config.validate()?;

    let client = store_client(&config)?;
    let source = ImportSource::read(&args.input)
        .await
        .with_context(|| format!("failed to read import file {}", args.input.display()))?;

    let target = match &args.collection {
        Some(key) => ImportTarget::Existing(Session::new().resolve_collection(&client, key).await?),
        None => ImportTarget::NewCollections {
            name_prefix: args
                .name_prefix
                .clone()
                .unwrap_or_else(|| default_name_prefix(&args.input)),
            embedding_model_id: embedding_model_id(args.embedding_model.clone(), &config)?,
        },
    };

    println!(
        "{} item(s), {} per collection",
        source.len(),
        config.records_per_collection
    );
    let report = BulkImporter::new(&client, &TracingProgressSink)
        .with_records_per_collection(config.records_per_collection)
        .with_template(args.template)
        .run(&source, &target)
        .await?;

    for collection in &report.collections {
        print_collection_line(collection);
    }
    println!("{}", report.summary);
    Ok(())
}

fn default_name_prefix(input: &std::path::Path) -> String {
    let stem = input
        .file_stem()
        .map_or_else(|| "import".to_string(), |s| s.to_string_lossy().into_owned());
    format!("{stem}_{}", Utc::now().format("%Y%m%d%H%M%S"))
}

async fn export(args: ExportArgs, config: AppConfig) -> Result<()> {
    config.validate()?;
    let client = store_client(&config)?;
    let collection = Session::new()
        .resolve_collection(&client, &args.collection)
        .await?;

    let (chunks, summary) = fetch_all_chunks(
        &client,
        &collection.collection_id,
        config.chunk_list_page_size,
        &TracingProgressSink,
    )
    .await?;
    let path: PathBuf = write_export(&chunks, &args.output, &collection.name).await?;

    println!("{summary}");
    println!("wrote {} chunk(s) to {}", chunks.chunks.len(), path.display());
    Ok(())
}
