use std::{
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use common::error::AppError;
use dom_smoothie::{Article, Readability, TextMode};
use quick_xml::{events::Event, Reader};
use tracing::debug;

/// Input handed to the pipeline: a file on disk or bytes received from elsewhere.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Path(PathBuf),
    Upload { file_name: String, bytes: Vec<u8> },
}

impl DocumentSource {
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
            Self::Upload { file_name, .. } => file_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Html,
    Pdf,
    Docx,
    /// Recognized, but no built-in extractor.
    Office,
}

pub fn document_kind(path: &Path) -> Result<DocumentKind, AppError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" | "csv" | "eml" | "enex" => Ok(DocumentKind::PlainText),
        "html" => Ok(DocumentKind::Html),
        "pdf" => Ok(DocumentKind::Pdf),
        "docx" => Ok(DocumentKind::Docx),
        "doc" | "odt" | "ppt" | "pptx" | "epub" => Ok(DocumentKind::Office),
        _ => Err(AppError::UnsupportedFormat(format!(
            "{} (extension '{extension}')",
            path.display()
        ))),
    }
}

/// Text extracted from one source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub source: String,
    pub text: String,
}

impl ExtractedDocument {
    /// Structural elements: paragraphs separated by blank lines.
    pub fn elements(&self) -> Vec<String> {
        let mut elements = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in self.text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    elements.push(current.join("\n"));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            elements.push(current.join("\n"));
        }

        elements
    }
}

pub async fn extract_source(source: &DocumentSource) -> Result<ExtractedDocument, AppError> {
    match source {
        DocumentSource::Path(path) => extract_document(path).await,
        DocumentSource::Upload { file_name, bytes } => {
            extract_from_upload(file_name, bytes).await
        }
    }
}

pub async fn extract_document(path: &Path) -> Result<ExtractedDocument, AppError> {
    let source = DocumentSource::Path(path.to_path_buf()).name();
    extract_named(path, source).await
}

/// Stages uploaded bytes in a temporary file that is removed when extraction returns.
pub async fn extract_from_upload(
    file_name: &str,
    bytes: &[u8],
) -> Result<ExtractedDocument, AppError> {
    let suffix = Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    document_kind(Path::new(file_name))?;

    let staged = tempfile::Builder::new()
        .prefix("qaforge-upload-")
        .suffix(&suffix)
        .tempfile()?;
    tokio::fs::write(staged.path(), bytes).await?;

    extract_named(staged.path(), file_name.to_string()).await
}

/// Extracts `path`, naming the document `source` in the result and in every error.
async fn extract_named(path: &Path, source: String) -> Result<ExtractedDocument, AppError> {
    let kind = document_kind(path)?;

    let text = match kind {
        DocumentKind::PlainText => read_text(path, &source).await?,
        DocumentKind::Html => html_to_text(&read_text(path, &source).await?, &source)?,
        DocumentKind::Pdf => pdf_to_text(read_bytes(path, &source).await?, &source).await?,
        DocumentKind::Docx => docx_to_text(read_bytes(path, &source).await?, &source).await?,
        DocumentKind::Office => {
            return Err(AppError::Extraction(format!(
                "no built-in extractor for {source}"
            )))
        }
    };

    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!(
            "{source} contains no extractable text"
        )));
    }

    debug!(%source, chars = text.chars().count(), "document extracted");

    Ok(ExtractedDocument { source, text })
}

async fn read_bytes(path: &Path, source: &str) -> Result<Vec<u8>, AppError> {
    tokio::fs::read(path)
        .await
        .map_err(|err| AppError::Extraction(format!("failed to read {source}: {err}")))
}

async fn read_text(path: &Path, source: &str) -> Result<String, AppError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AppError::Extraction(format!("failed to read {source}: {err}")))
}

fn html_to_text(raw: &str, source: &str) -> Result<String, AppError> {
    let config = dom_smoothie::Config {
        text_mode: TextMode::Markdown,
        ..Default::default()
    };
    let mut readability = Readability::new(raw, None, Some(config))
        .map_err(|err| AppError::Extraction(format!("failed to parse {source}: {err}")))?;
    let article: Article = readability
        .parse()
        .map_err(|err| AppError::Extraction(format!("failed to extract {source}: {err}")))?;

    Ok(article.text_content.into())
}

async fn pdf_to_text(bytes: Vec<u8>, source: &str) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map(|s| s.trim().to_string())
    })
    .await?
    .map_err(|err| AppError::Extraction(format!("failed to extract text from {source}: {err}")))
}

async fn docx_to_text(bytes: Vec<u8>, source: &str) -> Result<String, AppError> {
    let source_name = source.to_string();
    tokio::task::spawn_blocking(move || {
        let failed = |err: &dyn std::fmt::Display| {
            AppError::Extraction(format!("failed to extract text from {source_name}: {err}"))
        };
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|err| failed(&err))?;
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|err| failed(&err))?
            .read_to_string(&mut xml)
            .map_err(|err| failed(&err))?;
        docx_body_text(&xml).map_err(|err| failed(&err))
    })
    .await?
}

/// Text runs of a WordprocessingML body; each paragraph ends with a blank line.
fn docx_body_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(tag) if tag.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(tag) => match tag.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Empty(tag) => match tag.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Event::Text(run) if in_text_run => text.push_str(&run.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text.trim().to_string())
}
