use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How a QA record is rendered into chunk content before upload.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentTemplate {
    /// `Question: ..\nAnswer: ..`
    #[default]
    Labeled,
    /// Labeled question and answer followed by the source passage.
    LabeledWithSource,
    /// Question and answer separated by a newline.
    Plain,
}

impl std::str::FromStr for ContentTemplate {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "labeled" => Ok(Self::Labeled),
            "labeled_with_source" => Ok(Self::LabeledWithSource),
            "plain" => Ok(Self::Plain),
            other => Err(AppError::Validation(format!(
                "unknown content template '{other}'. Expected 'labeled', 'labeled_with_source', or 'plain'."
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_passage: String,
}

impl QaRecord {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        source_passage: impl Into<String>,
    ) -> Result<Self, AppError> {
        let record = Self {
            question: question.into(),
            answer: answer.into(),
            source_passage: source_passage.into(),
        };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.question.trim().is_empty() {
            return Err(AppError::Validation("QA record has an empty question".into()));
        }
        if self.answer.trim().is_empty() {
            return Err(AppError::Validation("QA record has an empty answer".into()));
        }
        Ok(())
    }

    pub fn render(&self, template: ContentTemplate) -> String {
        match template {
            ContentTemplate::Labeled => {
                format!("Question: {}\nAnswer: {}", self.question, self.answer)
            }
            ContentTemplate::LabeledWithSource => format!(
                "Question: {}\nAnswer: {}\nSource: {}",
                self.question, self.answer, self.source_passage
            ),
            ContentTemplate::Plain => format!("{}\n{}", self.question, self.answer),
        }
    }
}

/// On-disk form of a session's records: `{"qa_pairs": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QaPairsArtifact {
    pub qa_pairs: Vec<QaRecord>,
}
