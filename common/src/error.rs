use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Extraction error: {0}")]
    Extraction(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("LLM parsing error: {0}")]
    LLMParsing(String),
    #[error("Remote request failed during {operation}{}: {message}", status_suffix(.status))]
    RemoteRequest {
        operation: String,
        status: Option<u16>,
        message: String,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (status {code})")).unwrap_or_default()
}

impl AppError {
    pub fn remote(operation: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteRequest {
            operation: operation.to_string(),
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_includes_status_when_present() {
        let err = AppError::remote("create chunk", Some(502), "bad gateway");
        assert_eq!(
            err.to_string(),
            "Remote request failed during create chunk (status 502): bad gateway"
        );
    }

    #[test]
    fn config_failures_convert_into_app_errors() {
        let err: AppError = config::ConfigError::NotFound("chunk_size".into()).into();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn remote_error_omits_missing_status() {
        let err = AppError::remote("list collections", None, "connection refused");
        assert_eq!(
            err.to_string(),
            "Remote request failed during list collections: connection refused"
        );
    }
}
