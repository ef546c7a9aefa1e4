use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid URL: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Download timed out after {}ms", .timeout.as_millis())]
    DownloadTimeout { timeout: Duration },

    #[error("File size exceeds maximum allowed size of {limit} bytes")]
    FileSizeLimit { limit: u64 },

    #[error("Network error: {message}")]
    NetworkError { status: Option<u16>, message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Document {index} failed: {source}")]
    DocumentError {
        index: usize,
        source: Box<ImportError>,
    },

    #[error("Download cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤種類，`DocumentError` 會回報其內部錯誤的種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidUrl,
    DownloadTimeout,
    FileSizeLimit,
    NetworkError,
    ParseError,
    Cancelled,
    Io,
    Config,
}

impl ImportError {
    pub fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            status: None,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn in_document(self, index: usize) -> Self {
        Self::DocumentError {
            index,
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::DownloadTimeout { .. } => ErrorKind::DownloadTimeout,
            Self::FileSizeLimit { .. } => ErrorKind::FileSizeLimit,
            Self::NetworkError { .. } => ErrorKind::NetworkError,
            Self::ParseError { .. } => ErrorKind::ParseError,
            Self::DocumentError { source, .. } => source.kind(),
            Self::Cancelled => ErrorKind::Cancelled,
            Self::IoError(_) | Self::SerializationError(_) => ErrorKind::Io,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => ErrorKind::Config,
        }
    }

    /// 失敗文件的索引 (僅限合併階段)
    pub fn document_index(&self) -> Option<usize> {
        match self {
            Self::DocumentError { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// HTTP 狀態碼 (如果有)
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NetworkError { status, .. } => *status,
            Self::DocumentError { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidUrl { reason, .. } => format!("The directory URL was rejected: {}", reason),
            Self::DownloadTimeout { timeout } => format!(
                "The directory server did not respond within {} seconds",
                timeout.as_secs()
            ),
            Self::FileSizeLimit { limit } => format!(
                "The directory export is larger than the {} MiB limit",
                limit / (1024 * 1024)
            ),
            Self::NetworkError { message, .. } => {
                format!("Could not download the directory export: {}", message)
            }
            Self::ParseError { message } => {
                format!("The directory export could not be read: {}", message)
            }
            Self::DocumentError { index, source } => {
                format!("Document #{}: {}", index + 1, source.user_friendly_message())
            }
            Self::Cancelled => "The import was cancelled".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InvalidUrl => {
                "Use an https:// link to a gc.ca or canada.ca directory record"
            }
            ErrorKind::DownloadTimeout | ErrorKind::NetworkError => {
                "Check the network connection and try the import again"
            }
            ErrorKind::FileSizeLimit => "Import a smaller part of the directory",
            ErrorKind::ParseError => "Make sure the link points to a person record's XML export",
            ErrorKind::Cancelled => "Start the import again when ready",
            ErrorKind::Io => "Check that the output location is writable",
            ErrorKind::Config => "Fix the configuration file and try again",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
