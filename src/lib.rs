pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::JsonFileSink;
pub use config::{toml_config::ImportConfig, FetchConfig};
pub use crate::core::{
    fetcher::{cleanup, BoundedFetcher, FetchOutcome},
    importer::DirectoryImporter,
    merge::{merge_documents, merge_lenient, merge_parsed},
    parser::{parse_document, parse_document_bytes},
    url_guard::{normalize_url, validate_url, UrlPolicy},
};
pub use domain::model::{
    Department, DocumentFailure, EntryKind, ImportSummary, MergeReport, MergedDirectory,
    ParsedDocument, Person,
};
pub use domain::ports::ImportSink;
pub use utils::error::{ErrorKind, ImportError, Result};
pub use tokio_util::sync::CancellationToken;
