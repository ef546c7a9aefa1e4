pub mod fetcher;
pub mod importer;
pub mod merge;
pub mod parser;
pub mod slug;
pub mod url_guard;

pub use crate::domain::model::{Department, MergedDirectory, ParsedDocument, Person};
pub use crate::domain::ports::ImportSink;
pub use crate::utils::error::Result;
