// Adapters layer: concrete implementations of the import sink.

use crate::domain::model::MergedDirectory;
use crate::domain::ports::ImportSink;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// 把合併結果寫成 JSON 檔，給外部匯入程式讀取
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImportSink for JsonFileSink {
    async fn import(&self, merged: MergedDirectory) -> Result<String> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&merged)?;
        tokio::fs::write(&self.path, json).await?;

        Ok(self.path.display().to_string())
    }
}
