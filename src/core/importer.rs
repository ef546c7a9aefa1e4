use crate::core::fetcher::{cleanup, BoundedFetcher};
use crate::core::merge::{merge_documents, merge_lenient};
use crate::domain::model::{ImportSummary, MergedDirectory};
use crate::domain::ports::ImportSink;
use crate::utils::error::Result;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Fetch -> parse -> merge -> hand off, for one batch of export URLs.
pub struct DirectoryImporter<K: ImportSink> {
    fetcher: BoundedFetcher,
    sink: K,
    lenient: bool,
}

impl<K: ImportSink> DirectoryImporter<K> {
    pub fn new(fetcher: BoundedFetcher, sink: K) -> Self {
        Self {
            fetcher,
            sink,
            lenient: false,
        }
    }

    /// 寬鬆模式下略過無法解析的文件，而不是整批失敗
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub async fn run(&self, urls: &[String], cancel: &CancellationToken) -> Result<ImportSummary> {
        tracing::info!("🚀 Starting directory import of {} URL(s)", urls.len());

        // 每次執行使用獨立的暫存目錄，避免並行匯入互相覆蓋
        let work_dir = tempfile::Builder::new()
            .prefix("directory-import-")
            .tempdir()?;

        let mut documents = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            let dest = work_dir.path().join(format!("export-{}.xml", index));
            documents.push(self.fetch_document(url, &dest, cancel).await?);
        }

        let (merged, skipped) = self.merge(&documents)?;
        let departments = merged.departments.len();
        let people = merged.people.len();

        tracing::info!(
            "📦 Handing off {} departments and {} people",
            departments,
            people
        );
        let output = self.sink.import(merged).await?;

        tracing::info!("✅ Directory import completed: {}", output);

        Ok(ImportSummary {
            documents: documents.len(),
            skipped_documents: skipped,
            departments,
            people,
            output,
        })
    }

    async fn fetch_document(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        self.fetcher.fetch_with_cancel(url, dest, cancel).await?;

        // 原始位元組交給解析階段，編碼錯誤才能對應到文件索引
        let content = tokio::fs::read(dest).await;
        cleanup(dest).await;

        Ok(content?)
    }

    fn merge(&self, documents: &[Vec<u8>]) -> Result<(MergedDirectory, usize)> {
        if !self.lenient {
            return Ok((merge_documents(documents)?, 0));
        }

        let report = merge_lenient(documents);
        if !report.is_complete() {
            tracing::warn!(
                "⚠️ {} of {} documents skipped",
                report.failures.len(),
                documents.len()
            );
        }
        Ok((report.merged, report.failures.len()))
    }
}
