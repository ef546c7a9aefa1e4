//! Bounded HTTP(S) download of a single directory export.
//!
//! The whole exchange (request, at most one redirect hop, body streaming) runs
//! under the configured wall-clock timeout and can be cancelled through a
//! `CancellationToken`. The body size is checked twice: once against the
//! declared `Content-Length` before any byte is read, then continuously against
//! the bytes actually received.

use crate::config::FetchConfig;
use crate::core::url_guard::normalize_url;
use crate::utils::error::{ImportError, Result};
use reqwest::header::{CONTENT_LENGTH, LOCATION};
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// URL the body was actually read from
    pub url: String,
    pub bytes: u64,
    pub redirected: bool,
}

pub struct BoundedFetcher {
    client: Client,
    config: FetchConfig,
}

impl BoundedFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        // 自行處理轉址，最多一次
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ImportError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub async fn fetch(&self, url: &str, dest: impl AsRef<Path>) -> Result<FetchOutcome> {
        self.fetch_with_cancel(url, dest, &CancellationToken::new())
            .await
    }

    pub async fn fetch_with_cancel(
        &self,
        url: &str,
        dest: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome> {
        let dest = dest.as_ref();

        let normalized = normalize_url(url);
        if normalized != url {
            tracing::debug!("Rewrote profile URL to XML export: {}", normalized);
        }
        let target = self.config.policy.validate(&normalized)?;

        tracing::info!("⬇️ Fetching {} -> {}", target, dest.display());

        let download = tokio::time::timeout(self.config.timeout, self.download(target, dest));

        // 未完成的下載在這裡被 drop，PartialFile 會刪掉半成品
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ImportError::Cancelled),
            result = download => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(ImportError::DownloadTimeout {
                    timeout: self.config.timeout,
                }),
            },
        };

        match &result {
            Ok(outcome) => tracing::info!(
                "✅ Downloaded {} bytes from {}",
                outcome.bytes,
                outcome.url
            ),
            Err(e) => tracing::warn!("❌ Fetch failed: {}", e),
        }

        result
    }

    async fn download(&self, url: Url, dest: &Path) -> Result<FetchOutcome> {
        let mut response = self.get(url.as_str()).await?;
        let mut redirected = false;

        if is_redirect(response.status()) {
            let code = response.status().as_u16();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| ImportError::NetworkError {
                    status: Some(code),
                    message: format!("Redirect ({}) without a Location header", code),
                })?;
            let next = response.url().join(location).map_err(|e| {
                ImportError::network(format!("Invalid redirect location '{}': {}", location, e))
            })?;

            // 只跟一次，第二個轉址視為最終回應
            tracing::debug!("↪️ Following redirect ({}) to {}", code, next);
            response = self.get(next.as_str()).await?;
            redirected = true;
        }

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ImportError::NetworkError {
                status: Some(status.as_u16()),
                message: format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unexpected status")
                ),
            });
        }

        if let Some(declared) = declared_length(&response) {
            if declared > self.config.max_bytes {
                tracing::warn!(
                    "Declared Content-Length {} exceeds limit {}",
                    declared,
                    self.config.max_bytes
                );
                return Err(ImportError::FileSizeLimit {
                    limit: self.config.max_bytes,
                });
            }
        }

        let final_url = response.url().to_string();
        let bytes = self.stream_to_file(response, dest).await?;

        Ok(FetchOutcome {
            url: final_url,
            bytes,
            redirected,
        })
    }

    async fn get(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImportError::network(format!("Request to {} failed: {}", url, e)))?;

        tracing::debug!("Response status: {}", response.status());
        Ok(response)
    }

    async fn stream_to_file(&self, mut response: Response, dest: &Path) -> Result<u64> {
        let mut file = PartialFile::create(dest).await?;
        let mut received: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImportError::network(format!("Failed to read response body: {}", e)))?
        {
            received += chunk.len() as u64;
            if received > self.config.max_bytes {
                tracing::warn!(
                    "Received {} bytes, over the {} byte limit",
                    received,
                    self.config.max_bytes
                );
                return Err(ImportError::FileSizeLimit {
                    limit: self.config.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.commit().await?;
        Ok(received)
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::TEMPORARY_REDIRECT
    )
}

fn declared_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Destination file that is removed on drop unless `commit` succeeded.
struct PartialFile {
    path: PathBuf,
    file: File,
    committed: bool,
}

impl PartialFile {
    async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .map_err(|e| write_error(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            committed: false,
        })
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .write_all(data)
            .await
            .map_err(|e| write_error(&self.path, e))
    }

    async fn commit(mut self) -> Result<()> {
        self.file
            .flush()
            .await
            .map_err(|e| write_error(&self.path, e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| write_error(&self.path, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("🧹 Removed partial download {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Could not remove partial download {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

fn write_error(path: &Path, e: std::io::Error) -> ImportError {
    ImportError::network(format!("Failed to write {}: {}", path.display(), e))
}

/// 刪除暫存檔，任何錯誤都只記錄不回傳
pub async fn cleanup(path: impl AsRef<Path>) {
    let path = path.as_ref();
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("🧹 Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_redirect_statuses() {
        assert!(is_redirect(StatusCode::MOVED_PERMANENTLY));
        assert!(is_redirect(StatusCode::FOUND));
        assert!(is_redirect(StatusCode::TEMPORARY_REDIRECT));
        assert!(!is_redirect(StatusCode::SEE_OTHER));
        assert!(!is_redirect(StatusCode::PERMANENT_REDIRECT));
        assert!(!is_redirect(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_invalid_url_never_touches_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("export.xml");
        let fetcher = BoundedFetcher::new(FetchConfig::default()).unwrap();

        for url in ["not-a-url", "http://geds-sage.gc.ca/x", "https://example.com/x"] {
            let err = fetcher.fetch(url, &dest).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidUrl, "{}", url);
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("export.xml");
        let fetcher = BoundedFetcher::new(FetchConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetcher
            .fetch_with_cancel("https://geds-sage.gc.ca/en/GEDS?pgid=026", &dest, &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_partial_file_removed_unless_committed() {
        let dir = TempDir::new().unwrap();
        let dropped = dir.path().join("dropped.xml");
        let kept = dir.path().join("kept.xml");

        {
            let mut file = PartialFile::create(&dropped).await.unwrap();
            file.write_all(b"<person>").await.unwrap();
        }
        let mut file = PartialFile::create(&kept).await.unwrap();
        file.write_all(b"<person/>").await.unwrap();
        file.commit().await.unwrap();

        assert!(!dropped.exists());
        assert_eq!(std::fs::read_to_string(&kept).unwrap(), "<person/>");
    }

    #[tokio::test]
    async fn test_cleanup_never_fails() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("export.xml");
        std::fs::write(&existing, "<person/>").unwrap();

        cleanup(&existing).await;
        assert!(!existing.exists());

        // 不存在的檔案
        cleanup(&existing).await;
        cleanup(dir.path().join("missing/nested.xml")).await;

        // 目錄無法用 remove_file 刪除
        let subdir = dir.path().join("subdir");
        std::fs::create_dir(&subdir).unwrap();
        cleanup(&subdir).await;
        assert!(subdir.exists());
    }
}
