use crate::domain::model::MergedDirectory;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 外部匯入端：把合併後的部門與人員寫入組織資料
#[async_trait]
pub trait ImportSink: Send + Sync {
    /// Returns a description of where the records went (a path, a batch id, ...).
    async fn import(&self, merged: MergedDirectory) -> Result<String>;
}
