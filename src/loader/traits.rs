use crate::model::LoadError;
use bytes::Bytes;

#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Returns the raw bytes stored at `location` (CSV text or a parquet file).
    async fn fetch(&self, location: &str) -> Result<Bytes, LoadError>;
}
