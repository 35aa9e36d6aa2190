use async_trait::async_trait;

use campaignlens_core::record::MetricRecord;
use campaignlens_core::source::{LoadedRecords, RecordStore};

use crate::DuckDbBackend;

#[async_trait]
impl RecordStore for DuckDbBackend {
    async fn load_records(&self) -> anyhow::Result<LoadedRecords> {
        DuckDbBackend::load_records(self).await
    }

    async fn replace_records(&self, records: &[MetricRecord]) -> anyhow::Result<()> {
        DuckDbBackend::replace_records(self, records).await
    }

    async fn append_records(&self, records: &[MetricRecord]) -> anyhow::Result<()> {
        DuckDbBackend::insert_records(self, records).await
    }

    async fn count_records(&self) -> anyhow::Result<u64> {
        DuckDbBackend::count_records(self).await
    }
}
