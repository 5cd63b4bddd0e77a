use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use blob_store::BlobStorage;
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::data_model::{aggregate_key, individual_files_prefix, ReportPeriod, ReportType};

const CONCURRENT_FILE_READS: usize = 8;

/// Storage the report engine reads individual files from and caches
/// aggregates into.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Contents of every individual file of the period, ordered by key.
    /// An empty listing is not an error.
    async fn list_individual_files(
        &self,
        report_type: ReportType,
        period: &ReportPeriod,
    ) -> Result<Vec<Bytes>>;

    /// The cached aggregate, or `None` when it was never stored.
    async fn retrieve_aggregate(
        &self,
        report_type: ReportType,
        period: &ReportPeriod,
    ) -> Result<Option<Bytes>>;

    async fn store_aggregate(
        &self,
        report_type: ReportType,
        period: &ReportPeriod,
        data: Bytes,
    ) -> Result<()>;
}

pub struct BlobReportStore {
    blob_storage: Arc<BlobStorage>,
}

impl BlobReportStore {
    pub fn new(blob_storage: Arc<BlobStorage>) -> Self {
        Self { blob_storage }
    }
}

#[async_trait]
impl ReportStore for BlobReportStore {
    async fn list_individual_files(
        &self,
        report_type: ReportType,
        period: &ReportPeriod,
    ) -> Result<Vec<Bytes>> {
        let prefix = individual_files_prefix(report_type, period);
        let keys = self.blob_storage.list(&prefix).await?;
        debug!(prefix, files = keys.len(), "retrieving individual files");

        // `buffered` keeps the listing order while fetching concurrently.
        stream::iter(keys)
            .map(|key| {
                let blob_storage = self.blob_storage.clone();
                async move { blob_storage.read_bytes(&key).await }
            })
            .buffered(CONCURRENT_FILE_READS)
            .try_collect()
            .await
    }

    async fn retrieve_aggregate(
        &self,
        report_type: ReportType,
        period: &ReportPeriod,
    ) -> Result<Option<Bytes>> {
        self.blob_storage
            .get(&aggregate_key(report_type, period))
            .await
    }

    async fn store_aggregate(
        &self,
        report_type: ReportType,
        period: &ReportPeriod,
        data: Bytes,
    ) -> Result<()> {
        let key = aggregate_key(report_type, period);
        let res = self.blob_storage.put(&key, data).await?;
        info!(url = res.url, size_bytes = res.size_bytes, "stored aggregate report");
        Ok(())
    }
}
