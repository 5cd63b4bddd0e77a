use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    csv_merge::{merge_csv_files, MergeError},
    data_model::{aggregate_key, ReportPeriod, ReportType},
    error::ReportError,
    in_flight::InFlight,
    store::ReportStore,
};

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate_single(&self, period: ReportPeriod) -> Result<Bytes, ReportError>;

    async fn generate_cumulative(&self, period: ReportPeriod) -> Result<Bytes, ReportError>;
}

type MergeRule = fn(&[Bytes]) -> Result<Bytes, MergeError>;

/// How the individual files of a report type are combined. Cumulative reports
/// have no rollup rule yet, so only a previously cached aggregate can be served.
fn merge_rule(report_type: ReportType) -> Option<MergeRule> {
    match report_type {
        ReportType::Single => Some(merge_csv_files),
        ReportType::Cumulative => None,
    }
}

/// Serves CSV reports from the aggregate cache, building and caching the
/// aggregate on a miss.
pub struct CsvReportGenerator {
    store: Arc<dyn ReportStore>,
    in_flight: InFlight,
}

impl CsvReportGenerator {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self {
            store,
            in_flight: InFlight::new(),
        }
    }

    async fn generate(
        &self,
        report_type: ReportType,
        period: ReportPeriod,
    ) -> Result<Bytes, ReportError> {
        let store = self.store.clone();
        self.in_flight
            .run(
                (report_type, period),
                generate_report(store, report_type, period),
            )
            .await
    }
}

#[async_trait]
impl ReportGenerator for CsvReportGenerator {
    async fn generate_single(&self, period: ReportPeriod) -> Result<Bytes, ReportError> {
        self.generate(ReportType::Single, period).await
    }

    async fn generate_cumulative(&self, period: ReportPeriod) -> Result<Bytes, ReportError> {
        self.generate(ReportType::Cumulative, period).await
    }
}

async fn cached_aggregate(
    store: &dyn ReportStore,
    report_type: ReportType,
    period: &ReportPeriod,
) -> Option<Bytes> {
    match store.retrieve_aggregate(report_type, period).await {
        Ok(cached) => cached,
        Err(e) => {
            warn!(
                %report_type,
                %period,
                "failed to read cached aggregate, regenerating: {:#}",
                e
            );
            None
        }
    }
}

async fn generate_report(
    store: Arc<dyn ReportStore>,
    report_type: ReportType,
    period: ReportPeriod,
) -> Result<Bytes, ReportError> {
    if let Some(cached) = cached_aggregate(store.as_ref(), report_type, &period).await {
        debug!(%report_type, %period, "serving cached aggregate");
        return Ok(cached);
    }

    let Some(merge) = merge_rule(report_type) else {
        return Err(ReportError::AggregationUnavailable { report_type });
    };

    info!(%report_type, %period, "aggregate not cached, merging individual files");
    let files = store
        .list_individual_files(report_type, &period)
        .await
        .map_err(|e| ReportError::ListingFailure {
            report_type,
            period,
            message: format!("{:#}", e),
        })?;
    if files.is_empty() {
        return Err(ReportError::NoDataAvailable { period });
    }

    let merged = merge(&files).map_err(|e| ReportError::MalformedInput {
        report_type,
        period,
        file_index: e.file_index,
        message: e.message,
    })?;

    store
        .store_aggregate(report_type, &period, merged.clone())
        .await
        .map_err(|e| ReportError::StoreWriteFailure {
            key: aggregate_key(report_type, &period),
            message: format!("{:#}", e),
        })?;
    info!(
        %report_type,
        %period,
        files = files.len(),
        size_bytes = merged.len(),
        "aggregate report generated"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_objects::tests::{test_period, MockReportStore, StoreCall};

    const CLUSTER_1: &str = "CLUSTER,DATA\ncluster-1,data-1.1\ncluster-1,data-1.2";
    const CLUSTER_2: &str = "CLUSTER,DATA\ncluster-2,data-2.1\ncluster-2,data-2.2";
    const MERGED: &str = "CLUSTER,DATA\ncluster-1,data-1.1\ncluster-1,data-1.2\ncluster-2,data-2.1\ncluster-2,data-2.2\n";

    fn generator(store: &Arc<MockReportStore>) -> CsvReportGenerator {
        CsvReportGenerator::new(store.clone())
    }

    async fn generate(
        generator: &CsvReportGenerator,
        report_type: ReportType,
    ) -> Result<Bytes, ReportError> {
        match report_type {
            ReportType::Single => generator.generate_single(test_period()).await,
            ReportType::Cumulative => generator.generate_cumulative(test_period()).await,
        }
    }

    #[tokio::test]
    async fn test_return_aggregate_straightaway_when_found() {
        for report_type in [ReportType::Single, ReportType::Cumulative] {
            let store = Arc::new(MockReportStore::new().with_aggregate(
                report_type,
                test_period(),
                "some,data",
            ));

            let data = generate(&generator(&store), report_type).await;

            assert_eq!(data, Ok(Bytes::from("some,data")));
            assert_eq!(
                store.calls(),
                vec![StoreCall::RetrieveAggregate(report_type, test_period())]
            );
        }
    }

    #[tokio::test]
    async fn test_no_individual_files() {
        let store = Arc::new(MockReportStore::new());

        let err = generate(&generator(&store), ReportType::Single)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ReportError::NoDataAvailable {
                period: test_period()
            }
        );
        assert!(err.to_string().contains("no data available for 04/2022"));
        assert!(store.store_calls().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_is_surfaced() {
        let store = Arc::new(MockReportStore::new().fail_list_with("some error"));

        let err = generate(&generator(&store), ReportType::Single)
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::ListingFailure { .. }));
        assert!(err.to_string().contains("some error"));
        assert!(store.store_calls().is_empty());
    }

    #[tokio::test]
    async fn test_store_and_return_aggregate() {
        let store = Arc::new(MockReportStore::new().with_individual_files(
            ReportType::Single,
            test_period(),
            &[CLUSTER_1, CLUSTER_2],
        ));

        let data = generate(&generator(&store), ReportType::Single).await;

        assert_eq!(data, Ok(Bytes::from(MERGED)));
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::RetrieveAggregate(ReportType::Single, test_period()),
                StoreCall::ListIndividualFiles(ReportType::Single, test_period()),
                StoreCall::StoreAggregate(ReportType::Single, test_period(), Bytes::from(MERGED)),
            ]
        );
    }

    #[tokio::test]
    async fn test_store_failure_discards_report() {
        let store = Arc::new(
            MockReportStore::new()
                .with_individual_files(ReportType::Single, test_period(), &[CLUSTER_1])
                .fail_store_with("some error"),
        );

        let err = generate(&generator(&store), ReportType::Single)
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            ReportError::StoreWriteFailure { key, .. } if key == "2022/04/aggregate/single.csv"
        ));
        assert!(err.to_string().contains("some error"));
        assert_eq!(store.store_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_read_failure_falls_through() {
        let store = Arc::new(
            MockReportStore::new()
                .with_individual_files(ReportType::Single, test_period(), &[CLUSTER_1, CLUSTER_2])
                .fail_retrieve_with("connection reset"),
        );

        let data = generate(&generator(&store), ReportType::Single).await;

        assert_eq!(data, Ok(Bytes::from(MERGED)));
        assert_eq!(store.store_calls(), vec![Bytes::from(MERGED)]);
    }

    #[tokio::test]
    async fn test_malformed_file_aborts_without_caching() {
        let store = Arc::new(MockReportStore::new().with_individual_files(
            ReportType::Single,
            test_period(),
            &[CLUSTER_1, "CLUSTER,DATA\ncluster-2,data-2.1,extra"],
        ));

        let err = generate(&generator(&store), ReportType::Single)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::MalformedInput { file_index: 1, .. }
        ));
        assert!(store.store_calls().is_empty());
        assert!(store.aggregate(ReportType::Single, test_period()).is_none());
    }

    #[tokio::test]
    async fn test_header_only_files_count_as_data() {
        let store = Arc::new(MockReportStore::new().with_individual_files(
            ReportType::Single,
            test_period(),
            &["CLUSTER,DATA", "CLUSTER,DATA"],
        ));

        let data = generate(&generator(&store), ReportType::Single).await;

        assert_eq!(data, Ok(Bytes::from("CLUSTER,DATA\n")));
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let store = Arc::new(MockReportStore::new().with_individual_files(
            ReportType::Single,
            test_period(),
            &[CLUSTER_1, CLUSTER_2],
        ));
        let generator = generator(&store);

        let first = generate(&generator, ReportType::Single).await;
        let second = generate(&generator, ReportType::Single).await;

        assert_eq!(first, Ok(Bytes::from(MERGED)));
        assert_eq!(second, first);
        assert_eq!(store.list_calls(), 1);
        assert_eq!(store.store_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cumulative_miss_performs_no_aggregation() {
        let store = Arc::new(MockReportStore::new().with_individual_files(
            ReportType::Cumulative,
            test_period(),
            &[CLUSTER_1],
        ));

        let err = generate(&generator(&store), ReportType::Cumulative)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ReportError::AggregationUnavailable {
                report_type: ReportType::Cumulative
            }
        );
        assert_eq!(store.list_calls(), 0);
        assert!(store.store_calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_requests_merge_once() {
        let store = Arc::new(MockReportStore::new().with_individual_files(
            ReportType::Single,
            test_period(),
            &[CLUSTER_1, CLUSTER_2],
        ));
        let gate = store.pause_listing();
        let generator = generator(&store);

        let release = async {
            gate.notify_one();
        };
        let (first, second, _) = tokio::join!(
            generate(&generator, ReportType::Single),
            generate(&generator, ReportType::Single),
            release
        );

        assert_eq!(first, Ok(Bytes::from(MERGED)));
        assert_eq!(second, first);
        assert_eq!(store.list_calls(), 1);
        assert_eq!(store.store_calls(), vec![Bytes::from(MERGED)]);
    }
}
