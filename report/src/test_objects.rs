pub mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::Notify;

    use crate::{
        data_model::{ReportPeriod, ReportType},
        store::ReportStore,
    };

    pub const TEST_YEAR: i32 = 2022;
    pub const TEST_MONTH: u32 = 4;

    pub fn test_period() -> ReportPeriod {
        ReportPeriod::new(TEST_YEAR, TEST_MONTH)
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum StoreCall {
        ListIndividualFiles(ReportType, ReportPeriod),
        RetrieveAggregate(ReportType, ReportPeriod),
        StoreAggregate(ReportType, ReportPeriod, Bytes),
    }

    /// In-memory `ReportStore` that records every call and can be told to
    /// fail any of its operations.
    #[derive(Default)]
    pub struct MockReportStore {
        individual_files: Mutex<HashMap<(ReportType, ReportPeriod), Vec<Bytes>>>,
        aggregates: Mutex<HashMap<(ReportType, ReportPeriod), Bytes>>,
        list_error: Mutex<Option<String>>,
        retrieve_error: Mutex<Option<String>>,
        store_error: Mutex<Option<String>>,
        listing_gate: Mutex<Option<Arc<Notify>>>,
        calls: Mutex<Vec<StoreCall>>,
    }

    impl MockReportStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_individual_files(
            self,
            report_type: ReportType,
            period: ReportPeriod,
            files: &[&str],
        ) -> Self {
            self.individual_files.lock().unwrap().insert(
                (report_type, period),
                files.iter().map(|f| Bytes::from(f.to_string())).collect(),
            );
            self
        }

        pub fn with_aggregate(
            self,
            report_type: ReportType,
            period: ReportPeriod,
            data: &str,
        ) -> Self {
            self.aggregates
                .lock()
                .unwrap()
                .insert((report_type, period), Bytes::from(data.to_string()));
            self
        }

        pub fn fail_list_with(self, message: &str) -> Self {
            *self.list_error.lock().unwrap() = Some(message.to_string());
            self
        }

        pub fn fail_retrieve_with(self, message: &str) -> Self {
            *self.retrieve_error.lock().unwrap() = Some(message.to_string());
            self
        }

        pub fn fail_store_with(self, message: &str) -> Self {
            *self.store_error.lock().unwrap() = Some(message.to_string());
            self
        }

        /// Makes listing wait until the returned handle is notified.
        pub fn pause_listing(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.listing_gate.lock().unwrap() = Some(gate.clone());
            gate
        }

        pub fn calls(&self) -> Vec<StoreCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn list_calls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, StoreCall::ListIndividualFiles(..)))
                .count()
        }

        pub fn store_calls(&self) -> Vec<Bytes> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    StoreCall::StoreAggregate(_, _, data) => Some(data),
                    _ => None,
                })
                .collect()
        }

        pub fn aggregate(&self, report_type: ReportType, period: ReportPeriod) -> Option<Bytes> {
            self.aggregates
                .lock()
                .unwrap()
                .get(&(report_type, period))
                .cloned()
        }

        fn record(&self, call: StoreCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ReportStore for MockReportStore {
        async fn list_individual_files(
            &self,
            report_type: ReportType,
            period: &ReportPeriod,
        ) -> Result<Vec<Bytes>> {
            self.record(StoreCall::ListIndividualFiles(report_type, *period));
            let gate = self.listing_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if let Some(message) = self.list_error.lock().unwrap().clone() {
                return Err(anyhow!(message));
            }
            Ok(self
                .individual_files
                .lock()
                .unwrap()
                .get(&(report_type, *period))
                .cloned()
                .unwrap_or_default())
        }

        async fn retrieve_aggregate(
            &self,
            report_type: ReportType,
            period: &ReportPeriod,
        ) -> Result<Option<Bytes>> {
            self.record(StoreCall::RetrieveAggregate(report_type, *period));
            if let Some(message) = self.retrieve_error.lock().unwrap().clone() {
                return Err(anyhow!(message));
            }
            Ok(self.aggregate(report_type, *period))
        }

        async fn store_aggregate(
            &self,
            report_type: ReportType,
            period: &ReportPeriod,
            data: Bytes,
        ) -> Result<()> {
            self.record(StoreCall::StoreAggregate(
                report_type,
                *period,
                data.clone(),
            ));
            if let Some(message) = self.store_error.lock().unwrap().clone() {
                return Err(anyhow!(message));
            }
            self.aggregates
                .lock()
                .unwrap()
                .insert((report_type, *period), data);
            Ok(())
        }
    }
}
