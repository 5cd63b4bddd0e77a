use thiserror::Error;

use crate::data_model::{ReportPeriod, ReportType};

/// Failures surfaced by report generation.
///
/// Cache read failures never show up here: they are logged and the report is
/// recomputed. The enum is `Clone` so a single in-flight computation can hand
/// the same outcome to every waiting caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReportError {
    #[error("failed to list individual {report_type} files for {period}: {message}")]
    ListingFailure {
        report_type: ReportType,
        period: ReportPeriod,
        message: String,
    },

    #[error("no data available for {period}")]
    NoDataAvailable { period: ReportPeriod },

    #[error("malformed {report_type} file #{file_index} for {period}: {message}")]
    MalformedInput {
        report_type: ReportType,
        period: ReportPeriod,
        file_index: usize,
        message: String,
    },

    #[error("failed to store aggregate report at {key}: {message}")]
    StoreWriteFailure { key: String, message: String },

    #[error("no aggregation rule defined for {report_type} reports")]
    AggregationUnavailable { report_type: ReportType },
}
