pub mod csv_merge;
pub mod data_model;
pub mod error;
pub mod generator;
pub mod in_flight;
pub mod store;
pub mod test_objects;

pub use data_model::{ReportPeriod, ReportType};
pub use error::ReportError;
pub use generator::{CsvReportGenerator, ReportGenerator};
pub use store::{BlobReportStore, ReportStore};
