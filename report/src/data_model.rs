use std::fmt;

use chrono::{DateTime, Datelike, Days, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Single,
    Cumulative,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Single => "single",
            ReportType::Cumulative => "cumulative",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reporting month. Displays as `MM/YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReportPeriod {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The calendar month before the one containing `now`.
    pub fn previous_month(now: DateTime<Utc>) -> Self {
        let day = u64::from(now.day());
        let last_day_of_previous_month = now
            .date_naive()
            .checked_sub_days(Days::new(day))
            .unwrap_or(now.date_naive());
        Self {
            year: last_day_of_previous_month.year(),
            month: last_day_of_previous_month.month(),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Prefix under which upstream producers drop the per-entity files.
pub fn individual_files_prefix(report_type: ReportType, period: &ReportPeriod) -> String {
    format!("{}/{:02}/{}", period.year, period.month, report_type)
}

pub fn aggregate_key(report_type: ReportType, period: &ReportPeriod) -> String {
    format!(
        "{}/{:02}/aggregate/{}.csv",
        period.year, period.month, report_type
    )
}
