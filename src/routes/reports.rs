use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::Response,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use report::{ReportPeriod, ReportType};

use super::RouteState;
use crate::http_objects::{ErrorResponse, ReportAPIError, ReportParams};

const EARLIEST_REPORT_YEAR: i32 = 2020;

/// Get the merged report of all clusters for a month
#[utoipa::path(
    get,
    path = "/reports/single",
    tag = "reports",
    params(ReportParams),
    responses(
        (status = 200, description = "CSV report", body = String, content_type = "text/csv"),
        (status = BAD_REQUEST, description = "Invalid year or month", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn single_report(
    Query(params): Query<ReportParams>,
    State(state): State<RouteState>,
) -> Result<Response<Body>, ReportAPIError> {
    let period = parse_period(&params, Utc::now())?;
    let data = state
        .report_generator
        .generate_single(period)
        .await
        .map_err(ReportAPIError::internal_error)?;
    csv_response(ReportType::Single, &period, data)
}

/// Get the cumulative report for a month
#[utoipa::path(
    get,
    path = "/reports/cumulative",
    tag = "reports",
    params(ReportParams),
    responses(
        (status = 200, description = "CSV report", body = String, content_type = "text/csv"),
        (status = BAD_REQUEST, description = "Invalid year or month", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn cumulative_report(
    Query(params): Query<ReportParams>,
    State(state): State<RouteState>,
) -> Result<Response<Body>, ReportAPIError> {
    let period = parse_period(&params, Utc::now())?;
    let data = state
        .report_generator
        .generate_cumulative(period)
        .await
        .map_err(ReportAPIError::internal_error)?;
    csv_response(ReportType::Cumulative, &period, data)
}

/// Empty query values are treated the same as missing ones.
fn parse_period(params: &ReportParams, now: DateTime<Utc>) -> Result<ReportPeriod, ReportAPIError> {
    let year = params.year.as_deref().filter(|v| !v.is_empty());
    let month = params.month.as_deref().filter(|v| !v.is_empty());

    let (year, month) = match (year, month) {
        (None, None) => return Ok(ReportPeriod::previous_month(now)),
        (Some(year), Some(month)) => (year, month),
        _ => {
            return Err(ReportAPIError::bad_request(
                "either both year and month are provided or none are provided",
            ))
        }
    };

    let year: i32 = year
        .parse()
        .map_err(|_| ReportAPIError::bad_request(&format!("year '{}' is invalid", year)))?;
    if year < EARLIEST_REPORT_YEAR {
        return Err(ReportAPIError::bad_request(&format!(
            "{} is too early",
            year
        )));
    }

    let month: i64 = month
        .parse()
        .map_err(|_| ReportAPIError::bad_request(&format!("month '{}' is invalid", month)))?;
    let month = u32::try_from(month)
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ReportAPIError::bad_request("month must be in the range 1..12"))?;

    Ok(ReportPeriod::new(year, month))
}

fn csv_response(
    report_type: ReportType,
    period: &ReportPeriod,
    data: Bytes,
) -> Result<Response<Body>, ReportAPIError> {
    Response::builder()
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename={}-{}{:02}.csv",
                report_type, period.year, period.month
            ),
        )
        .body(Body::from(data))
        .map_err(ReportAPIError::internal_error)
}
