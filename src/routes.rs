use std::sync::Arc;

use axum::{routing::get, Json, Router};
use report::ReportGenerator;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::{
    http_objects::ErrorResponse,
    middleware::InstanceRequestSpan,
};

mod reports;
use reports::{cumulative_report, single_report};

#[derive(OpenApi)]
#[openapi(
        paths(
            reports::single_report,
            reports::cumulative_report,
        ),
        components(
            schemas(
                ErrorResponse,
            )
        ),
        tags(
            (name = "reports", description = "Monthly usage reports")
        )
    )]
struct ApiDoc;

#[derive(Clone)]
pub struct RouteState {
    pub report_generator: Arc<dyn ReportGenerator>,
}

pub fn create_routes(route_state: RouteState, env: &str) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/docs/openapi.json", get(openapi))
        .route(
            "/reports/single",
            get(single_report).with_state(route_state.clone()),
        )
        .route(
            "/reports/cumulative",
            get(cumulative_report).with_state(route_state.clone()),
        )
        .layer(TraceLayer::new_for_http().make_span_with(InstanceRequestSpan::new(env)))
}

async fn index() -> &'static str {
    "Report Server"
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
