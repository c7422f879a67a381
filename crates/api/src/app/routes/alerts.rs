use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockwatch_core::CompanyId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/alerts/low-stock", get(low_stock_alerts))
}

pub async fn low_stock_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Path(company_id): Path<String>,
    query: Result<Query<dto::LowStockQuery>, QueryRejection>,
) -> axum::response::Response {
    // An unreadable query string (e.g. a repeated `days`) means no usable window.
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "unreadable query string, using default window");
            dto::LowStockQuery::default()
        }
    };

    let company_id = match CompanyId::parse_positive(&company_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .forecaster
        .compute_from_request(company_id, query.days.as_deref())
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => errors::forecast_error_to_response(e),
    }
}
