use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use stockwatch_core::CompanyId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/products", post(register_product))
}

pub async fn register_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(company_id): Path<String>,
    body: Result<Json<dto::RegisterProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let company_id = match CompanyId::parse_positive(&company_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_json", rejection.body_text());
        }
    };

    match services
        .registry
        .register_product(body.into_command(company_id))
        .await
    {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(dto::RegisterProductResponse::from(outcome)),
        )
            .into_response(),
        Err(e) => errors::registration_error_to_response(e),
    }
}
