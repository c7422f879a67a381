use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockwatch_core::DomainError;
use stockwatch_forecast::ForecastError;
use stockwatch_infra::RegistrationError;

pub fn forecast_error_to_response(err: ForecastError) -> axum::response::Response {
    match err {
        ForecastError::CompanyNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "company_not_found", err.to_string())
        }
        ForecastError::DataSource(e) => {
            tracing::error!(error = %e, "forecast data source failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "data_source_error",
                "failed to load inventory data",
            )
        }
    }
}

pub fn registration_error_to_response(err: RegistrationError) -> axum::response::Response {
    match err {
        RegistrationError::Domain(e) => domain_error_to_response(e),
        RegistrationError::AlreadyStocked { product_id } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "conflict",
                "message": RegistrationError::AlreadyStocked { product_id }.to_string(),
                "product_id": product_id,
            })),
        )
            .into_response(),
        RegistrationError::DataSource(e) => {
            tracing::error!(error = %e, "registration data source failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "data_source_error",
                "failed to store product",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
