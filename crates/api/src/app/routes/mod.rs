use axum::Router;

pub mod alerts;
pub mod products;
pub mod system;

/// Router for company-scoped endpoints, mounted under `/api`.
pub fn router() -> Router {
    Router::new().nest(
        "/companies/:company_id",
        alerts::router().merge(products::router()),
    )
}
