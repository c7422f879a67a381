//! Company-isolated storage backing the forecaster and the product registry.

pub mod tenant_store;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use tenant_store::InMemoryRepository;

#[cfg(feature = "postgres")]
pub use postgres::PgRepository;
