use std::sync::Arc;

use chrono::Utc;

use stockwatch_forecast::{ForecastConfig, Forecaster, Repository, RepositoryError};
use stockwatch_infra::{seed, AppConfig, InMemoryRepository, ProductRegistry};

/// Shared handler state: the forecaster and the product registry over one store.
#[derive(Clone)]
pub struct AppServices {
    pub forecaster: Arc<Forecaster<Arc<dyn Repository>>>,
    pub registry: Arc<dyn ProductRegistry>,
}

impl AppServices {
    /// Wire both services to the same in-memory store (dev/test).
    pub fn in_memory(store: Arc<InMemoryRepository>, config: ForecastConfig) -> Self {
        let repository: Arc<dyn Repository> = store.clone();
        Self {
            forecaster: Arc::new(Forecaster::new(repository, config)),
            registry: store,
        }
    }
}

/// Select the storage backend from configuration.
///
/// A `DATABASE_URL` selects Postgres when the `postgres` feature is enabled;
/// otherwise an in-memory store is used, optionally seeded with demo data.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, RepositoryError> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            return build_postgres_services(url, config).await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            tracing::warn!("DATABASE_URL set but postgres feature not enabled, falling back to in-memory");
        }
    }

    Ok(build_in_memory_services(config))
}

fn build_in_memory_services(config: &AppConfig) -> AppServices {
    let store = Arc::new(InMemoryRepository::new());
    if config.seed_demo {
        store.load(seed::demo_dataset(Utc::now()));
        tracing::info!(company_id = %seed::DEMO_COMPANY, "demo dataset loaded");
    }
    AppServices::in_memory(store, config.forecast)
}

#[cfg(feature = "postgres")]
async fn build_postgres_services(url: &str, config: &AppConfig) -> Result<AppServices, RepositoryError> {
    let store = Arc::new(stockwatch_infra::PgRepository::connect(url, 10).await?);
    store.apply_schema().await?;
    tracing::info!("connected to postgres");

    let repository: Arc<dyn Repository> = store.clone();
    Ok(AppServices {
        forecaster: Arc::new(Forecaster::new(repository, config.forecast)),
        registry: store,
    })
}
