use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockwatch_core::CompanyId;
use stockwatch_inventory::{
    BundleComponent, Company, InventoryRecord, Product, ProductSupplier, Sale, Supplier, Warehouse,
};

use crate::error::{ForecastError, RepositoryError};
use crate::snapshot::ForecastSnapshot;

/// Read-only, company-scoped access to the entities a forecast needs.
///
/// Implementations must filter every query by `company_id`.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn fetch_company(&self, company_id: CompanyId) -> Result<Option<Company>, RepositoryError>;

    async fn fetch_inventory(&self, company_id: CompanyId) -> Result<Vec<InventoryRecord>, RepositoryError>;

    /// Sales dated at or after `window_start`.
    async fn fetch_recent_sales(
        &self,
        company_id: CompanyId,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<Sale>, RepositoryError>;

    async fn fetch_catalog(&self, company_id: CompanyId) -> Result<Vec<Product>, RepositoryError>;

    async fn fetch_bundle_components(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<BundleComponent>, RepositoryError>;

    async fn fetch_warehouses(&self, company_id: CompanyId) -> Result<Vec<Warehouse>, RepositoryError>;

    /// Suppliers referenced by the company's products, directly or through associations.
    async fn fetch_suppliers(&self, company_id: CompanyId) -> Result<Vec<Supplier>, RepositoryError>;

    async fn fetch_product_suppliers(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ProductSupplier>, RepositoryError>;
}

#[async_trait]
impl<R> Repository for Arc<R>
where
    R: Repository + ?Sized,
{
    async fn fetch_company(&self, company_id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        (**self).fetch_company(company_id).await
    }

    async fn fetch_inventory(&self, company_id: CompanyId) -> Result<Vec<InventoryRecord>, RepositoryError> {
        (**self).fetch_inventory(company_id).await
    }

    async fn fetch_recent_sales(
        &self,
        company_id: CompanyId,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<Sale>, RepositoryError> {
        (**self).fetch_recent_sales(company_id, window_start).await
    }

    async fn fetch_catalog(&self, company_id: CompanyId) -> Result<Vec<Product>, RepositoryError> {
        (**self).fetch_catalog(company_id).await
    }

    async fn fetch_bundle_components(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<BundleComponent>, RepositoryError> {
        (**self).fetch_bundle_components(company_id).await
    }

    async fn fetch_warehouses(&self, company_id: CompanyId) -> Result<Vec<Warehouse>, RepositoryError> {
        (**self).fetch_warehouses(company_id).await
    }

    async fn fetch_suppliers(&self, company_id: CompanyId) -> Result<Vec<Supplier>, RepositoryError> {
        (**self).fetch_suppliers(company_id).await
    }

    async fn fetch_product_suppliers(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ProductSupplier>, RepositoryError> {
        (**self).fetch_product_suppliers(company_id).await
    }
}

/// Load a full snapshot for `company_id`, failing with `CompanyNotFound` first.
pub async fn load_snapshot<R>(
    repository: &R,
    company_id: CompanyId,
    window_start: DateTime<Utc>,
) -> Result<ForecastSnapshot, ForecastError>
where
    R: Repository + ?Sized,
{
    let company = repository
        .fetch_company(company_id)
        .await?
        .ok_or(ForecastError::CompanyNotFound(company_id))?;

    let mut snapshot = ForecastSnapshot::new(company);
    snapshot.warehouses = repository.fetch_warehouses(company_id).await?;
    snapshot.products = repository.fetch_catalog(company_id).await?;
    snapshot.bundle_components = repository.fetch_bundle_components(company_id).await?;
    snapshot.inventory = repository.fetch_inventory(company_id).await?;
    snapshot.sales = repository.fetch_recent_sales(company_id, window_start).await?;
    snapshot.suppliers = repository.fetch_suppliers(company_id).await?;
    snapshot.product_suppliers = repository.fetch_product_suppliers(company_id).await?;

    Ok(snapshot)
}
