//! Product registration against a backing store.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockwatch_core::{DomainError, ProductId};
use stockwatch_forecast::RepositoryError;
use stockwatch_inventory::{RegisterProduct, RegistrationOutcome};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Validation, unknown company/warehouse/supplier, or SKU conflict.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The SKU is already stocked in the target warehouse.
    #[error("product with this sku already exists in this warehouse (product_id={product_id})")]
    AlreadyStocked { product_id: ProductId },

    #[error(transparent)]
    DataSource(#[from] RepositoryError),
}

/// Writes new products and their first stock rows.
///
/// Implementations validate the command, check that the warehouse belongs to
/// the company and apply the [`stockwatch_inventory::RegistrationPlan`]
/// atomically.
#[async_trait]
pub trait ProductRegistry: Send + Sync {
    async fn register_product(
        &self,
        command: RegisterProduct,
    ) -> Result<RegistrationOutcome, RegistrationError>;
}

#[async_trait]
impl<R> ProductRegistry for Arc<R>
where
    R: ProductRegistry + ?Sized,
{
    async fn register_product(
        &self,
        command: RegisterProduct,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        (**self).register_product(command).await
    }
}
