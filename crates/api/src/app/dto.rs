use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockwatch_core::{CompanyId, ProductId, SupplierId, WarehouseId};
use stockwatch_inventory::{RegisterProduct, RegistrationOutcome};

// -------------------------
// Request DTOs
// -------------------------

/// `?days=` is kept as raw text; the forecaster recovers bad values.
#[derive(Debug, Default, Deserialize)]
pub struct LowStockQuery {
    pub days: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterProductRequest {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub warehouse_id: i64,
    #[serde(default)]
    pub initial_quantity: i64,
    #[serde(default)]
    pub threshold: i64,
    #[serde(default)]
    pub is_bundle: bool,
    pub supplier_id: Option<i64>,
}

impl RegisterProductRequest {
    pub fn into_command(self, company_id: CompanyId) -> RegisterProduct {
        RegisterProduct {
            company_id,
            name: self.name,
            sku: self.sku,
            price: self.price,
            warehouse_id: WarehouseId::new(self.warehouse_id),
            initial_quantity: self.initial_quantity,
            threshold: self.threshold,
            is_bundle: self.is_bundle,
            supplier_id: self.supplier_id.map(SupplierId::new),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct RegisterProductResponse {
    pub message: &'static str,
    pub product_id: ProductId,
    pub sku: String,
    pub warehouse_id: WarehouseId,
}

impl From<RegistrationOutcome> for RegisterProductResponse {
    fn from(outcome: RegistrationOutcome) -> Self {
        Self {
            message: outcome.message(),
            product_id: outcome.product_id,
            sku: outcome.sku,
            warehouse_id: outcome.warehouse_id,
        }
    }
}
