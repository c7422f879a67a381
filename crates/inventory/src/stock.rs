use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwatch_core::{CompanyId, ProductId, WarehouseId};

/// On-hand quantity of one product in one warehouse.
///
/// Storage keeps at most one row per (warehouse, product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub company_id: CompanyId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub quantity_on_hand: i64,
}

impl InventoryRecord {
    pub fn new(
        company_id: CompanyId,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        quantity_on_hand: i64,
    ) -> Self {
        Self {
            company_id,
            warehouse_id,
            product_id,
            quantity_on_hand,
        }
    }
}

/// Append-only sale event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub company_id: CompanyId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub quantity_sold: i64,
    pub sale_date: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        company_id: CompanyId,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        quantity_sold: i64,
        sale_date: DateTime<Utc>,
    ) -> Self {
        Self {
            company_id,
            warehouse_id,
            product_id,
            quantity_sold,
            sale_date,
        }
    }
}
