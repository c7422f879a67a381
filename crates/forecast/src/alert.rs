//! Alert records and the response envelope.
//!
//! Field names are the public JSON contract of the low-stock endpoint.

use serde::{Deserialize, Serialize};

use stockwatch_core::{ProductId, WarehouseId};
use stockwatch_inventory::{Product, Warehouse};

use crate::supplier::SupplierInfo;

/// One (product, warehouse) pair at risk of stockout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub current_stock: i64,
    pub threshold: i64,
    pub days_until_stockout: Option<i64>,
    pub supplier: SupplierInfo,
}

impl Alert {
    pub fn new(
        product: &Product,
        warehouse: &Warehouse,
        current_stock: i64,
        days_until_stockout: Option<i64>,
        supplier: SupplierInfo,
    ) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            sku: product.sku.clone(),
            warehouse_id: warehouse.id,
            warehouse_name: warehouse.name.clone(),
            current_stock,
            threshold: product.threshold,
            days_until_stockout,
            supplier,
        }
    }

    pub fn sort_key(&self) -> (WarehouseId, ProductId) {
        (self.warehouse_id, self.product_id)
    }
}

/// Ordered alert list plus its length.
///
/// Fields are private so `total_alerts` cannot drift from `alerts.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertsResponse {
    alerts: Vec<Alert>,
    total_alerts: usize,
}

impl AlertsResponse {
    /// Merge simple and bundle alerts and order them by `(warehouse_id, product_id)`.
    pub fn assemble(simple: Vec<Alert>, bundle: Vec<Alert>) -> Self {
        let mut alerts = simple;
        alerts.extend(bundle);
        alerts.sort_by_key(Alert::sort_key);

        let total_alerts = alerts.len();
        Self {
            alerts,
            total_alerts,
        }
    }

    pub fn empty() -> Self {
        Self::assemble(Vec::new(), Vec::new())
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn total_alerts(&self) -> usize {
        self.total_alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockwatch_core::CompanyId;

    fn alert(warehouse: i64, product: i64) -> Alert {
        let c = CompanyId::new(1);
        let p = Product::new(ProductId::new(product), c, format!("SKU-{product}"), "Thing", 10);
        let w = Warehouse::new(WarehouseId::new(warehouse), c, "Main");
        Alert::new(&p, &w, 1, Some(3), SupplierInfo::unknown())
    }

    #[test]
    fn assemble_orders_by_warehouse_then_product() {
        let response = AlertsResponse::assemble(
            vec![alert(2, 1), alert(1, 9)],
            vec![alert(1, 3), alert(2, 0)],
        );

        let keys: Vec<_> = response
            .alerts()
            .iter()
            .map(|a| (a.warehouse_id.get(), a.product_id.get()))
            .collect();
        assert_eq!(keys, vec![(1, 3), (1, 9), (2, 0), (2, 1)]);
        assert_eq!(response.total_alerts(), 4);
    }

    #[test]
    fn empty_response_has_zero_total() {
        let response = AlertsResponse::empty();
        assert!(response.alerts().is_empty());
        assert_eq!(response.total_alerts(), 0);
    }

    #[test]
    fn json_shape_matches_contract() {
        let response = AlertsResponse::assemble(vec![alert(1, 101)], Vec::new());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "alerts": [{
                    "product_id": 101,
                    "product_name": "Thing",
                    "sku": "SKU-101",
                    "warehouse_id": 1,
                    "warehouse_name": "Main",
                    "current_stock": 1,
                    "threshold": 10,
                    "days_until_stockout": 3,
                    "supplier": {"id": null, "name": null, "contact_email": null}
                }],
                "total_alerts": 1
            })
        );
    }
}
