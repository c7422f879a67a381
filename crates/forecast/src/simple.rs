//! Alerts for products whose stock is tracked directly.

use std::collections::HashSet;

use crate::alert::Alert;
use crate::snapshot::{ForecastSnapshot, SnapshotIndex};
use crate::supplier::SupplierResolver;
use crate::velocity::{days_until_stockout, SalesVelocity};

/// Evaluate every inventory row of an active, non-bundle product in an active
/// warehouse. Rows without recent demand never alert.
pub(crate) fn evaluate(
    snapshot: &ForecastSnapshot,
    index: &SnapshotIndex<'_>,
    velocity: &SalesVelocity,
    suppliers: &SupplierResolver<'_>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let mut seen = HashSet::new();

    for row in &snapshot.inventory {
        if !seen.insert((row.warehouse_id, row.product_id)) {
            continue;
        }

        let (Some(product), Some(warehouse)) = (
            index.products.get(&row.product_id),
            index.warehouses.get(&row.warehouse_id),
        ) else {
            tracing::debug!(
                product_id = %row.product_id,
                warehouse_id = %row.warehouse_id,
                "inventory row references unknown product or warehouse"
            );
            continue;
        };

        if product.is_bundle || !product.active || !warehouse.active {
            continue;
        }

        let total_sold = velocity.total_sold(product.id, warehouse.id);
        if total_sold <= 0 {
            continue;
        }

        let current_stock = row.quantity_on_hand;
        if current_stock >= product.threshold {
            continue;
        }

        let avg_daily = velocity.avg_daily(product.id, warehouse.id);
        let days = days_until_stockout(current_stock, avg_daily);

        alerts.push(Alert::new(
            product,
            warehouse,
            current_stock,
            days,
            suppliers.resolve(product),
        ));
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use stockwatch_core::{CompanyId, ProductId, WarehouseId};
    use stockwatch_inventory::{Company, InventoryRecord, Product, Sale, Warehouse};

    use crate::window::WindowDays;

    const C: CompanyId = CompanyId::new(1);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn snapshot() -> ForecastSnapshot {
        let mut snap = ForecastSnapshot::new(Company::new(C, "Demo Co"));
        snap.warehouses.push(Warehouse::new(WarehouseId::new(1), C, "Main"));
        snap.products.push(Product::new(ProductId::new(101), C, "WID-001", "Widget A", 20));
        snap.inventory.push(InventoryRecord::new(C, WarehouseId::new(1), ProductId::new(101), 5));
        snap
    }

    fn run(snap: &ForecastSnapshot) -> Vec<Alert> {
        let index = SnapshotIndex::build(snap);
        let velocity = SalesVelocity::aggregate(&snap.sales, WindowDays::default(), now());
        let suppliers = SupplierResolver::new(C, &snap.suppliers, &snap.product_suppliers);
        evaluate(snap, &index, &velocity, &suppliers)
    }

    fn sell(snap: &mut ForecastSnapshot, product: i64, qty: i64, days_ago: i64) {
        snap.sales.push(Sale::new(
            C,
            WarehouseId::new(1),
            ProductId::new(product),
            qty,
            now() - Duration::days(days_ago),
        ));
    }

    #[test]
    fn low_stock_with_demand_alerts() {
        let mut snap = snapshot();
        for d in 1..=5 {
            sell(&mut snap, 101, 2, d);
        }

        let alerts = run(&snap);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].current_stock, 5);
        assert_eq!(alerts[0].threshold, 20);
        assert_eq!(alerts[0].days_until_stockout, Some(15));
    }

    #[test]
    fn no_demand_never_alerts() {
        let snap = snapshot();
        assert!(run(&snap).is_empty());
    }

    #[test]
    fn stock_at_threshold_does_not_alert() {
        let mut snap = snapshot();
        snap.inventory[0].quantity_on_hand = 20;
        sell(&mut snap, 101, 10, 1);
        assert!(run(&snap).is_empty());
    }

    #[test]
    fn inactive_product_or_warehouse_is_skipped() {
        let mut snap = snapshot();
        sell(&mut snap, 101, 10, 1);
        snap.products[0].active = false;
        assert!(run(&snap).is_empty());

        let mut snap = snapshot();
        sell(&mut snap, 101, 10, 1);
        snap.warehouses[0].active = false;
        assert!(run(&snap).is_empty());
    }

    #[test]
    fn bundle_rows_are_left_to_the_bundle_evaluator() {
        let mut snap = snapshot();
        snap.products[0].is_bundle = true;
        sell(&mut snap, 101, 10, 1);
        assert!(run(&snap).is_empty());
    }

    #[test]
    fn duplicate_inventory_rows_alert_once() {
        let mut snap = snapshot();
        snap.inventory.push(InventoryRecord::new(C, WarehouseId::new(1), ProductId::new(101), 1));
        sell(&mut snap, 101, 10, 1);

        let alerts = run(&snap);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].current_stock, 5);
    }

    #[test]
    fn orphan_inventory_rows_are_ignored() {
        let mut snap = snapshot();
        snap.inventory.push(InventoryRecord::new(C, WarehouseId::new(1), ProductId::new(999), 0));
        sell(&mut snap, 999, 10, 1);
        assert!(run(&snap).is_empty());
    }
}
