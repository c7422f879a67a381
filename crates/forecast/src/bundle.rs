//! Alerts for bundle products.
//!
//! A bundle has no stock row of its own. Its buildable quantity in a warehouse
//! is bounded by its scarcest component.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use stockwatch_core::WarehouseId;
use stockwatch_inventory::{BundleComponent, QuantityPerBundle};

use crate::alert::Alert;
use crate::snapshot::{ForecastSnapshot, SnapshotIndex};
use crate::supplier::SupplierResolver;
use crate::velocity::{days_until_stockout, SalesVelocity};

/// Whole bundles a component's stock can support: `floor(on_hand / ratio)`.
///
/// A non-positive ratio supports nothing (0). Negative on-hand counts as 0.
pub fn component_contribution(on_hand: i64, ratio: QuantityPerBundle) -> i64 {
    if !ratio.is_positive() {
        return 0;
    }
    Decimal::from(on_hand.max(0))
        .checked_div(ratio.as_decimal())
        .map(|q| q.floor().to_i64().unwrap_or(i64::MAX))
        .unwrap_or(i64::MAX)
}

/// Buildable bundles in `warehouse_id`: the minimum contribution across
/// `components`, or `None` when there are no components.
pub(crate) fn bundle_stock(
    components: &[&BundleComponent],
    warehouse_id: WarehouseId,
    index: &SnapshotIndex<'_>,
) -> Option<i64> {
    components
        .iter()
        .map(|c| {
            if !c.quantity_per_bundle.is_positive() {
                tracing::debug!(
                    bundle_id = %c.bundle_product_id,
                    component_id = %c.component_product_id,
                    ratio = %c.quantity_per_bundle,
                    "non-positive quantity_per_bundle, component contributes 0"
                );
            }
            let on_hand = index.on_hand(warehouse_id, c.component_product_id);
            component_contribution(on_hand, c.quantity_per_bundle)
        })
        .min()
}

/// Evaluate every active bundle with at least one component against every
/// active warehouse of the company.
pub(crate) fn evaluate(
    snapshot: &ForecastSnapshot,
    index: &SnapshotIndex<'_>,
    velocity: &SalesVelocity,
    suppliers: &SupplierResolver<'_>,
) -> Vec<Alert> {
    let mut bundles: Vec<_> = snapshot
        .products
        .iter()
        .filter(|p| p.is_bundle && p.active)
        .collect();
    bundles.sort_by_key(|p| p.id);

    let warehouses = index.active_warehouses();
    let mut alerts = Vec::new();

    for bundle in bundles {
        let components = index.components_of(bundle.id);
        if components.is_empty() {
            continue;
        }

        for warehouse in &warehouses {
            let total_sold = velocity.total_sold(bundle.id, warehouse.id);
            if total_sold <= 0 {
                continue;
            }

            let Some(stock) = bundle_stock(components, warehouse.id, index) else {
                continue;
            };
            if stock >= bundle.threshold {
                continue;
            }

            let avg_daily = velocity.avg_daily(bundle.id, warehouse.id);
            let days = days_until_stockout(stock, avg_daily);

            alerts.push(Alert::new(
                bundle,
                warehouse,
                stock,
                days,
                suppliers.resolve(bundle),
            ));
        }
    }

    alerts
}
