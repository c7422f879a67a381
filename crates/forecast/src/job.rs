use chrono::{DateTime, Utc};

use crate::alert::AlertsResponse;
use crate::snapshot::{ForecastSnapshot, SnapshotIndex};
use crate::supplier::SupplierResolver;
use crate::velocity::SalesVelocity;
use crate::window::WindowDays;
use crate::{bundle, simple};

/// A single low-stock forecast over one company snapshot.
///
/// Pure: reads the snapshot, allocates request-local state and returns the
/// ordered alerts. Safe to run concurrently for different companies.
#[derive(Debug, Clone)]
pub struct ForecastJob {
    snapshot: ForecastSnapshot,
    window: WindowDays,
    now: DateTime<Utc>,
}

impl ForecastJob {
    /// Build a job. Rows belonging to other companies are dropped up front.
    pub fn new(mut snapshot: ForecastSnapshot, window: WindowDays, now: DateTime<Utc>) -> Self {
        let dropped = snapshot.retain_company();
        if dropped > 0 {
            tracing::warn!(
                company_id = %snapshot.company_id(),
                dropped,
                "snapshot contained rows from other companies"
            );
        }
        Self {
            snapshot,
            window,
            now,
        }
    }

    pub fn input(&self) -> &ForecastSnapshot {
        &self.snapshot
    }

    pub fn run(&self) -> AlertsResponse {
        let snapshot = &self.snapshot;
        let index = SnapshotIndex::build(snapshot);
        let velocity = SalesVelocity::aggregate(&snapshot.sales, self.window, self.now);
        let suppliers = SupplierResolver::new(
            snapshot.company_id(),
            &snapshot.suppliers,
            &snapshot.product_suppliers,
        );

        let simple = simple::evaluate(snapshot, &index, &velocity, &suppliers);
        let bundle = bundle::evaluate(snapshot, &index, &velocity, &suppliers);

        AlertsResponse::assemble(simple, bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use stockwatch_core::{CompanyId, ProductId, SupplierId, WarehouseId};
    use stockwatch_inventory::{
        BundleComponent, Company, InventoryRecord, Product, ProductSupplier, Sale, Supplier,
        Warehouse,
    };

    const C: CompanyId = CompanyId::new(1);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 9, 30, 0).unwrap()
    }

    fn base() -> ForecastSnapshot {
        let mut snap = ForecastSnapshot::new(Company::new(C, "Demo Co"));
        snap.warehouses.push(Warehouse::new(WarehouseId::new(1), C, "Main Warehouse"));
        snap.products.push(Product::new(ProductId::new(101), C, "WID-001", "Widget A", 20));
        snap.inventory.push(InventoryRecord::new(C, WarehouseId::new(1), ProductId::new(101), 5));
        snap
    }

    fn sell(snap: &mut ForecastSnapshot, warehouse: i64, product: i64, qty: i64, days_ago: i64) {
        snap.sales.push(Sale::new(
            C,
            WarehouseId::new(warehouse),
            ProductId::new(product),
            qty,
            now() - Duration::days(days_ago),
        ));
    }

    #[test]
    fn widget_selling_two_a_day_alerts_with_fifteen_days() {
        let mut snap = base();
        for d in 1..=5 {
            sell(&mut snap, 1, 101, 2, d);
        }

        let response = ForecastJob::new(snap, WindowDays::default(), now()).run();
        assert_eq!(response.total_alerts(), 1);
        let alert = &response.alerts()[0];
        assert_eq!(alert.product_id, ProductId::new(101));
        assert_eq!(alert.current_stock, 5);
        assert_eq!(alert.days_until_stockout, Some(15));
        assert!(alert.supplier.is_unknown());
    }

    #[test]
    fn unsold_widget_does_not_alert() {
        let response = ForecastJob::new(base(), WindowDays::default(), now()).run();
        assert_eq!(response.total_alerts(), 0);
    }

    #[test]
    fn sales_outside_window_do_not_count() {
        let mut snap = base();
        sell(&mut snap, 1, 101, 50, 10);

        let response = ForecastJob::new(snap, WindowDays::new(7).unwrap(), now()).run();
        assert_eq!(response.total_alerts(), 0);
    }

    #[test]
    fn association_supplier_is_reported() {
        let mut snap = base();
        sell(&mut snap, 1, 101, 3, 1);
        snap.suppliers.push(
            Supplier::new(SupplierId::new(8), "Parts Inc").with_contact_email("buy@parts.example"),
        );
        snap.product_suppliers
            .push(ProductSupplier::new(C, ProductId::new(101), SupplierId::new(8)));

        let response = ForecastJob::new(snap, WindowDays::default(), now()).run();
        let supplier = &response.alerts()[0].supplier;
        assert_eq!(supplier.id, Some(SupplierId::new(8)));
        assert_eq!(supplier.name.as_deref(), Some("Parts Inc"));
        assert_eq!(supplier.contact_email.as_deref(), Some("buy@parts.example"));
    }

    #[test]
    fn simple_and_bundle_alerts_are_merged_in_order() {
        let mut snap = base();
        let w2 = WarehouseId::new(2);
        snap.warehouses.push(Warehouse::new(w2, C, "Overflow"));
        snap.products.push(Product::new(ProductId::new(50), C, "KIT", "Kit", 10).as_bundle());
        snap.bundle_components
            .push(BundleComponent::new(C, ProductId::new(50), ProductId::new(101), dec!(1)));
        snap.inventory.push(InventoryRecord::new(C, w2, ProductId::new(101), 100));
        sell(&mut snap, 1, 101, 2, 1);
        sell(&mut snap, 1, 50, 1, 1);
        sell(&mut snap, 2, 50, 1, 1);

        let response = ForecastJob::new(snap, WindowDays::default(), now()).run();
        let keys: Vec<_> = response
            .alerts()
            .iter()
            .map(|a| (a.warehouse_id.get(), a.product_id.get()))
            .collect();
        // Warehouse 2 has 100 of the component, so the kit is fine there.
        assert_eq!(keys, vec![(1, 50), (1, 101)]);
        assert_eq!(response.total_alerts(), 2);
    }

    #[test]
    fn foreign_rows_never_leak_into_alerts() {
        let mut snap = base();
        let other = CompanyId::new(2);
        snap.warehouses.push(Warehouse::new(WarehouseId::new(9), other, "Theirs"));
        snap.products.push(Product::new(ProductId::new(900), other, "X", "X", 100));
        snap.inventory.push(InventoryRecord::new(other, WarehouseId::new(9), ProductId::new(900), 0));
        snap.sales.push(Sale::new(other, WarehouseId::new(9), ProductId::new(900), 5, now()));

        let job = ForecastJob::new(snap, WindowDays::default(), now());
        assert_eq!(job.input().warehouses.len(), 1);
        assert_eq!(job.run().total_alerts(), 0);
    }

    #[test]
    fn zero_ratio_bundle_reports_zero_stock() {
        let mut snap = base();
        snap.products.push(Product::new(ProductId::new(50), C, "KIT", "Kit", 1).as_bundle());
        snap.bundle_components
            .push(BundleComponent::new(C, ProductId::new(50), ProductId::new(101), Decimal::ZERO));
        sell(&mut snap, 1, 50, 1, 1);

        let response = ForecastJob::new(snap, WindowDays::default(), now()).run();
        assert_eq!(response.total_alerts(), 1);
        assert_eq!(response.alerts()[0].current_stock, 0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        use crate::bundle::component_contribution;

        fn ratio(i: usize) -> Decimal {
            [dec!(0), dec!(0.5), dec!(1), dec!(2), dec!(3)][i]
        }
        const MAX_PRODUCTS: usize = 6;

        type ProductSpec = (bool, bool, i64);
        type SaleSpec = (usize, usize, i64, i64);
        type ComponentSpec = (usize, usize, usize);

        fn build(
            warehouses: Vec<bool>,
            products: Vec<ProductSpec>,
            on_hand: Vec<i64>,
            sales: Vec<SaleSpec>,
            components: Vec<ComponentSpec>,
        ) -> ForecastSnapshot {
            let mut snap = ForecastSnapshot::new(Company::new(C, "Demo Co"));
            let pid = |i: usize| ProductId::new(100 + i as i64);
            let wid = |i: usize| WarehouseId::new(1 + i as i64);

            for (i, active) in warehouses.iter().enumerate() {
                let mut w = Warehouse::new(wid(i), C, format!("W{i}"));
                w.active = *active;
                snap.warehouses.push(w);
            }
            for (i, (active, is_bundle, threshold)) in products.iter().enumerate() {
                let mut p = Product::new(pid(i), C, format!("SKU-{i}"), format!("P{i}"), *threshold);
                p.active = *active;
                p.is_bundle = *is_bundle;
                snap.products.push(p);
            }
            for w in 0..warehouses.len() {
                for p in 0..products.len() {
                    let qty = on_hand[w * MAX_PRODUCTS + p];
                    // -5 stands for "no inventory row".
                    if qty != -5 {
                        snap.inventory.push(InventoryRecord::new(C, wid(w), pid(p), qty));
                    }
                }
            }
            for (w, p, qty, days_ago) in sales {
                if w < warehouses.len() && p < products.len() {
                    snap.sales.push(Sale::new(C, wid(w), pid(p), qty, now() - Duration::days(days_ago)));
                }
            }
            for (b, c, r) in components {
                if b < products.len() && c < products.len() && b != c && products[b].1 && !products[c].1 {
                    snap.bundle_components.push(BundleComponent::new(C, pid(b), pid(c), ratio(r)));
                }
            }
            snap
        }

        fn arb_snapshot() -> impl Strategy<Value = ForecastSnapshot> {
            (
                prop::collection::vec(any::<bool>(), 1..4),
                prop::collection::vec((any::<bool>(), any::<bool>(), 0i64..30), 1..=MAX_PRODUCTS),
                prop::collection::vec(-5i64..40, 3 * MAX_PRODUCTS),
                prop::collection::vec((0usize..3, 0usize..MAX_PRODUCTS, 0i64..5, 0i64..60), 0..30),
                prop::collection::vec((0usize..MAX_PRODUCTS, 0usize..MAX_PRODUCTS, 0usize..5), 0..8),
            )
                .prop_map(|(w, p, q, s, c)| build(w, p, q, s, c))
        }

        fn sold_in_window(snap: &ForecastSnapshot, product: ProductId, warehouse: WarehouseId) -> i64 {
            let start = now() - Duration::days(30);
            snap.sales
                .iter()
                .filter(|s| s.product_id == product && s.warehouse_id == warehouse)
                .filter(|s| s.sale_date >= start && s.sale_date <= now())
                .map(|s| s.quantity_sold)
                .sum()
        }

        fn on_hand(snap: &ForecastSnapshot, warehouse: WarehouseId, product: ProductId) -> i64 {
            snap.inventory
                .iter()
                .find(|r| r.warehouse_id == warehouse && r.product_id == product)
                .map(|r| r.quantity_on_hand)
                .unwrap_or(0)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: every alert is below threshold, has demand and refers
            /// to active entities; the envelope count matches.
            #[test]
            fn alerts_respect_threshold_and_demand(snap in arb_snapshot()) {
                let response = ForecastJob::new(snap.clone(), WindowDays::default(), now()).run();

                prop_assert_eq!(response.total_alerts(), response.alerts().len());
                for alert in response.alerts() {
                    let product = snap.products.iter().find(|p| p.id == alert.product_id).unwrap();
                    let warehouse = snap.warehouses.iter().find(|w| w.id == alert.warehouse_id).unwrap();
                    prop_assert!(product.active);
                    prop_assert!(warehouse.active);
                    prop_assert!(alert.current_stock < alert.threshold);
                    prop_assert!(sold_in_window(&snap, product.id, warehouse.id) > 0);
                }
            }

            /// Property: output is ordered by (warehouse_id, product_id) and
            /// identical across runs.
            #[test]
            fn output_is_sorted_and_deterministic(snap in arb_snapshot()) {
                let job = ForecastJob::new(snap, WindowDays::default(), now());
                let first = job.run();
                let second = job.run();

                prop_assert!(first.alerts().windows(2).all(|w| w[0].sort_key() <= w[1].sort_key()));
                prop_assert_eq!(first, second);
            }

            /// Property: a bundle's reported stock is the minimum component contribution.
            #[test]
            fn bundle_stock_is_min_of_contributions(snap in arb_snapshot()) {
                let response = ForecastJob::new(snap.clone(), WindowDays::default(), now()).run();

                for alert in response.alerts() {
                    let product = snap.products.iter().find(|p| p.id == alert.product_id).unwrap();
                    if !product.is_bundle {
                        continue;
                    }
                    let expected = snap.bundle_components
                        .iter()
                        .filter(|c| c.bundle_product_id == product.id)
                        .map(|c| component_contribution(
                            on_hand(&snap, alert.warehouse_id, c.component_product_id),
                            c.quantity_per_bundle,
                        ))
                        .min();
                    prop_assert_eq!(Some(alert.current_stock), expected);
                    prop_assert!(alert.current_stock >= 0);
                }
            }
        }
    }
}
