//! Demo fixture used by the dev server and tests.

use chrono::{DateTime, Duration, Utc};

use stockwatch_core::{CompanyId, ProductId, SupplierId, WarehouseId};
use stockwatch_forecast::ForecastSnapshot;
use stockwatch_inventory::{Company, InventoryRecord, Product, Sale, Supplier, Warehouse};

pub const DEMO_COMPANY: CompanyId = CompanyId::new(1);
pub const DEMO_WAREHOUSE: WarehouseId = WarehouseId::new(1);
pub const DEMO_SUPPLIER: SupplierId = SupplierId::new(1);
pub const WIDGET_A: ProductId = ProductId::new(101);
pub const BUNDLE_PACK: ProductId = ProductId::new(102);

/// "Demo Co": one warehouse, one supplier, a widget selling 2/day for the
/// last five days with 5 on hand, and a component-less bundle.
pub fn demo_dataset(now: DateTime<Utc>) -> ForecastSnapshot {
    let mut data = ForecastSnapshot::new(Company::new(DEMO_COMPANY, "Demo Co"));

    data.suppliers
        .push(Supplier::new(DEMO_SUPPLIER, "Supplier Corp").with_contact_email("orders@supplier.com"));
    data.warehouses
        .push(Warehouse::new(DEMO_WAREHOUSE, DEMO_COMPANY, "Main Warehouse"));

    data.products.push(
        Product::new(WIDGET_A, DEMO_COMPANY, "WID-001", "Widget A", 20).with_supplier(DEMO_SUPPLIER),
    );
    data.products.push(
        Product::new(BUNDLE_PACK, DEMO_COMPANY, "BUNDLE-01", "Bundle Pack", 5)
            .as_bundle()
            .with_supplier(DEMO_SUPPLIER),
    );

    data.inventory
        .push(InventoryRecord::new(DEMO_COMPANY, DEMO_WAREHOUSE, WIDGET_A, 5));
    data.inventory
        .push(InventoryRecord::new(DEMO_COMPANY, DEMO_WAREHOUSE, BUNDLE_PACK, 0));

    for days_ago in 1..=5 {
        data.sales.push(Sale::new(
            DEMO_COMPANY,
            DEMO_WAREHOUSE,
            WIDGET_A,
            2,
            now - Duration::days(days_ago),
        ));
    }

    data
}
