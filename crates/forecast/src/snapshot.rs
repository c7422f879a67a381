//! Immutable, company-scoped input for one forecast.

use std::collections::{BTreeMap, HashMap};

use stockwatch_core::{CompanyId, Entity, ProductId, WarehouseId};
use stockwatch_inventory::{
    BundleComponent, Company, InventoryRecord, Product, ProductSupplier, Sale, Supplier, Warehouse,
};

/// Everything the forecaster reads for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSnapshot {
    pub company: Company,
    pub warehouses: Vec<Warehouse>,
    pub products: Vec<Product>,
    pub bundle_components: Vec<BundleComponent>,
    pub inventory: Vec<InventoryRecord>,
    pub sales: Vec<Sale>,
    pub suppliers: Vec<Supplier>,
    pub product_suppliers: Vec<ProductSupplier>,
}

impl ForecastSnapshot {
    /// Empty snapshot for `company`.
    pub fn new(company: Company) -> Self {
        Self {
            company,
            warehouses: Vec::new(),
            products: Vec::new(),
            bundle_components: Vec::new(),
            inventory: Vec::new(),
            sales: Vec::new(),
            suppliers: Vec::new(),
            product_suppliers: Vec::new(),
        }
    }

    pub fn company_id(&self) -> CompanyId {
        self.company.id
    }

    /// Drop rows that belong to another company. Returns how many were dropped.
    pub fn retain_company(&mut self) -> usize {
        let company_id = self.company.id;
        let before = self.row_count();

        self.warehouses.retain(|w| w.company_id == company_id);
        self.products.retain(|p| p.company_id == company_id);
        self.bundle_components.retain(|c| c.company_id == company_id);
        self.inventory.retain(|i| i.company_id == company_id);
        self.sales.retain(|s| s.company_id == company_id);
        self.product_suppliers.retain(|l| l.company_id == company_id);

        before - self.row_count()
    }

    fn row_count(&self) -> usize {
        self.warehouses.len()
            + self.products.len()
            + self.bundle_components.len()
            + self.inventory.len()
            + self.sales.len()
            + self.product_suppliers.len()
    }
}

/// Index entities by id. When an id repeats, the first entity wins.
pub(crate) fn by_id<E: Entity>(items: &[E]) -> HashMap<E::Id, &E> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        index.entry(item.id()).or_insert(item);
    }
    index
}

/// Lookup tables over a snapshot.
#[derive(Debug)]
pub(crate) struct SnapshotIndex<'a> {
    pub products: HashMap<ProductId, &'a Product>,
    pub warehouses: HashMap<WarehouseId, &'a Warehouse>,
    on_hand: HashMap<(WarehouseId, ProductId), i64>,
    components: BTreeMap<ProductId, Vec<&'a BundleComponent>>,
}

impl<'a> SnapshotIndex<'a> {
    pub fn build(snapshot: &'a ForecastSnapshot) -> Self {
        let products = by_id(&snapshot.products);
        let warehouses = by_id(&snapshot.warehouses);

        let mut on_hand = HashMap::new();
        for row in &snapshot.inventory {
            // One row per (warehouse, product); keep the first if storage ever disagrees.
            on_hand
                .entry((row.warehouse_id, row.product_id))
                .or_insert(row.quantity_on_hand);
        }

        let mut components: BTreeMap<ProductId, Vec<&BundleComponent>> = BTreeMap::new();
        for c in &snapshot.bundle_components {
            components.entry(c.bundle_product_id).or_default().push(c);
        }

        Self {
            products,
            warehouses,
            on_hand,
            components,
        }
    }

    /// On-hand quantity; a missing row is zero.
    pub fn on_hand(&self, warehouse_id: WarehouseId, product_id: ProductId) -> i64 {
        self.on_hand
            .get(&(warehouse_id, product_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn components_of(&self, bundle_id: ProductId) -> &[&'a BundleComponent] {
        self.components
            .get(&bundle_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Active warehouses in ascending id order.
    pub fn active_warehouses(&self) -> Vec<&'a Warehouse> {
        let mut active: Vec<&Warehouse> = self.warehouses.values().copied().filter(|w| w.active).collect();
        active.sort_by_key(|w| w.id);
        active
    }
}
