use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockwatch_core::{CompanyId, DomainError, ProductId, SupplierId, WarehouseId};
use stockwatch_forecast::{ForecastSnapshot, Repository, RepositoryError};
use stockwatch_inventory::{
    BundleComponent, Company, InventoryRecord, Product, ProductSupplier, RegisterProduct,
    RegistrationKind, RegistrationOutcome, RegistrationPlan, Sale, Supplier, Warehouse,
};

use crate::registry::{ProductRegistry, RegistrationError};

/// Tables held by [`InMemoryRepository`].
///
/// Company-owned rows are keyed by `(CompanyId, ..)` so every read is a
/// range over one company. Suppliers are shared across companies.
#[derive(Debug, Default)]
struct Tables {
    companies: BTreeMap<CompanyId, Company>,
    warehouses: BTreeMap<(CompanyId, WarehouseId), Warehouse>,
    products: BTreeMap<(CompanyId, ProductId), Product>,
    bundle_components: BTreeMap<(CompanyId, ProductId, ProductId), BundleComponent>,
    inventory: BTreeMap<(CompanyId, WarehouseId, ProductId), InventoryRecord>,
    sales: Vec<Sale>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    product_suppliers: BTreeSet<(CompanyId, ProductId, SupplierId)>,
    last_product_id: i64,
}

impl Tables {
    fn company_products(&self, company_id: CompanyId) -> impl Iterator<Item = &Product> {
        self.products
            .range((company_id, ProductId::new(i64::MIN))..=(company_id, ProductId::new(i64::MAX)))
            .map(|(_, p)| p)
    }

    fn next_product_id(&mut self) -> ProductId {
        self.last_product_id += 1;
        ProductId::new(self.last_product_id)
    }
}

/// In-memory, company-isolated store for tests/dev.
///
/// Implements both the forecaster's [`Repository`] and the [`ProductRegistry`].
/// A failure can be injected to simulate an unavailable data source.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: RwLock<Tables>,
    failure: RwLock<Option<RepositoryError>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding one company's dataset.
    pub fn with_dataset(data: ForecastSnapshot) -> Self {
        let repo = Self::new();
        repo.load(data);
        repo
    }

    /// Insert every row of `data`. Existing rows with the same keys are replaced.
    pub fn load(&self, data: ForecastSnapshot) {
        self.insert_company(data.company);
        for s in data.suppliers {
            self.insert_supplier(s);
        }
        for w in data.warehouses {
            self.insert_warehouse(w);
        }
        for p in data.products {
            self.insert_product(p);
        }
        for c in data.bundle_components {
            self.insert_bundle_component(c);
        }
        for r in data.inventory {
            self.set_stock(r);
        }
        for s in data.sales {
            self.record_sale(s);
        }
        for l in data.product_suppliers {
            self.link_supplier(l);
        }
    }

    pub fn insert_company(&self, company: Company) {
        if let Ok(mut t) = self.inner.write() {
            t.companies.insert(company.id, company);
        }
    }

    pub fn insert_warehouse(&self, warehouse: Warehouse) {
        if let Ok(mut t) = self.inner.write() {
            t.warehouses.insert((warehouse.company_id, warehouse.id), warehouse);
        }
    }

    pub fn insert_product(&self, product: Product) {
        if let Ok(mut t) = self.inner.write() {
            t.last_product_id = t.last_product_id.max(product.id.get());
            t.products.insert((product.company_id, product.id), product);
        }
    }

    pub fn insert_bundle_component(&self, component: BundleComponent) {
        if let Ok(mut t) = self.inner.write() {
            let key = (
                component.company_id,
                component.bundle_product_id,
                component.component_product_id,
            );
            t.bundle_components.insert(key, component);
        }
    }

    /// Upsert the on-hand row for `(warehouse, product)`.
    pub fn set_stock(&self, record: InventoryRecord) {
        if let Ok(mut t) = self.inner.write() {
            let key = (record.company_id, record.warehouse_id, record.product_id);
            t.inventory.insert(key, record);
        }
    }

    pub fn record_sale(&self, sale: Sale) {
        if let Ok(mut t) = self.inner.write() {
            t.sales.push(sale);
        }
    }

    pub fn insert_supplier(&self, supplier: Supplier) {
        if let Ok(mut t) = self.inner.write() {
            t.suppliers.insert(supplier.id, supplier);
        }
    }

    pub fn link_supplier(&self, link: ProductSupplier) {
        if let Ok(mut t) = self.inner.write() {
            t.product_suppliers
                .insert((link.company_id, link.product_id, link.supplier_id));
        }
    }

    /// Make every subsequent read fail with `error` (`None` clears it).
    pub fn set_failure(&self, error: Option<RepositoryError>) {
        if let Ok(mut f) = self.failure.write() {
            *f = error;
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        if let Some(err) = self.failure.read().ok().and_then(|f| f.clone()) {
            return Err(err);
        }
        self.inner
            .read()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        if let Some(err) = self.failure.read().ok().and_then(|f| f.clone()) {
            return Err(err);
        }
        self.inner
            .write()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn fetch_company(&self, company_id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.read()?.companies.get(&company_id).cloned())
    }

    async fn fetch_inventory(&self, company_id: CompanyId) -> Result<Vec<InventoryRecord>, RepositoryError> {
        let t = self.read()?;
        Ok(t.inventory
            .values()
            .filter(|r| r.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn fetch_recent_sales(
        &self,
        company_id: CompanyId,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<Sale>, RepositoryError> {
        let t = self.read()?;
        Ok(t.sales
            .iter()
            .filter(|s| s.company_id == company_id && s.sale_date >= window_start)
            .cloned()
            .collect())
    }

    async fn fetch_catalog(&self, company_id: CompanyId) -> Result<Vec<Product>, RepositoryError> {
        let t = self.read()?;
        Ok(t.company_products(company_id).cloned().collect())
    }

    async fn fetch_bundle_components(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<BundleComponent>, RepositoryError> {
        let t = self.read()?;
        Ok(t.bundle_components
            .values()
            .filter(|c| c.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn fetch_warehouses(&self, company_id: CompanyId) -> Result<Vec<Warehouse>, RepositoryError> {
        let t = self.read()?;
        Ok(t.warehouses
            .values()
            .filter(|w| w.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn fetch_suppliers(&self, company_id: CompanyId) -> Result<Vec<Supplier>, RepositoryError> {
        let t = self.read()?;
        let mut referenced: BTreeSet<SupplierId> = t
            .company_products(company_id)
            .filter_map(|p| p.supplier_id)
            .collect();
        referenced.extend(
            t.product_suppliers
                .iter()
                .filter(|(c, _, _)| *c == company_id)
                .map(|(_, _, s)| *s),
        );

        Ok(referenced
            .into_iter()
            .filter_map(|id| t.suppliers.get(&id).cloned())
            .collect())
    }

    async fn fetch_product_suppliers(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ProductSupplier>, RepositoryError> {
        let t = self.read()?;
        Ok(t.product_suppliers
            .iter()
            .filter(|(c, _, _)| *c == company_id)
            .map(|(c, p, s)| ProductSupplier::new(*c, *p, *s))
            .collect())
    }
}

#[async_trait]
impl ProductRegistry for InMemoryRepository {
    async fn register_product(
        &self,
        command: RegisterProduct,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let command = command.validated()?;
        let company_id = command.company_id;
        let warehouse_id = command.warehouse_id;

        // One write guard for the whole registration so the plan and its
        // writes see the same state.
        let mut t = self.write()?;

        if !t.companies.contains_key(&company_id) {
            return Err(DomainError::not_found(format!("company {company_id}")).into());
        }
        if !t.warehouses.contains_key(&(company_id, warehouse_id)) {
            return Err(DomainError::not_found(format!("warehouse {warehouse_id}")).into());
        }
        if let Some(supplier_id) = command.supplier_id {
            if !t.suppliers.contains_key(&supplier_id) {
                return Err(DomainError::not_found(format!("supplier {supplier_id}")).into());
            }
        }

        let existing = t
            .company_products(company_id)
            .find(|p| p.sku == command.sku)
            .cloned();
        let stocked = existing
            .as_ref()
            .is_some_and(|p| t.inventory.contains_key(&(company_id, warehouse_id, p.id)));

        let (kind, product_id) = match command.plan(existing.as_ref(), stocked)? {
            RegistrationPlan::CreateProduct => {
                let id = t.next_product_id();
                t.products.insert((company_id, id), command.to_product(id));
                (RegistrationKind::Created, id)
            }
            RegistrationPlan::AddInventory { product_id } => {
                (RegistrationKind::StockedInNewWarehouse, product_id)
            }
            RegistrationPlan::AlreadyStocked { product_id } => {
                return Err(RegistrationError::AlreadyStocked { product_id });
            }
        };

        t.inventory.insert(
            (company_id, warehouse_id, product_id),
            InventoryRecord::new(company_id, warehouse_id, product_id, command.initial_quantity),
        );

        tracing::info!(
            company_id = %company_id,
            product_id = %product_id,
            warehouse_id = %warehouse_id,
            kind = ?kind,
            "product registered"
        );

        Ok(RegistrationOutcome {
            kind,
            product_id,
            sku: command.sku,
            warehouse_id,
        })
    }
}
