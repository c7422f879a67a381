use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockwatch_core::{CompanyId, Entity, ProductId, SupplierId, WarehouseId};

/// Tenant boundary. Every other entity carries a `company_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

impl Company {
    pub fn new(id: CompanyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> CompanyId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub company_id: CompanyId,
    pub name: String,
    pub location: Option<String>,
    pub active: bool,
}

impl Warehouse {
    /// An active warehouse with no location.
    pub fn new(id: WarehouseId, company_id: CompanyId, name: impl Into<String>) -> Self {
        Self {
            id,
            company_id,
            name: name.into(),
            location: None,
            active: true,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }
}

/// Catalog entry. Bundles carry no stock of their own; their buildable quantity
/// is derived from [`BundleComponent`] rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub company_id: CompanyId,
    pub supplier_id: Option<SupplierId>,
    pub sku: String,
    pub name: String,
    pub is_bundle: bool,
    /// Reorder point: stock strictly below this is "low".
    pub threshold: i64,
    pub active: bool,
    pub price: Option<Decimal>,
}

impl Product {
    /// An active, non-bundle product without supplier or price.
    pub fn new(
        id: ProductId,
        company_id: CompanyId,
        sku: impl Into<String>,
        name: impl Into<String>,
        threshold: i64,
    ) -> Self {
        Self {
            id,
            company_id,
            supplier_id: None,
            sku: sku.into(),
            name: name.into(),
            is_bundle: false,
            threshold,
            active: true,
            price: None,
        }
    }

    pub fn as_bundle(mut self) -> Self {
        self.is_bundle = true;
        self
    }

    pub fn with_supplier(mut self, supplier_id: SupplierId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Units of a component consumed per bundle (`NUMERIC(18,4)` in storage).
///
/// Non-positive values are malformed but representable; consumers treat them as
/// "cannot support production" rather than rejecting the row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuantityPerBundle(Decimal);

impl QuantityPerBundle {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl From<Decimal> for QuantityPerBundle {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for QuantityPerBundle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Bill-of-materials line: one component of one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleComponent {
    pub company_id: CompanyId,
    pub bundle_product_id: ProductId,
    pub component_product_id: ProductId,
    pub quantity_per_bundle: QuantityPerBundle,
}

impl BundleComponent {
    pub fn new(
        company_id: CompanyId,
        bundle_product_id: ProductId,
        component_product_id: ProductId,
        quantity_per_bundle: impl Into<QuantityPerBundle>,
    ) -> Self {
        Self {
            company_id,
            bundle_product_id,
            component_product_id,
            quantity_per_bundle: quantity_per_bundle.into(),
        }
    }
}
