//! Supplier resolution for alert records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockwatch_core::{CompanyId, ProductId, SupplierId};
use stockwatch_inventory::{Product, ProductSupplier, Supplier};

use crate::snapshot::by_id;

/// Supplier block of an alert. All fields are `null` when no supplier resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub id: Option<SupplierId>,
    pub name: Option<String>,
    pub contact_email: Option<String>,
}

impl SupplierInfo {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.id.is_none()
    }
}

impl From<&Supplier> for SupplierInfo {
    fn from(s: &Supplier) -> Self {
        Self {
            id: Some(s.id),
            name: Some(s.name.clone()),
            contact_email: s.contact_email.clone(),
        }
    }
}

/// Resolves the supplier of a product: direct reference first, then the
/// association table (lowest supplier id wins), else unknown.
///
/// Only suppliers present in the company's snapshot are visible, which keeps
/// lookups inside the tenant.
#[derive(Debug)]
pub struct SupplierResolver<'a> {
    suppliers: HashMap<SupplierId, &'a Supplier>,
    links: HashMap<ProductId, Vec<SupplierId>>,
}

impl<'a> SupplierResolver<'a> {
    pub fn new(
        company_id: CompanyId,
        suppliers: &'a [Supplier],
        product_suppliers: &[ProductSupplier],
    ) -> Self {
        let suppliers = by_id(suppliers);

        let mut links: HashMap<ProductId, Vec<SupplierId>> = HashMap::new();
        for link in product_suppliers.iter().filter(|l| l.company_id == company_id) {
            links.entry(link.product_id).or_default().push(link.supplier_id);
        }
        for ids in links.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }

        Self { suppliers, links }
    }

    pub fn resolve(&self, product: &Product) -> SupplierInfo {
        if let Some(direct) = product.supplier_id.and_then(|id| self.suppliers.get(&id)) {
            return SupplierInfo::from(*direct);
        }

        self.links
            .get(&product.id)
            .into_iter()
            .flatten()
            .find_map(|id| self.suppliers.get(id))
            .map(|s| SupplierInfo::from(*s))
            .unwrap_or_default()
    }
}
