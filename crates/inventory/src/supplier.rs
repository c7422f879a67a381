use serde::{Deserialize, Serialize};

use stockwatch_core::{CompanyId, Entity, ProductId, SupplierId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
}

impl Supplier {
    pub fn new(id: SupplierId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            contact_email: None,
            phone: None,
        }
    }

    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> SupplierId {
        self.id
    }
}

/// Many-to-many link between a product and the suppliers able to provide it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSupplier {
    pub company_id: CompanyId,
    pub product_id: ProductId,
    pub supplier_id: SupplierId,
}

impl ProductSupplier {
    pub fn new(company_id: CompanyId, product_id: ProductId, supplier_id: SupplierId) -> Self {
        Self {
            company_id,
            product_id,
            supplier_id,
        }
    }
}
