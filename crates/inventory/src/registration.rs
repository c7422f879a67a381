//! Product registration rules.
//!
//! Registering a SKU either creates the product together with its first stock
//! row, or (when the SKU already exists in the company) opens stock for it in
//! another warehouse. Persisting the plan is the caller's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockwatch_core::{CompanyId, DomainError, DomainResult, ProductId, SupplierId, WarehouseId};

use crate::catalog::Product;

/// Command: RegisterProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProduct {
    pub company_id: CompanyId,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub warehouse_id: WarehouseId,
    pub initial_quantity: i64,
    pub threshold: i64,
    pub is_bundle: bool,
    pub supplier_id: Option<SupplierId>,
}

impl RegisterProduct {
    /// Trim text fields and check every field-level rule.
    ///
    /// Rules that need stored state (warehouse ownership, SKU reuse) are checked
    /// by [`RegisterProduct::plan`] and by the registry.
    pub fn validated(mut self) -> DomainResult<Self> {
        self.name = self.name.trim().to_string();
        self.sku = self.sku.trim().to_string();

        if self.name.is_empty() || self.sku.is_empty() {
            return Err(DomainError::validation("name and sku cannot be empty"));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if self.warehouse_id.get() <= 0 {
            return Err(DomainError::validation("invalid warehouse id"));
        }
        if self.initial_quantity < 0 {
            return Err(DomainError::validation("initial quantity cannot be negative"));
        }
        if self.threshold < 0 {
            return Err(DomainError::validation("threshold cannot be negative"));
        }
        Ok(self)
    }

    /// Decide what to write given the product already registered under this SKU
    /// (if any) and whether it is already stocked in the target warehouse.
    ///
    /// A SKU already stocked in the warehouse yields
    /// [`RegistrationPlan::AlreadyStocked`]; the registry reports it as a
    /// conflict carrying the existing product id.
    pub fn plan(
        &self,
        existing: Option<&Product>,
        stocked_in_warehouse: bool,
    ) -> DomainResult<RegistrationPlan> {
        match existing {
            None => Ok(RegistrationPlan::CreateProduct),
            Some(product) if product.company_id != self.company_id => Err(DomainError::conflict(
                "sku lookup returned a product from another company",
            )),
            Some(product) if stocked_in_warehouse => Ok(RegistrationPlan::AlreadyStocked {
                product_id: product.id,
            }),
            Some(product) => Ok(RegistrationPlan::AddInventory {
                product_id: product.id,
            }),
        }
    }

    /// Build the catalog row for a brand-new product.
    pub fn to_product(&self, id: ProductId) -> Product {
        Product {
            id,
            company_id: self.company_id,
            supplier_id: self.supplier_id,
            sku: self.sku.clone(),
            name: self.name.clone(),
            is_bundle: self.is_bundle,
            threshold: self.threshold,
            active: true,
            price: Some(self.price),
        }
    }
}

/// What a registration will write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegistrationPlan {
    /// New product row plus its first inventory row.
    CreateProduct,
    /// Only an inventory row for an existing product.
    AddInventory { product_id: ProductId },
    /// Nothing to write: the product is already stocked in the warehouse.
    AlreadyStocked { product_id: ProductId },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationKind {
    Created,
    StockedInNewWarehouse,
}

/// Result of a committed registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub kind: RegistrationKind,
    pub product_id: ProductId,
    pub sku: String,
    pub warehouse_id: WarehouseId,
}

impl RegistrationOutcome {
    pub fn message(&self) -> &'static str {
        match self.kind {
            RegistrationKind::Created => "Product created successfully",
            RegistrationKind::StockedInNewWarehouse => {
                "Product already exists, inventory added for new warehouse"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn command() -> RegisterProduct {
        RegisterProduct {
            company_id: CompanyId::new(1),
            name: "  Widget A ".to_string(),
            sku: " WID-001".to_string(),
            price: dec!(9.99),
            warehouse_id: WarehouseId::new(1),
            initial_quantity: 5,
            threshold: 20,
            is_bundle: false,
            supplier_id: None,
        }
    }

    fn existing() -> Product {
        Product::new(ProductId::new(101), CompanyId::new(1), "WID-001", "Widget A", 20)
    }

    #[test]
    fn validated_trims_text_fields() {
        let cmd = command().validated().unwrap();
        assert_eq!(cmd.name, "Widget A");
        assert_eq!(cmd.sku, "WID-001");
    }

    #[test]
    fn rejects_blank_name_or_sku() {
        let mut cmd = command();
        cmd.name = "   ".to_string();
        assert!(matches!(cmd.validated(), Err(DomainError::Validation(_))));

        let mut cmd = command();
        cmd.sku = String::new();
        assert!(matches!(cmd.validated(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_negative_price_quantity_and_threshold() {
        let mut cmd = command();
        cmd.price = dec!(-0.01);
        assert!(cmd.validated().is_err());

        let mut cmd = command();
        cmd.initial_quantity = -1;
        assert!(cmd.validated().is_err());

        let mut cmd = command();
        cmd.threshold = -5;
        assert!(cmd.validated().is_err());
    }

    #[test]
    fn rejects_non_positive_warehouse() {
        let mut cmd = command();
        cmd.warehouse_id = WarehouseId::new(0);
        assert_eq!(
            cmd.validated().unwrap_err(),
            DomainError::validation("invalid warehouse id")
        );
    }

    #[test]
    fn zero_price_is_allowed() {
        let mut cmd = command();
        cmd.price = Decimal::ZERO;
        assert!(cmd.validated().is_ok());
    }

    #[test]
    fn new_sku_creates_product() {
        let plan = command().plan(None, false).unwrap();
        assert_eq!(plan, RegistrationPlan::CreateProduct);
    }

    #[test]
    fn known_sku_in_new_warehouse_adds_inventory_only() {
        let plan = command().plan(Some(&existing()), false).unwrap();
        assert_eq!(
            plan,
            RegistrationPlan::AddInventory {
                product_id: ProductId::new(101)
            }
        );
    }

    #[test]
    fn known_sku_already_stocked_reports_existing_product() {
        let plan = command().plan(Some(&existing()), true).unwrap();
        assert_eq!(
            plan,
            RegistrationPlan::AlreadyStocked {
                product_id: ProductId::new(101)
            }
        );
    }

    #[test]
    fn sku_from_another_company_conflicts() {
        let mut foreign = existing();
        foreign.company_id = CompanyId::new(2);
        assert!(matches!(
            command().plan(Some(&foreign), false),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn to_product_copies_command_fields() {
        let cmd = command().validated().unwrap();
        let product = cmd.to_product(ProductId::new(7));
        assert_eq!(product.sku, "WID-001");
        assert_eq!(product.threshold, 20);
        assert_eq!(product.price, Some(dec!(9.99)));
        assert!(product.active);
    }

    #[test]
    fn outcome_messages() {
        let created = RegistrationOutcome {
            kind: RegistrationKind::Created,
            product_id: ProductId::new(1),
            sku: "S".to_string(),
            warehouse_id: WarehouseId::new(1),
        };
        assert_eq!(created.message(), "Product created successfully");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: validation is idempotent on accepted commands.
            #[test]
            fn validated_is_idempotent(
                name in "[ ]{0,3}[A-Za-z][A-Za-z0-9 ]{0,30}",
                sku in "[ ]{0,3}[A-Z0-9-]{1,20}[ ]{0,3}",
                qty in 0i64..10_000,
            ) {
                let mut cmd = command();
                cmd.name = name;
                cmd.sku = sku;
                cmd.initial_quantity = qty;

                let once = cmd.validated().unwrap();
                let twice = once.clone().validated().unwrap();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
