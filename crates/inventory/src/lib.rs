//! Inventory domain module.
//!
//! Plain, tenant-scoped entities (companies, warehouses, products, bundles,
//! stock rows, sales, suppliers) plus the product registration rules. Pure
//! domain logic: no IO, no HTTP, no storage.

pub mod catalog;
pub mod registration;
pub mod stock;
pub mod supplier;

pub use catalog::{BundleComponent, Company, Product, QuantityPerBundle, Warehouse};
pub use registration::{RegisterProduct, RegistrationKind, RegistrationOutcome, RegistrationPlan};
pub use stock::{InventoryRecord, Sale};
pub use supplier::{ProductSupplier, Supplier};
