//! Postgres-backed repository.
//!
//! Reads and writes the reference schema in `migrations/0001_stockwatch.sql`.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `RepositoryError` as follows:
//!
//! | SQLx Error | RepositoryError |
//! |------------|-----------------|
//! | Io, Tls, PoolTimedOut, PoolClosed, WorkerCrashed | `Unavailable` |
//! | ColumnDecode, Decode, ColumnNotFound, TypeNotFound | `Decode` |
//! | Database and everything else | `Query` |
//!
//! Unique violations (`23505`) during registration become a `Conflict`.
//!
//! ## Tenant Isolation
//!
//! Every query includes `company_id` in the WHERE clause.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::{instrument, Span};

use stockwatch_core::{CompanyId, DomainError, ProductId, SupplierId, WarehouseId};
use stockwatch_forecast::{Repository, RepositoryError};
use stockwatch_inventory::{
    BundleComponent, Company, InventoryRecord, Product, ProductSupplier, QuantityPerBundle,
    RegisterProduct, RegistrationKind, RegistrationOutcome, RegistrationPlan, Sale, Supplier,
    Warehouse,
};

use crate::registry::{ProductRegistry, RegistrationError};

/// Reference schema, applied by [`PgRepository::apply_schema`].
pub const SCHEMA: &str = include_str!("../../migrations/0001_stockwatch.sql");

const PRODUCT_COLUMNS: &str = "id, company_id, supplier_id, sku, name, is_bundle, \
     threshold::BIGINT AS threshold, active, price";

/// Postgres repository and product registry.
///
/// Uses the SQLx connection pool, which is `Send + Sync`. Registration runs
/// in a single transaction.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: Arc<PgPool>,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables and indexes if they do not exist.
    pub async fn apply_schema(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply_schema", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    pub async fn load_company(&self, company_id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        let row = sqlx::query("SELECT id, name FROM companies WHERE id = $1")
            .bind(company_id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_company", e))?;

        row.as_ref().map(company_from_row).transpose().map_err(decode_error)
    }

    #[instrument(skip(self), fields(company_id = %company_id, rows = tracing::field::Empty), err)]
    pub async fn load_warehouses(&self, company_id: CompanyId) -> Result<Vec<Warehouse>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, name, location, active
            FROM warehouses
            WHERE company_id = $1
            ORDER BY id
            "#,
        )
        .bind(company_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_warehouses", e))?;

        decode_rows(&rows, warehouse_from_row)
    }

    #[instrument(skip(self), fields(company_id = %company_id, rows = tracing::field::Empty), err)]
    pub async fn load_products(&self, company_id: CompanyId) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE company_id = $1 ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(company_id.get())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_products", e))?;

        decode_rows(&rows, product_from_row)
    }

    #[instrument(skip(self), fields(company_id = %company_id, rows = tracing::field::Empty), err)]
    pub async fn load_bundle_components(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<BundleComponent>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT company_id, bundle_product_id, component_product_id, quantity_per_bundle
            FROM bundle_components
            WHERE company_id = $1
            ORDER BY bundle_product_id, component_product_id
            "#,
        )
        .bind(company_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_bundle_components", e))?;

        decode_rows(&rows, bundle_component_from_row)
    }

    #[instrument(skip(self), fields(company_id = %company_id, rows = tracing::field::Empty), err)]
    pub async fn load_inventory(&self, company_id: CompanyId) -> Result<Vec<InventoryRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT
                company_id,
                warehouse_id,
                product_id,
                quantity_on_hand::BIGINT AS quantity_on_hand
            FROM inventory
            WHERE company_id = $1
            ORDER BY warehouse_id, product_id
            "#,
        )
        .bind(company_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_inventory", e))?;

        decode_rows(&rows, inventory_from_row)
    }

    #[instrument(skip(self), fields(company_id = %company_id, rows = tracing::field::Empty), err)]
    pub async fn load_recent_sales(
        &self,
        company_id: CompanyId,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<Sale>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT
                company_id,
                warehouse_id,
                product_id,
                quantity_sold::BIGINT AS quantity_sold,
                sale_date
            FROM sales
            WHERE company_id = $1 AND sale_date >= $2
            "#,
        )
        .bind(company_id.get())
        .bind(window_start)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_recent_sales", e))?;

        decode_rows(&rows, sale_from_row)
    }

    #[instrument(skip(self), fields(company_id = %company_id, rows = tracing::field::Empty), err)]
    pub async fn load_suppliers(&self, company_id: CompanyId) -> Result<Vec<Supplier>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.name, s.contact_email, s.phone
            FROM suppliers s
            WHERE s.id IN (
                SELECT supplier_id FROM products
                WHERE company_id = $1 AND supplier_id IS NOT NULL
                UNION
                SELECT supplier_id FROM product_suppliers
                WHERE company_id = $1
            )
            ORDER BY s.id
            "#,
        )
        .bind(company_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_suppliers", e))?;

        decode_rows(&rows, supplier_from_row)
    }

    #[instrument(skip(self), fields(company_id = %company_id, rows = tracing::field::Empty), err)]
    pub async fn load_product_suppliers(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ProductSupplier>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT company_id, product_id, supplier_id
            FROM product_suppliers
            WHERE company_id = $1
            ORDER BY product_id, supplier_id
            "#,
        )
        .bind(company_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_product_suppliers", e))?;

        decode_rows(&rows, product_supplier_from_row)
    }

    /// Register a product inside one transaction; any error rolls it back.
    #[instrument(
        skip(self, command),
        fields(
            company_id = %command.company_id,
            warehouse_id = %command.warehouse_id,
            product_id = tracing::field::Empty
        ),
        err
    )]
    pub async fn register(&self, command: RegisterProduct) -> Result<RegistrationOutcome, RegistrationError> {
        let command = command.validated()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        match register_in(&mut tx, &command).await {
            Ok(outcome) => {
                tx.commit()
                    .await
                    .map_err(|e| map_sqlx_error("commit_transaction", e))?;
                Span::current().record("product_id", outcome.product_id.get());
                Ok(outcome)
            }
            Err(err) => Err(after_rollback(err, tx.rollback().await)),
        }
    }
}

async fn register_in(
    tx: &mut Transaction<'static, Postgres>,
    command: &RegisterProduct,
) -> Result<RegistrationOutcome, RegistrationError> {
    let company_id = command.company_id;
    let warehouse_id = command.warehouse_id;

    let company_exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM companies WHERE id = $1)")
        .bind(company_id.get())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("check_company", e))?;
    if !company_exists {
        return Err(DomainError::not_found(format!("company {company_id}")).into());
    }

    let warehouse_owned = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM warehouses WHERE id = $1 AND company_id = $2)",
    )
    .bind(warehouse_id.get())
    .bind(company_id.get())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("check_warehouse", e))?;
    if !warehouse_owned {
        return Err(DomainError::not_found(format!("warehouse {warehouse_id}")).into());
    }

    if let Some(supplier_id) = command.supplier_id {
        let supplier_exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM suppliers WHERE id = $1)")
            .bind(supplier_id.get())
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("check_supplier", e))?;
        if !supplier_exists {
            return Err(DomainError::not_found(format!("supplier {supplier_id}")).into());
        }
    }

    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE company_id = $1 AND sku = $2 FOR UPDATE"
    );
    let existing = sqlx::query(&sql)
        .bind(company_id.get())
        .bind(&command.sku)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("find_product_by_sku", e))?
        .as_ref()
        .map(product_from_row)
        .transpose()
        .map_err(decode_error)?;

    let stocked = match &existing {
        Some(product) => sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM inventory
                WHERE company_id = $1 AND warehouse_id = $2 AND product_id = $3
            )
            "#,
        )
        .bind(company_id.get())
        .bind(warehouse_id.get())
        .bind(product.id.get())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("check_inventory", e))?,
        None => false,
    };

    let (kind, product_id) = match command.plan(existing.as_ref(), stocked)? {
        RegistrationPlan::CreateProduct => {
            let id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO products (company_id, supplier_id, sku, name, is_bundle, threshold, active, price)
                VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
                RETURNING id
                "#,
            )
            .bind(company_id.get())
            .bind(command.supplier_id.map(|s| s.get()))
            .bind(&command.sku)
            .bind(&command.name)
            .bind(command.is_bundle)
            .bind(command.threshold)
            .bind(command.price)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RegistrationError::Domain(DomainError::conflict(format!(
                        "product with sku {} was registered concurrently",
                        command.sku
                    )))
                } else {
                    map_sqlx_error("insert_product", e).into()
                }
            })?;
            (RegistrationKind::Created, ProductId::new(id))
        }
        RegistrationPlan::AddInventory { product_id } => {
            (RegistrationKind::StockedInNewWarehouse, product_id)
        }
        RegistrationPlan::AlreadyStocked { product_id } => {
            return Err(RegistrationError::AlreadyStocked { product_id });
        }
    };

    sqlx::query(
        r#"
        INSERT INTO inventory (company_id, warehouse_id, product_id, quantity_on_hand)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(company_id.get())
    .bind(warehouse_id.get())
    .bind(product_id.get())
    .bind(command.initial_quantity)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RegistrationError::AlreadyStocked { product_id }
        } else {
            map_sqlx_error("insert_inventory", e).into()
        }
    })?;

    Ok(RegistrationOutcome {
        kind,
        product_id,
        sku: command.sku.clone(),
        warehouse_id,
    })
}

#[async_trait]
impl Repository for PgRepository {
    async fn fetch_company(&self, company_id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        self.load_company(company_id).await
    }

    async fn fetch_inventory(&self, company_id: CompanyId) -> Result<Vec<InventoryRecord>, RepositoryError> {
        self.load_inventory(company_id).await
    }

    async fn fetch_recent_sales(
        &self,
        company_id: CompanyId,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<Sale>, RepositoryError> {
        self.load_recent_sales(company_id, window_start).await
    }

    async fn fetch_catalog(&self, company_id: CompanyId) -> Result<Vec<Product>, RepositoryError> {
        self.load_products(company_id).await
    }

    async fn fetch_bundle_components(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<BundleComponent>, RepositoryError> {
        self.load_bundle_components(company_id).await
    }

    async fn fetch_warehouses(&self, company_id: CompanyId) -> Result<Vec<Warehouse>, RepositoryError> {
        self.load_warehouses(company_id).await
    }

    async fn fetch_suppliers(&self, company_id: CompanyId) -> Result<Vec<Supplier>, RepositoryError> {
        self.load_suppliers(company_id).await
    }

    async fn fetch_product_suppliers(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ProductSupplier>, RepositoryError> {
        self.load_product_suppliers(company_id).await
    }
}

#[async_trait]
impl ProductRegistry for PgRepository {
    async fn register_product(
        &self,
        command: RegisterProduct,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        self.register(command).await
    }
}

/// The registration error wins over a failed rollback, which is only logged.
fn after_rollback(err: RegistrationError, rollback: Result<(), sqlx::Error>) -> RegistrationError {
    if let Err(e) = rollback {
        tracing::warn!(error = %e, original = %err, "rollback after failed registration failed");
    }
    err
}

/// Map SQLx errors to repository errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => RepositoryError::Query(format!(
            "database error in {}: {} (code {})",
            operation,
            db_err.message(),
            db_err.code().as_deref().unwrap_or("none")
        )),
        sqlx::Error::Io(e) => RepositoryError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => RepositoryError::Unavailable(format!("tls error in {operation}: {e}")),
        sqlx::Error::PoolTimedOut => {
            RepositoryError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            RepositoryError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::WorkerCrashed => {
            RepositoryError::Unavailable(format!("connection worker crashed in {operation}"))
        }
        e @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. }) => decode_error(e),
        other => RepositoryError::Query(format!("{operation}: {other}")),
    }
}

fn decode_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn decode_rows<T>(
    rows: &[PgRow],
    decode: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> Result<Vec<T>, RepositoryError> {
    let decoded = rows
        .iter()
        .map(decode)
        .collect::<Result<Vec<_>, _>>()
        .map_err(decode_error)?;
    Span::current().record("rows", decoded.len());
    Ok(decoded)
}

// Row decoders

fn company_from_row(row: &PgRow) -> Result<Company, sqlx::Error> {
    Ok(Company::new(CompanyId::new(row.try_get("id")?), row.try_get::<String, _>("name")?))
}

fn warehouse_from_row(row: &PgRow) -> Result<Warehouse, sqlx::Error> {
    Ok(Warehouse {
        id: WarehouseId::new(row.try_get("id")?),
        company_id: CompanyId::new(row.try_get("company_id")?),
        name: row.try_get("name")?,
        location: row.try_get("location")?,
        active: row.try_get("active")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        company_id: CompanyId::new(row.try_get("company_id")?),
        supplier_id: row.try_get::<Option<i64>, _>("supplier_id")?.map(SupplierId::new),
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        is_bundle: row.try_get("is_bundle")?,
        threshold: row.try_get("threshold")?,
        active: row.try_get("active")?,
        price: row.try_get::<Option<Decimal>, _>("price")?,
    })
}

fn bundle_component_from_row(row: &PgRow) -> Result<BundleComponent, sqlx::Error> {
    Ok(BundleComponent::new(
        CompanyId::new(row.try_get("company_id")?),
        ProductId::new(row.try_get("bundle_product_id")?),
        ProductId::new(row.try_get("component_product_id")?),
        QuantityPerBundle::new(row.try_get::<Decimal, _>("quantity_per_bundle")?),
    ))
}

fn inventory_from_row(row: &PgRow) -> Result<InventoryRecord, sqlx::Error> {
    Ok(InventoryRecord::new(
        CompanyId::new(row.try_get("company_id")?),
        WarehouseId::new(row.try_get("warehouse_id")?),
        ProductId::new(row.try_get("product_id")?),
        row.try_get("quantity_on_hand")?,
    ))
}

fn sale_from_row(row: &PgRow) -> Result<Sale, sqlx::Error> {
    Ok(Sale::new(
        CompanyId::new(row.try_get("company_id")?),
        WarehouseId::new(row.try_get("warehouse_id")?),
        ProductId::new(row.try_get("product_id")?),
        row.try_get("quantity_sold")?,
        row.try_get("sale_date")?,
    ))
}

fn supplier_from_row(row: &PgRow) -> Result<Supplier, sqlx::Error> {
    Ok(Supplier {
        id: SupplierId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        contact_email: row.try_get("contact_email")?,
        phone: row.try_get("phone")?,
    })
}

fn product_supplier_from_row(row: &PgRow) -> Result<ProductSupplier, sqlx::Error> {
    Ok(ProductSupplier::new(
        CompanyId::new(row.try_get("company_id")?),
        ProductId::new(row.try_get("product_id")?),
        SupplierId::new(row.try_get("supplier_id")?),
    ))
}
