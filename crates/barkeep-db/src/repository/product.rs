//! # Product Repository
//!
//! Database operations for products.
//!
//! Products carry the three nullable catalog references (brand, category,
//! provider) that drive most deactivation conflicts. The helpers at the
//! bottom implement the two resolution strategies on the product side:
//!
//! - `clear_references_on` nulls one reference column across all products
//! - `cascade_deactivate_on` deactivates every active product that still
//!   points at the catalog row
//!
//! Both run on the caller's connection so the lifecycle orchestrator can
//! bundle them with the flag flip and the audit row in one transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use barkeep_core::{normalize, EntityKind, Money, Product};

/// Fields for inserting or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub price: Money,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub provider_id: Option<i64>,
}

/// The products column holding the reference to a catalog kind.
///
/// `None` for kinds products don't reference.
const fn reference_column(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::Brand => Some("brand_id"),
        EntityKind::Category => Some("category_id"),
        EntityKind::Provider => Some("provider_id"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    const COLUMNS: &'static str = "id, name, normalized_name, price_cents, category_id, \
         brand_id, provider_id, active, created_at, updated_at";

    /// Inserts a new product with `active = true`.
    ///
    /// ## Failure
    /// - `DbError::UniqueViolation` on duplicate normalized name
    /// - `DbError::ForeignKeyViolation` when a referenced catalog row
    ///   doesn't exist
    pub async fn insert(&self, input: ProductInput) -> DbResult<Product> {
        let normalized = normalize(&input.name);
        debug!(name = %input.name, price = %input.price, "Inserting product");

        if self.find_by_normalized_name(&normalized).await?.is_some() {
            return Err(DbError::duplicate("products.normalized_name", normalized));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO products \
             (name, normalized_name, price_cents, category_id, brand_id, provider_id, active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
        )
        .bind(&input.name)
        .bind(&normalized)
        .bind(input.price.cents())
        .bind(input.category_id)
        .bind(input.brand_id)
        .bind(input.provider_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: result.last_insert_rowid(),
            name: input.name,
            normalized_name: normalized,
            price_cents: input.price.cents(),
            category_id: input.category_id,
            brand_id: input.brand_id,
            provider_id: input.provider_id,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates a product's name, price and references in place.
    pub async fn update(&self, id: i64, input: ProductInput) -> DbResult<()> {
        let normalized = normalize(&input.name);

        if let Some(existing) = self.find_by_normalized_name(&normalized).await? {
            if existing.id != id {
                return Err(DbError::duplicate("products.normalized_name", normalized));
            }
        }

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE products SET name = ?2, normalized_name = ?3, price_cents = ?4, \
             category_id = ?5, brand_id = ?6, provider_id = ?7, updated_at = ?8 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&normalized)
        .bind(input.price.cents())
        .bind(input.category_id)
        .bind(input.brand_id)
        .bind(input.provider_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product only if it is active. Sale lines must never be added
    /// for deactivated products.
    pub async fn find_active_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?1 AND active = 1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn find_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE normalized_name = ?1",
            Self::COLUMNS
        ))
        .bind(normalized_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn get_all(&self, include_inactive: bool) -> DbResult<Vec<Product>> {
        let filter = if include_inactive {
            ""
        } else {
            " WHERE active = 1"
        };
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products{} ORDER BY name ASC",
            Self::COLUMNS,
            filter
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        let now = Utc::now();
        let result =
            sqlx::query("UPDATE products SET active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products referencing a catalog row.
    ///
    /// Feeds the `*_IN_USE` conflict rules for brand, category and provider.
    /// Returns 0 for kinds products don't reference.
    pub async fn count_active_referencing(&self, kind: EntityKind, id: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count_active_referencing_on(&mut conn, kind, id).await
    }
}

/// Gets an active product on the caller's connection. The sale service
/// reads the price snapshot through this inside its line transactions.
pub async fn find_active_product_on(
    conn: &mut SqliteConnection,
    id: i64,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, normalized_name, price_cents, category_id, brand_id, provider_id, \
         active, created_at, updated_at FROM products WHERE id = ?1 AND active = 1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

/// Counts active products referencing a catalog row, on the caller's
/// connection.
pub async fn count_active_referencing_on(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: i64,
) -> DbResult<i64> {
    let Some(column) = reference_column(kind) else {
        return Ok(0);
    };

    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM products WHERE {} = ?1 AND active = 1",
        column
    ))
    .bind(id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Nulls one catalog reference across all products (active or not).
///
/// The `clear-references` strategy: products stay sellable, they just lose
/// the link. Inactive products are cleared too so a later product
/// reactivation can't resurrect a pointer to a dead catalog row.
/// Returns the number of products touched.
pub async fn clear_references_on(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: i64,
) -> DbResult<u64> {
    let Some(column) = reference_column(kind) else {
        return Ok(0);
    };
    debug!(kind = %kind, id = %id, "Clearing product references");

    let now = Utc::now();
    let result = sqlx::query(&format!(
        "UPDATE products SET {col} = NULL, updated_at = ?2 WHERE {col} = ?1",
        col = column
    ))
    .bind(id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Deactivates every active product referencing a catalog row.
///
/// The `cascade-dependents` strategy. The reference itself is kept so a
/// later reactivation of the catalog row leaves the products one flag flip
/// away from coming back. Returns the number of products deactivated.
pub async fn cascade_deactivate_on(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: i64,
) -> DbResult<u64> {
    let Some(column) = reference_column(kind) else {
        return Ok(0);
    };
    debug!(kind = %kind, id = %id, "Cascade-deactivating products");

    let now = Utc::now();
    let result = sqlx::query(&format!(
        "UPDATE products SET active = 0, updated_at = ?2 WHERE {} = ?1 AND active = 1",
        column
    ))
    .bind(id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

// =============================================================================
// Unit Tests
// =============================================================================
