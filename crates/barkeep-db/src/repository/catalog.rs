//! # Catalog Repositories
//!
//! Database operations for the soft-deletable catalog kinds.
//!
//! ## Uniform Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog Repository Layout                            │
//! │                                                                         │
//! │  CatalogRepository (kind→table)      Bespoke repositories               │
//! │  ──────────────────────────────      ────────────────────               │
//! │  Brand      → brands                 AccountRepository (is_system)      │
//! │  Category   → categories             PaymentMethodRepository            │
//! │  Provider   → providers                (account_id FK + cascade)        │
//! │  Employee   → employees              BartableRepository (number key)    │
//! │                                                                         │
//! │  Shared ops: insert, find_by_id, find_active_by_id,                    │
//! │  find_by_normalized_name, get_all(ListOptions), rename, set_active     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Duplicate names are rejected *before* any write by probing the
//! normalized-name index; the unique constraint itself is the backstop
//! against races.
//!
//! The free functions at the bottom (`find_active_flag_on`, `set_active_on`)
//! give the lifecycle orchestrator one uniform flag-flip across all seven
//! kinds, scoped to the caller's transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use barkeep_core::{normalize, Account, Bartable, CatalogEntity, EntityKind, PaymentMethod};

// =============================================================================
// Listing Options
// =============================================================================

/// Whitelisted sort columns. Raw column strings never reach the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    #[default]
    Name,
    CreatedAt,
}

impl SortField {
    const fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    const fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Options for `get_all` listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Include soft-deleted rows. Default: active only.
    pub include_inactive: bool,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

// =============================================================================
// Kind → Table Mapping
// =============================================================================

/// Table name for an entity kind.
pub(crate) const fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Brand => "brands",
        EntityKind::Category => "categories",
        EntityKind::Provider => "providers",
        EntityKind::Employee => "employees",
        EntityKind::Account => "accounts",
        EntityKind::Bartable => "bartables",
        EntityKind::PaymentMethod => "payment_methods",
    }
}

// =============================================================================
// Catalog Repository (Brand / Category / Provider / Employee)
// =============================================================================

/// Repository for the four catalog kinds that share the plain
/// `CatalogEntity` shape. The kind picks the table; the SQL is identical.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
    kind: EntityKind,
}

impl CatalogRepository {
    /// Creates a repository for one of the plain catalog kinds.
    pub fn new(pool: SqlitePool, kind: EntityKind) -> Self {
        debug_assert!(
            matches!(
                kind,
                EntityKind::Brand
                    | EntityKind::Category
                    | EntityKind::Provider
                    | EntityKind::Employee
            ),
            "CatalogRepository only serves the plain catalog kinds"
        );
        CatalogRepository { pool, kind }
    }

    fn table(&self) -> &'static str {
        table_for(self.kind)
    }

    /// Inserts a new entity with `active = true`.
    ///
    /// ## Failure
    /// `DbError::UniqueViolation` when another row (active or not) already
    /// owns the normalized name. Checked before any write.
    pub async fn insert(&self, name: &str) -> DbResult<CatalogEntity> {
        let normalized = normalize(name);
        debug!(kind = %self.kind, name = %name, "Inserting catalog entity");

        if let Some(existing) = self.find_by_normalized_name(&normalized).await? {
            return Err(DbError::duplicate(
                format!("{}.normalized_name", self.table()),
                existing.normalized_name,
            ));
        }

        let now = Utc::now();
        let result = sqlx::query(&format!(
            "INSERT INTO {} (name, normalized_name, active, created_at, updated_at) \
             VALUES (?1, ?2, 1, ?3, ?3)",
            self.table()
        ))
        .bind(name)
        .bind(&normalized)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(CatalogEntity {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            normalized_name: normalized,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets an entity by ID, active or not.
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<CatalogEntity>> {
        let entity = sqlx::query_as::<_, CatalogEntity>(&format!(
            "SELECT id, name, normalized_name, active, created_at, updated_at \
             FROM {} WHERE id = ?1",
            self.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity)
    }

    /// Gets an entity by ID, additionally filtering `active = true`.
    pub async fn find_active_by_id(&self, id: i64) -> DbResult<Option<CatalogEntity>> {
        let entity = sqlx::query_as::<_, CatalogEntity>(&format!(
            "SELECT id, name, normalized_name, active, created_at, updated_at \
             FROM {} WHERE id = ?1 AND active = 1",
            self.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity)
    }

    /// Looks an entity up by its normalized name (duplicate probing).
    pub async fn find_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> DbResult<Option<CatalogEntity>> {
        let entity = sqlx::query_as::<_, CatalogEntity>(&format!(
            "SELECT id, name, normalized_name, active, created_at, updated_at \
             FROM {} WHERE normalized_name = ?1",
            self.table()
        ))
        .bind(normalized_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity)
    }

    /// Lists entities with sort and inactive-visibility options.
    pub async fn get_all(&self, opts: ListOptions) -> DbResult<Vec<CatalogEntity>> {
        let filter = if opts.include_inactive {
            ""
        } else {
            " WHERE active = 1"
        };
        let entities = sqlx::query_as::<_, CatalogEntity>(&format!(
            "SELECT id, name, normalized_name, active, created_at, updated_at \
             FROM {}{} ORDER BY {} {}",
            self.table(),
            filter,
            opts.sort_field.column(),
            opts.sort_direction.keyword()
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entities)
    }

    /// Renames an entity, re-deriving its normalized name.
    ///
    /// ## Failure
    /// - `DbError::UniqueViolation` when a *different* row owns the new name
    /// - `DbError::NotFound` when the id doesn't exist
    pub async fn rename(&self, id: i64, name: &str) -> DbResult<()> {
        let normalized = normalize(name);

        if let Some(existing) = self.find_by_normalized_name(&normalized).await? {
            if existing.id != id {
                return Err(DbError::duplicate(
                    format!("{}.normalized_name", self.table()),
                    normalized,
                ));
            }
        }

        let now = Utc::now();
        let result = sqlx::query(&format!(
            "UPDATE {} SET name = ?2, normalized_name = ?3, updated_at = ?4 WHERE id = ?1",
            self.table()
        ))
        .bind(id)
        .bind(name)
        .bind(&normalized)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(self.kind.display_name(), id));
        }

        Ok(())
    }

    /// Flips the active flag only. No cascading here: dependent-side
    /// effects belong to the lifecycle orchestrator.
    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        set_active_on(&mut conn, self.kind, id, active).await
    }
}

// =============================================================================
// Account Repository
// =============================================================================

/// Repository for payment accounts (adds the `is_system` column).
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    const COLUMNS: &'static str =
        "id, name, normalized_name, is_system, active, created_at, updated_at";

    /// Inserts a new non-system account.
    ///
    /// The single system account comes from the bootstrap migration; this
    /// method always writes `is_system = 0`.
    pub async fn insert(&self, name: &str) -> DbResult<Account> {
        let normalized = normalize(name);
        debug!(name = %name, "Inserting account");

        if self.find_by_normalized_name(&normalized).await?.is_some() {
            return Err(DbError::duplicate("accounts.normalized_name", normalized));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO accounts (name, normalized_name, is_system, active, created_at, updated_at) \
             VALUES (?1, ?2, 0, 1, ?3, ?3)",
        )
        .bind(name)
        .bind(&normalized)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Account {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            normalized_name: normalized,
            is_system: false,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = ?1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn find_active_by_id(&self, id: i64) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = ?1 AND active = 1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn find_by_normalized_name(&self, normalized_name: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE normalized_name = ?1",
            Self::COLUMNS
        ))
        .bind(normalized_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Gets the system default account (seeded at bootstrap).
    pub async fn find_system(&self) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE is_system = 1",
            Self::COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn get_all(&self, opts: ListOptions) -> DbResult<Vec<Account>> {
        let filter = if opts.include_inactive {
            ""
        } else {
            " WHERE active = 1"
        };
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts{} ORDER BY {} {}",
            Self::COLUMNS,
            filter,
            opts.sort_field.column(),
            opts.sort_direction.keyword()
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    pub async fn rename(&self, id: i64, name: &str) -> DbResult<()> {
        let normalized = normalize(name);

        if let Some(existing) = self.find_by_normalized_name(&normalized).await? {
            if existing.id != id {
                return Err(DbError::duplicate("accounts.normalized_name", normalized));
            }
        }

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE accounts SET name = ?2, normalized_name = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(name)
        .bind(&normalized)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }
}

// =============================================================================
// Payment Method Repository
// =============================================================================

/// Repository for payment methods (adds the required `account_id` FK).
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    pool: SqlitePool,
}

impl PaymentMethodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentMethodRepository { pool }
    }

    const COLUMNS: &'static str =
        "id, name, normalized_name, account_id, active, created_at, updated_at";

    /// Inserts a new payment method owned by `account_id`.
    ///
    /// ## Failure
    /// - `DbError::UniqueViolation` on duplicate normalized name
    /// - `DbError::ForeignKeyViolation` when the account doesn't exist
    pub async fn insert(&self, name: &str, account_id: i64) -> DbResult<PaymentMethod> {
        let normalized = normalize(name);
        debug!(name = %name, account_id = %account_id, "Inserting payment method");

        if self.find_by_normalized_name(&normalized).await?.is_some() {
            return Err(DbError::duplicate(
                "payment_methods.normalized_name",
                normalized,
            ));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO payment_methods (name, normalized_name, account_id, active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, 1, ?4, ?4)",
        )
        .bind(name)
        .bind(&normalized)
        .bind(account_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(PaymentMethod {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            normalized_name: normalized,
            account_id,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "SELECT {} FROM payment_methods WHERE id = ?1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    pub async fn find_active_by_id(&self, id: i64) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "SELECT {} FROM payment_methods WHERE id = ?1 AND active = 1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    pub async fn find_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "SELECT {} FROM payment_methods WHERE normalized_name = ?1",
            Self::COLUMNS
        ))
        .bind(normalized_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    pub async fn get_all(&self, opts: ListOptions) -> DbResult<Vec<PaymentMethod>> {
        let filter = if opts.include_inactive {
            ""
        } else {
            " WHERE active = 1"
        };
        let methods = sqlx::query_as::<_, PaymentMethod>(&format!(
            "SELECT {} FROM payment_methods{} ORDER BY {} {}",
            Self::COLUMNS,
            filter,
            opts.sort_field.column(),
            opts.sort_direction.keyword()
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    /// Counts active payment methods owned by an account.
    ///
    /// Feeds the `ACCOUNT_IN_USE` conflict rule.
    pub async fn count_active_by_account(&self, account_id: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count_active_payment_methods_on(&mut conn, account_id).await
    }
}

/// Counts active payment methods for an account, on the caller's connection.
pub async fn count_active_payment_methods_on(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payment_methods WHERE account_id = ?1 AND active = 1",
    )
    .bind(account_id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Cascade-deactivates every active payment method owned by an account.
///
/// Runs inside the caller's transaction alongside the account flag flip:
/// either both commit or neither does. Returns the number of methods
/// deactivated.
pub async fn cascade_deactivate_payment_methods_on(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> DbResult<u64> {
    let now = Utc::now();
    let result = sqlx::query(
        "UPDATE payment_methods SET active = 0, updated_at = ?2 \
         WHERE account_id = ?1 AND active = 1",
    )
    .bind(account_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

// =============================================================================
// Bartable Repository
// =============================================================================

/// Repository for bartables (keyed by floor number instead of name).
#[derive(Debug, Clone)]
pub struct BartableRepository {
    pool: SqlitePool,
}

impl BartableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BartableRepository { pool }
    }

    const COLUMNS: &'static str = "id, number, active, created_at, updated_at";

    /// Inserts a new bartable.
    ///
    /// ## Failure
    /// `DbError::UniqueViolation` when the number is already taken.
    pub async fn insert(&self, number: i64) -> DbResult<Bartable> {
        debug!(number = %number, "Inserting bartable");

        if self.find_by_number(number).await?.is_some() {
            return Err(DbError::duplicate("bartables.number", number.to_string()));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO bartables (number, active, created_at, updated_at) VALUES (?1, 1, ?2, ?2)",
        )
        .bind(number)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Bartable {
            id: result.last_insert_rowid(),
            number,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Bartable>> {
        let table = sqlx::query_as::<_, Bartable>(&format!(
            "SELECT {} FROM bartables WHERE id = ?1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    pub async fn find_active_by_id(&self, id: i64) -> DbResult<Option<Bartable>> {
        let table = sqlx::query_as::<_, Bartable>(&format!(
            "SELECT {} FROM bartables WHERE id = ?1 AND active = 1",
            Self::COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    pub async fn find_by_number(&self, number: i64) -> DbResult<Option<Bartable>> {
        let table = sqlx::query_as::<_, Bartable>(&format!(
            "SELECT {} FROM bartables WHERE number = ?1",
            Self::COLUMNS
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    pub async fn get_all(&self, include_inactive: bool) -> DbResult<Vec<Bartable>> {
        let filter = if include_inactive {
            ""
        } else {
            " WHERE active = 1"
        };
        let tables = sqlx::query_as::<_, Bartable>(&format!(
            "SELECT {} FROM bartables{} ORDER BY number ASC",
            Self::COLUMNS,
            filter
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }
}

// =============================================================================
// Uniform Lifecycle Helpers
// =============================================================================

/// Reads the active flag of any catalog kind's row, on the caller's
/// connection. `None` when the id doesn't exist.
pub async fn find_active_flag_on(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: i64,
) -> DbResult<Option<bool>> {
    let active: Option<bool> = sqlx::query_scalar(&format!(
        "SELECT active FROM {} WHERE id = ?1",
        table_for(kind)
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(active)
}

/// Flips the active flag of any catalog kind's row, on the caller's
/// connection. `DbError::NotFound` when the id doesn't exist.
pub async fn set_active_on(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: i64,
    active: bool,
) -> DbResult<()> {
    debug!(kind = %kind, id = %id, active = %active, "Flipping active flag");

    let now = Utc::now();
    let result = sqlx::query(&format!(
        "UPDATE {} SET active = ?2, updated_at = ?3 WHERE id = ?1",
        table_for(kind)
    ))
    .bind(id)
    .bind(active)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(kind.display_name(), id));
    }

    Ok(())
}

/// Reads the `is_system` flag of an account (0 when absent).
///
/// Feeds the `SYSTEM_ACCOUNT` blocking rule.
pub async fn account_is_system_on(conn: &mut SqliteConnection, id: i64) -> DbResult<bool> {
    let is_system: Option<bool> =
        sqlx::query_scalar("SELECT is_system FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

    Ok(is_system.unwrap_or(false))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = test_db().await;
        let brands = db.brands();

        let brand = brands.insert("Stella").await.unwrap();
        assert!(brand.active);
        assert_eq!(brand.normalized_name, "stella");

        let found = brands.find_by_id(brand.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Stella");

        let by_name = brands
            .find_by_normalized_name("stella")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, brand.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_before_write() {
        let db = test_db().await;
        let brands = db.brands();

        brands.insert("Mahou").await.unwrap();
        // Accent/case variants normalize to the same key
        let err = brands.insert("  MAHÓU ").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let all = brands.get_all(ListOptions::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_rename_checks_other_rows_only() {
        let db = test_db().await;
        let categories = db.categories();

        let beer = categories.insert("Beer").await.unwrap();
        categories.insert("Wine").await.unwrap();

        // Renaming onto your own name is fine
        categories.rename(beer.id, "BEER").await.unwrap();
        // Renaming onto another row's name is not
        let err = categories.rename(beer.id, "wine").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_set_active_and_filtered_lookup() {
        let db = test_db().await;
        let providers = db.providers();

        let p = providers.insert("Distribuciones Sur").await.unwrap();
        providers.set_active(p.id, false).await.unwrap();

        assert!(providers.find_by_id(p.id).await.unwrap().is_some());
        assert!(providers.find_active_by_id(p.id).await.unwrap().is_none());

        let visible = providers.get_all(ListOptions::default()).await.unwrap();
        assert!(visible.is_empty());
        let all = providers
            .get_all(ListOptions {
                include_inactive: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_set_active_missing_id_is_not_found() {
        let db = test_db().await;
        let err = db.employees().set_active(999, false).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_payment_method_belongs_to_account() {
        let db = test_db().await;
        let account = db.accounts().insert("Banco").await.unwrap();
        let methods = db.payment_methods();

        methods.insert("Tarjeta", account.id).await.unwrap();
        methods.insert("Bizum", account.id).await.unwrap();

        assert_eq!(
            methods.count_active_by_account(account.id).await.unwrap(),
            2
        );

        // FK is enforced
        let err = methods.insert("Vales", 9999).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_bartable_number_unique() {
        let db = test_db().await;
        let bartables = db.bartables();

        bartables.insert(5).await.unwrap();
        let err = bartables.insert(5).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let found = bartables.find_by_number(5).await.unwrap().unwrap();
        assert!(found.active);
    }

    #[tokio::test]
    async fn test_uniform_flag_helpers_cover_all_kinds() {
        let db = test_db().await;
        let brand = db.brands().insert("Alhambra").await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(
            find_active_flag_on(&mut conn, EntityKind::Brand, brand.id)
                .await
                .unwrap(),
            Some(true)
        );
        set_active_on(&mut conn, EntityKind::Brand, brand.id, false)
            .await
            .unwrap();
        assert_eq!(
            find_active_flag_on(&mut conn, EntityKind::Brand, brand.id)
                .await
                .unwrap(),
            Some(false)
        );
        assert_eq!(
            find_active_flag_on(&mut conn, EntityKind::Brand, 12345)
                .await
                .unwrap(),
            None
        );
    }
}
