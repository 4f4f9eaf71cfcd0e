use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    errors::AppError,
    structs::{Admin, ButtonNumber, Item, ItemDraft, Tenant, TenantDraft},
    utils::hash_password,
};

const TENANT_COLUMNS: &str = "id, name, slug, description, created_at";
const ITEM_COLUMNS: &str = "id, tenant_id, name, amount, last_button_clicked, created_at";

/// Opens the connection pool. Foreign keys are enforced on every connection so
/// deleting a tenant cascades to its items.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, AppError> {
    let in_memory = database_url.contains(":memory:");
    let mut opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .read_only(false)
        .busy_timeout(Duration::from_secs(5));
    let mut pool_opts = SqlitePoolOptions::new();
    if in_memory {
        // a memory database lives and dies with its single connection
        pool_opts = pool_opts
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        opts = opts.journal_mode(SqliteJournalMode::Wal);
    }
    Ok(pool_opts.connect_with(opts).await?)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!().run(pool).await?;
    log::info!("Database migrated successfully");
    Ok(())
}

pub async fn ping(pool: &SqlitePool) -> Result<(), AppError> {
    let mut conn = pool.acquire().await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}

/// Creates the initial admin when the table is empty. Returns whether an admin
/// was created.
pub async fn seed_admin(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<bool, AppError> {
    let mut conn = pool.acquire().await?;
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(&mut *conn)
        .await?;
    if existing > 0 {
        return Ok(false);
    }

    let pwd_hash = hash_password(password)?;
    sqlx::query("INSERT INTO admins (username, password_hash, created_at) VALUES ($1, $2, $3)")
        .bind(username)
        .bind(pwd_hash)
        .bind(chrono::Utc::now())
        .execute(&mut *conn)
        .await?;
    log::warn!(
        "Seeded default admin '{}'; change its password for production use",
        username
    );
    Ok(true)
}

pub async fn find_admin_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<Admin>, AppError> {
    let mut conn = pool.acquire().await?;
    let admin = sqlx::query_as::<_, Admin>(
        "SELECT id, username, password_hash, created_at FROM admins WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(admin)
}

pub async fn list_tenants(pool: &SqlitePool) -> Result<Vec<Tenant>, AppError> {
    let mut conn = pool.acquire().await?;
    let tenants = sqlx::query_as::<_, Tenant>(&format!(
        "SELECT {TENANT_COLUMNS} FROM tenants ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(&mut *conn)
    .await?;
    Ok(tenants)
}

/// Looks a tenant up by its exact slug.
pub async fn resolve_tenant(pool: &SqlitePool, slug: &str) -> Result<Tenant, AppError> {
    let mut conn = pool.acquire().await?;
    let tenant = sqlx::query_as::<_, Tenant>(&format!(
        "SELECT {TENANT_COLUMNS} FROM tenants WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(&mut *conn)
    .await?;
    tenant.ok_or(AppError::TenantNotFound)
}

pub async fn create_tenant(pool: &SqlitePool, draft: &TenantDraft) -> Result<Tenant, AppError> {
    let mut conn = pool.acquire().await?;
    let tenant = sqlx::query_as::<_, Tenant>(&format!(
        "INSERT INTO tenants (name, slug, description, created_at) VALUES ($1, $2, $3, $4) RETURNING {TENANT_COLUMNS}"
    ))
    .bind(&draft.name)
    .bind(&draft.slug)
    .bind(&draft.description)
    .bind(chrono::Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::DuplicateTenant(draft.slug.clone())
        }
        e => AppError::DatabaseError(e),
    })?;
    log::info!("Tenant created: {} ({})", tenant.slug, tenant.id);
    Ok(tenant)
}

/// Deletes a tenant and, through the foreign key cascade, all of its items.
/// Returns the number of tenants removed, which is zero for an unknown id.
pub async fn delete_tenant(pool: &SqlitePool, id: i64) -> Result<u64, AppError> {
    let mut conn = pool.acquire().await?;
    let removed = sqlx::query("DELETE FROM tenants WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    log::info!("Tenant with id {} deleted ({} rows)", id, removed);
    Ok(removed)
}

pub async fn list_items(pool: &SqlitePool, tenant_id: i64) -> Result<Vec<Item>, AppError> {
    let mut conn = pool.acquire().await?;
    let items = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE tenant_id = $1 ORDER BY id DESC"
    ))
    .bind(tenant_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

/// Inserts an item with its marker already set to button 1.
pub async fn add_item(
    pool: &SqlitePool,
    tenant_id: i64,
    draft: &ItemDraft,
) -> Result<Item, AppError> {
    let mut conn = pool.acquire().await?;
    let item = sqlx::query_as::<_, Item>(&format!(
        "INSERT INTO items (tenant_id, name, amount, last_button_clicked, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING {ITEM_COLUMNS}"
    ))
    .bind(tenant_id)
    .bind(&draft.name)
    .bind(draft.amount)
    .bind(ButtonNumber::One.get())
    .bind(chrono::Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        // the tenant was deleted after it was resolved
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::TenantNotFound
        }
        e => AppError::DatabaseError(e),
    })?;
    log::info!("Item {} added for tenant {}", item.id, tenant_id);
    Ok(item)
}

pub async fn delete_item(
    pool: &SqlitePool,
    tenant_id: i64,
    item_id: i64,
) -> Result<(), AppError> {
    let mut conn = pool.acquire().await?;
    let removed = sqlx::query("DELETE FROM items WHERE id = $1 AND tenant_id = $2")
        .bind(item_id)
        .bind(tenant_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(AppError::ItemNotFound);
    }
    log::info!("Item {} deleted for tenant {}", item_id, tenant_id);
    Ok(())
}

/// Records which read-back button was last used for an item and returns the
/// stored value.
pub async fn set_last_button_clicked(
    pool: &SqlitePool,
    tenant_id: i64,
    item_id: i64,
    button: ButtonNumber,
) -> Result<i64, AppError> {
    let mut conn = pool.acquire().await?;
    let stored = sqlx::query_scalar::<_, i64>(
        "UPDATE items SET last_button_clicked = $1 WHERE id = $2 AND tenant_id = $3 RETURNING last_button_clicked",
    )
    .bind(button.get())
    .bind(item_id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;
    stored.ok_or(AppError::ItemNotFound)
}
