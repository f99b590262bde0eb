use crate::models::{Group, DEFAULT_GROUP_DESCRIPTION, DEFAULT_GROUP_NAMES};
use crate::stores::{GroupStore, StoreResult};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Result as SqlxResult};
use tracing::info;
use uuid::Uuid;

/// Advisory lock key serialising default-group bootstrap across sessions
const BOOTSTRAP_LOCK_KEY: i64 = 0x6855_4e44_4752_5031;

const GROUP_COLUMNS: &str = "id, name, area, description, created_by, created_at";

pub(crate) async fn count_all(conn: &mut PgConnection) -> SqlxResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM donor_groups")
        .fetch_one(conn)
        .await
}

pub(crate) async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> SqlxResult<Option<Group>> {
    let sql = format!("SELECT {GROUP_COLUMNS} FROM donor_groups WHERE id = $1");
    sqlx::query_as::<_, Group>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub(crate) async fn find_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> SqlxResult<Option<Group>> {
    let sql = format!("SELECT {GROUP_COLUMNS} FROM donor_groups WHERE name = $1");
    sqlx::query_as::<_, Group>(&sql)
        .bind(name)
        .fetch_optional(conn)
        .await
}

/// Create the default groups that do not exist yet.
///
/// Must run inside a transaction: the advisory lock is released at commit
/// or rollback, and the unique name constraint makes reruns no-ops.
pub(crate) async fn bootstrap_defaults(
    conn: &mut PgConnection,
    owner: Uuid,
) -> SqlxResult<Vec<Group>> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(BOOTSTRAP_LOCK_KEY)
        .execute(&mut *conn)
        .await?;

    let mut created = 0u64;
    for name in DEFAULT_GROUP_NAMES {
        created += sqlx::query(
            r#"
            INSERT INTO donor_groups (name, description, created_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(DEFAULT_GROUP_DESCRIPTION)
        .bind(owner)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }
    if created > 0 {
        info!("Created {} default group(s) owned by {}", created, owner);
    }

    let names: Vec<String> = DEFAULT_GROUP_NAMES.iter().map(|n| n.to_string()).collect();
    let sql = format!("SELECT {GROUP_COLUMNS} FROM donor_groups WHERE name = ANY($1) ORDER BY name");
    sqlx::query_as::<_, Group>(&sql)
        .bind(names)
        .fetch_all(&mut *conn)
        .await
}

/// Repository for collection group data access
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new GroupRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new group
    pub async fn create(
        &self,
        name: &str,
        area: Option<&str>,
        description: Option<&str>,
        created_by: Uuid,
    ) -> SqlxResult<Group> {
        let sql = format!(
            r#"
            INSERT INTO donor_groups (name, area, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {GROUP_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Group>(&sql)
            .bind(name)
            .bind(area)
            .bind(description)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await
    }
}

#[async_trait]
impl GroupStore for GroupRepository {
    async fn count_all(&self) -> StoreResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Ok(count_all(&mut conn).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_by_id(&mut conn, id).await?)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Group>> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_by_name(&mut conn, name).await?)
    }

    async fn bootstrap_defaults(&self, owner: Uuid) -> StoreResult<Vec<Group>> {
        let mut tx = self.pool.begin().await?;
        let groups = bootstrap_defaults(&mut tx, owner).await?;
        tx.commit().await?;
        Ok(groups)
    }
}
