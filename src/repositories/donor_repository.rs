use crate::error::RepositoryError;
use crate::models::{
    Donor, DonorDetails, DonorStatus, GroupSummary, NewDonor, StatusHistoryEntry, UserSummary,
};
use crate::stores::{DonorChanges, DonorFilter, DonorStore, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

const DONOR_COLUMNS: &str = r#"
    d.id, d.hundi_no, d.name, d.mobile_number, d.address, d.google_map_link,
    d.collection_date, d.group_id, d.created_by, d.status, d.status_history,
    d.created_at, d.updated_at
"#;

const SUMMARY_COLUMNS: &str = r#"
    g.name AS group_name, g.area AS group_area,
    u.name AS creator_name, u.email AS creator_email
"#;

const SUMMARY_JOINS: &str = r#"
    JOIN donor_groups g ON g.id = d.group_id
    LEFT JOIN users u ON u.id = d.created_by
"#;

/// Donor row joined with group and creator columns
#[derive(Debug, FromRow)]
struct DonorDetailsRow {
    id: Uuid,
    hundi_no: String,
    name: String,
    mobile_number: Option<String>,
    address: Option<String>,
    google_map_link: Option<String>,
    collection_date: NaiveDateTime,
    group_id: Uuid,
    created_by: Uuid,
    status: DonorStatus,
    status_history: Json<Vec<StatusHistoryEntry>>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    group_name: String,
    group_area: Option<String>,
    creator_name: Option<String>,
    creator_email: Option<String>,
}

impl DonorDetailsRow {
    fn into_details(self) -> DonorDetails {
        let creator = match (self.creator_name, self.creator_email) {
            (Some(name), Some(email)) => Some(UserSummary {
                id: self.created_by,
                name,
                email,
            }),
            _ => None,
        };
        DonorDetails {
            group: GroupSummary {
                id: self.group_id,
                name: self.group_name,
                area: self.group_area,
            },
            creator,
            donor: Donor {
                id: self.id,
                hundi_no: self.hundi_no,
                name: self.name,
                mobile_number: self.mobile_number,
                address: self.address,
                google_map_link: self.google_map_link,
                collection_date: self.collection_date,
                group_id: self.group_id,
                created_by: self.created_by,
                status: self.status,
                status_history: self.status_history,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        }
    }
}

/// Escape LIKE wildcards so the search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &DonorFilter) {
    builder.push(" WHERE TRUE");
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (d.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR d.hundi_no ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR d.mobile_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = filter.from {
        builder.push(" AND d.collection_date >= ").push_bind(from);
    }
    if let Some(until) = filter.until {
        builder.push(" AND d.collection_date < ").push_bind(until);
    }
    if let Some(group_id) = filter.group_id {
        builder.push(" AND d.group_id = ").push_bind(group_id);
    }
}

pub(crate) async fn find_details_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> SqlxResult<Option<DonorDetails>> {
    let sql = format!(
        "SELECT {DONOR_COLUMNS}, {SUMMARY_COLUMNS} FROM donors d {SUMMARY_JOINS} WHERE d.id = $1"
    );
    let row = sqlx::query_as::<_, DonorDetailsRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(DonorDetailsRow::into_details))
}

pub(crate) async fn find_by_hundi_no(
    conn: &mut PgConnection,
    hundi_no: &str,
) -> SqlxResult<Option<Donor>> {
    let sql = format!("SELECT {DONOR_COLUMNS} FROM donors d WHERE d.hundi_no = $1");
    sqlx::query_as::<_, Donor>(&sql)
        .bind(hundi_no)
        .fetch_optional(conn)
        .await
}

pub(crate) async fn insert(conn: &mut PgConnection, donor: &NewDonor) -> SqlxResult<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO donors (
            hundi_no, name, mobile_number, address, google_map_link,
            collection_date, group_id, created_by, status, status_history,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
        RETURNING id
        "#,
    )
    .bind(&donor.hundi_no)
    .bind(&donor.name)
    .bind(&donor.mobile_number)
    .bind(&donor.address)
    .bind(&donor.google_map_link)
    .bind(donor.collection_date)
    .bind(donor.group_id)
    .bind(donor.created_by)
    .bind(DonorStatus::Pending)
    .bind(Json(&donor.status_history))
    .bind(donor.created_at)
    .fetch_one(conn)
    .await
}

type SqlxResult<T> = Result<T, sqlx::Error>;

/// Repository for donor data access
pub struct DonorRepository {
    pool: PgPool,
}

impl DonorRepository {
    /// Create a new DonorRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonorStore for DonorRepository {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<DonorDetails>> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_details_by_id(&mut conn, id).await?)
    }

    async fn find_by_hundi_no(&self, hundi_no: &str) -> StoreResult<Option<Donor>> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_by_hundi_no(&mut conn, hundi_no).await?)
    }

    async fn find(
        &self,
        filter: &DonorFilter,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<DonorDetails>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {DONOR_COLUMNS}, {SUMMARY_COLUMNS} FROM donors d {SUMMARY_JOINS}"
        ));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY d.collection_date DESC, d.created_at DESC, d.id ASC")
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(skip);

        debug!("Listing donors: filter={:?}, skip={}, limit={}", filter, skip, limit);

        let rows = builder
            .build_query_as::<DonorDetailsRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(DonorDetailsRow::into_details).collect())
    }

    async fn count(&self, filter: &DonorFilter) -> StoreResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM donors d");
        push_filter(&mut builder, filter);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &DonorChanges,
        updated_at: NaiveDateTime,
    ) -> StoreResult<Option<DonorDetails>> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE donors
            SET hundi_no = COALESCE($2, hundi_no),
                name = COALESCE($3, name),
                mobile_number = CASE WHEN $4 THEN $5 ELSE mobile_number END,
                address = CASE WHEN $6 THEN $7 ELSE address END,
                google_map_link = CASE WHEN $8 THEN $9 ELSE google_map_link END,
                collection_date = COALESCE($10, collection_date),
                group_id = COALESCE($11, group_id),
                updated_at = $12
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&changes.hundi_no)
        .bind(&changes.name)
        .bind(changes.mobile_number.is_some())
        .bind(changes.mobile_number.clone().flatten())
        .bind(changes.address.is_some())
        .bind(changes.address.clone().flatten())
        .bind(changes.google_map_link.is_some())
        .bind(changes.google_map_link.clone().flatten())
        .bind(changes.collection_date)
        .bind(changes.group_id)
        .bind(updated_at)
        .fetch_optional(&mut *tx)
        .await?;

        let details = match updated {
            Some(id) => find_details_by_id(&mut tx, id).await?,
            None => None,
        };
        tx.commit().await?;
        Ok(details)
    }

    async fn append_status(
        &self,
        id: Uuid,
        expected: DonorStatus,
        entry: &StatusHistoryEntry,
        collection_date: NaiveDateTime,
    ) -> StoreResult<Option<DonorDetails>> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE donors
            SET status = $3,
                status_history = status_history || jsonb_build_array($4::jsonb),
                collection_date = $5,
                updated_at = $6
            WHERE id = $1 AND status = $2
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(entry.status)
        .bind(Json(entry))
        .bind(collection_date)
        .bind(entry.date)
        .fetch_optional(&mut *tx)
        .await?;

        let details = match updated {
            Some(id) => find_details_by_id(&mut tx, id).await?,
            None => None,
        };
        tx.commit().await?;
        Ok(details)
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM donors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
