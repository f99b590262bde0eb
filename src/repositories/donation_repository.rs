use crate::models::Donation;
use crate::stores::{DonationStore, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for donation data access
pub struct DonationRepository {
    pool: PgPool,
}

impl DonationRepository {
    /// Create a new DonationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a donation collected from a donor
    pub async fn create(
        &self,
        donor_id: Uuid,
        collection_date: NaiveDateTime,
        amount: Decimal,
    ) -> SqlxResult<Donation> {
        sqlx::query_as::<_, Donation>(
            r#"
            INSERT INTO donations (donor_id, collection_date, amount)
            VALUES ($1, $2, $3)
            RETURNING id, donor_id, collection_date, amount, created_at
            "#,
        )
        .bind(donor_id)
        .bind(collection_date)
        .bind(amount)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl DonationStore for DonationRepository {
    async fn count_for_donor_in_range(
        &self,
        donor_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM donations
            WHERE donor_id = $1 AND collection_date >= $2 AND collection_date < $3
            "#,
        )
        .bind(donor_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_for_donor(&self, donor_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM donations WHERE donor_id = $1",
        )
        .bind(donor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
