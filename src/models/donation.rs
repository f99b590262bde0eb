use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Donation collected from a donor's hundi
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub collection_date: NaiveDateTime,
    pub amount: Decimal, // NUMERIC(12, 2) in database
    pub created_at: NaiveDateTime,
}

impl Donation {
    /// Create a new Donation
    pub fn new(donor_id: Uuid, collection_date: NaiveDateTime, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            donor_id,
            collection_date,
            amount,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
