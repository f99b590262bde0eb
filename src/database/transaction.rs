use super::pool::Database;
use crate::error::RepositoryError;
use crate::models::{Donor, DonorDetails, Group, NewDonor};
use crate::repositories::{donor_repository, group_repository};
use crate::stores::{StoreResult, StoreTransaction, TransactionalStore};
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL unit of work.
///
/// Dropping it before `commit` rolls the transaction back.
pub struct PgStoreTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgStoreTransaction {
    fn conn(&mut self) -> StoreResult<&mut Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| RepositoryError::InvalidInput("transaction already committed".to_string()))
    }
}

#[async_trait]
impl TransactionalStore for Database {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool().begin().await?;
        debug!("Opened donor store transaction");
        Ok(Box::new(PgStoreTransaction { tx: Some(tx) }))
    }
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn count_groups(&mut self) -> StoreResult<i64> {
        Ok(group_repository::count_all(self.conn()?).await?)
    }

    async fn find_group_by_id(&mut self, id: Uuid) -> StoreResult<Option<Group>> {
        Ok(group_repository::find_by_id(self.conn()?, id).await?)
    }

    async fn find_group_by_name(&mut self, name: &str) -> StoreResult<Option<Group>> {
        Ok(group_repository::find_by_name(self.conn()?, name).await?)
    }

    async fn bootstrap_default_groups(&mut self, owner: Uuid) -> StoreResult<Vec<Group>> {
        Ok(group_repository::bootstrap_defaults(self.conn()?, owner).await?)
    }

    async fn find_donor_by_hundi_no(&mut self, hundi_no: &str) -> StoreResult<Option<Donor>> {
        Ok(donor_repository::find_by_hundi_no(self.conn()?, hundi_no).await?)
    }

    async fn insert_donor(&mut self, donor: &NewDonor) -> StoreResult<DonorDetails> {
        let conn = self.conn()?;
        let id = donor_repository::insert(&mut *conn, donor).await?;
        donor_repository::find_details_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("inserted donor {} not visible", id)))
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| RepositoryError::InvalidInput("transaction already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}
