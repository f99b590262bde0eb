//! Store ports consumed by the donor service.
//!
//! Production: the PostgreSQL repositories in `crate::repositories` and
//! `crate::database::Database` for transactions.
//! Testing: `MemoryStore`.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::RepositoryError;
use crate::models::{Donor, DonorDetails, DonorStatus, Group, NewDonor, StatusHistoryEntry};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

/// Result type for store operations
pub type StoreResult<T> = Result<T, RepositoryError>;

/// Resolved listing filter.
///
/// `until` is exclusive; callers turn an inclusive end date into the
/// start of the following day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorFilter {
    pub search: Option<String>,
    pub from: Option<NaiveDateTime>,
    pub until: Option<NaiveDateTime>,
    pub group_id: Option<Uuid>,
}

impl DonorFilter {
    /// Evaluate the filter against a record held in memory
    pub fn matches(&self, donor: &Donor) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = donor.name.to_lowercase().contains(&needle)
                || donor.hundi_no.to_lowercase().contains(&needle)
                || donor
                    .mobile_number
                    .as_deref()
                    .is_some_and(|m| m.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.from.is_some_and(|from| donor.collection_date < from) {
            return false;
        }
        if self.until.is_some_and(|until| donor.collection_date >= until) {
            return false;
        }
        if self.group_id.is_some_and(|group_id| donor.group_id != group_id) {
            return false;
        }
        true
    }
}

/// Validated partial update of descriptive donor fields.
///
/// `None` leaves a field alone; for the optional fields `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorChanges {
    pub hundi_no: Option<String>,
    pub name: Option<String>,
    pub mobile_number: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub google_map_link: Option<Option<String>>,
    pub collection_date: Option<NaiveDateTime>,
    pub group_id: Option<Uuid>,
}

impl DonorChanges {
    /// Apply the changes to an in-memory record
    pub fn apply_to(&self, donor: &mut Donor, updated_at: NaiveDateTime) {
        if let Some(hundi_no) = &self.hundi_no {
            donor.hundi_no = hundi_no.clone();
        }
        if let Some(name) = &self.name {
            donor.name = name.clone();
        }
        if let Some(mobile_number) = &self.mobile_number {
            donor.mobile_number = mobile_number.clone();
        }
        if let Some(address) = &self.address {
            donor.address = address.clone();
        }
        if let Some(link) = &self.google_map_link {
            donor.google_map_link = link.clone();
        }
        if let Some(collection_date) = self.collection_date {
            donor.collection_date = collection_date;
        }
        if let Some(group_id) = self.group_id {
            donor.group_id = group_id;
        }
        donor.updated_at = updated_at;
    }
}

/// Donor persistence.
///
/// Listing order is fixed: `collection_date` descending, then `created_at`
/// descending, then id.
#[async_trait]
pub trait DonorStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<DonorDetails>>;

    async fn find_by_hundi_no(&self, hundi_no: &str) -> StoreResult<Option<Donor>>;

    async fn find(
        &self,
        filter: &DonorFilter,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<DonorDetails>>;

    async fn count(&self, filter: &DonorFilter) -> StoreResult<i64>;

    /// Returns `None` when the donor does not exist.
    async fn update(
        &self,
        id: Uuid,
        changes: &DonorChanges,
        updated_at: NaiveDateTime,
    ) -> StoreResult<Option<DonorDetails>>;

    /// Set the status to `entry.status`, append `entry` to the history and
    /// move the collection date, only if the stored status still equals
    /// `expected`. Returns `None` when nothing matched.
    async fn append_status(
        &self,
        id: Uuid,
        expected: DonorStatus,
        entry: &StatusHistoryEntry,
        collection_date: NaiveDateTime,
    ) -> StoreResult<Option<DonorDetails>>;

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool>;
}

/// Group persistence
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn count_all(&self) -> StoreResult<i64>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>>;

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Group>>;

    /// Idempotently create the default group set and return it.
    async fn bootstrap_defaults(&self, owner: Uuid) -> StoreResult<Vec<Group>>;
}

/// Donation lookups used for referential checks
#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Count donations with `start <= collection_date < end`
    async fn count_for_donor_in_range(
        &self,
        donor_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<i64>;

    async fn count_for_donor(&self, donor_id: Uuid) -> StoreResult<i64>;
}

/// Opens an atomic unit of work spanning donors and groups
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// Operations available inside a unit of work.
///
/// Dropping a transaction without calling `commit` discards every write
/// made through it.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn count_groups(&mut self) -> StoreResult<i64>;

    async fn find_group_by_id(&mut self, id: Uuid) -> StoreResult<Option<Group>>;

    async fn find_group_by_name(&mut self, name: &str) -> StoreResult<Option<Group>>;

    async fn bootstrap_default_groups(&mut self, owner: Uuid) -> StoreResult<Vec<Group>>;

    async fn find_donor_by_hundi_no(&mut self, hundi_no: &str) -> StoreResult<Option<Donor>>;

    async fn insert_donor(&mut self, donor: &NewDonor) -> StoreResult<DonorDetails>;

    async fn commit(&mut self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DONOR_CREATED_NOTE;
    use chrono::NaiveDate;

    fn donor(name: &str, hundi_no: &str, mobile: Option<&str>, day: u32) -> Donor {
        let date = NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        NewDonor {
            hundi_no: hundi_no.to_string(),
            name: name.to_string(),
            mobile_number: mobile.map(str::to_string),
            address: None,
            google_map_link: None,
            collection_date: date,
            group_id: Uuid::nil(),
            created_by: Uuid::nil(),
            status_history: vec![StatusHistoryEntry::new(
                DonorStatus::Pending,
                date,
                DONOR_CREATED_NOTE,
            )],
            created_at: date,
        }
        .into_donor(Uuid::new_v4())
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let d = donor("Lakshmi Narayan", "HN-042", Some("9845012345"), 10);
        let filter = |s: &str| DonorFilter {
            search: Some(s.to_string()),
            ..Default::default()
        };
        assert!(filter("lakshmi").matches(&d));
        assert!(filter("hn-04").matches(&d));
        assert!(filter("50123").matches(&d));
        assert!(!filter("gopal").matches(&d));
    }

    #[test]
    fn test_date_bounds_are_half_open() {
        let d = donor("A", "H1", None, 10);
        let at = |day: u32| {
            NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let filter = DonorFilter {
            from: Some(at(10)),
            until: Some(at(11)),
            ..Default::default()
        };
        assert!(filter.matches(&d));

        let filter = DonorFilter {
            until: Some(at(10)),
            ..Default::default()
        };
        assert!(!filter.matches(&d));
    }

    #[test]
    fn test_group_filter_is_exact() {
        let d = donor("A", "H1", None, 10);
        let filter = DonorFilter {
            group_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(!filter.matches(&d));
        let filter = DonorFilter {
            group_id: Some(Uuid::nil()),
            ..Default::default()
        };
        assert!(filter.matches(&d));
    }
}
