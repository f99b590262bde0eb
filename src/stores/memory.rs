//! In-process store adapter.
//!
//! Implements every store port over a single mutex-guarded state. A
//! transaction holds the lock for its whole lifetime and works on a copy of
//! the state, which replaces the shared state only on `commit`.

use super::{
    DonationStore, DonorChanges, DonorFilter, DonorStore, GroupStore, StoreResult,
    StoreTransaction, TransactionalStore,
};
use crate::error::RepositoryError;
use crate::models::{
    Donation, Donor, DonorDetails, DonorStatus, Group, NewDonor, StatusHistoryEntry, User,
    DEFAULT_GROUP_NAMES,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<User>,
    groups: Vec<Group>,
    donors: Vec<Donor>,
    donations: Vec<Donation>,
}

impl MemoryState {
    fn details(&self, donor: &Donor) -> StoreResult<DonorDetails> {
        let group = self
            .groups
            .iter()
            .find(|g| g.id == donor.group_id)
            .ok_or_else(|| {
                RepositoryError::Backend(format!(
                    "donor {} references missing group {}",
                    donor.id, donor.group_id
                ))
            })?;
        let creator = self.users.iter().find(|u| u.id == donor.created_by);
        Ok(DonorDetails {
            donor: donor.clone(),
            group: group.summary(),
            creator: creator.map(User::summary),
        })
    }

    fn group_by_id(&self, id: Uuid) -> Option<Group> {
        self.groups.iter().find(|g| g.id == id).cloned()
    }

    fn group_by_name(&self, name: &str) -> Option<Group> {
        self.groups.iter().find(|g| g.name == name).cloned()
    }

    fn donor_by_hundi_no(&self, hundi_no: &str) -> Option<Donor> {
        self.donors.iter().find(|d| d.hundi_no == hundi_no).cloned()
    }

    fn bootstrap_defaults(&mut self, owner: Uuid) -> Vec<Group> {
        DEFAULT_GROUP_NAMES
            .iter()
            .map(|name| match self.group_by_name(name) {
                Some(existing) => existing,
                None => {
                    let group = Group::default_named(name, owner);
                    self.groups.push(group.clone());
                    group
                }
            })
            .collect()
    }

    fn insert_donor(&mut self, new_donor: &NewDonor) -> StoreResult<DonorDetails> {
        // Mirrors the unique index on donors.hundi_no
        if self.donor_by_hundi_no(&new_donor.hundi_no).is_some() {
            return Err(RepositoryError::Duplicate(format!(
                "hundi_no {} already exists",
                new_donor.hundi_no
            )));
        }
        if self.group_by_id(new_donor.group_id).is_none() {
            return Err(RepositoryError::ConstraintViolation(format!(
                "group {} does not exist",
                new_donor.group_id
            )));
        }
        let donor = new_donor.clone().into_donor(Uuid::new_v4());
        let details = self.details(&donor)?;
        self.donors.push(donor);
        Ok(details)
    }
}

#[derive(Debug, Default)]
struct Faults {
    bootstrap: AtomicBool,
    donor_insert: AtomicBool,
}

/// In-memory implementation of all store ports
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every default-group bootstrap fail until reset
    pub fn fail_bootstrap(&self, fail: bool) {
        self.faults.bootstrap.store(fail, Ordering::SeqCst);
    }

    /// Make every donor insert fail until reset
    pub fn fail_donor_insert(&self, fail: bool) {
        self.faults.donor_insert.store(fail, Ordering::SeqCst);
    }

    /// Register a user so creator summaries can be resolved
    pub async fn insert_user(&self, name: &str, email: &str) -> User {
        let user = User::new(name.to_string(), email.to_string());
        self.state.lock().await.users.push(user.clone());
        user
    }

    /// Insert a group outside the default bootstrap
    pub async fn insert_group(&self, name: &str, area: Option<&str>, owner: Uuid) -> StoreResult<Group> {
        let mut state = self.state.lock().await;
        if state.group_by_name(name).is_some() {
            return Err(RepositoryError::Duplicate(format!("group {} already exists", name)));
        }
        let group = Group::new(name.to_string(), area.map(str::to_string), None, owner);
        state.groups.push(group.clone());
        Ok(group)
    }

    /// Record a donation against an existing donor
    pub async fn record_donation(
        &self,
        donor_id: Uuid,
        collection_date: NaiveDateTime,
        amount: Decimal,
    ) -> StoreResult<Donation> {
        let mut state = self.state.lock().await;
        if !state.donors.iter().any(|d| d.id == donor_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "donor {} does not exist",
                donor_id
            )));
        }
        let donation = Donation::new(donor_id, collection_date, amount);
        state.donations.push(donation.clone());
        Ok(donation)
    }

    /// Every group, ordered by name
    pub async fn groups(&self) -> Vec<Group> {
        let mut groups = self.state.lock().await.groups.clone();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    /// Number of donors currently stored
    pub async fn donor_count(&self) -> usize {
        self.state.lock().await.donors.len()
    }
}

#[async_trait]
impl DonorStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<DonorDetails>> {
        let state = self.state.lock().await;
        state
            .donors
            .iter()
            .find(|d| d.id == id)
            .map(|d| state.details(d))
            .transpose()
    }

    async fn find_by_hundi_no(&self, hundi_no: &str) -> StoreResult<Option<Donor>> {
        Ok(self.state.lock().await.donor_by_hundi_no(hundi_no))
    }

    async fn find(
        &self,
        filter: &DonorFilter,
        skip: i64,
        limit: i64,
    ) -> StoreResult<Vec<DonorDetails>> {
        let state = self.state.lock().await;
        let mut matching: Vec<&Donor> = state.donors.iter().filter(|d| filter.matches(d)).collect();
        matching.sort_by(|a, b| {
            b.collection_date
                .cmp(&a.collection_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        matching
            .into_iter()
            .skip(usize::try_from(skip.max(0)).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|d| state.details(d))
            .collect()
    }

    async fn count(&self, filter: &DonorFilter) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state.donors.iter().filter(|d| filter.matches(d)).count() as i64)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &DonorChanges,
        updated_at: NaiveDateTime,
    ) -> StoreResult<Option<DonorDetails>> {
        let mut state = self.state.lock().await;
        if let Some(hundi_no) = &changes.hundi_no {
            if state.donors.iter().any(|d| d.id != id && &d.hundi_no == hundi_no) {
                return Err(RepositoryError::Duplicate(format!(
                    "hundi_no {} already exists",
                    hundi_no
                )));
            }
        }
        if let Some(group_id) = changes.group_id {
            if state.group_by_id(group_id).is_none() {
                return Err(RepositoryError::ConstraintViolation(format!(
                    "group {} does not exist",
                    group_id
                )));
            }
        }
        let Some(donor) = state.donors.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        changes.apply_to(donor, updated_at);
        let donor = donor.clone();
        state.details(&donor).map(Some)
    }

    async fn append_status(
        &self,
        id: Uuid,
        expected: DonorStatus,
        entry: &StatusHistoryEntry,
        collection_date: NaiveDateTime,
    ) -> StoreResult<Option<DonorDetails>> {
        let mut state = self.state.lock().await;
        let Some(donor) = state
            .donors
            .iter_mut()
            .find(|d| d.id == id && d.status == expected)
        else {
            return Ok(None);
        };
        donor.status = entry.status;
        donor.status_history.0.push(entry.clone());
        donor.collection_date = collection_date;
        donor.updated_at = entry.date;
        let donor = donor.clone();
        state.details(&donor).map(Some)
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        // Mirrors ON DELETE RESTRICT on donations.donor_id
        if state.donations.iter().any(|d| d.donor_id == id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "donor {} is referenced by donations",
                id
            )));
        }
        let before = state.donors.len();
        state.donors.retain(|d| d.id != id);
        Ok(state.donors.len() < before)
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn count_all(&self) -> StoreResult<i64> {
        Ok(self.state.lock().await.groups.len() as i64)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Group>> {
        Ok(self.state.lock().await.group_by_id(id))
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Group>> {
        Ok(self.state.lock().await.group_by_name(name))
    }

    async fn bootstrap_defaults(&self, owner: Uuid) -> StoreResult<Vec<Group>> {
        if self.faults.bootstrap.load(Ordering::SeqCst) {
            return Err(RepositoryError::Backend("default group bootstrap failed".to_string()));
        }
        Ok(self.state.lock().await.bootstrap_defaults(owner))
    }

}

#[async_trait]
impl DonationStore for MemoryStore {
    async fn count_for_donor_in_range(
        &self,
        donor_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .donations
            .iter()
            .filter(|d| d.donor_id == donor_id && d.collection_date >= start && d.collection_date < end)
            .count() as i64)
    }

    async fn count_for_donor(&self, donor_id: Uuid) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state.donations.iter().filter(|d| d.donor_id == donor_id).count() as i64)
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }
}

/// Unit of work over `MemoryStore`
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Faults>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn count_groups(&mut self) -> StoreResult<i64> {
        Ok(self.working.groups.len() as i64)
    }

    async fn find_group_by_id(&mut self, id: Uuid) -> StoreResult<Option<Group>> {
        Ok(self.working.group_by_id(id))
    }

    async fn find_group_by_name(&mut self, name: &str) -> StoreResult<Option<Group>> {
        Ok(self.working.group_by_name(name))
    }

    async fn bootstrap_default_groups(&mut self, owner: Uuid) -> StoreResult<Vec<Group>> {
        if self.faults.bootstrap.load(Ordering::SeqCst) {
            return Err(RepositoryError::Backend("default group bootstrap failed".to_string()));
        }
        Ok(self.working.bootstrap_defaults(owner))
    }

    async fn find_donor_by_hundi_no(&mut self, hundi_no: &str) -> StoreResult<Option<Donor>> {
        Ok(self.working.donor_by_hundi_no(hundi_no))
    }

    async fn insert_donor(&mut self, donor: &NewDonor) -> StoreResult<DonorDetails> {
        if self.faults.donor_insert.load(Ordering::SeqCst) {
            return Err(RepositoryError::Backend("donor insert failed".to_string()));
        }
        self.working.insert_donor(donor)
    }

    async fn commit(&mut self) -> StoreResult<()> {
        *self.guard = self.working.clone();
        Ok(())
    }
}
