use crate::domain::validation::{self, parse_id};
use crate::domain::{add_one_month, month_bounds, plan_transition};
use crate::error::{option_to_result, AppError, AppResult, RepositoryError};
use crate::models::{
    Actor, CreateDonorRequest, DonorDetails, DonorListQuery, DonorPage, DonorPatch, DonorStatus,
    DonorStatusSummary, Group, NewDonor, StatusHistoryEntry, DEFAULT_GROUP_NAME,
    DONOR_CREATED_NOTE,
};
use crate::stores::{DonationStore, DonorStore, GroupStore, StoreTransaction, TransactionalStore};
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Attempts at a status compare-and-set before giving up
const MAX_STATUS_ATTEMPTS: usize = 3;

fn system_clock() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Donor lifecycle manager.
///
/// Coordinates the donor, group and donation stores. HTTP handlers and the
/// scheduled rollover job both call these operations; neither gets a
/// separate code path.
pub struct DonorService {
    donors: Arc<dyn DonorStore>,
    groups: Arc<dyn GroupStore>,
    donations: Arc<dyn DonationStore>,
    transactions: Arc<dyn TransactionalStore>,
    clock: fn() -> NaiveDateTime,
}

impl DonorService {
    pub fn new(
        donors: Arc<dyn DonorStore>,
        groups: Arc<dyn GroupStore>,
        donations: Arc<dyn DonationStore>,
        transactions: Arc<dyn TransactionalStore>,
    ) -> Self {
        Self {
            donors,
            groups,
            donations,
            transactions,
            clock: system_clock,
        }
    }

    /// Build a service over a single backend implementing every store
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: DonorStore + GroupStore + DonationStore + TransactionalStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    async fn load(&self, id: Uuid) -> AppResult<DonorDetails> {
        let donor = self.donors.find_by_id(id).await?;
        option_to_result(donor, &format!("Donor {} not found", id))
    }

    /// Make sure the default group set exists
    pub async fn ensure_default_groups(&self, owner: &Actor) -> AppResult<Vec<Group>> {
        self.groups.bootstrap_defaults(owner.id).await.map_err(|e| {
            error!("Default group bootstrap failed: {}", e);
            AppError::DependencyInitFailed(format!("Failed to create default groups: {}", e))
        })
    }

    /// Register a donor.
    ///
    /// Duplicate check, default-group bootstrap and insert share one
    /// transaction; any early return drops it and rolls everything back.
    pub async fn create_donor(
        &self,
        actor: &Actor,
        request: CreateDonorRequest,
    ) -> AppResult<DonorDetails> {
        let input = validation::validate_new_donor(&request)?;
        info!("Creating donor: hundi_no={}, actor={}", input.hundi_no, actor.id);

        let now = self.now();
        let mut tx = self.transactions.begin().await?;

        if tx.find_donor_by_hundi_no(&input.hundi_no).await?.is_some() {
            warn!("Rejected duplicate hundi number {}", input.hundi_no);
            return Err(duplicate_hundi_no(&input.hundi_no));
        }

        let bootstrapped = if tx.count_groups().await? == 0 {
            info!("No groups exist, bootstrapping defaults for {}", actor.id);
            tx.bootstrap_default_groups(actor.id).await.map_err(|e| {
                error!("Default group bootstrap failed: {}", e);
                AppError::DependencyInitFailed(format!("Failed to create default groups: {}", e))
            })?
        } else {
            Vec::new()
        };

        let group = resolve_group(tx.as_mut(), input.group_id, &bootstrapped).await?;

        let new_donor = NewDonor {
            collection_date: input.collection_date.unwrap_or_else(|| add_one_month(now)),
            status_history: vec![StatusHistoryEntry::new(
                DonorStatus::Pending,
                now,
                DONOR_CREATED_NOTE,
            )],
            hundi_no: input.hundi_no,
            name: input.name,
            mobile_number: input.mobile_number,
            address: input.address,
            google_map_link: input.google_map_link,
            group_id: group.id,
            created_by: actor.id,
            created_at: now,
        };

        let donor = tx.insert_donor(&new_donor).await.map_err(|e| match e {
            // Unique index caught a concurrent insert
            RepositoryError::Duplicate(_) => duplicate_hundi_no(&new_donor.hundi_no),
            other => other.into(),
        })?;
        tx.commit().await?;

        info!(
            "Created donor {} ({}) in {}",
            donor.donor.hundi_no, donor.donor.id, donor.group.name
        );
        Ok(donor)
    }

    /// Page through donors, newest due date first
    pub async fn list_donors(&self, query: &DonorListQuery) -> AppResult<DonorPage> {
        let params = validation::validate_list_query(query)?;

        let total = self.donors.count(&params.filter).await?;
        let donors = self
            .donors
            .find(&params.filter, params.skip(), i64::from(params.limit))
            .await?;

        Ok(DonorPage::new(donors, total, params.page, params.limit))
    }

    pub async fn get_donor_by_id(&self, id: &str) -> AppResult<DonorDetails> {
        let donor_id = parse_id(id, "donor")?;
        self.load(donor_id).await
    }

    /// Current status, due state and this month's donation activity
    pub async fn get_donor_status_summary(&self, id: &str) -> AppResult<DonorStatusSummary> {
        let donor_id = parse_id(id, "donor")?;
        let details = self.load(donor_id).await?;

        let now = self.now();
        let (month_start, month_end) = month_bounds(now);
        let this_month = self
            .donations
            .count_for_donor_in_range(donor_id, month_start, month_end)
            .await?;
        let total = self.donations.count_for_donor(donor_id).await?;

        Ok(DonorStatusSummary::new(&details.donor, now, this_month, total))
    }

    /// Update descriptive fields; status is not reachable from here
    pub async fn update_donor(&self, id: &str, patch: DonorPatch) -> AppResult<DonorDetails> {
        let donor_id = parse_id(id, "donor")?;
        let changes = validation::validate_patch(&patch)?;
        let current = self.load(donor_id).await?;

        if let Some(hundi_no) = &changes.hundi_no {
            if hundi_no != &current.donor.hundi_no {
                if let Some(other) = self.donors.find_by_hundi_no(hundi_no).await? {
                    if other.id != donor_id {
                        warn!("Rejected hundi number change of {} to {}", donor_id, hundi_no);
                        return Err(duplicate_hundi_no(hundi_no));
                    }
                }
            }
        }

        if let Some(group_id) = changes.group_id {
            let group = self.groups.find_by_id(group_id).await?;
            option_to_result(group, &format!("Group {} not found", group_id))?;
        }

        let updated = self
            .donors
            .update(donor_id, &changes, self.now())
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => {
                    duplicate_hundi_no(changes.hundi_no.as_deref().unwrap_or_default())
                }
                other => other.into(),
            })?;

        let updated = option_to_result(updated, &format!("Donor {} not found", donor_id))?;
        info!("Updated donor {} ({})", updated.donor.hundi_no, donor_id);
        Ok(updated)
    }

    /// Move a donor through the status state machine.
    ///
    /// The write only lands if the status is still the one the transition
    /// was validated against; otherwise the donor is reloaded and the
    /// transition re-validated.
    pub async fn update_donor_status(
        &self,
        id: &str,
        status: DonorStatus,
        notes: Option<String>,
    ) -> AppResult<DonorDetails> {
        let donor_id = parse_id(id, "donor")?;

        for attempt in 1..=MAX_STATUS_ATTEMPTS {
            let current = self.load(donor_id).await?;
            let plan = plan_transition(&current.donor, status, notes.as_deref(), self.now())?;

            let updated = self
                .donors
                .append_status(donor_id, plan.from, &plan.entry, plan.collection_date)
                .await?;

            match updated {
                Some(donor) => {
                    info!(
                        "Donor {} status {} -> {} (next due {})",
                        donor_id, plan.from, status, donor.donor.collection_date
                    );
                    return Ok(donor);
                }
                None => warn!(
                    "Donor {} changed while updating status (attempt {})",
                    donor_id, attempt
                ),
            }
        }

        Err(AppError::Unexpected(format!(
            "Status of donor {} kept changing concurrently",
            donor_id
        )))
    }

    /// Delete a donor that no donation references
    pub async fn delete_donor(&self, id: &str) -> AppResult<DonorDetails> {
        let donor_id = parse_id(id, "donor")?;
        let current = self.load(donor_id).await?;

        let donations = self.donations.count_for_donor(donor_id).await?;
        if donations > 0 {
            return Err(has_donations(&current.donor.hundi_no, donations));
        }

        match self.donors.delete_by_id(donor_id).await {
            Ok(true) => {
                info!("Deleted donor {} ({})", current.donor.hundi_no, donor_id);
                Ok(current)
            }
            Ok(false) => Err(AppError::NotFound(format!("Donor {} not found", donor_id))),
            // A donation was recorded between the count and the delete
            Err(RepositoryError::ConstraintViolation(_)) => {
                Err(has_donations(&current.donor.hundi_no, 1))
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn resolve_group(
    tx: &mut dyn StoreTransaction,
    explicit: Option<Uuid>,
    bootstrapped: &[Group],
) -> AppResult<Group> {
    if let Some(group_id) = explicit {
        let group = tx.find_group_by_id(group_id).await?;
        return option_to_result(group, &format!("Group {} not found", group_id));
    }

    if let Some(group) = bootstrapped.iter().find(|g| g.is_default()) {
        return Ok(group.clone());
    }

    tx.find_group_by_name(DEFAULT_GROUP_NAME)
        .await?
        .ok_or_else(|| {
            AppError::MissingDefaultGroup(format!(
                "No group given and '{}' does not exist",
                DEFAULT_GROUP_NAME
            ))
        })
}

fn duplicate_hundi_no(hundi_no: &str) -> AppError {
    AppError::DuplicateKey(format!("Donor with hundi number {} already exists", hundi_no))
}

fn has_donations(hundi_no: &str, count: i64) -> AppError {
    AppError::HasDependentRecords(format!(
        "Donor {} has {} linked donation(s) and cannot be deleted",
        hundi_no, count
    ))
}
