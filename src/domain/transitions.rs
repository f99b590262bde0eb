//! Donor status state machine
//!
//! | From      | Allowed targets     |
//! |-----------|---------------------|
//! | pending   | collected, skipped  |
//! | collected | pending             |
//! | skipped   | pending             |
//!
//! A status may always be set to itself; the change is still recorded.

use super::calendar::add_one_month;
use crate::error::{AppError, AppResult};
use crate::models::{Donor, DonorStatus, StatusHistoryEntry};
use chrono::NaiveDateTime;

/// Check whether `from -> to` is an allowed transition
pub fn can_transition(from: DonorStatus, to: DonorStatus) -> bool {
    use DonorStatus::*;

    from == to
        || matches!(
            (from, to),
            (Pending, Collected) | (Pending, Skipped) | (Collected, Pending) | (Skipped, Pending)
        )
}

/// Reject transitions outside the table
pub fn validate_transition(from: DonorStatus, to: DonorStatus) -> AppResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

/// History note used when the caller gives none
pub fn default_note(to: DonorStatus) -> String {
    format!("Status changed to {}", to)
}

/// Everything a store needs to persist one validated status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: DonorStatus,
    pub entry: StatusHistoryEntry,
    pub collection_date: NaiveDateTime,
}

/// Validate and describe a status change without touching the donor.
///
/// Closing a round (collected or skipped) moves the next due date to one
/// month after `now`; going back to pending keeps the current due date.
pub fn plan_transition(
    donor: &Donor,
    to: DonorStatus,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<TransitionPlan> {
    validate_transition(donor.status, to)?;

    let notes = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_note(to));

    let collection_date = if to.closes_round() {
        add_one_month(now)
    } else {
        donor.collection_date
    };

    Ok(TransitionPlan {
        from: donor.status,
        entry: StatusHistoryEntry::new(to, now, notes),
        collection_date,
    })
}
