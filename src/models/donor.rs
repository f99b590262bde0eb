use super::group::GroupSummary;
use super::user::UserSummary;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Note recorded on the first status history entry of every donor
pub const DONOR_CREATED_NOTE: &str = "Donor created";

/// Collection status of a donor for the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "donor_status", rename_all = "lowercase")]
pub enum DonorStatus {
    #[default]
    Pending,
    Collected,
    Skipped,
}

impl DonorStatus {
    pub const ALL: [DonorStatus; 3] = [
        DonorStatus::Pending,
        DonorStatus::Collected,
        DonorStatus::Skipped,
    ];

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            DonorStatus::Pending => "pending",
            DonorStatus::Collected => "collected",
            DonorStatus::Skipped => "skipped",
        }
    }

    /// Statuses that close a round and push the next due date out
    pub fn closes_round(&self) -> bool {
        matches!(self, DonorStatus::Collected | DonorStatus::Skipped)
    }
}

impl FromStr for DonorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(DonorStatus::Pending),
            "collected" => Ok(DonorStatus::Collected),
            "skipped" => Ok(DonorStatus::Skipped),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl fmt::Display for DonorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DonorStatus> for String {
    fn from(status: DonorStatus) -> Self {
        status.as_str().to_string()
    }
}

/// One entry of the append-only status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: DonorStatus,
    pub date: NaiveDateTime,
    pub notes: String,
}

impl StatusHistoryEntry {
    pub fn new(status: DonorStatus, date: NaiveDateTime, notes: impl Into<String>) -> Self {
        Self {
            status,
            date,
            notes: notes.into(),
        }
    }
}

/// Donor model representing a hundi box holder
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: Uuid,
    pub hundi_no: String,
    pub name: String,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub google_map_link: Option<String>,
    /// Next due date for collection
    pub collection_date: NaiveDateTime,
    pub group_id: Uuid,
    pub created_by: Uuid,
    pub status: DonorStatus,
    pub status_history: Json<Vec<StatusHistoryEntry>>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Donor {
    /// Most recent status history entry
    pub fn last_status_change(&self) -> Option<&StatusHistoryEntry> {
        self.status_history.last()
    }

    /// Check if collection is due at the given instant
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.collection_date <= now
    }
}

/// Insert payload for a donor; status is always `pending` on insert
#[derive(Debug, Clone)]
pub struct NewDonor {
    pub hundi_no: String,
    pub name: String,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub google_map_link: Option<String>,
    pub collection_date: NaiveDateTime,
    pub group_id: Uuid,
    pub created_by: Uuid,
    pub status_history: Vec<StatusHistoryEntry>,
    pub created_at: NaiveDateTime,
}

impl NewDonor {
    /// Materialise the record the store will hold
    pub fn into_donor(self, id: Uuid) -> Donor {
        Donor {
            id,
            hundi_no: self.hundi_no,
            name: self.name,
            mobile_number: self.mobile_number,
            address: self.address,
            google_map_link: self.google_map_link,
            collection_date: self.collection_date,
            group_id: self.group_id,
            created_by: self.created_by,
            status: DonorStatus::Pending,
            status_history: Json(self.status_history),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Donor joined with its group and creator summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorDetails {
    #[serde(flatten)]
    pub donor: Donor,
    pub group: GroupSummary,
    pub creator: Option<UserSummary>,
}

/// Collection status overview for a single donor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorStatusSummary {
    pub donor_id: Uuid,
    pub hundi_no: String,
    pub name: String,
    pub status: DonorStatus,
    pub collection_date: NaiveDateTime,
    pub is_due: bool,
    pub donations_this_month: i64,
    pub collected_this_month: bool,
    pub total_donations: i64,
    pub last_change: Option<StatusHistoryEntry>,
    pub history_length: usize,
}

impl DonorStatusSummary {
    pub fn new(
        donor: &Donor,
        now: NaiveDateTime,
        donations_this_month: i64,
        total_donations: i64,
    ) -> Self {
        Self {
            donor_id: donor.id,
            hundi_no: donor.hundi_no.clone(),
            name: donor.name.clone(),
            status: donor.status,
            collection_date: donor.collection_date,
            is_due: donor.is_due(now),
            donations_this_month,
            collected_this_month: donations_this_month > 0,
            total_donations,
            last_change: donor.last_status_change().cloned(),
            history_length: donor.status_history.len(),
        }
    }
}

/// One page of the donor listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorPage {
    pub donors: Vec<DonorDetails>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl DonorPage {
    pub fn new(donors: Vec<DonorDetails>, total: i64, page: u32, limit: u32) -> Self {
        let total_u64 = total.max(0) as u64;
        let pages = total_u64.div_ceil(u64::from(limit.max(1)));
        Self {
            donors,
            total,
            page,
            limit,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in DonorStatus::ALL {
            assert_eq!(status.as_str().parse::<DonorStatus>().unwrap(), status);
        }
        assert_eq!(" Collected ".parse::<DonorStatus>().unwrap(), DonorStatus::Collected);
        assert!("archived".parse::<DonorStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&DonorStatus::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
    }

    #[test]
    fn test_new_donor_starts_pending() {
        let created = at(2024, 3, 1);
        let donor = NewDonor {
            hundi_no: "H-100".to_string(),
            name: "Asha".to_string(),
            mobile_number: None,
            address: None,
            google_map_link: None,
            collection_date: at(2024, 4, 1),
            group_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            status_history: vec![StatusHistoryEntry::new(
                DonorStatus::Pending,
                created,
                DONOR_CREATED_NOTE,
            )],
            created_at: created,
        }
        .into_donor(Uuid::new_v4());

        assert_eq!(donor.status, DonorStatus::Pending);
        assert_eq!(donor.status_history.len(), 1);
        assert_eq!(donor.updated_at, created);
        assert!(!donor.is_due(at(2024, 3, 31)));
        assert!(donor.is_due(at(2024, 4, 1)));
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(DonorPage::new(vec![], 15, 2, 10).pages, 2);
        assert_eq!(DonorPage::new(vec![], 20, 1, 10).pages, 2);
        assert_eq!(DonorPage::new(vec![], 0, 1, 10).pages, 0);
        assert_eq!(DonorPage::new(vec![], 1, 1, 1).pages, 1);
    }
}
