//! Caller-facing request shapes.
//!
//! Ids arrive as strings so that malformed values surface as
//! `InvalidIdFormat` instead of failing at deserialisation.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Attributes for registering a donor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonorRequest {
    pub hundi_no: String,
    pub name: String,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub google_map_link: Option<String>,
    pub group: Option<String>,
    pub collection_date: Option<NaiveDateTime>,
}

impl CreateDonorRequest {
    pub fn new(hundi_no: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hundi_no: hundi_no.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial update of descriptive donor fields.
///
/// Status and status history are deliberately absent; they only change
/// through `DonorService::update_donor_status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DonorPatch {
    pub hundi_no: Option<String>,
    pub name: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub google_map_link: Option<String>,
    pub collection_date: Option<NaiveDateTime>,
    pub group: Option<String>,
}

impl DonorPatch {
    pub fn is_empty(&self) -> bool {
        self.hundi_no.is_none()
            && self.name.is_none()
            && self.mobile_number.is_none()
            && self.address.is_none()
            && self.google_map_link.is_none()
            && self.collection_date.is_none()
            && self.group.is_none()
    }
}

/// Pagination and filters for the donor listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Case-insensitive substring over name, hundi number and mobile
    pub search: Option<String>,
    /// Inclusive lower bound on the collection date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the collection date
    pub to: Option<NaiveDate>,
    pub group: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_rejects_status_fields() {
        let result: Result<DonorPatch, _> =
            serde_json::from_str(r#"{"name":"Ravi","status":"collected"}"#);
        assert!(result.is_err());

        let result: Result<DonorPatch, _> =
            serde_json::from_str(r#"{"statusHistory":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_emptiness() {
        assert!(DonorPatch::default().is_empty());
        let patch = DonorPatch {
            address: Some("12 Temple Street".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_create_request_camel_case() {
        let request: CreateDonorRequest =
            serde_json::from_str(r#"{"hundiNo":"H1","name":"A","mobileNumber":"98450"}"#)
                .unwrap();
        assert_eq!(request.hundi_no, "H1");
        assert_eq!(request.mobile_number.as_deref(), Some("98450"));
        assert!(request.group.is_none());
    }
}
