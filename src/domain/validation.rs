//! Input validation for donor requests.
//!
//! Every check collects into a list of field errors so callers see all
//! problems at once.

use super::calendar::start_of_next_day;
use crate::error::{AppError, AppResult, FieldError};
use crate::models::{CreateDonorRequest, DonorListQuery, DonorPatch};
use crate::stores::{DonorChanges, DonorFilter};
use chrono::NaiveDateTime;
use uuid::Uuid;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

const MAX_HUNDI_NO_LEN: usize = 64;
const MAX_NAME_LEN: usize = 200;

/// Parse a caller-supplied identifier
pub fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidIdFormat(format!("Invalid {} id: {}", what, raw)))
}

/// Create request after trimming and validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDonorInput {
    pub hundi_no: String,
    pub name: String,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub google_map_link: Option<String>,
    pub group_id: Option<Uuid>,
    pub collection_date: Option<NaiveDateTime>,
}

/// Resolved listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub filter: DonorFilter,
}

impl ListParams {
    /// Rows before the requested page; pages past the end saturate
    pub fn skip(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)).saturating_mul(i64::from(self.limit))
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_required(field: &str, value: &str, max_len: usize, errors: &mut Vec<FieldError>) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if value.chars().count() > max_len {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }
}

fn check_mobile(value: &str, errors: &mut Vec<FieldError>) {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !allowed || !(7..=15).contains(&digits) {
        errors.push(FieldError::new(
            "mobileNumber",
            "must contain 7 to 15 digits",
        ));
    }
}

fn check_link(value: &str, errors: &mut Vec<FieldError>) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(FieldError::new(
            "googleMapLink",
            "must be an http(s) URL",
        ));
    }
}

/// Parse an optional group id. Call after every other check: a malformed id
/// on its own is `InvalidIdFormat`, next to other problems it becomes one
/// more field error.
fn check_group(raw: Option<&str>, errors: &mut Vec<FieldError>) -> AppResult<Option<Uuid>> {
    match trimmed(raw) {
        None if raw.is_some() => {
            errors.push(FieldError::new("group", "must not be empty"));
            Ok(None)
        }
        None => Ok(None),
        Some(id) => match parse_id(&id, "group") {
            Ok(id) => Ok(Some(id)),
            Err(err) if errors.is_empty() => Err(err),
            Err(_) => {
                errors.push(FieldError::new("group", "is not a valid id"));
                Ok(None)
            }
        },
    }
}

/// Blank optional text means "no value": absent on create, cleared on update
fn clearable(value: Option<&str>) -> Option<Option<String>> {
    value.map(|v| trimmed(Some(v)))
}

fn finish<T>(errors: Vec<FieldError>, value: T) -> AppResult<T> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(AppError::ValidationFailed(errors))
    }
}

/// Validate a create request
pub fn validate_new_donor(request: &CreateDonorRequest) -> AppResult<ValidDonorInput> {
    let mut errors = Vec::new();

    check_required("hundiNo", &request.hundi_no, MAX_HUNDI_NO_LEN, &mut errors);
    check_required("name", &request.name, MAX_NAME_LEN, &mut errors);

    let mobile_number = trimmed(request.mobile_number.as_deref());
    if let Some(mobile) = &mobile_number {
        check_mobile(mobile, &mut errors);
    }
    let google_map_link = trimmed(request.google_map_link.as_deref());
    if let Some(link) = &google_map_link {
        check_link(link, &mut errors);
    }
    let group_id = check_group(request.group.as_deref(), &mut errors)?;

    finish(
        errors,
        ValidDonorInput {
            hundi_no: request.hundi_no.trim().to_string(),
            name: request.name.trim().to_string(),
            mobile_number,
            address: trimmed(request.address.as_deref()),
            google_map_link,
            group_id,
            collection_date: request.collection_date,
        },
    )
}

/// Validate a partial update
pub fn validate_patch(patch: &DonorPatch) -> AppResult<DonorChanges> {
    if patch.is_empty() {
        return Err(AppError::invalid_field("body", "no fields to update"));
    }

    let mut errors = Vec::new();

    if let Some(hundi_no) = &patch.hundi_no {
        check_required("hundiNo", hundi_no, MAX_HUNDI_NO_LEN, &mut errors);
    }
    if let Some(name) = &patch.name {
        check_required("name", name, MAX_NAME_LEN, &mut errors);
    }
    let mobile_number = clearable(patch.mobile_number.as_deref());
    if let Some(Some(mobile)) = &mobile_number {
        check_mobile(mobile, &mut errors);
    }
    let google_map_link = clearable(patch.google_map_link.as_deref());
    if let Some(Some(link)) = &google_map_link {
        check_link(link, &mut errors);
    }
    let group_id = check_group(patch.group.as_deref(), &mut errors)?;

    finish(
        errors,
        DonorChanges {
            hundi_no: patch.hundi_no.as_deref().map(|v| v.trim().to_string()),
            name: patch.name.as_deref().map(|v| v.trim().to_string()),
            mobile_number,
            address: clearable(patch.address.as_deref()),
            google_map_link,
            collection_date: patch.collection_date,
            group_id,
        },
    )
}

/// Validate pagination and filters of a listing request
pub fn validate_list_query(query: &DonorListQuery) -> AppResult<ListParams> {
    let mut errors = Vec::new();

    let page = query.page.unwrap_or(DEFAULT_PAGE);
    if page < 1 {
        errors.push(FieldError::new("page", "must be at least 1"));
    }
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 1 {
        errors.push(FieldError::new("limit", "must be at least 1"));
    }
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            errors.push(FieldError::new("from", "must not be after 'to'"));
        }
    }
    let group_id = check_group(query.group.as_deref(), &mut errors)?;

    finish(
        errors,
        ListParams {
            page,
            limit,
            filter: DonorFilter {
                search: trimmed(query.search.as_deref()),
                from: query
                    .from
                    .and_then(|d| d.and_hms_opt(0, 0, 0)),
                until: query.to.map(start_of_next_day),
                group_id,
            },
        },
    )
}
