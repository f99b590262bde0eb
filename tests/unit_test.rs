use chrono::NaiveDate;
use hundi_backend::domain::{add_one_month, can_transition, month_bounds};
use hundi_backend::error::{AppError, ErrorKind, FieldError};
use hundi_backend::models::*;
use hundi_backend::response::ApiResponse;
use std::str::FromStr;

fn at(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap()
}

/// Unit tests for the status state machine
#[test]
fn test_transition_table() {
    use DonorStatus::*;

    let allowed = [
        (Pending, Collected),
        (Pending, Skipped),
        (Collected, Pending),
        (Skipped, Pending),
    ];
    for from in DonorStatus::ALL {
        for to in DonorStatus::ALL {
            let expected = from == to || allowed.contains(&(from, to));
            assert_eq!(can_transition(from, to), expected, "{} -> {}", from, to);
        }
    }
}

#[test]
fn test_status_wire_format() {
    assert_eq!(serde_json::to_string(&DonorStatus::Collected).unwrap(), "\"collected\"");
    assert_eq!(DonorStatus::from_str("skipped").unwrap(), DonorStatus::Skipped);
    assert!(DonorStatus::from_str("lost").is_err());
    assert_eq!(DonorStatus::default(), DonorStatus::Pending);
}

/// Unit tests for calendar arithmetic
#[test]
fn test_month_addition_clamps() {
    assert_eq!(add_one_month(at(2024, 1, 31)), at(2024, 2, 29));
    assert_eq!(add_one_month(at(2023, 1, 31)), at(2023, 2, 28));
    assert_eq!(add_one_month(at(2024, 12, 15)), at(2025, 1, 15));
}

#[test]
fn test_month_bounds_cover_whole_month() {
    let (start, end) = month_bounds(at(2024, 2, 10));
    assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
    assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
}

/// Unit tests for error classification
#[test]
fn test_error_kinds_and_status_codes() {
    let cases = [
        (AppError::invalid_field("name", "is required"), ErrorKind::ValidationFailed, 400),
        (AppError::InvalidIdFormat("x".into()), ErrorKind::InvalidIdFormat, 400),
        (AppError::NotFound("x".into()), ErrorKind::NotFound, 404),
        (AppError::DuplicateKey("x".into()), ErrorKind::DuplicateKey, 409),
        (AppError::HasDependentRecords("x".into()), ErrorKind::HasDependentRecords, 409),
        (AppError::DependencyInitFailed("x".into()), ErrorKind::DependencyInitFailed, 500),
        (AppError::MissingDefaultGroup("x".into()), ErrorKind::MissingDefaultGroup, 500),
        (AppError::Config("x".into()), ErrorKind::Unexpected, 500),
    ];
    for (err, kind, status) in cases {
        assert_eq!(err.kind(), kind);
        assert_eq!(err.status_code(), status, "{}", err);
    }
}

#[test]
fn test_response_envelope_for_validation_failure() {
    let err = AppError::ValidationFailed(vec![
        FieldError::new("hundiNo", "is required"),
        FieldError::new("mobileNumber", "must contain 7 to 15 digits"),
    ]);
    let response = ApiResponse::<DonorDetails>::from_error(&err, true);

    assert!(!response.success);
    assert!(response.data.is_none());
    let body = response.error.unwrap();
    assert_eq!(body.kind, ErrorKind::ValidationFailed);
    assert_eq!(body.details.len(), 2);
}

#[test]
fn test_donor_page_math() {
    let page = DonorPage::new(Vec::new(), 15, 2, 10);
    assert_eq!(page.pages, 2);
    let empty = DonorPage::new(Vec::new(), 0, 1, 10);
    assert_eq!(empty.pages, 0);
}
