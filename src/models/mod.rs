//! Domain models for the hundi backend.
//!
//! This module contains the database-backed records and the request
//! shapes accepted by the donor service.

pub mod donation;
pub mod donor;
pub mod group;
pub mod requests;
pub mod user;

// Re-export all models for convenient access
pub use donation::Donation;
pub use donor::{
    Donor, DonorDetails, DonorPage, DonorStatus, DonorStatusSummary, NewDonor,
    StatusHistoryEntry, DONOR_CREATED_NOTE,
};
pub use group::{
    Group, GroupSummary, DEFAULT_GROUP_DESCRIPTION, DEFAULT_GROUP_NAME, DEFAULT_GROUP_NAMES,
};
pub use requests::{CreateDonorRequest, DonorListQuery, DonorPatch};
pub use user::{Actor, User, UserSummary};
