pub mod donation_repository;
pub mod donor_repository;
pub mod group_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use donation_repository::DonationRepository;
pub use donor_repository::DonorRepository;
pub use group_repository::GroupRepository;
pub use user_repository::UserRepository;
