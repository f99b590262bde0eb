//! PostgreSQL repository tests.
//!
//! Run with `DATABASE_URL` pointing at a server the test user may create
//! databases on: `cargo test -- --ignored`.

mod helpers;

use helpers::*;
use hundi_backend::error::{AppError, RepositoryError};
use hundi_backend::models::*;
use hundi_backend::stores::{
    DonationStore, DonorFilter, DonorStore, GroupStore, StoreTransaction, TransactionalStore,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

// ============================================================================
// Migration Tests
// ============================================================================

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_migrations_ran(pool: PgPool) {
    let tables = ["users", "donor_groups", "donors", "donations"];

    for table in tables {
        let exists: bool = sqlx::query(
            "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get(0);
        assert!(exists, "Table {} should exist", table);
    }
}

// ============================================================================
// Group Repository Tests
// ============================================================================

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_group_bootstrap_is_idempotent(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let owner = db.actor().await;

    let first = db.group_repo.bootstrap_defaults(owner.id).await.unwrap();
    let second = db.group_repo.bootstrap_defaults(owner.id).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(
        first.iter().map(|g| g.id).collect::<Vec<_>>(),
        second.iter().map(|g| g.id).collect::<Vec<_>>()
    );
    assert_eq!(db.group_repo.count_all().await.unwrap(), 3);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_duplicate_group_name_rejected(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let owner = db.actor().await;

    db.group_repo
        .create("North Ward", None, None, owner.id)
        .await
        .unwrap();
    let err = db
        .group_repo
        .create("North Ward", None, None, owner.id)
        .await
        .unwrap_err();

    assert!(matches!(
        RepositoryError::from(err),
        RepositoryError::Duplicate(_)
    ));
}

// ============================================================================
// Transaction Tests
// ============================================================================

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_dropped_transaction_rolls_back(pool: PgPool) {
    let db = TestDatabase::from_pool(pool.clone());
    let owner = db.actor().await;
    let database = hundi_backend::database::Database::new(pool);

    {
        let mut tx = database.begin().await.unwrap();
        let groups = tx.bootstrap_default_groups(owner.id).await.unwrap();
        assert_eq!(groups.len(), 3);
    }

    assert_eq!(db.group_repo.count_all().await.unwrap(), 0);
}

// ============================================================================
// Donor Service Tests
// ============================================================================

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_create_donor_bootstraps_groups(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let service = db.service();
    let actor = db.actor().await;

    let created = service
        .create_donor(&actor, donor_request("H1", "Asha"))
        .await
        .unwrap();

    assert_eq!(created.group.name, "Group A");
    assert_eq!(created.donor.status, DonorStatus::Pending);
    assert_eq!(created.donor.status_history.len(), 1);
    assert_eq!(created.creator.unwrap().email, "collector@example.com");
    assert_eq!(db.group_repo.count_all().await.unwrap(), 3);

    let err = service
        .create_donor(&actor, donor_request("H1", "Asha"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey(_)));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_status_history_appended_in_database(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let service = db.service();
    let actor = db.actor().await;
    let created = service
        .create_donor(&actor, donor_request("H1", "Asha"))
        .await
        .unwrap();
    let id = created.donor.id.to_string();

    let collected = service
        .update_donor_status(&id, DonorStatus::Collected, Some("Box emptied".to_string()))
        .await
        .unwrap();
    assert_eq!(collected.donor.status_history.len(), 2);
    assert!(collected.donor.collection_date >= created.donor.collection_date);

    let err = service
        .update_donor_status(&id, DonorStatus::Skipped, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    // A stale compare-and-set matches nothing
    let stale = db
        .donor_repo
        .append_status(
            created.donor.id,
            DonorStatus::Pending,
            &StatusHistoryEntry::new(DonorStatus::Skipped, fixed_now(), "stale"),
            fixed_now(),
        )
        .await
        .unwrap();
    assert!(stale.is_none());

    let stored = DonorStore::find_by_id(&*db.donor_repo, created.donor.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.donor.status, DonorStatus::Collected);
    assert_eq!(stored.donor.status_history[1].notes, "Box emptied");
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_listing_filters_in_database(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let service = db.service();
    let actor = db.actor().await;

    for (hundi_no, name, day) in [("H1", "Ravi 100%", 1), ("H2", "Ravindra", 10), ("H3", "Gopal", 20)] {
        let request = CreateDonorRequest {
            collection_date: Some(at(2024, 3, day, 9)),
            ..CreateDonorRequest::new(hundi_no, name)
        };
        service.create_donor(&actor, request).await.unwrap();
    }

    let filter = DonorFilter {
        search: Some("ravi".to_string()),
        ..Default::default()
    };
    assert_eq!(db.donor_repo.count(&filter).await.unwrap(), 2);

    // Wildcards in the search term match literally
    let filter = DonorFilter {
        search: Some("0%".to_string()),
        ..Default::default()
    };
    let found = db.donor_repo.find(&filter, 0, 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].donor.hundi_no, "H1");

    let page = service
        .list_donors(&DonorListQuery {
            from: chrono::NaiveDate::from_ymd_opt(2024, 3, 10),
            to: chrono::NaiveDate::from_ymd_opt(2024, 3, 20),
            ..Default::default()
        })
        .await
        .unwrap();
    let hundi_nos: Vec<_> = page.donors.iter().map(|d| d.donor.hundi_no.as_str()).collect();
    assert_eq!(hundi_nos, vec!["H3", "H2"]);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_delete_blocked_by_donations(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let service = db.service();
    let actor = db.actor().await;
    let created = service
        .create_donor(&actor, donor_request("H1", "Asha"))
        .await
        .unwrap();
    let donor_id = created.donor.id;

    db.donation_repo
        .create(donor_id, at(2024, 1, 10, 9), Decimal::new(25000, 2))
        .await
        .unwrap();
    assert_eq!(db.donation_repo.count_for_donor(donor_id).await.unwrap(), 1);

    let err = service.delete_donor(&donor_id.to_string()).await.unwrap_err();
    assert!(matches!(err, AppError::HasDependentRecords(_)));

    // The foreign key holds even when the service check is bypassed
    let err = db.donor_repo.delete_by_id(donor_id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_donation_counts_by_month(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let service = db.service();
    let actor = db.actor().await;
    let created = service
        .create_donor(&actor, donor_request("H1", "Asha"))
        .await
        .unwrap();
    let donor_id = created.donor.id;

    for date in [at(2024, 1, 1, 0), at(2024, 1, 31, 23), at(2024, 2, 1, 0)] {
        db.donation_repo
            .create(donor_id, date, Decimal::new(100, 0))
            .await
            .unwrap();
    }

    let january = db
        .donation_repo
        .count_for_donor_in_range(donor_id, at(2024, 1, 1, 0), at(2024, 2, 1, 0))
        .await
        .unwrap();
    assert_eq!(january, 2);
}
