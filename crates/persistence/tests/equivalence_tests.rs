//! Cross-backend equivalence.
//!
//! The same operation sequence applied to a MongoDB and a SQLite store must
//! leave both with the same observable state, and a backup taken from one
//! must restore into the other.

#![cfg(all(feature = "sqlite", feature = "mongodb"))]

mod common;

use larder_persistence::cache::CacheAside;
use larder_persistence::core::{BackendKind, BackendSelector};
use larder_persistence::repository::Repositories;
use larder_persistence::types::{ItemQuery, ItemSort, ItemSortField, RestoreMode};

use common::harness::mongo::mongo_backend;
use common::scenarios;
use common::*;

#[tokio::test]
async fn test_replayed_operations_match() {
    let document = repositories(mongo_backend().await);
    let relational = sqlite_repositories();

    scenarios::replay_operations(&document).await;
    scenarios::replay_operations(&relational).await;

    assert_eq!(
        scenarios::observable_state(&document).await,
        scenarios::observable_state(&relational).await
    );
}

#[tokio::test]
async fn test_seeded_listings_match() {
    let document = repositories(mongo_backend().await);
    let relational = sqlite_repositories();
    scenarios::seed(&document).await;
    scenarios::seed(&relational).await;

    for sort in [
        ItemSort::ascending(ItemSortField::Name),
        ItemSort::descending(ItemSortField::WarrantyExpiry),
        ItemSort::ascending(ItemSortField::UsageExpiry),
    ] {
        let query = ItemQuery::new().with_sort(sort);
        assert_eq!(
            document.items().list(&query).await.unwrap(),
            relational.items().list(&query).await.unwrap()
        );
    }

    let today = chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    assert_eq!(
        document.items().get_expiring_on(today, 60).await.unwrap(),
        relational.items().get_expiring_on(today, 60).await.unwrap()
    );
    assert_eq!(
        document.items().stats().await.unwrap(),
        relational.items().stats().await.unwrap()
    );
}

#[tokio::test]
async fn test_backup_moves_between_backends() {
    scenarios::restore_into(&sqlite_repositories(), &repositories(mongo_backend().await)).await;
    scenarios::restore_into(&repositories(mongo_backend().await), &sqlite_repositories()).await;
}

#[tokio::test]
async fn test_switching_backends_at_runtime() {
    let (selector, switch) = BackendSelector::switchable(BackendKind::Relational);
    let repos = Repositories::builder()
        .backend(sqlite_backend())
        .backend(mongo_backend().await)
        .selector(selector)
        .cache(CacheAside::in_memory())
        .build();

    scenarios::seed(&repos).await;
    let backup = repos.backup().await.unwrap();

    switch.set(BackendKind::Document);
    assert!(repos.types().list_all().await.unwrap().is_empty());
    repos.restore(&backup, RestoreMode::Merge).await.unwrap();

    let document_state = scenarios::observable_state(&repos).await;
    switch.set(BackendKind::Relational);
    assert_eq!(scenarios::observable_state(&repos).await, document_state);
}
