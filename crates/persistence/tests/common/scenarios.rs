//! Backend-agnostic checks against the repository facades.
//!
//! Every function here starts from an empty store and panics on the first
//! mismatch. The SQLite and MongoDB suites call each of them once.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::json;

use larder_persistence::repository::Repositories;
use larder_persistence::types::{
    Item, ItemFilter, ItemPatch, ItemQuery, ItemSort, ItemSortField, LocationPatch, LogEntry,
    LogFilter, LoginEvent, NewLocation, NotificationSettings, RelatedItem, RestoreMode, User,
    timestamp,
};

use super::fixtures::*;

// ============================================================================
// Items
// ============================================================================

pub async fn item_crud(repos: &Repositories) {
    let items = repos.items();

    items.insert(&notebook()).await.unwrap();
    let found = items.find_by_key("A1").await.unwrap().unwrap();
    assert_eq!(found.name, "Notebook");
    assert_eq!(found.item_type, "Stationery");

    let err = items.insert(&notebook()).await.unwrap_err();
    assert!(err.is_duplicate_key(), "expected duplicate key, got {err}");

    let patch = ItemPatch::new().name("Spiral notebook").quantity(4);
    assert!(items.update("A1", &patch).await.unwrap());
    assert!(!items.update("missing", &patch).await.unwrap());

    let updated = items.find_by_key("A1").await.unwrap().unwrap();
    assert_eq!(updated.name, "Spiral notebook");
    assert_eq!(updated.quantity, 4);
    assert_eq!(updated.item_type, "Stationery");

    assert!(items.delete("A1").await.unwrap());
    assert!(!items.delete("A1").await.unwrap());
    assert!(items.find_by_key("A1").await.unwrap().is_none());
}

pub async fn item_patch_clears_dates(repos: &Repositories) {
    let items = repos.items();
    let item = notebook().with_warranty_expiry(days_from_today(5));
    items.insert(&item).await.unwrap();

    let patch = ItemPatch::new().warranty_expiry(None).location("2F", "Study", "Desk");
    assert!(items.update("A1", &patch).await.unwrap());

    let updated = items.find_by_key("A1").await.unwrap().unwrap();
    assert_eq!(updated.warranty_expiry, None);
    assert_eq!(
        (updated.floor.as_str(), updated.room.as_str(), updated.zone.as_str()),
        ("2F", "Study", "Desk")
    );
}

pub async fn expiring_buckets(repos: &Repositories) {
    let items = repos.items();
    items
        .insert(&Item::new("X", "Far").with_warranty_expiry(days_from_today(40)))
        .await
        .unwrap();
    items
        .insert(&Item::new("Y", "Near").with_warranty_expiry(days_from_today(10)))
        .await
        .unwrap();

    let report = items.get_expiring(30).await.unwrap();
    let near: Vec<&str> = report.near_expiry.iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(near, vec!["Y"]);
    assert!(report.expired.is_empty());
}

pub async fn expired_never_near(repos: &Repositories) {
    let items = repos.items();
    let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
    let yesterday = NaiveDate::from_ymd_opt(2026, 6, 14).unwrap();

    items
        .insert(&Item::new("Z", "Old").with_warranty_expiry(yesterday))
        .await
        .unwrap();
    // One date expired and one upcoming: expired wins.
    items
        .insert(
            &Item::new("W", "Mixed")
                .with_warranty_expiry(yesterday)
                .with_usage_expiry(NaiveDate::from_ymd_opt(2026, 6, 20).unwrap()),
        )
        .await
        .unwrap();
    items
        .insert(&Item::new("B", "Boundary").with_usage_expiry(NaiveDate::from_ymd_opt(2026, 6, 22).unwrap()))
        .await
        .unwrap();

    for days in [0, 7, 30, u32::MAX] {
        let report = items.get_expiring_on(today, days).await.unwrap();
        let expired: Vec<&str> = report.expired.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(expired, vec!["W", "Z"], "threshold {days}");
        assert!(
            report
                .near_expiry
                .iter()
                .all(|i| i.item_id != "Z" && i.item_id != "W"),
            "threshold {days}"
        );
    }

    // The threshold is inclusive.
    let report = items.get_expiring_on(today, 7).await.unwrap();
    assert_eq!(report.near_expiry.len(), 1);
    let report = items.get_expiring_on(today, 6).await.unwrap();
    assert!(report.near_expiry.is_empty());
}

pub async fn favorites(repos: &Repositories) {
    let items = repos.items();
    items.insert(&notebook()).await.unwrap();
    items.insert(&Item::new("A2", "Pen")).await.unwrap();

    assert!(items.toggle_favorite("A1", "u1").await.unwrap());
    assert!(items.is_favorite("A1", "u1").await.unwrap());
    assert!(!items.toggle_favorite("A1", "u1").await.unwrap());
    assert!(!items.is_favorite("A1", "u1").await.unwrap());

    assert!(items.toggle_favorite("A1", "u1").await.unwrap());
    assert!(items.toggle_favorite("A2", "u1").await.unwrap());
    assert!(items.toggle_favorite("A2", "u2").await.unwrap());

    let favorites: Vec<String> = items
        .favorites_of("u1")
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.item_id)
        .collect();
    assert_eq!(favorites, vec!["A1", "A2"]);

    let pen = items.find_by_key("A2").await.unwrap().unwrap();
    assert_eq!(pen.favorites, vec!["u1", "u2"]);

    assert!(!items.toggle_favorite("missing", "u1").await.unwrap());
}

pub async fn related_links(repos: &Repositories) {
    let items = repos.items();
    items.insert(&notebook()).await.unwrap();

    assert!(items.add_related("A1", "B2", "accessory").await.unwrap());
    assert!(items.add_related("A1", "B2", "accessory").await.unwrap());
    let item = items.find_by_key("A1").await.unwrap().unwrap();
    assert_eq!(
        item.related_items,
        vec![RelatedItem {
            id: "B2".to_string(),
            relation: "accessory".to_string()
        }]
    );

    assert!(items.add_related("A1", "B2", "spare").await.unwrap());
    assert!(items.add_related("A1", "C3", "accessory").await.unwrap());
    let item = items.find_by_key("A1").await.unwrap().unwrap();
    assert_eq!(item.related_items.len(), 3);

    assert!(items.remove_related("A1", "B2").await.unwrap());
    let item = items.find_by_key("A1").await.unwrap().unwrap();
    let ids: Vec<&str> = item.related_items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["C3"]);

    // Removing an absent link still finds the item.
    assert!(items.remove_related("A1", "B2").await.unwrap());
    assert!(!items.add_related("missing", "B2", "spare").await.unwrap());
    assert!(!items.remove_related("missing", "B2").await.unwrap());
}

pub async fn move_history(repos: &Repositories) {
    let items = repos.items();
    items.insert(&notebook()).await.unwrap();

    assert!(items.append_move_history("A1", "Desk", "Shelf").await.unwrap());
    assert!(items.append_move_history("A1", "Shelf", "Box").await.unwrap());
    assert!(!items.append_move_history("missing", "a", "b").await.unwrap());

    let item = items.find_by_key("A1").await.unwrap().unwrap();
    let moves: Vec<(&str, &str)> = item
        .move_history
        .iter()
        .map(|m| (m.from_location.as_str(), m.to_location.as_str()))
        .collect();
    assert_eq!(moves, vec![("Desk", "Shelf"), ("Shelf", "Box")]);
    assert_eq!(item.move_history[0].date.len(), "2026-01-01 09:30".len());
}

async fn insert_samples(repos: &Repositories) {
    for item in sample_items() {
        repos.items().insert(&item).await.unwrap();
    }
}

fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.item_id.as_str()).collect()
}

pub async fn pagination(repos: &Repositories) {
    insert_samples(repos).await;
    let items = repos.items();

    let all = items.list(&ItemQuery::new()).await.unwrap();
    assert_eq!(ids(&all), vec!["E1", "E2", "K1", "T1", "T2"]);

    let page = items.list(&ItemQuery::new().with_page(1, 2)).await.unwrap();
    assert_eq!(ids(&page), vec!["E2", "K1"]);

    let tail = items.list(&ItemQuery::new().with_page(3, 0)).await.unwrap();
    assert_eq!(ids(&tail), vec!["T1", "T2"]);

    for skip in [5, 6, 100] {
        let empty = items.list(&ItemQuery::new().with_page(skip, 0)).await.unwrap();
        assert!(empty.is_empty(), "skip {skip}");
    }
}

pub async fn filters(repos: &Repositories) {
    insert_samples(repos).await;
    let items = repos.items();

    let cases: Vec<(ItemFilter, Vec<&str>)> = vec![
        (ItemFilter::new().name_contains("drill"), vec!["E2", "T1"]),
        (ItemFilter::new().name_contains("USB-C"), vec!["E1"]),
        (ItemFilter::new().name_contains("."), vec![]),
        (ItemFilter::new().store_place_contains("SHELF"), vec!["T1"]),
        (ItemFilter::new().item_type("Tools"), vec!["T1", "T2"]),
        (ItemFilter::new().item_type("tools"), vec![]),
        (ItemFilter::new().floor("2F").room("Study"), vec!["E1", "E2"]),
        (ItemFilter::new().zone("Fridge"), vec!["K1"]),
        (ItemFilter::new().item_type(""), vec!["E1", "E2", "K1", "T1", "T2"]),
    ];

    for (filter, expected) in cases {
        let found = items
            .list(&ItemQuery::new().with_filter(filter.clone()))
            .await
            .unwrap();
        assert_eq!(ids(&found), expected, "{filter:?}");
        assert_eq!(
            items.count(&filter).await.unwrap(),
            expected.len() as u64,
            "{filter:?}"
        );
    }
}

pub async fn sorting(repos: &Repositories) {
    insert_samples(repos).await;
    let items = repos.items();

    let by = |sort: ItemSort| ItemQuery::new().with_sort(sort);

    let asc = items
        .list(&by(ItemSort::ascending(ItemSortField::WarrantyExpiry)))
        .await
        .unwrap();
    assert_eq!(ids(&asc), vec!["E1", "T1", "E2", "K1", "T2"]);

    let desc = items
        .list(&by(ItemSort::descending(ItemSortField::WarrantyExpiry)))
        .await
        .unwrap();
    assert_eq!(ids(&desc), vec!["T1", "E1", "E2", "K1", "T2"]);

    let names = items
        .list(&by(ItemSort::ascending(ItemSortField::Name)))
        .await
        .unwrap();
    assert_eq!(ids(&names), vec!["T2", "T1", "E2", "K1", "E1"]);

    let usage_page = items
        .list(&by(ItemSort::descending(ItemSortField::UsageExpiry)).with_page(0, 2))
        .await
        .unwrap();
    assert_eq!(ids(&usage_page), vec!["K1", "E1"]);
}

pub async fn stats_and_choices(repos: &Repositories) {
    insert_samples(repos).await;
    let items = repos.items();

    let stats = items.stats().await.unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.with_photo, 1);
    assert_eq!(stats.with_location, 3);
    assert_eq!(stats.with_type, 4);

    let choices = items.location_choices().await.unwrap();
    assert_eq!(choices.floors, vec!["1F", "2F"]);
    assert_eq!(choices.rooms, vec!["Garage", "Kitchen", "Study"]);
    assert_eq!(choices.zones, vec!["Drawer", "Fridge", "Pegboard", "Shelf A"]);
}

// ============================================================================
// Types and locations
// ============================================================================

pub async fn type_cache_coherence(repos: &Repositories) {
    let types = repos.types();

    assert!(types.list_all().await.unwrap().is_empty());

    let tools = types.insert("Tools").await.unwrap();
    assert!(!tools.id.is_empty());
    types.insert("Food").await.unwrap();

    let names: Vec<String> = types.list_all().await.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["Food", "Tools"]);
    assert_eq!(types.find_by_name("Tools").await.unwrap().unwrap().id, tools.id);

    let err = types.insert("Tools").await.unwrap_err();
    assert!(err.is_duplicate_key());

    assert!(types.delete("Tools").await.unwrap());
    assert!(!types.delete("Tools").await.unwrap());
    assert!(types.find_by_name("Tools").await.unwrap().is_none());
}

pub async fn location_lifecycle(repos: &Repositories) {
    let locations = repos.locations();

    let mut ids = Vec::new();
    for location in sample_locations() {
        ids.push(locations.insert(&location).await.unwrap());
    }
    let garage = ids[0].clone();

    let rooms = |list: &[larder_persistence::types::Location]| -> Vec<String> {
        list.iter().map(|l| l.room.clone()).collect()
    };
    let listed = locations.list_all().await.unwrap();
    assert_eq!(rooms(&listed), vec!["Kitchen", "Garage", "Study"]);

    assert!(locations.reorder(&garage, 0).await.unwrap());
    let listed = locations.list_all().await.unwrap();
    assert_eq!(rooms(&listed), vec!["Garage", "Kitchen", "Study"]);

    let patch = LocationPatch {
        zone: Some("Shelf B".to_string()),
        ..Default::default()
    };
    assert!(locations.update(&garage, &patch).await.unwrap());
    let listed = locations.list_all().await.unwrap();
    assert_eq!(listed[0].zone, "Shelf B");
    assert_eq!(listed[0].id, garage);

    assert!(locations.delete(&garage).await.unwrap());
    assert!(!locations.delete(&garage).await.unwrap());
    assert_eq!(locations.list_all().await.unwrap().len(), 2);
}

pub async fn invalid_ids_report_false(repos: &Repositories) {
    let locations = repos.locations();
    locations
        .insert(&NewLocation::new("1F", "Hall", "Closet"))
        .await
        .unwrap();

    for id in ["", "not-an-id", "-1", "zzzzzzzzzzzzzzzzzzzzzzzz"] {
        assert!(!locations.reorder(id, 1).await.unwrap(), "{id:?}");
        assert!(
            !locations
                .update(id, &LocationPatch::default())
                .await
                .unwrap(),
            "{id:?}"
        );
        assert!(!locations.delete(id).await.unwrap(), "{id:?}");
    }
    assert_eq!(locations.list_all().await.unwrap().len(), 1);
}

// ============================================================================
// Users and logs
// ============================================================================

pub async fn user_lifecycle(repos: &Repositories) {
    let users = repos.users();

    let id = users.insert(&alice()).await.unwrap();
    assert!(!id.is_empty());

    let found = users.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(found.id, id);
    assert!(found.requires_password_change());
    assert!(users.find_by_username("ALICE").await.unwrap().is_none());
    assert_eq!(
        users.find_by_username_ci("ALICE").await.unwrap().unwrap().username,
        "alice"
    );
    assert!(users.find_by_username_ci("ali").await.unwrap().is_none());

    assert!(users.insert(&User::new("Alice", "x")).await.unwrap_err().is_duplicate_key());
    assert!(users.insert(&alice()).await.unwrap_err().is_duplicate_key());

    assert!(users.update_credential("alice", "hash-b", true).await.unwrap());
    assert!(!users.update_credential("nobody", "hash-b", true).await.unwrap());
    let found = users.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(found.password_hash, "hash-b");
    assert!(!found.requires_password_change());

    users.insert(&User::new("bob", "hash").with_admin(true)).await.unwrap();
    let names: Vec<String> = users.list_all().await.unwrap().into_iter().map(|u| u.username).collect();
    assert_eq!(names, vec!["alice", "bob"]);
}

pub async fn notification_settings(repos: &Repositories) {
    let users = repos.users();
    users.insert(&alice()).await.unwrap();

    let defaults = users.notification_settings("alice").await.unwrap().unwrap();
    assert_eq!(defaults, NotificationSettings::default());

    let settings = NotificationSettings {
        email: "alice@example.com".to_string(),
        notify_enabled: true,
        notify_days: 14,
        notify_channels: vec!["email".to_string()],
        replacement_intervals: vec![json!({"type": "Filter", "months": 6})],
        ..Default::default()
    };
    assert!(users.set_notification_settings("alice", &settings).await.unwrap());
    assert!(!users.set_notification_settings("nobody", &settings).await.unwrap());

    assert_eq!(users.notification_settings("alice").await.unwrap().unwrap(), settings);
    let user = users.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.notifications, settings);
    assert_eq!(user.password_hash, "hash-a");

    assert!(users.notification_settings("nobody").await.unwrap().is_none());
}

pub async fn login_history(repos: &Repositories) {
    let users = repos.users();
    users.insert(&alice()).await.unwrap();

    let mut last_success = None;
    for n in 1..=12 {
        let event = LoginEvent::now(format!("10.0.0.{n}"), n % 4 == 0);
        assert!(users.record_login_event("alice", &event).await.unwrap());
        if event.success {
            last_success = Some(event);
        }
    }
    assert!(!users.record_login_event("nobody", &LoginEvent::now("1.1.1.1", true)).await.unwrap());

    let user = users.find_by_username("alice").await.unwrap().unwrap();
    let ips: Vec<&str> = user.login_history.iter().map(|e| e.ip.as_str()).collect();
    assert_eq!(ips.len(), 10);
    assert_eq!(ips.first(), Some(&"10.0.0.3"));
    assert_eq!(ips.last(), Some(&"10.0.0.12"));

    let last_success = last_success.unwrap();
    assert_eq!(user.last_login, timestamp::format(&last_success.at));
    assert_eq!(user.last_login_ip, "10.0.0.12");
}

fn at(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, second).unwrap()
}

pub async fn log_ordering(repos: &Repositories) {
    let logs = repos.logs();

    let entries = [
        LogEntry::new("login", "alice").with_created_at(at(1)),
        LogEntry::new("add_item", "alice")
            .with_item("A1", "Notebook")
            .with_details(json!({"quantity": 2}))
            .with_created_at(at(2)),
        LogEntry::new("edit_item", "bob")
            .with_item("A1", "Notebook")
            .with_created_at(at(3)),
        // Same instant as the previous entry; inserted later, so listed first.
        LogEntry::new("add_item", "bob")
            .with_item("B2", "Pen")
            .with_created_at(at(3)),
    ];
    for entry in &entries {
        assert!(!logs.append(entry).await.unwrap().is_empty());
    }

    let all = logs.list(&LogFilter::new(), 0, 0).await.unwrap();
    let actions: Vec<(&str, Option<&str>)> = all
        .iter()
        .map(|e| (e.action.as_str(), e.item_id.as_deref()))
        .collect();
    assert_eq!(
        actions,
        vec![
            ("add_item", Some("B2")),
            ("edit_item", Some("A1")),
            ("add_item", Some("A1")),
            ("login", None),
        ]
    );
    assert_eq!(all[2].details, json!({"quantity": 2}));
    assert_eq!(all[2].created_at, at(2));

    let page = logs.list(&LogFilter::new(), 2, 1).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].action, "edit_item");

    let added = LogFilter::new().action("add_item");
    assert_eq!(logs.count(&added).await.unwrap(), 2);
    assert_eq!(logs.count(&LogFilter::new().user("bob")).await.unwrap(), 2);
    assert_eq!(logs.count(&LogFilter::new()).await.unwrap(), 4);

    let for_item = logs.for_item("A1", 1).await.unwrap();
    assert_eq!(for_item.len(), 1);
    assert_eq!(for_item[0].action, "edit_item");
}

// ============================================================================
// Backup and restore
// ============================================================================

pub async fn seed(repos: &Repositories) {
    insert_samples(repos).await;
    for name in ["Electronics", "Food", "Tools"] {
        repos.types().insert(name).await.unwrap();
    }
    for location in sample_locations() {
        repos.locations().insert(&location).await.unwrap();
    }
    repos.items().toggle_favorite("T1", "alice").await.unwrap();
    repos.items().add_related("T1", "E2", "manual").await.unwrap();
}

/// Everything a caller can observe, minus backend ids.
pub async fn observable_state(repos: &Repositories) -> (Vec<Item>, Vec<String>, Vec<NewLocation>) {
    let backup = repos.backup().await.unwrap();
    (backup.items, backup.types, backup.locations)
}

pub async fn restore_into(source: &Repositories, target: &Repositories) {
    seed(source).await;
    let backup = source.backup().await.unwrap();
    assert_eq!(backup.items.len(), 5);

    let report = target.restore(&backup, RestoreMode::Merge).await.unwrap();
    assert_eq!((report.items, report.types, report.locations), (5, 3, 3));
    assert_eq!(observable_state(target).await, observable_state(source).await);

    // Replace over existing records never duplicates natural keys.
    let report = target.restore(&backup, RestoreMode::Replace).await.unwrap();
    assert_eq!(report.total(), 11);
    assert_eq!(target.locations().list_all().await.unwrap().len(), 3);
    assert_eq!(target.types().list_all().await.unwrap().len(), 3);

    // Merge finds every type present and writes none of them.
    let report = target.restore(&backup, RestoreMode::Merge).await.unwrap();
    assert_eq!((report.items, report.types, report.locations), (5, 0, 3));
    assert_eq!(observable_state(target).await, observable_state(source).await);
}

/// A fixed mixed sequence of writes, for comparing backends.
pub async fn replay_operations(repos: &Repositories) {
    let items = repos.items();
    insert_samples(repos).await;
    items.insert(&notebook()).await.unwrap();

    items
        .update("T1", &ItemPatch::new().quantity(2).store_place("Workbench"))
        .await
        .unwrap();
    items.update("K1", &ItemPatch::new().usage_expiry(None)).await.unwrap();
    items.toggle_favorite("A1", "alice").await.unwrap();
    items.toggle_favorite("A1", "bob").await.unwrap();
    items.toggle_favorite("A1", "alice").await.unwrap();
    items.toggle_favorite("E1", "alice").await.unwrap();
    items.add_related("E1", "E2", "manual").await.unwrap();
    items.add_related("E1", "E2", "manual").await.unwrap();
    items.delete("T2").await.unwrap();
    items.delete("T2").await.unwrap();
    items.update("T2", &ItemPatch::new().name("ghost")).await.unwrap();
}
