//! Test fixtures for persistence layer testing.

use chrono::{Days, Local, NaiveDate};

use larder_persistence::types::{Item, NewLocation, User};

/// Today's local date, as the expiry report computes it.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    let today = today();
    if days >= 0 {
        today + Days::new(days as u64)
    } else {
        today - Days::new(days.unsigned_abs())
    }
}

pub fn notebook() -> Item {
    Item::new("A1", "Notebook").with_type("Stationery")
}

/// A small mixed inventory covering every filterable field.
pub fn sample_items() -> Vec<Item> {
    let mut drill = Item::new("T1", "Cordless Drill")
        .with_type("Tools")
        .with_location("1F", "Garage", "Shelf A")
        .with_warranty_expiry(NaiveDate::from_ymd_opt(2027, 5, 1).unwrap());
    drill.store_place = "Garage shelf".to_string();
    drill.photo = "drill.jpg".to_string();
    drill.quantity = 1;

    let mut hammer = Item::new("T2", "Claw hammer")
        .with_type("Tools")
        .with_location("1F", "Garage", "Pegboard");
    hammer.store_place = "Pegboard hook".to_string();

    let mut milk = Item::new("K1", "Oat milk")
        .with_type("Food")
        .with_location("1F", "Kitchen", "Fridge")
        .with_usage_expiry(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
    milk.quantity = 3;
    milk.safety_stock = 1;

    let charger = Item::new("E1", "USB-C charger")
        .with_type("Electronics")
        .with_location("2F", "Study", "Drawer")
        .with_warranty_expiry(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

    let mut manual = Item::new("E2", "Drill manual").with_location("2F", "Study", "Drawer");
    manual.store_place = "Study drawer".to_string();

    vec![drill, hammer, milk, charger, manual]
}

pub fn sample_locations() -> Vec<NewLocation> {
    vec![
        NewLocation::new("1F", "Garage", "Shelf A").with_order(2),
        NewLocation::new("1F", "Kitchen", "Fridge").with_order(1),
        NewLocation::new("2F", "Study", "Drawer").with_order(3),
    ]
}

pub fn alice() -> User {
    User::new("alice", "hash-a")
}
