#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::Error;
use crate::models::{ExpenseFilter, NewExpense};
use rust_decimal_macros::dec;

fn add(db: &mut Database, category_id: &str, amount: Decimal, date: &str) {
    db.create_expense(NewExpense::new(category_id, amount).on(date))
        .unwrap();
}

fn month(month: &str, total: Decimal) -> MonthTotal {
    MonthTotal {
        month: month.into(),
        total,
    }
}

// ── Monthly totals ────────────────────────────────────────────

#[test]
fn test_monthly_totals_empty() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.monthly_totals().unwrap().is_empty());
}

#[test]
fn test_monthly_totals_scenario() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food", "#ff0000").unwrap();
    db.create_expense(
        NewExpense::new(&food.id, dec!(20))
            .with_name("lunch")
            .on("2024-05-10"),
    )
    .unwrap();
    add(&mut db, &food.id, dec!(30), "2024-06-01");

    assert_eq!(
        db.monthly_totals().unwrap(),
        vec![month("2024-05", dec!(20)), month("2024-06", dec!(30))]
    );
    assert_eq!(
        db.category_totals(Some("2024-05")).unwrap(),
        vec![CategoryTotal {
            category_id: food.id.clone(),
            name: "Food".into(),
            color: "#ff0000".into(),
            total: dec!(20),
        }]
    );
}

#[test]
fn test_monthly_totals_single_month_sums_everything() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food", "red").unwrap();
    let rent = db.create_category("Rent", "blue").unwrap();
    add(&mut db, &food.id, dec!(0.10), "2024-03-01");
    add(&mut db, &food.id, dec!(0.20), "2024-03-15");
    add(&mut db, &rent.id, dec!(1200), "2024-03-31");
    db.create_expense(NewExpense::new(&rent.id, dec!(4.70)).on("2024-03-31T23:59:59Z"))
        .unwrap();

    assert_eq!(
        db.monthly_totals().unwrap(),
        vec![month("2024-03", dec!(1205))]
    );
}

#[test]
fn test_monthly_totals_sorted_and_sparse() {
    let mut db = Database::open_in_memory().unwrap();
    let cat = db.create_category("Misc", "gray").unwrap();
    add(&mut db, &cat.id, dec!(5), "2024-11-02");
    add(&mut db, &cat.id, dec!(7), "2023-12-25");
    add(&mut db, &cat.id, dec!(1), "2024-02-29");

    let months: Vec<String> = db
        .monthly_totals()
        .unwrap()
        .into_iter()
        .map(|m| m.month)
        .collect();
    assert_eq!(months, ["2023-12", "2024-02", "2024-11"]);
}

#[test]
fn test_monthly_totals_use_utc_month() {
    let mut db = Database::open_in_memory().unwrap();
    let cat = db.create_category("Misc", "gray").unwrap();
    // 22:30 on Jan 31 at UTC-05:00 is already February in UTC.
    db.create_expense(NewExpense::new(&cat.id, dec!(9)).on("2024-01-31T22:30:00-05:00"))
        .unwrap();

    assert_eq!(db.monthly_totals().unwrap(), vec![month("2024-02", dec!(9))]);
}

// ── Category totals ───────────────────────────────────────────

#[test]
fn test_category_totals_left_join() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food", "red").unwrap();
    let rent = db.create_category("Rent", "blue").unwrap();
    let fun = db.create_category("Fun", "green").unwrap();
    add(&mut db, &food.id, dec!(15), "2024-04-03");
    add(&mut db, &food.id, dec!(5), "2024-04-20");
    add(&mut db, &rent.id, dec!(900), "2024-04-01");
    add(&mut db, &fun.id, dec!(50), "2024-03-30");

    let totals = db.category_totals(Some("2024-04")).unwrap();
    assert_eq!(totals.len(), 3);
    let summary: Vec<(&str, Decimal)> = totals
        .iter()
        .map(|t| (t.name.as_str(), t.total))
        .collect();
    assert_eq!(
        summary,
        vec![("Rent", dec!(900)), ("Food", dec!(20)), ("Fun", dec!(0))]
    );
    assert_eq!(totals[2].category_id, fun.id);
    assert_eq!(totals[2].color, "green");
}

#[test]
fn test_category_totals_one_entry_per_category() {
    let mut db = Database::open_in_memory().unwrap();
    let ids: Vec<String> = ["A", "B", "C", "D"]
        .iter()
        .map(|n| db.create_category(n, "gray").unwrap().id)
        .collect();
    for id in &ids {
        add(&mut db, id, dec!(1), "2024-01-10");
        add(&mut db, id, dec!(2), "2024-01-11");
    }

    for m in ["2024-01", "2024-02", "1999-07"] {
        let totals = db.category_totals(Some(m)).unwrap();
        assert_eq!(totals.len(), ids.len(), "month {m}");
        for id in &ids {
            assert_eq!(totals.iter().filter(|t| &t.category_id == id).count(), 1);
        }
    }
}

#[test]
fn test_category_totals_ties_ordered_by_name() {
    let db = Database::open_in_memory().unwrap();
    db.create_category("Zoo", "gray").unwrap();
    db.create_category("Art", "gray").unwrap();
    db.create_category("Mid", "gray").unwrap();

    let names: Vec<String> = db
        .category_totals(Some("2024-01"))
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, ["Art", "Mid", "Zoo"]);
}

#[test]
fn test_category_totals_no_categories() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.category_totals(Some("2024-01")).unwrap().is_empty());
    assert!(db.category_totals(None).unwrap().is_empty());
}

#[test]
fn test_category_totals_default_to_current_month() {
    let mut db = Database::open_in_memory().unwrap();
    let cat = db.create_category("Food", "red").unwrap();
    db.create_expense(NewExpense::new(&cat.id, dec!(8))).unwrap();
    add(&mut db, &cat.id, dec!(100), "2001-01-01");

    let totals = db.category_totals(None).unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].total, dec!(8));
}

#[test]
fn test_category_totals_invalid_month() {
    let db = Database::open_in_memory().unwrap();
    assert!(matches!(
        db.category_totals(Some("May 2024")),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_totals_overflow_is_an_error() {
    let mut db = Database::open_in_memory().unwrap();
    let cat = db.create_category("Huge", "gray").unwrap();
    add(&mut db, &cat.id, Decimal::MAX, "2024-05-01");
    add(&mut db, &cat.id, Decimal::MAX, "2024-05-02");

    assert!(matches!(db.monthly_totals(), Err(Error::Overflow(_))));
    assert!(matches!(
        db.category_totals(Some("2024-05")),
        Err(Error::Overflow(_))
    ));
    assert!(matches!(
        db.category_monthly_totals(&cat.id),
        Err(Error::Overflow(_))
    ));
    // Other months still sum.
    assert_eq!(db.category_totals(Some("2024-06")).unwrap()[0].total, dec!(0));
}

// ── Category monthly totals ───────────────────────────────────

#[test]
fn test_category_monthly_totals() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food", "red").unwrap();
    let rent = db.create_category("Rent", "blue").unwrap();
    add(&mut db, &food.id, dec!(3), "2024-02-14");
    add(&mut db, &food.id, dec!(4), "2024-01-09");
    add(&mut db, &food.id, dec!(6), "2024-02-01");
    add(&mut db, &rent.id, dec!(900), "2024-02-01");

    assert_eq!(
        db.category_monthly_totals(&food.id).unwrap(),
        vec![month("2024-01", dec!(4)), month("2024-02", dec!(9))]
    );
    assert_eq!(
        db.category_monthly_totals(&rent.id).unwrap(),
        vec![month("2024-02", dec!(900))]
    );
}

#[test]
fn test_category_monthly_totals_empty() {
    let db = Database::open_in_memory().unwrap();
    let cat = db.create_category("Unused", "gray").unwrap();
    assert!(db.category_monthly_totals(&cat.id).unwrap().is_empty());
    assert!(db.category_monthly_totals("ghost").unwrap().is_empty());
}

#[test]
fn test_summaries_follow_deletes() {
    let mut db = Database::open_in_memory().unwrap();
    let food = db.create_category("Food", "red").unwrap();
    let rent = db.create_category("Rent", "blue").unwrap();
    add(&mut db, &food.id, dec!(10), "2024-01-05");
    add(&mut db, &rent.id, dec!(900), "2024-01-01");

    db.delete_category(&food.id).unwrap();

    assert_eq!(db.monthly_totals().unwrap(), vec![month("2024-01", dec!(900))]);
    assert!(db.category_monthly_totals(&food.id).unwrap().is_empty());
    let totals = db.category_totals(Some("2024-01")).unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].category_id, rent.id);

    let rent_expense = db.list_expenses(&ExpenseFilter::default()).unwrap();
    db.delete_expense(&rent_expense[0].id).unwrap();
    assert!(db.monthly_totals().unwrap().is_empty());
}
