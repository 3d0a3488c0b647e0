//! Rules that span both tables: cascade delete of a category and the
//! existence check an expense needs before it can reference one.

use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;
use tracing::info;

use super::Database;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CascadeOutcome {
    pub(crate) category_deleted: bool,
    pub(crate) expenses_deleted: usize,
}

impl Database {
    /// Delete a category together with every expense that references it.
    ///
    /// Both deletes run in one immediate transaction. If either statement
    /// fails the transaction is dropped uncommitted and nothing changes.
    /// An unknown id commits an empty transaction and reports
    /// `category_deleted == false`.
    pub(crate) fn delete_category_cascade(&mut self, id: &str) -> Result<CascadeOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let expenses_deleted =
            tx.execute("DELETE FROM expenses WHERE category_id = ?1", params![id])?;
        let categories_deleted = tx.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        tx.commit()?;

        let outcome = CascadeOutcome {
            category_deleted: categories_deleted > 0,
            expenses_deleted,
        };
        info!(
            id,
            category_deleted = outcome.category_deleted,
            expenses_deleted = outcome.expenses_deleted,
            "deleted category"
        );
        Ok(outcome)
    }
}

/// Fails with `NotFound` unless the category exists. Takes a plain
/// connection so it can run inside an open transaction.
pub(super) fn validate_expense_category(conn: &Connection, category_id: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
        params![category_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(Error::category_not_found(category_id))
    }
}
