mod consistency;
mod schema;
mod summary;

use anyhow::Context;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::*;

pub(crate) use consistency::CascadeOutcome;

pub(crate) struct Database {
    conn: Connection,
    rules: ExpenseRules,
}

impl Database {
    pub(crate) fn open(
        path: &Path,
        busy_timeout: Duration,
        rules: ExpenseRules,
    ) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        conn.busy_timeout(busy_timeout)
            .context("Failed to set busy timeout")?;
        let mut db = Self { conn, rules };
        db.migrate().context("Database migration failed")?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self {
            conn,
            rules: ExpenseRules::default(),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            let tx = self.conn.transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tx.commit()?;
            info!(version = schema::CURRENT_VERSION, "initialized schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            info!(from = current, to = schema::CURRENT_VERSION, "migrated schema");
        }

        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn create_category(&self, name: &str, color: &str) -> Result<Category> {
        let category = Category::new(name, color)
            .inspect_err(|e| warn!(error = %e, "rejected category"))?;
        self.conn.execute(
            "INSERT INTO categories (id, name, color) VALUES (?1, ?2, ?3)",
            params![category.id, category.name, category.color],
        )?;
        info!(id = %category.id, name = %category.name, "created category");
        Ok(category)
    }

    pub(crate) fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, name, color FROM categories WHERE id = ?1",
            params![id],
            category_from_row,
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All categories in the order they were created.
    pub(crate) fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM categories ORDER BY rowid")?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_category(&mut self, id: &str) -> Result<CascadeOutcome> {
        self.delete_category_cascade(id)
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn create_expense(&mut self, new: NewExpense) -> Result<Expense> {
        let expense = new
            .into_expense(&self.rules, Utc::now())
            .inspect_err(|e| warn!(error = %e, "rejected expense"))?;

        // The category check and the insert share one write lock, so a
        // concurrent cascade either runs entirely before or entirely after.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        consistency::validate_expense_category(&tx, &expense.category_id)
            .inspect_err(|e| warn!(error = %e, "rejected expense"))?;
        tx.execute(
            "INSERT INTO expenses (id, category_id, amount, name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                expense.id,
                expense.category_id,
                expense.amount.to_string(),
                expense.name,
                format_timestamp(&expense.created_at),
            ],
        )?;
        tx.commit()?;

        info!(
            id = %expense.id,
            category_id = %expense.category_id,
            amount = %expense.amount,
            "created expense"
        );
        Ok(expense)
    }

    /// Expenses newest first. Equal timestamps fall back to insertion order,
    /// latest first.
    pub(crate) fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut sql = String::from(
            "SELECT id, category_id, amount, name, created_at FROM expenses WHERE 1=1",
        );
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        // An empty category or a zero limit means "no filter".
        if let Some(cid) = filter.category_id.as_deref().filter(|c| !c.is_empty()) {
            sql.push_str(&format!(" AND category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(cid.to_string()));
        }
        if let Some(m) = &filter.month {
            validate_month(m)?;
            sql.push_str(&format!(" AND created_at LIKE ?{}", param_values.len() + 1));
            param_values.push(Box::new(format!("{m}%")));
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        if let Some(l) = filter.limit.filter(|&l| l > 0) {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(i64::from(l)));
        }

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), expense_from_row)?;
        let expenses = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(count = expenses.len(), ?filter, "listed expenses");
        Ok(expenses)
    }

    /// Remove one expense. Unknown ids are not an error; the return value
    /// says whether a row was actually removed.
    pub(crate) fn delete_expense(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        info!(id, removed, "deleted expense");
        Ok(removed > 0)
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
    })
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let created_at: String = row.get(4)?;
    Ok(Expense {
        id: row.get(0)?,
        category_id: row.get(1)?,
        amount: amount_column(row, 2)?,
        name: row.get(3)?,
        created_at: parse_timestamp(&created_at).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("invalid timestamp '{created_at}'").into(),
            )
        })?,
    })
}

/// Read a TEXT amount column as an exact decimal.
fn amount_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    parse_amount(idx, &raw)
}

fn parse_amount(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
