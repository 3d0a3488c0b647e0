//! Read-only spending summaries. Month buckets come from SQLite's
//! `strftime('%Y-%m', ...)` over the stored UTC timestamps; sums are done
//! in `Decimal` so totals stay exact.

use rusqlite::params;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use super::{amount_column, parse_amount, Database};
use crate::error::{Error, Result};
use crate::models::{current_month, validate_month, CategoryTotal, MonthTotal};

impl Database {
    /// Spending per month across all categories, oldest month first.
    /// Months without expenses are omitted.
    pub(crate) fn monthly_totals(&self) -> Result<Vec<MonthTotal>> {
        let mut stmt = self
            .conn
            .prepare("SELECT strftime('%Y-%m', created_at), amount FROM expenses")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, amount_column(row, 1)?))
        })?;
        let totals = fold_by_month(rows)?;
        debug!(months = totals.len(), "computed monthly totals");
        Ok(totals)
    }

    /// Spending per category for `month` (default: the current UTC month).
    /// Every category is listed, with a zero total when it has no expenses
    /// that month. Highest total first, then by name.
    pub(crate) fn category_totals(&self, month: Option<&str>) -> Result<Vec<CategoryTotal>> {
        let month = match month {
            Some(m) => {
                validate_month(m)?;
                m.to_string()
            }
            None => current_month(),
        };

        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.color, e.amount
             FROM categories c
             LEFT JOIN expenses e
               ON e.category_id = c.id AND strftime('%Y-%m', e.created_at) = ?1
             ORDER BY c.rowid",
        )?;
        let rows = stmt.query_map(params![month], |row| {
            let amount: Option<String> = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                amount.map(|a| parse_amount(3, &a)).transpose()?,
            ))
        })?;

        let mut totals: Vec<CategoryTotal> = Vec::new();
        for row in rows {
            let (category_id, name, color, amount) = row?;
            let amount = amount.unwrap_or(Decimal::ZERO);
            match totals.last_mut() {
                Some(last) if last.category_id == category_id => {
                    last.total = last.total.checked_add(amount).ok_or_else(|| {
                        Error::Overflow(format!("category {category_id} in {month}"))
                    })?;
                }
                _ => totals.push(CategoryTotal {
                    category_id,
                    name,
                    color,
                    total: amount,
                }),
            }
        }

        for t in &mut totals {
            t.total = t.total.normalize();
        }
        // Stable, so equal totals and names keep creation order.
        totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        debug!(%month, categories = totals.len(), "computed category totals");
        Ok(totals)
    }

    /// Spending per month for one category, oldest month first. Unknown
    /// categories and categories without expenses give an empty list.
    pub(crate) fn category_monthly_totals(&self, category_id: &str) -> Result<Vec<MonthTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT strftime('%Y-%m', created_at), amount FROM expenses WHERE category_id = ?1",
        )?;
        let rows = stmt.query_map(params![category_id], |row| {
            Ok((row.get::<_, String>(0)?, amount_column(row, 1)?))
        })?;
        let totals = fold_by_month(rows)?;
        debug!(category_id, months = totals.len(), "computed category monthly totals");
        Ok(totals)
    }
}

fn fold_by_month(
    rows: impl Iterator<Item = rusqlite::Result<(String, Decimal)>>,
) -> Result<Vec<MonthTotal>> {
    let mut by_month: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows {
        let (month, amount) = row?;
        let total = by_month.entry(month.clone()).or_default();
        *total = total
            .checked_add(amount)
            .ok_or_else(|| Error::Overflow(format!("month {month}")))?;
    }
    Ok(by_month
        .into_iter()
        .map(|(month, total)| MonthTotal {
            month,
            total: total.normalize(),
        })
        .collect())
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
