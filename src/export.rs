use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::db::Database;
use crate::models::{format_timestamp, Category, ExpenseFilter};

/// Write expenses (optionally one month only) to a CSV file, newest first.
/// Returns the number of rows written.
pub(crate) fn export_to_csv(db: &Database, path: &Path, month: Option<&str>) -> Result<usize> {
    let categories = db.list_categories()?;
    let expenses = db.list_expenses(&ExpenseFilter {
        month: month.map(str::to_string),
        ..Default::default()
    })?;

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    wtr.write_record(["id", "date", "category", "name", "amount"])?;
    for e in &expenses {
        let category = Category::find_by_id(&categories, &e.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("");
        let date = format_timestamp(&e.created_at);
        let amount = e.amount.to_string();
        wtr.write_record([
            e.id.as_str(),
            date.as_str(),
            category,
            e.name.as_deref().unwrap_or(""),
            amount.as_str(),
        ])?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), rows = expenses.len(), "exported expenses");
    Ok(expenses.len())
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
