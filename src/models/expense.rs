use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::month::YEAR_RANGE;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validation rules applied to new expenses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpenseRules {
    /// Accept zero and negative amounts (refunds, corrections).
    pub allow_non_positive_amounts: bool,
}

/// An expense as submitted by a caller, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    pub category_id: String,
    pub amount: Option<Decimal>,
    pub name: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp. Defaults to now.
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category_id: Option<String>,
    /// Restrict to one `YYYY-MM` bucket.
    pub month: Option<String>,
    pub limit: Option<u32>,
}

impl NewExpense {
    pub fn new(category_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            category_id: category_id.into(),
            amount: Some(amount),
            name: None,
            created_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    /// Check the fields and build the record to store. Category existence
    /// is checked separately by the store, inside its write transaction.
    pub(crate) fn into_expense(self, rules: &ExpenseRules, now: DateTime<Utc>) -> Result<Expense> {
        let category_id = self.category_id.trim();
        let amount = match self.amount {
            Some(amount) if !category_id.is_empty() => amount,
            _ => return Err(Error::validation("categoryId and amount required")),
        };
        if amount <= Decimal::ZERO && !rules.allow_non_positive_amounts {
            return Err(Error::validation(format!(
                "amount must be positive, got {amount}"
            )));
        }

        let now = now.trunc_subsecs(0);
        let created_at = match self.created_at.as_deref() {
            Some(raw) => resolve_created_at(raw, now)?,
            None => now,
        };

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Expense {
            id: uuid::Uuid::new_v4().to_string(),
            category_id: category_id.to_string(),
            amount: amount.normalize(),
            name,
            created_at,
        })
    }
}

/// Turn a caller-supplied date into a stored timestamp. A bare date becomes
/// midnight UTC, except today's date which resolves to `now`. Dates after
/// today, and years that would not store as four digits, are rejected.
fn resolve_created_at(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    let today = now.date_naive();

    let ts = if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if date == today {
            return Ok(now);
        }
        date.and_time(NaiveTime::MIN).and_utc()
    } else {
        DateTime::parse_from_rfc3339(raw)
            .map_err(|_| {
                Error::validation(format!(
                    "invalid createdAt '{raw}', expected YYYY-MM-DD or RFC 3339"
                ))
            })?
            .with_timezone(&Utc)
            .trunc_subsecs(0)
    };

    if !YEAR_RANGE.contains(&ts.year()) {
        return Err(Error::validation(format!(
            "createdAt year {} is outside {}..={}",
            ts.year(),
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )));
    }
    if ts.date_naive() > today {
        return Err(Error::validation(format!(
            "createdAt {} is in the future",
            ts.date_naive()
        )));
    }
    Ok(ts)
}
