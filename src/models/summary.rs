use rust_decimal::Decimal;
use serde::Serialize;

/// Spending for one `YYYY-MM` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: Decimal,
}

/// Spending for one category within a month. Categories without
/// matching expenses carry a zero total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: String,
    pub name: String,
    pub color: String,
    pub total: Decimal,
}
