mod category;
mod expense;
mod month;
mod summary;

pub use category::Category;
pub use expense::{Expense, ExpenseFilter, ExpenseRules, NewExpense};
pub(crate) use month::{current_month, format_timestamp, month_key, parse_timestamp, validate_month};
pub use summary::{CategoryTotal, MonthTotal};
