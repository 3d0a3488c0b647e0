use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

use super::format::{format_amount, format_date, truncate};
use crate::db::Database;
use crate::models::{current_month, Category, Expense, ExpenseFilter, NewExpense};

/// Flags that take a value; their values are not positional arguments.
const VALUE_FLAGS: &[&str] = &["--category", "--limit", "--month", "--name", "--date"];

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    let out = Output {
        json: args.iter().skip(1).any(|a| a == "--json"),
    };
    let args: Vec<String> = args
        .iter()
        .filter(|a| a.as_str() != "--json")
        .cloned()
        .collect();

    let Some(command) = args.get(1) else {
        return cli_dashboard(&out, db);
    };
    let rest = &args[2..];
    match command.as_str() {
        "categories" | "c" => cli_categories(&out, db),
        "category" => cli_category(rest, &out, db),
        "add-category" => cli_add_category(rest, &out, db),
        "delete-category" => cli_delete_category(rest, &out, db),
        "expenses" | "e" => cli_expenses(rest, &out, db),
        "add-expense" | "add" => cli_add_expense(rest, &out, db),
        "delete-expense" => cli_delete_expense(rest, &out, db),
        "summary" | "s" => cli_summary(rest, &out, db),
        "export" => cli_export(rest, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("spendlog {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("spendlog — personal expense tracker");
    println!();
    println!("Usage: spendlog [command] [--json]");
    println!();
    println!("Commands:");
    println!("  (none)                              Overview: monthly totals, this month, recent");
    println!("  categories                          List categories");
    println!("  category <id>                       Show a category with recent expenses");
    println!("  add-category <name> <color>         Create a category");
    println!("  delete-category <id>                Delete a category and all its expenses");
    println!("  expenses                            List expenses, newest first");
    println!("    --category <id>                   Only this category");
    println!("    --month <YYYY-MM>                 Only this month");
    println!("    --limit <n>                       At most n expenses");
    println!("  add-expense <category-id> <amount>  Record an expense");
    println!("    --name <text>                     What it was for");
    println!("    --date <YYYY-MM-DD>               When (default: now, never in the future)");
    println!("  delete-expense <id>                 Delete an expense");
    println!("  summary monthly                     Totals per month");
    println!("  summary categories [YYYY-MM]        Totals per category (default: this month)");
    println!("  summary category <id>               Totals per month for one category");
    println!("  export [path]                       Export expenses to CSV");
    println!("    --month <YYYY-MM>                 Only this month (default: all)");
    println!("  --json                              Print results as JSON");
    println!("  --help, -h                          Show this help");
    println!("  --version, -V                       Show version");
}

struct Output {
    json: bool,
}

impl Output {
    /// Print `value` as JSON, or run `text` to print the human form.
    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn required<'a>(positional: &[&'a str], idx: usize, usage: &str) -> Result<&'a str> {
    positional
        .get(idx)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Usage: spendlog {usage}"))
}

// ── Categories ────────────────────────────────────────────────

fn cli_categories(out: &Output, db: &mut Database) -> Result<()> {
    let categories = db.list_categories()?;
    out.emit(&categories, || {
        if categories.is_empty() {
            println!("No categories");
            return;
        }
        println!("{:<36}  {:<20} Color", "ID", "Name");
        println!("{}", "─".repeat(66));
        for c in &categories {
            println!("{:<36}  {:<20} {}", c.id, truncate(&c.name, 20), c.color);
        }
    })
}

fn cli_category(args: &[String], out: &Output, db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let id = required(&pos, 0, "category <id>")?;
    let category = db.get_category(id)?;
    if out.json {
        return out.emit(&category, || {});
    }

    let Some(category) = category else {
        println!("Category not found: {id}");
        return Ok(());
    };
    let recent = db.list_expenses(&ExpenseFilter {
        category_id: Some(category.id.clone()),
        limit: Some(10),
        ..Default::default()
    })?;
    let monthly = db.category_monthly_totals(&category.id)?;

    println!("{} ({})", category.name, category.color);
    println!("{}", "─".repeat(40));
    if monthly.is_empty() {
        println!("  No expenses yet");
    }
    for m in &monthly {
        println!("  {}  {:>14}", m.month, format_amount(m.total));
    }
    if !recent.is_empty() {
        println!();
        println!("Recent:");
        print_expenses(&recent, std::slice::from_ref(&category));
    }
    Ok(())
}

fn cli_add_category(args: &[String], out: &Output, db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let name = pos.first().copied().unwrap_or("");
    let color = pos.get(1).copied().unwrap_or("");
    let category = db.create_category(name, color)?;
    out.emit(&category, || {
        println!("Created category {} ({})", category.name, category.id);
    })
}

fn cli_delete_category(args: &[String], out: &Output, db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let id = required(&pos, 0, "delete-category <id>")?;
    let outcome = db.delete_category(id)?;
    out.emit(&outcome, || {
        if outcome.category_deleted {
            println!(
                "Deleted category {id} and {} expense(s)",
                outcome.expenses_deleted
            );
        } else {
            println!("No category {id}; nothing deleted");
        }
    })
}

// ── Expenses ──────────────────────────────────────────────────

fn cli_expenses(args: &[String], out: &Output, db: &mut Database) -> Result<()> {
    let limit = flag(args, "--limit")
        .map(|l| {
            l.parse::<u32>()
                .with_context(|| format!("Invalid --limit: {l}"))
        })
        .transpose()?;
    let filter = ExpenseFilter {
        category_id: flag(args, "--category").map(str::to_string),
        month: flag(args, "--month").map(str::to_string),
        limit,
    };
    let expenses = db.list_expenses(&filter)?;
    let categories = db.list_categories()?;
    out.emit(&expenses, || {
        if expenses.is_empty() {
            println!("No expenses");
        } else {
            print_expenses(&expenses, &categories);
        }
    })
}

fn print_expenses(expenses: &[Expense], categories: &[Category]) {
    println!(
        "{:<36}  {:<16}  {:<16} {:<24} {:>12}",
        "ID", "Date (UTC)", "Category", "Name", "Amount"
    );
    println!("{}", "─".repeat(110));
    for e in expenses {
        let category = Category::find_by_id(categories, &e.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "{:<36}  {:<16}  {:<16} {:<24} {:>12}",
            e.id,
            format_date(&e.created_at),
            truncate(category, 16),
            truncate(e.name.as_deref().unwrap_or(""), 24),
            format_amount(e.amount),
        );
    }
}

fn cli_add_expense(args: &[String], out: &Output, db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let category_id = pos.first().copied().unwrap_or("");
    let amount = pos
        .get(1)
        .map(|a| Decimal::from_str(a.trim()).with_context(|| format!("Invalid amount: {a}")))
        .transpose()?;
    let new = NewExpense {
        category_id: category_id.to_string(),
        amount,
        name: flag(args, "--name").map(str::to_string),
        created_at: flag(args, "--date").map(str::to_string),
    };
    let expense = db.create_expense(new)?;
    out.emit(&expense, || {
        println!(
            "Recorded {} on {} ({})",
            format_amount(expense.amount),
            format_date(&expense.created_at),
            expense.id
        );
    })
}

fn cli_delete_expense(args: &[String], out: &Output, db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    let id = required(&pos, 0, "delete-expense <id>")?;
    let removed = db.delete_expense(id)?;
    out.emit(&serde_json::json!({ "id": id, "deleted": removed }), || {
        if removed {
            println!("Deleted expense {id}");
        } else {
            println!("No expense {id}; nothing deleted");
        }
    })
}

// ── Summaries ─────────────────────────────────────────────────

fn cli_summary(args: &[String], out: &Output, db: &mut Database) -> Result<()> {
    let pos = positionals(args);
    match pos.first().copied().unwrap_or("monthly") {
        "monthly" | "m" => {
            let totals = db.monthly_totals()?;
            out.emit(&totals, || {
                if totals.is_empty() {
                    println!("No expenses");
                }
                for m in &totals {
                    println!("{}  {:>14}", m.month, format_amount(m.total));
                }
            })
        }
        "categories" | "c" => {
            let month = pos.get(1).copied();
            let totals = db.category_totals(month)?;
            let label = month.map(str::to_string).unwrap_or_else(current_month);
            out.emit(&totals, || {
                println!("Spending by category — {label}");
                println!("{}", "─".repeat(40));
                if totals.is_empty() {
                    println!("  No categories");
                }
                for t in &totals {
                    println!("  {:<24} {:>14}", truncate(&t.name, 24), format_amount(t.total));
                }
            })
        }
        "category" => {
            let id = required(&pos, 1, "summary category <id>")?;
            let totals = db.category_monthly_totals(id)?;
            out.emit(&totals, || {
                if totals.is_empty() {
                    println!("No expenses for category {id}");
                }
                for m in &totals {
                    println!("{}  {:>14}", m.month, format_amount(m.total));
                }
            })
        }
        other => anyhow::bail!(
            "Unknown summary: {other} (expected monthly, categories or category)"
        ),
    }
}

fn cli_dashboard(out: &Output, db: &mut Database) -> Result<()> {
    let month = current_month();
    let monthly = db.monthly_totals()?;
    let categories = db.category_totals(Some(month.as_str()))?;
    let recent = db.list_expenses(&ExpenseFilter {
        limit: Some(10),
        ..Default::default()
    })?;
    let all_categories = db.list_categories()?;

    let value = serde_json::json!({
        "monthly": monthly,
        "categories": categories,
        "recent": recent,
    });
    out.emit(&value, || {
        println!("spendlog — {month}");
        println!("{}", "─".repeat(40));
        if monthly.is_empty() {
            println!("  No expenses yet. Try: spendlog add-category Food '#ff0000'");
        }
        for m in &monthly {
            println!("  {}  {:>14}", m.month, format_amount(m.total));
        }
        if !categories.is_empty() {
            println!();
            println!("This month by category:");
            for t in &categories {
                println!("  {:<24} {:>14}", truncate(&t.name, 24), format_amount(t.total));
            }
        }
        if !recent.is_empty() {
            println!();
            println!("Recent:");
            print_expenses(&recent, &all_categories);
        }
    })
}

// ── Export ────────────────────────────────────────────────────

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let month = flag(args, "--month");
    let output_path = positionals(args)
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            let suffix = month.unwrap_or("all");
            format!("{home}/spendlog-export-{suffix}.csv")
        });

    let count = crate::export::export_to_csv(db, Path::new(&output_path), month)?;
    if count == 0 {
        println!("No expenses to export");
    } else {
        println!("Exported {count} expenses to {output_path}");
    }
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
