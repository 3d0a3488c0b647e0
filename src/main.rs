mod config;
mod db;
mod error;
mod export;
mod logging;
mod models;
mod run;

use anyhow::Result;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::load()?;
    logging::init(&config.log_filter);

    let db_path = config.db_path()?;
    let mut db = db::Database::open(&db_path, config.busy_timeout(), config.expense_rules())?;
    run::as_cli(&args, &mut db)
}
