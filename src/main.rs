use anyhow::Result;
use std::env;
use std::path::PathBuf;

use bank_loans::{open, setup_database, Config};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("migrate") => run_migrate(args.get(2))?,
        Some("version") => println!("bank-loans {}", bank_loans::VERSION),
        _ => print_usage(),
    }

    Ok(())
}

/// Create the schema in the configured (or given) database file
fn run_migrate(path: Option<&String>) -> Result<()> {
    let db_path = match path {
        Some(p) => PathBuf::from(p),
        None => Config::from_env()?.db_path,
    };

    let conn = open(&db_path)?;
    setup_database(&conn)?;

    tracing::info!(db = ?db_path, "Database schema is up to date");
    Ok(())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("   bank-loans migrate [DB_PATH]   create tables (default: $BANK_API_DB or bank.db)");
    eprintln!("   bank-loans version");
    eprintln!();
    eprintln!("   Serve the API with: cargo run --bin bank-server");
}
