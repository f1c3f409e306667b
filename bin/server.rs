// Bank Loans - Web Server
// REST API with Axum over the SQLite loans store

use anyhow::{Context, Result};
use bank_loans::api::{router, AppState};
use bank_loans::{open, setup_database, Config, LoanRepository};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Open database (schema is created if missing)
    let conn = open(&config.db_path)?;
    setup_database(&conn)?;
    tracing::info!(db = ?config.db_path, "Database opened");

    // One repository for the whole process, shared by every request
    let state = AppState::new(LoanRepository::new(conn), config.environment);
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(
        addr = %addr,
        environment = config.environment.as_str(),
        "Server running, approve loans at POST /api/loan/approve"
    );

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
