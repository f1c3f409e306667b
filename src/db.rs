use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open the database at `path` (":memory:" for an in-memory database)
pub fn open(path: &Path) -> Result<Connection> {
    let in_memory = path.as_os_str() == ":memory:";

    let conn = if in_memory {
        Connection::open_in_memory()
    } else {
        Connection::open(path)
    }
    .with_context(|| format!("Failed to open database at {:?}", path))?;

    conn.pragma_update(None, "foreign_keys", "ON")?;

    // Writers from other connections wait instead of failing with SQLITE_BUSY
    conn.busy_timeout(Duration::from_secs(5))?;

    // WAL only applies to file databases
    if !in_memory {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "Database journal mode set");
    }

    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // ==========================================================================
    // Customers Table (owner of loans)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            phone TEXT,
            address TEXT,
            date_of_birth TEXT,
            customer_since TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            status TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'inactive', 'suspended'))
        )",
        [],
    )?;

    // ==========================================================================
    // Loans Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS loans (
            loan_id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL REFERENCES customers(customer_id),
            loan_amount REAL NOT NULL,
            interest_rate REAL NOT NULL,
            term_months INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved', 'rejected', 'disbursed', 'closed')),
            application_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            approval_date TEXT,
            approved_by TEXT,
            rejection_reason TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_loans_customer ON loans(customer_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_loans_status ON loans(status)",
        [],
    )?;

    Ok(())
}
