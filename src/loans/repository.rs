// Loan Repository - parameterized reads and the approval transition
//
// One connection per process, shared behind a mutex. The repository is
// cheap to clone and is handed to request handlers explicitly.

use super::model::{Loan, LoanStatus};
use crate::approval::LoanApproval;
use crate::error::{LoanError, Result};
use anyhow::anyhow;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

const LOAN_COLUMNS: &str = "loan_id, customer_id, loan_amount, interest_rate, term_months,
    status, application_date, approval_date, approved_by, rejection_reason";

#[derive(Clone)]
pub struct LoanRepository {
    db: Arc<Mutex<Connection>>,
}

impl LoanRepository {
    pub fn new(conn: Connection) -> Self {
        LoanRepository {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| LoanError::Internal(anyhow!("database connection lock poisoned")))
    }

    /// Run `f` against the shared connection (schema setup, seeding, tests)
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Find loan by ID
    pub fn find_by_id(&self, id: i64) -> Result<Option<Loan>> {
        let conn = self.lock()?;
        select_loan(&conn, id)
    }

    /// Decide a pending loan.
    ///
    /// Runs as one immediate transaction, and the update itself only matches
    /// rows still in `pending`, so two concurrent decisions on the same loan
    /// cannot both succeed.
    pub fn approve(&self, approval: &LoanApproval) -> Result<Loan> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = approval.loan_id;

        let existing = select_loan(&tx, id)?.ok_or_else(|| LoanError::not_found("Loan", id))?;
        if !existing.is_pending() {
            return Err(not_pending(existing.status));
        }

        let new_status = if approval.decision.is_approved() {
            LoanStatus::Approved
        } else {
            LoanStatus::Rejected
        };
        let approval_date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let changed = tx.execute(
            "UPDATE loans
             SET status = ?1, approval_date = ?2, approved_by = ?3, rejection_reason = ?4
             WHERE loan_id = ?5 AND status = 'pending'",
            params![
                new_status.as_str(),
                approval_date,
                approval.approved_by,
                approval.decision.rejection_reason(),
                id,
            ],
        )?;

        if changed == 0 {
            // The immediate transaction holds the write lock, so this only
            // fires if another process wrote to a file database without taking it
            return Err(match select_loan(&tx, id)? {
                None => LoanError::not_found("Loan", id),
                Some(current) => not_pending(current.status),
            });
        }

        let updated = select_loan(&tx, id)?.ok_or_else(|| LoanError::not_found("Loan", id))?;
        tx.commit()?;

        tracing::debug!(
            loan_id = id,
            status = %updated.status,
            approved_by = %approval.approved_by,
            "Loan decision persisted"
        );

        Ok(updated)
    }
}

fn not_pending(status: LoanStatus) -> LoanError {
    LoanError::validation(
        format!(
            "Cannot approve loan with status '{}'. Only pending loans can be approved.",
            status
        ),
        "status",
    )
}

fn select_loan(conn: &Connection, id: i64) -> Result<Option<Loan>> {
    let sql = format!("SELECT {} FROM loans WHERE loan_id = ?1", LOAN_COLUMNS);
    let loan = conn.query_row(&sql, params![id], row_to_loan).optional()?;
    Ok(loan)
}

fn row_to_loan(row: &Row<'_>) -> rusqlite::Result<Loan> {
    let status_str: String = row.get(5)?;
    let status = status_str.parse::<LoanStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })?;

    Ok(Loan {
        loan_id: row.get(0)?,
        customer_id: row.get(1)?,
        loan_amount: row.get(2)?,
        interest_rate: row.get(3)?,
        term_months: row.get(4)?,
        status,
        application_date: row.get(6)?,
        approval_date: row.get(7)?,
        approved_by: row.get(8)?,
        rejection_reason: row.get(9)?,
    })
}
