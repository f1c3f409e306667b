// 🏦 Loan Entity - credit application with an approval lifecycle
//
// Created elsewhere in `pending`, decided exactly once by the approval
// workflow (pending → approved | rejected), never deleted here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// LOAN STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Awaiting a decision
    Pending,

    Approved,

    Rejected,

    /// Funds released to the customer
    Disbursed,

    /// Fully repaid or written off
    Closed,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Disbursed => "disbursed",
            LoanStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LoanStatus::Pending),
            "approved" => Ok(LoanStatus::Approved),
            "rejected" => Ok(LoanStatus::Rejected),
            "disbursed" => Ok(LoanStatus::Disbursed),
            "closed" => Ok(LoanStatus::Closed),
            other => Err(format!("unknown loan status '{}'", other)),
        }
    }
}

// ============================================================================
// LOAN ENTITY
// ============================================================================

/// A row of the `loans` table, serialized in the API's camelCase shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub loan_id: i64,

    /// Owning customer (foreign key to `customers`)
    pub customer_id: i64,

    /// Principal amount
    pub loan_amount: f64,

    /// Annual interest rate as a percentage
    pub interest_rate: f64,

    pub term_months: i64,

    pub status: LoanStatus,

    pub application_date: String,

    // ========================================================================
    // DECISION METADATA (set once by the approval workflow)
    // ========================================================================
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Loan {
    pub fn is_pending(&self) -> bool {
        self.status == LoanStatus::Pending
    }
}
