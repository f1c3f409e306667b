// ✅ Approval request validation
//
// Turns a raw JSON body into a typed `LoanApproval` before any storage
// access. A rejection always carries a non-blank reason.

use crate::error::{LoanError, Result};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approve)
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Decision::Approve => None,
            Decision::Reject { reason } => Some(reason),
        }
    }
}

/// A validated approval command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanApproval {
    pub loan_id: i64,
    pub approved_by: String,
    pub decision: Decision,
}

impl LoanApproval {
    pub fn approve(loan_id: i64, approved_by: impl Into<String>) -> Self {
        LoanApproval {
            loan_id,
            approved_by: approved_by.into(),
            decision: Decision::Approve,
        }
    }

    pub fn reject(loan_id: i64, approved_by: impl Into<String>, reason: impl Into<String>) -> Self {
        LoanApproval {
            loan_id,
            approved_by: approved_by.into(),
            decision: Decision::Reject {
                reason: reason.into(),
            },
        }
    }

    /// Validate a `{ loanId, approved, approvedBy, rejectionReason? }` body.
    ///
    /// Checks run in field order and the first failure is reported.
    pub fn from_json(body: &Value) -> Result<Self> {
        // Any non-zero number passes; unknown ids are left to storage (404)
        let raw_id = body
            .get("loanId")
            .filter(|v| v.is_number() && v.as_f64() != Some(0.0))
            .ok_or_else(|| {
                LoanError::validation("loanId is required and must be a number", "loanId")
            })?;
        let loan_id = whole_number(raw_id).ok_or_else(|| {
            LoanError::validation("loanId must be a whole number", "loanId")
        })?;

        let approved = body
            .get("approved")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                LoanError::validation("approved is required and must be a boolean", "approved")
            })?;

        let approved_by = non_blank_str(body, "approvedBy").ok_or_else(|| {
            LoanError::validation("approvedBy is required and must be a string", "approvedBy")
        })?;

        let decision = if approved {
            Decision::Approve
        } else {
            let reason = non_blank_str(body, "rejectionReason").ok_or_else(|| {
                LoanError::validation(
                    "rejectionReason is required when rejecting a loan",
                    "rejectionReason",
                )
            })?;
            Decision::Reject {
                reason: reason.to_string(),
            }
        };

        Ok(LoanApproval {
            loan_id,
            approved_by: approved_by.to_string(),
            decision,
        })
    }
}

/// `1` and `1.0` both map to 1; fractions and out-of-range values do not map
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64)
            .map(|n| n as i64)
    })
}

fn non_blank_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}
