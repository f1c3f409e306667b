// Bank Loans - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod approval;
pub mod config;
pub mod db;
pub mod error;
pub mod loans;

// Only compile the HTTP layer when the server feature is enabled
#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use approval::{Decision, LoanApproval};
pub use config::{Config, Environment};
pub use db::{open, setup_database};
pub use error::{LoanError, Result};
pub use loans::{Loan, LoanRepository, LoanStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
