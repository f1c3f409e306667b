// Loans - entity model and the repository that owns the `loans` table

pub mod model;
pub mod repository;

pub use model::{Loan, LoanStatus};
pub use repository::LoanRepository;
