//! Data models for the library server

pub mod book;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use book::{AverageScore, Book, BookDetails, ScoreTotals};
pub use loan::{Borrow, BorrowedBook, LoanHistory, LoanStatus, Score};
pub use user::User;
