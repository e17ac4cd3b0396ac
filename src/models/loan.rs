//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// User rating recorded when a book is returned, between 0 and 10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 10;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(score) if score <= Self::MAX => Ok(Score(score)),
            _ => Err(AppError::Validation(format!(
                "Score must be an integer between 0 and {}",
                Self::MAX
            ))),
        }
    }
}

/// State of a loan. A score exists exactly when the book has been returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStatus {
    Active,
    Returned { at: DateTime<Utc>, score: Score },
}

impl LoanStatus {
    fn from_columns(returned_at: Option<DateTime<Utc>>, user_score: Option<i32>) -> Result<Self, AppError> {
        match (returned_at, user_score) {
            (None, None) => Ok(LoanStatus::Active),
            (Some(at), Some(score)) => Ok(LoanStatus::Returned {
                at,
                score: Score::try_from(i64::from(score))
                    .map_err(|_| AppError::Internal(format!("Stored score {} out of range", score)))?,
            }),
            (returned_at, user_score) => Err(AppError::Internal(format!(
                "Inconsistent loan state: returned_at={:?}, user_score={:?}",
                returned_at, user_score
            ))),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LoanStatus::Active)
    }
}

/// Loan model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Borrow {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub status: LoanStatus,
}

/// Loan row from database
#[derive(Debug, FromRow)]
pub struct BorrowRow {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub user_score: Option<i32>,
}

impl TryFrom<BorrowRow> for Borrow {
    type Error = AppError;

    fn try_from(row: BorrowRow) -> Result<Self, Self::Error> {
        Ok(Borrow {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            borrowed_at: row.borrowed_at,
            status: LoanStatus::from_columns(row.returned_at, row.user_score)?,
        })
    }
}

/// One entry of a user's borrowing history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowedBook {
    pub book_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub status: LoanStatus,
}

/// History row from database
#[derive(Debug, FromRow)]
pub struct BorrowedBookRow {
    pub book_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub user_score: Option<i32>,
}

impl TryFrom<BorrowedBookRow> for BorrowedBook {
    type Error = AppError;

    fn try_from(row: BorrowedBookRow) -> Result<Self, Self::Error> {
        Ok(BorrowedBook {
            book_name: row.book_name,
            borrowed_at: row.borrowed_at,
            status: LoanStatus::from_columns(row.returned_at, row.user_score)?,
        })
    }
}

/// A returned book and the score it was given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PastLoan<'a> {
    pub name: &'a str,
    pub score: Score,
}

/// A book the user currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentLoan<'a> {
    pub name: &'a str,
}

/// All loans of a user, viewed as past and present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanHistory {
    entries: Vec<BorrowedBook>,
}

impl LoanHistory {
    pub fn new(entries: Vec<BorrowedBook>) -> Self {
        Self { entries }
    }

    pub fn past(&self) -> impl Iterator<Item = PastLoan<'_>> {
        self.entries.iter().filter_map(|entry| match entry.status {
            LoanStatus::Returned { score, .. } => Some(PastLoan {
                name: &entry.book_name,
                score,
            }),
            LoanStatus::Active => None,
        })
    }

    pub fn present(&self) -> impl Iterator<Item = PresentLoan<'_>> {
        self.entries
            .iter()
            .filter(|entry| entry.status.is_active())
            .map(|entry| PresentLoan {
                name: &entry.book_name,
            })
    }
}

/// Return book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReturnBook {
    /// Rating between 0 and 10
    #[validate(
        required(message = "Score is required"),
        range(min = 0, max = 10, message = "Score must be an integer between 0 and 10")
    )]
    pub score: Option<i64>,
}
