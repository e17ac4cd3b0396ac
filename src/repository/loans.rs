//! Loans repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{BorrowRow, BorrowedBookRow},
        Borrow, BorrowedBook, Score, ScoreTotals,
    },
};

use super::PgStore;

pub(crate) const BORROW_CONFLICT: &str = "Book is already borrowed";

/// Loan records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoansRepository: Send + Sync {
    /// The loan of `book_id` that has not been returned yet, if any
    async fn find_active_loan_for_book(&self, book_id: i64) -> AppResult<Option<Borrow>>;

    /// Every loan of `user_id`, oldest first
    async fn find_borrows_for_user(&self, user_id: i64) -> AppResult<Vec<BorrowedBook>>;

    /// Open a loan.
    ///
    /// The `borrows_one_active_per_book` index rejects a second active loan of
    /// the same book, which is reported as `Conflict`.
    async fn create(&self, user_id: i64, book_id: i64, borrowed_at: DateTime<Utc>) -> AppResult<Borrow>;

    /// Close the active loan of `book_id` by `user_id`, recording its score.
    ///
    /// Returns `false` when there is no such active loan.
    async fn close(&self, user_id: i64, book_id: i64, score: Score, returned_at: DateTime<Utc>) -> AppResult<bool>;

    /// Number and sum of recorded scores for `book_id`
    async fn score_totals(&self, book_id: i64) -> AppResult<ScoreTotals>;
}

pub(crate) const SELECT_ACTIVE_LOAN: &str = r#"
    SELECT id, user_id, book_id, borrowed_at, returned_at, user_score
    FROM borrows
    WHERE book_id = $1 AND returned_at IS NULL
"#;

pub(crate) const SELECT_USER_BORROWS: &str = r#"
    SELECT b.name AS book_name, l.borrowed_at, l.returned_at, l.user_score
    FROM borrows l
    JOIN books b ON b.id = l.book_id
    WHERE l.user_id = $1
    ORDER BY l.borrowed_at, l.id
"#;

pub(crate) const INSERT_LOAN: &str = r#"
    INSERT INTO borrows (user_id, book_id, borrowed_at)
    VALUES ($1, $2, $3)
    RETURNING id, user_id, book_id, borrowed_at, returned_at, user_score
"#;

// Score and return date are written together, and only on an active loan
pub(crate) const CLOSE_LOAN: &str = r#"
    UPDATE borrows
    SET returned_at = $1, user_score = $2
    WHERE user_id = $3 AND book_id = $4 AND returned_at IS NULL
"#;

pub(crate) const SELECT_SCORE_TOTALS: &str = r#"
    SELECT COUNT(user_score) AS scored, COALESCE(SUM(user_score), 0) AS total
    FROM borrows
    WHERE book_id = $1
"#;

#[async_trait]
impl LoansRepository for PgStore {
    async fn find_active_loan_for_book(&self, book_id: i64) -> AppResult<Option<Borrow>> {
        sqlx::query_as::<_, BorrowRow>(SELECT_ACTIVE_LOAN)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Borrow::try_from)
            .transpose()
    }

    async fn find_borrows_for_user(&self, user_id: i64) -> AppResult<Vec<BorrowedBook>> {
        sqlx::query_as::<_, BorrowedBookRow>(SELECT_USER_BORROWS)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(BorrowedBook::try_from)
            .collect()
    }

    async fn create(&self, user_id: i64, book_id: i64, borrowed_at: DateTime<Utc>) -> AppResult<Borrow> {
        let row = sqlx::query_as::<_, BorrowRow>(INSERT_LOAN)
            .bind(user_id)
            .bind(book_id)
            .bind(borrowed_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as(e, BORROW_CONFLICT))?;
        Borrow::try_from(row)
    }

    async fn close(&self, user_id: i64, book_id: i64, score: Score, returned_at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(CLOSE_LOAN)
            .bind(returned_at)
            .bind(i32::from(score.value()))
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn score_totals(&self, book_id: i64) -> AppResult<ScoreTotals> {
        let totals = sqlx::query_as::<_, ScoreTotals>(SELECT_SCORE_TOTALS)
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(totals)
    }
}
