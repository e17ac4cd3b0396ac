//! Loan management service: borrowing and returning books

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::Score,
    repository::Repository,
};

pub(crate) const NOT_BORROWED: &str = "Book is not borrowed by this user";

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Open a loan of `book_id` for `user_id`.
    ///
    /// Fails with `NotFound` when the user or the book does not exist and with
    /// `Conflict` when the book is already on loan, including when another
    /// borrow of the same book wins a race against this one.
    pub async fn borrow_book(&self, user_id: i64, book_id: i64) -> AppResult<()> {
        self.repository.get_user(user_id).await?;
        self.repository.get_book(book_id).await?;

        if let Some(active) = self.repository.loans.find_active_loan_for_book(book_id).await? {
            tracing::debug!(loan_id = active.id, book_id, "Book already on loan");
            return Err(AppError::Conflict(crate::repository::loans::BORROW_CONFLICT.to_string()));
        }

        let loan = self.repository.loans.create(user_id, book_id, Utc::now()).await?;
        tracing::info!(loan_id = loan.id, user_id, book_id, "Book borrowed");
        Ok(())
    }

    /// Close the active loan of `book_id` by `user_id` and record `score`.
    ///
    /// A loan can only be returned once; later calls fail with `InvalidArgument`.
    pub async fn return_book(&self, user_id: i64, book_id: i64, score: i64) -> AppResult<()> {
        let score = Score::try_from(score)?;

        self.repository.get_user(user_id).await?;
        self.repository.get_book(book_id).await?;

        if !self.repository.loans.close(user_id, book_id, score, Utc::now()).await? {
            return Err(AppError::Validation(NOT_BORROWED.to_string()));
        }

        tracing::info!(user_id, book_id, score = score.value(), "Book returned");
        Ok(())
    }
}
