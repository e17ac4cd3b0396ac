//! Book catalog service

use crate::{
    error::AppResult,
    models::{book::CreateBook, AverageScore, Book, BookDetails},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all books ordered by name
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get a book with its average score
    pub async fn get_book(&self, id: i64) -> AppResult<BookDetails> {
        let book = self.repository.get_book(id).await?;
        let totals = self.repository.loans.score_totals(id).await?;

        Ok(BookDetails {
            book,
            score: AverageScore::from_totals(totals),
        })
    }

    /// Create a new book
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        tracing::debug!(name = %book.name, "Creating book");
        let created = self.repository.books.create(&book.name).await?;
        tracing::info!(book_id = created.id, name = %created.name, "Book created");
        Ok(created)
    }
}
