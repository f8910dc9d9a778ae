//! Book catalog service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{two_decimal_places, Book, BookQuery, CreateBook, UpdateBook},
        user::UserClaims,
    },
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

    /// List books matching price, search and ordering options
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        query.validate()?;
        self.repository
            .books
            .search(query)
            .await?
            .into_iter()
            .map(Book::try_from)
            .collect()
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        Book::try_from(self.repository.books.get_by_id(id).await?)
    }

    /// Create a book owned by the caller
    pub async fn create_book(&self, claims: &UserClaims, book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        let price = two_decimal_places(book.price).to_string();
        let id = self
            .repository
            .books
            .create(&book.name, &price, &book.author_name, Some(claims.user_id))
            .await?;

        tracing::info!("Book {} created by user {}", id, claims.user_id);
        self.get_book(id).await
    }

    /// Update a book; only its owner or a staff user may do so
    pub async fn update_book(
        &self,
        claims: &UserClaims,
        id: i64,
        changes: UpdateBook,
    ) -> AppResult<Book> {
        let current = self.repository.books.get_by_id(id).await?;
        claims.require_owner_or_staff(current.owner_id)?;
        changes.validate()?;

        let current = Book::try_from(current)?;
        let name = changes.name.unwrap_or(current.name);
        let price = two_decimal_places(changes.price.unwrap_or(current.price)).to_string();
        let author_name = changes.author_name.unwrap_or(current.author_name);

        self.repository
            .books
            .update(id, &name, &price, &author_name)
            .await?;

        tracing::info!("Book {} updated by user {}", id, claims.user_id);
        self.get_book(id).await
    }

    /// Delete a book; only its owner or a staff user may do so
    pub async fn delete_book(&self, claims: &UserClaims, id: i64) -> AppResult<()> {
        let current = self.repository.books.get_by_id(id).await?;
        claims.require_owner_or_staff(current.owner_id)?;

        self.repository.books.delete(id).await?;
        tracing::info!("Book {} deleted by user {}", id, claims.user_id);
        Ok(())
    }

    /// Number of stored books
    pub async fn count_books(&self) -> AppResult<i64> {
        self.repository.books.count().await
    }
}
