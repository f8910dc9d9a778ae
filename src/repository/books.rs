//! Books repository for database operations

use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::book::{two_decimal_places, BookQuery, BookRow},
};

/// Book columns plus owner name and relation aggregates
const BOOK_SELECT: &str = r#"
    SELECT b.id, b.name, b.price, b.author_name, b.owner_id,
           u.username AS owner_name,
           (SELECT COUNT(*) FROM user_book_relations r
             WHERE r.book_id = b.id AND r.liked = 1) AS annotated_likes,
           (SELECT SUM(r.rate) FROM user_book_relations r
             WHERE r.book_id = b.id) AS rate_sum,
           (SELECT COUNT(r.rate) FROM user_book_relations r
             WHERE r.book_id = b.id) AS rate_count
    FROM books b
    LEFT JOIN users u ON u.id = b.owner_id
"#;

/// Escape LIKE wildcards so user input matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case folding applied to both stored search columns and search terms
fn fold(text: &str) -> String {
    text.to_lowercase()
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// List books matching the query
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<BookRow>> {
        let mut builder = QueryBuilder::<Sqlite>::new(BOOK_SELECT);
        builder.push(" WHERE 1=1");

        if let Some(price) = query.price {
            builder
                .push(" AND b.price = ")
                .push_bind(two_decimal_places(price).to_string());
        }

        for term in query.search_terms() {
            let pattern = format!("%{}%", escape_like(&fold(term)));
            builder
                .push(" AND (b.name_folded LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR b.author_name_folded LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        let order_by = query
            .ordering()
            .map(|o| o.to_sql())
            .unwrap_or_else(|| "b.id ASC".to_string());
        builder.push(" ORDER BY ").push(order_by);

        let rows = builder
            .build_query_as::<BookRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<BookRow> {
        sqlx::query_as::<_, BookRow>(&format!("{} WHERE b.id = ?", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Insert a book and return its ID
    pub async fn create(
        &self,
        name: &str,
        price: &str,
        author_name: &str,
        owner_id: Option<i64>,
    ) -> AppResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO books (name, price, author_name, owner_id, name_folded, author_name_folded)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(author_name)
        .bind(owner_id)
        .bind(fold(name))
        .bind(fold(author_name))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Replace the editable columns of a book
    pub async fn update(&self, id: i64, name: &str, price: &str, author_name: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET name = ?, price = ?, author_name = ?, name_folded = ?, author_name_folded = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(author_name)
        .bind(fold(name))
        .bind(fold(author_name))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Delete a book; its relations go with it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
