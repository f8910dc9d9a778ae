//! User-book relations repository

use sqlx::{Pool, Sqlite};

use crate::{
    error::AppResult,
    models::relation::{PatchRelation, UserBookRelation},
};

const RELATION_SELECT: &str = r#"
    SELECT user_id AS user, book_id AS book, liked AS "like", in_bookmarks, rate
    FROM user_book_relations
    WHERE user_id = ? AND book_id = ?
"#;

#[derive(Clone)]
pub struct RelationsRepository {
    pool: Pool<Sqlite>,
}

impl RelationsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get the relation for a (user, book) pair, if one was stored
    pub async fn get(&self, user_id: i64, book_id: i64) -> AppResult<Option<UserBookRelation>> {
        let relation = sqlx::query_as::<_, UserBookRelation>(RELATION_SELECT)
            .bind(user_id)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(relation)
    }

    /// Get or create the relation for a (user, book) pair, then apply the patch.
    ///
    /// Both steps run in one transaction. The unique (user_id, book_id) index
    /// makes concurrent first touches converge on a single row.
    pub async fn upsert(
        &self,
        user_id: i64,
        book_id: i64,
        patch: &PatchRelation,
    ) -> AppResult<UserBookRelation> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO user_book_relations (user_id, book_id)
            VALUES (?, ?)
            ON CONFLICT (user_id, book_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        let mut relation = sqlx::query_as::<_, UserBookRelation>(RELATION_SELECT)
            .bind(user_id)
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;

        relation.apply(patch);

        sqlx::query(
            r#"
            UPDATE user_book_relations
            SET liked = ?, in_bookmarks = ?, rate = ?
            WHERE user_id = ? AND book_id = ?
            "#,
        )
        .bind(relation.like)
        .bind(relation.in_bookmarks)
        .bind(relation.rate)
        .bind(user_id)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(relation)
    }
}
