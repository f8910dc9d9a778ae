//! User-book relation service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        relation::{PatchRelation, UserBookRelation},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RelationsService {
    repository: Repository,
}

impl RelationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Caller's relation to a book; defaults when none is stored yet
    pub async fn get_relation(&self, claims: &UserClaims, book_id: i64) -> AppResult<UserBookRelation> {
        self.repository.books.get_by_id(book_id).await?;

        let relation = self
            .repository
            .relations
            .get(claims.user_id, book_id)
            .await?
            .unwrap_or_else(|| UserBookRelation::new(claims.user_id, book_id));

        Ok(relation)
    }

    /// Apply a partial update to the caller's relation, creating it on first touch
    pub async fn patch_relation(
        &self,
        claims: &UserClaims,
        book_id: i64,
        patch: PatchRelation,
    ) -> AppResult<UserBookRelation> {
        patch.validate()?;
        self.repository.books.get_by_id(book_id).await?;

        let relation = self
            .repository
            .relations
            .upsert(claims.user_id, book_id, &patch)
            .await?;

        tracing::debug!(
            "Relation user={} book={} like={} in_bookmarks={} rate={:?}",
            claims.user_id,
            book_id,
            relation.like,
            relation.in_bookmarks,
            relation.rate
        );

        Ok(relation)
    }
}
