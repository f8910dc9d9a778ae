//! User-book relation model (like, bookmark, rate)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Lowest and highest accepted rates
pub const RATE_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// Relation between one user and one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserBookRelation {
    #[serde(skip)]
    pub user: i64,
    pub book: i64,
    pub like: bool,
    pub in_bookmarks: bool,
    pub rate: Option<i32>,
}

impl UserBookRelation {
    /// State of a relation that has not been stored yet
    pub fn new(user: i64, book: i64) -> Self {
        Self {
            user,
            book,
            like: false,
            in_bookmarks: false,
            rate: None,
        }
    }

    pub fn apply(&mut self, patch: &PatchRelation) {
        if let Some(like) = patch.like {
            self.like = like;
        }
        if let Some(in_bookmarks) = patch.in_bookmarks {
            self.in_bookmarks = in_bookmarks;
        }
        if patch.rate.is_some() {
            self.rate = patch.rate;
        }
    }
}

/// Partial relation update request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PatchRelation {
    pub like: Option<bool>,
    pub in_bookmarks: Option<bool>,
    #[validate(range(min = 1, max = 5, message = "Rate must be between 1 and 5"))]
    pub rate: Option<i32>,
}
