//! Book model and related types

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{error::AppError, logic};

/// Largest accepted price: 7 digits, 2 of them decimal
fn max_price() -> Decimal {
    Decimal::new(9_999_999, 2)
}

/// Round to exactly two decimal places, the stored and serialized form of prices and ratings.
pub fn two_decimal_places(value: Decimal) -> Decimal {
    let mut value = value.round_dp(2);
    value.rescale(2);
    value
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    let message = if price.is_sign_negative() && !price.is_zero() {
        Some("Ensure this value is greater than or equal to 0.")
    } else if *price > max_price() {
        Some("Ensure that there are no more than 7 digits in total.")
    } else if price.normalize().scale() > 2 {
        Some("Ensure that there are no more than 2 decimal places.")
    } else {
        None
    };

    match message {
        Some(message) => {
            let mut err = ValidationError::new("price");
            err.message = Some(Cow::Borrowed(message));
            Err(err)
        }
        None => Ok(()),
    }
}

/// A price filter must be expressible as a stored price to match exactly
fn validate_price_filter(price: &Decimal) -> Result<(), ValidationError> {
    if price.normalize().scale() > 2 {
        let mut err = ValidationError::new("price");
        err.message = Some(Cow::Borrowed(
            "Ensure that there are no more than 2 decimal places.",
        ));
        return Err(err);
    }
    Ok(())
}

/// Internal row structure for book queries, aggregates included
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub author_name: String,
    pub owner_id: Option<i64>,
    pub owner_name: Option<String>,
    pub annotated_likes: i64,
    pub rate_sum: Option<i64>,
    pub rate_count: i64,
}

/// Book representation returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i64,
    pub name: String,
    #[schema(value_type = String, example = "25.00")]
    pub price: Decimal,
    pub author_name: String,
    /// Owner user id, null for unowned books
    pub owner: Option<i64>,
    /// Owner username, empty for unowned books
    pub owner_name: String,
    /// Number of users who liked the book
    pub annotated_likes: i64,
    /// Average rate, null when nobody rated the book
    #[schema(value_type = Option<String>, example = "4.50")]
    pub rating: Option<Decimal>,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let price: Decimal = row
            .price
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid stored price {:?}: {}", row.price, e)))?;

        let rating = match row.rate_sum {
            Some(sum) if row.rate_count > 0 => {
                Some(two_decimal_places(logic::operations(
                    sum,
                    row.rate_count,
                    '/',
                )?))
            }
            _ => None,
        };

        Ok(Book {
            id: row.id,
            name: row.name,
            price: two_decimal_places(price),
            author_name: row.author_name,
            owner: row.owner_id,
            owner_name: row.owner_name.unwrap_or_default(),
            annotated_likes: row.annotated_likes,
            rating,
        })
    }
}

/// Create (or fully replace) book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = String, example = "25.00")]
    pub price: Decimal,
    #[validate(length(min = 1, max = 255, message = "Author name must be 1 to 255 characters"))]
    pub author_name: String,
}

/// Partial book update request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>, example = "25.00")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1, max = 255, message = "Author name must be 1 to 255 characters"))]
    pub author_name: Option<String>,
}

impl From<CreateBook> for UpdateBook {
    fn from(book: CreateBook) -> Self {
        Self {
            name: Some(book.name),
            price: Some(book.price),
            author_name: Some(book.author_name),
        }
    }
}

/// Book list query parameters
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Exact price match
    #[validate(custom(function = "validate_price_filter"))]
    #[param(value_type = Option<String>)]
    pub price: Option<Decimal>,
    /// Whitespace separated terms, each matched against name or author name
    pub search: Option<String>,
    /// id, name, price or author_name, prefixed by '-' for descending order
    pub ordering: Option<String>,
}

impl BookQuery {
    /// Parsed ordering; unknown fields are ignored
    pub fn ordering(&self) -> Option<BookOrdering> {
        let raw = self.ordering.as_deref()?;
        let ordering = BookOrdering::parse(raw);
        if ordering.is_none() {
            tracing::debug!("Ignoring unknown book ordering {:?}", raw);
        }
        ordering
    }

    /// Non-empty search terms
    pub fn search_terms(&self) -> Vec<&str> {
        self.search
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOrderField {
    Id,
    Name,
    Price,
    AuthorName,
}

impl BookOrderField {
    fn column(&self) -> &'static str {
        match self {
            BookOrderField::Id => "b.id",
            BookOrderField::Name => "b.name",
            // Stored as text; cast so that "100.00" sorts after "50.00"
            BookOrderField::Price => "CAST(b.price AS REAL)",
            BookOrderField::AuthorName => "b.author_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookOrdering {
    pub field: BookOrderField,
    pub descending: bool,
}

impl BookOrdering {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, raw),
        };
        let field = match name {
            "id" => BookOrderField::Id,
            "name" => BookOrderField::Name,
            "price" => BookOrderField::Price,
            "author_name" => BookOrderField::AuthorName,
            _ => return None,
        };
        Some(Self { field, descending })
    }

    /// ORDER BY clause body; id breaks ties
    pub fn to_sql(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {}, b.id ASC", self.field.column(), direction)
    }
}
