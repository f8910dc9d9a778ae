//! User-book relation endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::relation::{PatchRelation, UserBookRelation},
    AppState,
};

use super::{AppJson, AuthenticatedUser};

/// Get the caller's relation to a book
#[utoipa::path(
    get,
    path = "/relations/{book_id}",
    tag = "relations",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Relation state", body = UserBookRelation),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_relation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i64>,
) -> AppResult<Json<UserBookRelation>> {
    let relation = state.services.relations.get_relation(&claims, book_id).await?;
    Ok(Json(relation))
}

/// Like, bookmark or rate a book
#[utoipa::path(
    patch,
    path = "/relations/{book_id}",
    tag = "relations",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = i64, Path, description = "Book ID")
    ),
    request_body = PatchRelation,
    responses(
        (status = 200, description = "Relation updated", body = UserBookRelation),
        (status = 400, description = "Invalid rate", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn patch_relation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i64>,
    AppJson(patch): AppJson<PatchRelation>,
) -> AppResult<Json<UserBookRelation>> {
    let relation = state
        .services
        .relations
        .patch_relation(&claims, book_id, patch)
        .await?;
    Ok(Json(relation))
}
