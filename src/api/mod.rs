//! API handlers for the bookstore REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod relations;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extract and validate the bearer token, if any.
///
/// Username and staff status come from the stored user, not from the token.
async fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<Option<UserClaims>, AppError> {
    let Some(auth_header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_header = auth_header
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

    let mut claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Authentication(e.to_string()))?;

    let user = match state.services.users.get_by_id(claims.user_id).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => {
            return Err(AppError::Authentication("User not found".to_string()))
        }
        Err(e) => return Err(e),
    };
    claims.sub = user.username;
    claims.is_staff = user.is_staff;

    Ok(Some(claims))
}

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts, state)
            .await?
            .map(AuthenticatedUser)
            .ok_or(AppError::NotAuthenticated)
    }
}

/// Extractor for read endpoints: anonymous callers are allowed,
/// but a token that is present must be valid
pub struct MaybeUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(claims_from_parts(parts, state).await?))
    }
}

/// JSON body extractor whose rejections use the `AppError` format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string extractor whose rejections use the `AppError` format
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Every resource route is served with and without the trailing slash
    let book_list = get(books::list_books).post(books::create_book);
    let book_detail = get(books::get_book)
        .put(books::update_book)
        .patch(books::partial_update_book)
        .delete(books::delete_book);
    let relation_detail = get(relations::get_relation).patch(relations::patch_relation);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Books
        .route("/books", book_list.clone())
        .route("/books/", book_list)
        .route("/books/:id", book_detail.clone())
        .route("/books/:id/", book_detail)
        // User-book relations
        .route("/relations/:book_id", relation_detail.clone())
        .route("/relations/:book_id/", relation_detail)
        .with_state(state);

    api.merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
