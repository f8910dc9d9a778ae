//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::{AuthConfig, StaffAccount},
    error::{AppError, AppResult},
    models::user::{RegisterRequest, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a regular (non-staff) user
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;
        let user = self
            .create_user(&request.username, &request.password, false)
            .await?;
        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Create a user with a hashed password
    pub async fn create_user(&self, username: &str, password: &str, is_staff: bool) -> AppResult<User> {
        let hash = self.hash_password(password)?;
        self.repository
            .users
            .create(username, Some(&hash), is_staff)
            .await
    }

    /// Create the configured staff account, or reset its password and staff flag
    pub async fn ensure_staff(&self, account: &StaffAccount) -> AppResult<User> {
        match self.repository.users.get_by_username(&account.username).await? {
            Some(user) => {
                let hash = self.hash_password(&account.password)?;
                self.repository
                    .users
                    .update_credentials(user.id, &hash, true)
                    .await?;
                self.repository.users.get_by_id(user.id).await
            }
            None => self.create_user(&account.username, &account.password, true).await,
        }
    }

    /// Authenticate user by username and password, returning a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Issue a JWT for the given user
    pub fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if let Some(ref hash) = user.password_hash {
            let parsed_hash = PasswordHash::new(hash)
                .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
            return Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok());
        }

        Ok(false)
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
