//! Business logic services

pub mod books;
pub mod relations;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub relations: relations::RelationsService,
    pub users: users::UsersService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            relations: relations::RelationsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.repository.ping().await
    }
}
