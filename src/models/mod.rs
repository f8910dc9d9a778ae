//! Data models for the bookstore

pub mod book;
pub mod relation;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookQuery, CreateBook, UpdateBook};
pub use relation::{PatchRelation, UserBookRelation};
pub use user::{User, UserClaims, UserInfo};
