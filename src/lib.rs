// Library root for the social REST API

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use db::Database;
pub use error::{ApiError, StoreError};
pub use handlers::create_router;
pub use models::{MemberType, Post, Profile, User};
pub use store::{Filter, Record, RecordStore};
