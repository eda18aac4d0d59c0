use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::error::StoreError;
use crate::models::{MemberType, Post, Profile, User};
use crate::store::{postgres, Filter, MemoryStore, PgStore, RecordStore};

/// One record store per collection, handed to every route group.
///
/// Cloning is cheap; all clones share the same collections.
#[derive(Clone)]
pub struct Database {
    pub users: Arc<dyn RecordStore<User>>,
    pub profiles: Arc<dyn RecordStore<Profile>>,
    pub posts: Arc<dyn RecordStore<Post>>,
    pub member_types: Arc<dyn RecordStore<MemberType>>,
}

impl Database {
    /// Empty process-local collections.
    pub fn in_memory() -> Self {
        Database {
            users: Arc::new(MemoryStore::<User>::new()),
            profiles: Arc::new(MemoryStore::<Profile>::new()),
            posts: Arc::new(MemoryStore::<Post>::new()),
            member_types: Arc::new(MemoryStore::<MemberType>::new()),
        }
    }

    /// Connects to PostgreSQL and creates any missing collection tables.
    pub async fn postgres(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = postgres::connect(config).await?;

        let users = PgStore::<User>::new(pool.clone());
        let profiles = PgStore::<Profile>::new(pool.clone());
        let posts = PgStore::<Post>::new(pool.clone());
        let member_types = PgStore::<MemberType>::new(pool);

        users.migrate().await?;
        profiles.migrate().await?;
        posts.migrate().await?;
        member_types.migrate().await?;
        info!("Database migrations completed successfully");

        Ok(Database {
            users: Arc::new(users),
            profiles: Arc::new(profiles),
            posts: Arc::new(posts),
            member_types: Arc::new(member_types),
        })
    }

    pub async fn open(backend: &StoreBackend) -> Result<Self, StoreError> {
        match backend {
            StoreBackend::Memory => Ok(Self::in_memory()),
            StoreBackend::Postgres(config) => Self::postgres(config).await,
        }
    }

    /// Inserts the default member types that are not present yet.
    pub async fn seed_member_types(&self) -> Result<(), StoreError> {
        for member_type in MemberType::defaults() {
            let existing = self
                .member_types
                .find_one(&Filter::id(member_type.id.clone()))
                .await?;

            if existing.is_none() {
                info!("Seeding member type: {}", member_type.id);
                self.member_types.create(member_type).await?;
            }
        }

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.users.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_member_types_is_idempotent() {
        let db = Database::in_memory();

        db.seed_member_types().await.unwrap();
        db.seed_member_types().await.unwrap();

        let member_types = db.member_types.find_many(None).await.unwrap();
        let ids: Vec<&str> = member_types.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["basic", "business"]);
    }

    #[tokio::test]
    async fn test_clones_share_collections() {
        let db = Database::in_memory();
        let other = db.clone();

        db.users
            .create(User::new("Ann".to_string(), "ann@example.com".to_string()))
            .await
            .unwrap();

        assert_eq!(other.users.find_many(None).await.unwrap().len(), 1);
        assert!(other.health_check().await.is_ok());
    }
}
