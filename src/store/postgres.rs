use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime, SslMode};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use postgres_types::Json;
use serde_json::Value;
use std::marker::PhantomData;
use tokio_postgres::Row;
use tracing::{error, info, warn};

use super::{Filter, Record, RecordStore};
use crate::config::DatabaseConfig;
use crate::error::StoreError;

/// Builds the deadpool connection pool and checks that it can hand out a
/// working connection.
pub async fn connect(config: &DatabaseConfig) -> Result<Pool, StoreError> {
    info!("Creating PostgreSQL connection pool for host: {}:{}", config.host, config.port);

    let mut pg_config = Config::new();
    pg_config.host = Some(config.host.clone());
    pg_config.port = Some(config.port);
    pg_config.dbname = Some(config.database.clone());
    pg_config.user = Some(config.username.clone());
    pg_config.password = Some(config.password.clone());
    pg_config.connect_timeout = Some(config.connection_timeout);

    pg_config.ssl_mode = Some(match config.ssl_mode.as_str() {
        "disable" => SslMode::Disable,
        "allow" | "prefer" => SslMode::Prefer,
        "require" => SslMode::Require,
        other => {
            warn!("SSL mode '{}' is not supported by the driver, using 'require'", other);
            SslMode::Require
        }
    });

    pg_config.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let mut pool_config = PoolConfig::new(config.max_connections as usize);
    pool_config.timeouts.wait = Some(config.connection_timeout);
    pg_config.pool = Some(pool_config);

    let tls_connector = TlsConnector::builder().build().map_err(|e| {
        error!("Failed to create TLS connector: {}", e);
        StoreError::Database(format!("TLS connector creation failed: {}", e))
    })?;
    let tls = MakeTlsConnector::new(tls_connector);

    let pool = pg_config.create_pool(Some(Runtime::Tokio1), tls).map_err(|e| {
        error!("Failed to create connection pool: {}", e);
        StoreError::Database(format!("Connection pool creation failed: {}", e))
    })?;

    let client = pool.get().await?;
    client.execute("SELECT 1", &[]).await?;
    info!("Database connection test successful");

    Ok(pool)
}

/// A collection stored as JSONB documents in its own table.
///
/// Table layout: `seq` keeps insertion order, `id` is the record id and
/// `body` the serialized record.
pub struct PgStore<T> {
    pool: Pool,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> PgStore<T> {
    pub fn new(pool: Pool) -> Self {
        PgStore {
            pool,
            _record: PhantomData,
        }
    }

    async fn client(&self) -> Result<Object, StoreError> {
        Ok(self.pool.get().await?)
    }

    /// Creates the collection table and its unique indexes if missing.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let client = self.client().await?;

        for statement in schema_statements(T::COLLECTION, T::UNIQUE_KEYS) {
            client.execute(statement.as_str(), &[]).await.map_err(|e| {
                error!("Migration of {} failed: {}", T::COLLECTION, e);
                StoreError::from(e)
            })?;
        }

        info!("Collection table '{}' is ready", T::COLLECTION);
        Ok(())
    }

    fn decode(row: &Row) -> Result<T, StoreError> {
        let Json(record) = row.try_get::<_, Json<T>>(0)?;
        Ok(record)
    }

    fn not_found(id: &str) -> StoreError {
        StoreError::NotFound {
            collection: T::COLLECTION,
            id: id.to_string(),
        }
    }
}

fn schema_statements(table: &str, unique_keys: &[&str]) -> Vec<String> {
    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
            seq BIGSERIAL, \
            id TEXT PRIMARY KEY, \
            body JSONB NOT NULL\
        )"
    )];

    for key in unique_keys {
        statements.push(format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_{column} ON {table} ((body ->> '{key}'))",
            column = key.to_lowercase(),
        ));
    }

    statements
}

#[async_trait]
impl<T: Record> RecordStore<T> for PgStore<T> {
    async fn find_many(&self, filter: Option<&Filter>) -> Result<Vec<T>, StoreError> {
        let client = self.client().await?;

        let rows = match filter {
            Some(filter) => {
                let query = format!(
                    "SELECT body FROM {} WHERE body -> $1::text = $2::jsonb ORDER BY seq",
                    T::COLLECTION
                );
                client.query(query.as_str(), &[&filter.key, &filter.equals]).await?
            }
            None => {
                let query = format!("SELECT body FROM {} ORDER BY seq", T::COLLECTION);
                client.query(query.as_str(), &[]).await?
            }
        };

        rows.iter().map(Self::decode).collect()
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let client = self.client().await?;
        let query = format!(
            "SELECT body FROM {} WHERE body -> $1::text = $2::jsonb ORDER BY seq LIMIT 1",
            T::COLLECTION
        );

        let row = client.query_opt(query.as_str(), &[&filter.key, &filter.equals]).await?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn create(&self, record: T) -> Result<T, StoreError> {
        let client = self.client().await?;
        let query = format!(
            "INSERT INTO {} (id, body) VALUES ($1, $2::jsonb) \
             ON CONFLICT (id) DO NOTHING RETURNING body",
            T::COLLECTION
        );

        let row = client.query_opt(query.as_str(), &[&record.id(), &Json(&record)]).await?;
        match row {
            Some(row) => Self::decode(&row),
            None => Err(StoreError::Duplicate {
                collection: T::COLLECTION,
                id: record.id().to_string(),
            }),
        }
    }

    async fn delete(&self, id: &str) -> Result<T, StoreError> {
        let client = self.client().await?;
        let query = format!("DELETE FROM {} WHERE id = $1 RETURNING body", T::COLLECTION);

        let row = client.query_opt(query.as_str(), &[&id]).await?;
        match row {
            Some(row) => Self::decode(&row),
            None => Err(Self::not_found(id)),
        }
    }

    async fn change(&self, id: &str, patch: Value) -> Result<T, StoreError> {
        let mut patch = match patch {
            Value::Object(fields) => fields,
            _ => return Err(StoreError::InvalidPatch),
        };
        patch.remove("id");

        let mut client = self.client().await?;
        let tx = client.transaction().await?;

        let select = format!("SELECT body FROM {} WHERE id = $1 FOR UPDATE", T::COLLECTION);
        let current = tx
            .query_opt(select.as_str(), &[&id])
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        // Type-check the merged document before writing it
        let merged = super::merge_patch(&Self::decode(&current)?, &Value::Object(patch))?;

        let update = format!(
            "UPDATE {} SET body = $2::jsonb WHERE id = $1 RETURNING body",
            T::COLLECTION
        );
        let row = tx.query_one(update.as_str(), &[&id, &Json(&merged)]).await?;
        let changed = Self::decode(&row)?;

        tx.commit().await?;
        Ok(changed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.client().await?;
        client.execute("SELECT 1", &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_without_unique_keys() {
        let statements = schema_statements("posts", &[]);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS posts ("));
        assert!(statements[0].contains("body JSONB NOT NULL"));
    }

    #[test]
    fn test_schema_with_unique_key_index() {
        let statements = schema_statements("profiles", &["userId"]);
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[1],
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_profiles_userid ON profiles ((body ->> 'userId'))"
        );
    }
}
