use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{merge_patch, Filter, Record, RecordStore};
use crate::error::StoreError;

/// Process-local collection kept in insertion order.
///
/// Cloning shares the underlying collection.
#[derive(Clone)]
pub struct MemoryStore<T> {
    records: Arc<RwLock<Vec<T>>>,
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        MemoryStore {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn matching(records: &[T], filter: &Filter) -> Result<Vec<T>, StoreError> {
        let mut found = Vec::new();
        for record in records {
            if filter.matches(&serde_json::to_value(record)?) {
                found.push(record.clone());
            }
        }
        Ok(found)
    }

    fn check_unique(records: &[T], candidate: &T, skip_id: Option<&str>) -> Result<(), StoreError> {
        if T::UNIQUE_KEYS.is_empty() {
            return Ok(());
        }

        let document = serde_json::to_value(candidate)?;
        for &key in T::UNIQUE_KEYS {
            let Some(value) = document.get(key) else {
                continue;
            };
            let filter = Filter::equals(key, value.clone());

            for existing in records {
                if Some(existing.id()) == skip_id {
                    continue;
                }
                if filter.matches(&serde_json::to_value(existing)?) {
                    return Err(StoreError::UniqueViolation {
                        collection: T::COLLECTION,
                        key,
                        value: unquoted(value),
                    });
                }
            }
        }

        Ok(())
    }
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn unquoted(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryStore<T> {
    async fn find_many(&self, filter: Option<&Filter>) -> Result<Vec<T>, StoreError> {
        let records = self.records.read().await;
        match filter {
            Some(filter) => Self::matching(&records, filter),
            None => Ok(records.clone()),
        }
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let records = self.records.read().await;
        for record in records.iter() {
            if filter.matches(&serde_json::to_value(record)?) {
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }

    async fn create(&self, record: T) -> Result<T, StoreError> {
        let mut records = self.records.write().await;

        if records.iter().any(|existing| existing.id() == record.id()) {
            return Err(StoreError::Duplicate {
                collection: T::COLLECTION,
                id: record.id().to_string(),
            });
        }
        Self::check_unique(&records, &record, None)?;

        records.push(record.clone());
        debug!("Inserted {} record {}", T::COLLECTION, record.id());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<T, StoreError> {
        let mut records = self.records.write().await;

        let position = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            })?;

        Ok(records.remove(position))
    }

    async fn change(&self, id: &str, patch: Value) -> Result<T, StoreError> {
        let mut records = self.records.write().await;

        let position = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            })?;

        let changed = merge_patch(&records[position], &patch)?;
        Self::check_unique(&records, &changed, Some(id))?;

        records[position] = changed.clone();
        Ok(changed)
    }
}
