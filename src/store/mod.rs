// Record store abstraction
// Generic find/create/delete/change contract shared by every collection

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// An entity persisted in a record store collection.
///
/// Records are stored as JSON documents keyed by `id`; `Filter` and `change`
/// operate on the camelCase field names produced by `Serialize`.
pub trait Record: Serialize + DeserializeOwned + Debug + Clone + Send + Sync + 'static {
    /// Collection (and table) name.
    const COLLECTION: &'static str;

    /// Top-level fields whose values must be unique across the collection.
    const UNIQUE_KEYS: &'static [&'static str] = &[];

    fn id(&self) -> &str;
}

/// Equality match on one top-level field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub key: String,
    pub equals: Value,
}

impl Filter {
    pub fn equals(key: impl Into<String>, equals: impl Into<Value>) -> Self {
        Filter {
            key: key.into(),
            equals: equals.into(),
        }
    }

    /// Shortcut for the most common lookup.
    pub fn id(id: impl Into<String>) -> Self {
        Self::equals("id", id.into())
    }

    /// Whether a serialized record satisfies this filter.
    pub fn matches(&self, document: &Value) -> bool {
        document.get(&self.key) == Some(&self.equals)
    }
}

#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    async fn find_many(&self, filter: Option<&Filter>) -> Result<Vec<T>, StoreError>;

    /// Absence is `Ok(None)`, not an error.
    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError>;

    async fn create(&self, record: T) -> Result<T, StoreError>;

    /// Removes the record and returns it. Unknown ids fail.
    async fn delete(&self, id: &str) -> Result<T, StoreError>;

    /// Shallow-merges `patch` into the stored record and returns the result.
    /// Unknown ids fail.
    async fn change(&self, id: &str, patch: Value) -> Result<T, StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Serializes a partial payload into a change patch.
///
/// `None` fields must be skipped by the payload's `Serialize` impl so they
/// leave the stored value untouched. The `id` key is always dropped.
pub fn patch_from<P: Serialize>(payload: &P) -> Result<Value, StoreError> {
    match serde_json::to_value(payload)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(Value::Object(fields))
        }
        _ => Err(StoreError::InvalidPatch),
    }
}

/// Applies a shallow JSON merge of `patch` onto `record`.
pub(crate) fn merge_patch<T: Record>(record: &T, patch: &Value) -> Result<T, StoreError> {
    let patch = patch.as_object().ok_or(StoreError::InvalidPatch)?;

    let mut document = match serde_json::to_value(record)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };

    for (key, value) in patch {
        if key == "id" {
            continue;
        }
        document.insert(key.clone(), value.clone());
    }

    Ok(serde_json::from_value(Value::Object(document))?)
}
