use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Host-side document persistence for numbered models.
pub trait Collection: Send + Sync {
    /// Reject later inserts whose `field` repeats an existing value for `model`.
    fn ensure_unique(&self, model: &str, field: &str) -> impl Future<Output = Result<()>> + Send;

    fn insert(
        &self,
        model: &str,
        fields: &Map<String, Value>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Replace the document whose `key_field` equals the one in `fields`.
    /// Returns the number of documents replaced.
    fn replace(
        &self,
        model: &str,
        key_field: &str,
        fields: &Map<String, Value>,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Every document of `model`, in insertion order.
    fn find_all(
        &self,
        model: &str,
    ) -> impl Future<Output = Result<Vec<Map<String, Value>>>> + Send;
}

#[derive(Debug, Default)]
struct Contents {
    documents: BTreeMap<String, Vec<Map<String, Value>>>,
    unique: BTreeSet<(String, String)>,
}

/// In-process collection, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    contents: Mutex<Contents>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> MutexGuard<'_, Contents> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Collection for MemoryCollection {
    async fn ensure_unique(&self, model: &str, field: &str) -> Result<()> {
        self.contents()
            .unique
            .insert((model.to_string(), field.to_string()));
        Ok(())
    }

    async fn insert(&self, model: &str, fields: &Map<String, Value>) -> Result<()> {
        let mut contents = self.contents();
        let Contents { documents, unique } = &mut *contents;
        let existing = documents.entry(model.to_string()).or_default();

        for (_, field) in unique.iter().filter(|(m, _)| m == model) {
            let Some(value) = fields.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            if existing.iter().any(|doc| doc.get(field) == Some(value)) {
                return Err(Error::DuplicateKey {
                    model: model.to_string(),
                    field: field.clone(),
                    value: value.clone(),
                });
            }
        }

        existing.push(fields.clone());
        Ok(())
    }

    async fn replace(
        &self,
        model: &str,
        key_field: &str,
        fields: &Map<String, Value>,
    ) -> Result<u64> {
        let Some(key) = fields.get(key_field) else {
            return Ok(0);
        };
        let mut contents = self.contents();
        let Some(existing) = contents.documents.get_mut(model) else {
            return Ok(0);
        };
        let mut replaced = 0;
        for doc in existing.iter_mut().filter(|doc| doc.get(key_field) == Some(key)) {
            *doc = fields.clone();
            replaced += 1;
        }
        Ok(replaced)
    }

    async fn find_all(&self, model: &str) -> Result<Vec<Map<String, Value>>> {
        Ok(self
            .contents()
            .documents
            .get(model)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn unique_field_rejects_repeats() {
        let users = MemoryCollection::new();
        users.ensure_unique("User", "_id").await.unwrap();
        users.insert("User", &fields(json!({"_id": 0}))).await.unwrap();

        let err = users
            .insert("User", &fields(json!({"_id": 0})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { .. }));

        // Uniqueness is per model.
        users.insert("Admin", &fields(json!({"_id": 0}))).await.unwrap();
    }

    #[tokio::test]
    async fn replace_matches_on_key_field() {
        let users = MemoryCollection::new();
        users
            .insert("User", &fields(json!({"_id": 0, "dept": "Support"})))
            .await
            .unwrap();
        let replaced = users
            .replace("User", "_id", &fields(json!({"_id": 0, "dept": "Sales"})))
            .await
            .unwrap();
        assert_eq!(replaced, 1);
        assert_eq!(users.find_all("User").await.unwrap()[0]["dept"], "Sales");

        let missing = users
            .replace("User", "_id", &fields(json!({"_id": 9})))
            .await
            .unwrap();
        assert_eq!(missing, 0);
    }
}
