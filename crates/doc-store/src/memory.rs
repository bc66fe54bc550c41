use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    DocStore, DocumentStream, Result, StoreError,
    store::merge_documents,
};
use async_trait::async_trait;

/// In-memory document store implementation for testing and local runs.
///
/// Collections are created lazily on first write. Documents within a
/// collection are kept ordered by id so listing is deterministic, matching
/// the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDocStore {
    collections: Arc<RwLock<HashMap<String, BTreeMap<Uuid, Value>>>>,
}

impl InMemoryDocStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

#[async_trait]
impl DocStore for InMemoryDocStore {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.contains_key(&id) {
            return Err(StoreError::DuplicateDocument {
                collection: collection.to_string(),
                id,
            });
        }

        docs.insert(id, doc);
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: Uuid, doc: Value) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(&id).is_some()))
    }

    async fn find_one_by(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.values()
                .find(|doc| doc.get(field) == Some(value))
                .cloned()
        }))
    }

    async fn find_all_by(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn stream_all(&self, collection: &str) -> Result<DocumentStream> {
        use futures_util::stream;

        let docs = self.list(collection).await?;
        let stream = stream::iter(docs.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn find_and_update(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<Value>> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(&id))
        else {
            return Ok(None);
        };

        merge_documents(doc, patch);
        Ok(Some(doc.clone()))
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn insert_and_get() {
        let store = InMemoryDocStore::new();
        let id = Uuid::new_v4();

        store
            .insert("things", id, json!({"name": "anvil"}))
            .await
            .unwrap();

        let doc = store.get("things", id).await.unwrap();
        assert_eq!(doc, Some(json!({"name": "anvil"})));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryDocStore::new();
        let doc = store.get("things", Uuid::new_v4()).await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn insert_duplicate_fails() {
        let store = InMemoryDocStore::new();
        let id = Uuid::new_v4();

        store.insert("things", id, json!({"v": 1})).await.unwrap();
        let result = store.insert("things", id, json!({"v": 2})).await;

        assert!(matches!(
            result,
            Err(StoreError::DuplicateDocument { .. })
        ));
    }

    #[tokio::test]
    async fn put_replaces_existing() {
        let store = InMemoryDocStore::new();
        let id = Uuid::new_v4();

        store.put("things", id, json!({"v": 1})).await.unwrap();
        store.put("things", id, json!({"v": 2})).await.unwrap();

        let doc = store.get("things", id).await.unwrap();
        assert_eq!(doc, Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = InMemoryDocStore::new();
        let id = Uuid::new_v4();
        store.put("things", id, json!({})).await.unwrap();

        assert!(store.delete("things", id).await.unwrap());
        assert!(!store.delete("things", id).await.unwrap());
    }

    #[tokio::test]
    async fn find_one_by_field() {
        let store = InMemoryDocStore::new();
        store
            .put("things", Uuid::new_v4(), json!({"code": "A", "n": 1}))
            .await
            .unwrap();
        store
            .put("things", Uuid::new_v4(), json!({"code": "B", "n": 2}))
            .await
            .unwrap();

        let doc = store
            .find_one_by("things", "code", &json!("B"))
            .await
            .unwrap();
        assert_eq!(doc.unwrap()["n"], json!(2));

        let missing = store
            .find_one_by("things", "code", &json!("C"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn find_all_by_field() {
        let store = InMemoryDocStore::new();
        let owner = Uuid::new_v4().to_string();
        store
            .put("things", Uuid::new_v4(), json!({"owner": owner, "n": 1}))
            .await
            .unwrap();
        store
            .put("things", Uuid::new_v4(), json!({"owner": owner, "n": 2}))
            .await
            .unwrap();
        store
            .put("things", Uuid::new_v4(), json!({"owner": "other", "n": 3}))
            .await
            .unwrap();

        let docs = store
            .find_all_by("things", "owner", &json!(owner))
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn list_is_scoped_to_collection() {
        let store = InMemoryDocStore::new();
        store.put("a", Uuid::new_v4(), json!({})).await.unwrap();
        store.put("a", Uuid::new_v4(), json!({})).await.unwrap();
        store.put("b", Uuid::new_v4(), json!({})).await.unwrap();

        assert_eq!(store.list("a").await.unwrap().len(), 2);
        assert_eq!(store.list("b").await.unwrap().len(), 1);
        assert_eq!(store.list("c").await.unwrap().len(), 0);
        assert_eq!(store.count("a").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn stream_all_yields_every_document() {
        use futures_util::StreamExt;

        let store = InMemoryDocStore::new();
        store.put("a", Uuid::new_v4(), json!({"n": 1})).await.unwrap();
        store.put("a", Uuid::new_v4(), json!({"n": 2})).await.unwrap();

        let stream = store.stream_all("a").await.unwrap();
        let docs: Vec<_> = stream.collect().await;
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.is_ok()));
    }

    #[tokio::test]
    async fn find_and_update_merges_top_level_fields() {
        let store = InMemoryDocStore::new();
        let id = Uuid::new_v4();
        store
            .put("things", id, json!({"stock": 5, "name": "anvil"}))
            .await
            .unwrap();

        let updated = store
            .find_and_update("things", id, json!({"stock": 3}))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated, json!({"stock": 3, "name": "anvil"}));
    }

    #[tokio::test]
    async fn find_and_update_missing_returns_none() {
        let store = InMemoryDocStore::new();
        let result = store
            .find_and_update("things", Uuid::new_v4(), json!({"stock": 3}))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn clear_empties_every_collection() {
        let store = InMemoryDocStore::new();
        store.put("a", Uuid::new_v4(), json!({})).await.unwrap();
        store.put("b", Uuid::new_v4(), json!({})).await.unwrap();

        store.clear().await;

        assert_eq!(store.count("a").await.unwrap(), 0);
        assert_eq!(store.count("b").await.unwrap(), 0);
    }
}
