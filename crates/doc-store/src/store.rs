use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde_json::Value;
use uuid::Uuid;

use crate::{Document, Result};

/// A stream of raw documents from one collection.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<Value>> + Send>>;

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Every operation is
/// an independent round trip; the only atomicity guarantee is per document
/// (`insert`, `put`, `delete`, `find_and_update` each touch exactly one
/// document).
#[async_trait]
pub trait DocStore: Send + Sync {
    /// Inserts a new document.
    ///
    /// Fails with `DuplicateDocument` if the id is already taken in the
    /// collection.
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<()>;

    /// Retrieves a document by id, or None if absent.
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>>;

    /// Inserts or fully replaces a document.
    async fn put(&self, collection: &str, id: Uuid, doc: Value) -> Result<()>;

    /// Deletes a document by id. Returns true if something was removed.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool>;

    /// Finds the first document whose top-level `field` equals `value`.
    ///
    /// Backends index the fields used through this call (unique codes,
    /// slugs, owner ids).
    async fn find_one_by(&self, collection: &str, field: &str, value: &Value)
    -> Result<Option<Value>>;

    /// Finds all documents whose top-level `field` equals `value`.
    async fn find_all_by(&self, collection: &str, field: &str, value: &Value)
    -> Result<Vec<Value>>;

    /// Lists every document in a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<Value>>;

    /// Streams every document in a collection, ordered by id.
    async fn stream_all(&self, collection: &str) -> Result<DocumentStream>;

    /// Atomically merges `patch`'s top-level fields into one document.
    ///
    /// Returns the updated document, or None if it does not exist. This is
    /// the store's only read-modify-write primitive; operations spanning
    /// several documents get no such guarantee.
    async fn find_and_update(&self, collection: &str, id: Uuid, patch: Value)
    -> Result<Option<Value>>;

    /// Returns the number of documents in a collection.
    async fn count(&self, collection: &str) -> Result<u64>;
}

/// Extension trait providing serde-typed access on top of [`DocStore`].
#[async_trait]
pub trait DocStoreExt: DocStore {
    /// Inserts a typed document into its collection.
    async fn insert_doc<T: Document>(&self, doc: &T) -> Result<()> {
        self.insert(T::COLLECTION, doc.id(), serde_json::to_value(doc)?)
            .await
    }

    /// Retrieves a typed document by id.
    async fn get_doc<T: Document>(&self, id: Uuid) -> Result<Option<T>> {
        match self.get(T::COLLECTION, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Inserts or fully replaces a typed document.
    async fn put_doc<T: Document>(&self, doc: &T) -> Result<()> {
        self.put(T::COLLECTION, doc.id(), serde_json::to_value(doc)?)
            .await
    }

    /// Deletes a typed document by id. Returns true if something was removed.
    async fn delete_doc<T: Document>(&self, id: Uuid) -> Result<bool> {
        self.delete(T::COLLECTION, id).await
    }

    /// Finds the first typed document whose top-level `field` equals `value`.
    async fn find_doc_by<T: Document>(&self, field: &str, value: Value) -> Result<Option<T>> {
        match self.find_one_by(T::COLLECTION, field, &value).await? {
            Some(found) => Ok(Some(serde_json::from_value(found)?)),
            None => Ok(None),
        }
    }

    /// Finds all typed documents whose top-level `field` equals `value`.
    async fn find_docs_by<T: Document>(&self, field: &str, value: Value) -> Result<Vec<T>> {
        self.find_all_by(T::COLLECTION, field, &value)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .collect()
    }

    /// Lists every typed document in the collection.
    async fn list_docs<T: Document>(&self) -> Result<Vec<T>> {
        self.list(T::COLLECTION)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .collect()
    }
}

// Blanket implementation for all DocStore implementations
impl<S: DocStore + ?Sized> DocStoreExt for S {}

/// Merges `patch`'s top-level fields into `doc`.
///
/// Mirrors the semantics of PostgreSQL's jsonb `||` operator so both
/// backends agree on what `find_and_update` does.
pub fn merge_documents(doc: &mut Value, patch: Value) {
    match (doc, patch) {
        (Value::Object(doc), Value::Object(patch)) => {
            for (key, value) in patch {
                doc.insert(key, value);
            }
        }
        (doc, patch) => *doc = patch,
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::InMemoryDocStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: Uuid,
        name: String,
        weight: u32,
    }

    impl Document for Widget {
        const COLLECTION: &'static str = "widgets";

        fn id(&self) -> Uuid {
            self.id
        }
    }

    #[test]
    fn merge_overwrites_and_keeps_fields() {
        let mut doc = serde_json::json!({"a": 1, "b": 2});
        merge_documents(&mut doc, serde_json::json!({"b": 3, "c": 4}));
        assert_eq!(doc, serde_json::json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn merge_replaces_non_objects() {
        let mut doc = serde_json::json!({"a": 1});
        merge_documents(&mut doc, serde_json::json!(42));
        assert_eq!(doc, serde_json::json!(42));
    }

    fn widget(name: &str, weight: u32) -> Widget {
        Widget {
            id: Uuid::new_v4(),
            name: name.to_string(),
            weight,
        }
    }

    #[tokio::test]
    async fn typed_roundtrip() {
        let store = InMemoryDocStore::new();
        let doc = widget("anvil", 100);

        store.insert_doc(&doc).await.unwrap();

        let loaded: Widget = store.get_doc(doc.id).await.unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn typed_find_by_field() {
        let store = InMemoryDocStore::new();
        store.insert_doc(&widget("anvil", 100)).await.unwrap();
        store.insert_doc(&widget("feather", 1)).await.unwrap();

        let found: Option<Widget> = store
            .find_doc_by("name", Value::String("feather".into()))
            .await
            .unwrap();
        assert_eq!(found.unwrap().weight, 1);

        let missing: Option<Widget> = store
            .find_doc_by("name", Value::String("piano".into()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn typed_put_replaces() {
        let store = InMemoryDocStore::new();
        let mut doc = widget("anvil", 100);
        store.insert_doc(&doc).await.unwrap();

        doc.weight = 250;
        store.put_doc(&doc).await.unwrap();

        let loaded: Widget = store.get_doc(doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.weight, 250);
    }

    #[tokio::test]
    async fn typed_list_and_delete() {
        let store = InMemoryDocStore::new();
        let doc = widget("anvil", 100);
        store.insert_doc(&doc).await.unwrap();
        store.insert_doc(&widget("feather", 1)).await.unwrap();

        let all: Vec<Widget> = store.list_docs().await.unwrap();
        assert_eq!(all.len(), 2);

        assert!(store.delete_doc::<Widget>(doc.id).await.unwrap());
        assert!(!store.delete_doc::<Widget>(doc.id).await.unwrap());

        let all: Vec<Widget> = store.list_docs().await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
