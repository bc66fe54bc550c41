use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Trait for entities persisted as documents.
///
/// A document knows which collection it lives in and its own id. The id is
/// also stored inside the JSON body so indexed lookups return complete
/// documents.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Name of the collection this document type is stored in.
    const COLLECTION: &'static str;

    /// Returns the document's unique id within its collection.
    fn id(&self) -> Uuid;
}
