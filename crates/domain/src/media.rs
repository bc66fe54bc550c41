//! Object-storage port for product images.
//!
//! Upload happens at the HTTP boundary before a product is created; the core
//! only needs to destroy stored assets when a product is deleted.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by the media store collaborator.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The backing service rejected or failed the request.
    #[error("Media service error: {0}")]
    Service(String),
}

/// Trait for object-storage operations on stored images.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Destroys a stored asset by its public id.
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError>;
}

#[derive(Debug, Default)]
struct InMemoryMediaState {
    destroyed: Vec<String>,
    fail_on_destroy: bool,
}

/// In-memory media store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMediaStore {
    state: Arc<RwLock<InMemoryMediaState>>,
}

impl InMemoryMediaStore {
    /// Creates a new in-memory media store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail on the next destroy call.
    pub fn set_fail_on_destroy(&self, fail: bool) {
        self.state.write().unwrap().fail_on_destroy = fail;
    }

    /// Returns the number of destroyed assets.
    pub fn destroyed_count(&self) -> usize {
        self.state.read().unwrap().destroyed.len()
    }

    /// Returns true if an asset with the given public id was destroyed.
    pub fn was_destroyed(&self, public_id: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .destroyed
            .iter()
            .any(|id| id == public_id)
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_destroy {
            return Err(MediaError::Service("destroy failed".to_string()));
        }

        state.destroyed.push(public_id.to_string());
        Ok(())
    }
}
