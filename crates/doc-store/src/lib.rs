//! Document store abstraction for the storefront services.
//!
//! Entities are persisted as JSON documents in named collections. The store
//! offers per-document CRUD, indexed lookup by a top-level field, listing and
//! streaming of whole collections, and an atomic single-document merge
//! (`find_and_update`). Multi-document consistency is explicitly out of
//! scope; callers sequence their own read-then-write steps.
//!
//! Two backends implement the same [`DocStore`] trait: [`InMemoryDocStore`]
//! for tests and local runs, and [`PostgresDocStore`] backed by a JSONB
//! table.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use document::Document;
pub use error::{Result, StoreError};
pub use memory::InMemoryDocStore;
pub use postgres::PostgresDocStore;
pub use store::{DocStore, DocStoreExt, DocumentStream};
