//! # contract: seams between the sync pipeline and the outside world
//!
//! The pipeline never talks to a database or the system clock directly. It
//! goes through the traits defined here:
//!
//! - [`DocumentStore`]: atomic replace-with-upsert of a [`SyncedDocument`] and
//!   declarative index creation on the target collection.
//! - [`Clock`]: source of the `synced_at` instant.
//!
//! ## Mocking & Testing
//! - `DocumentStore` is annotated for `mockall`; `MockDocumentStore` is
//!   exported under the `test-export-mocks` feature so integration tests (and
//!   downstream crates) can script store behaviour.
//! - Implementations are expected to be bound to a single collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::indexes::IndexSpec;
use crate::transform::SyncedDocument;

/// Boxed error returned by storage implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// What a replace-with-upsert did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No document with the id existed; one was created.
    Inserted,
    /// An existing document with the id was replaced wholesale.
    Replaced,
}

/// Trait for persisting synced documents into a document collection.
///
/// Implementations must make `replace_document` a single atomic
/// replace-with-upsert keyed on the document id (never read-then-write), so a
/// failed call leaves the previous document for that id untouched.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `document`, or fully replace the stored document with the same id.
    async fn replace_document(&self, document: &SyncedDocument) -> Result<UpsertOutcome, StoreError>;

    /// Ensure a single-field index exists. Must succeed when it already does.
    /// Returns the index name.
    async fn ensure_index(&self, index: &IndexSpec) -> Result<String, StoreError>;
}

/// Source of "now" for `synced_at`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
