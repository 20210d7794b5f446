#![doc = "MongoDB implementation of the core `DocumentStore` contract."]
//
//! # Store Integration (CLI <-> Core)
//!
//! Bridges [`boxoffice_sync_core::contract::DocumentStore`] to a real MongoDB
//! collection. The CLI opens one [`MongoStore`] per process, lends it to the
//! sync engine, and calls [`MongoStore::close`] once the run has an outcome.
//!
//! - Documents are written with `replace_one(.., upsert = true)` keyed on `_id`,
//!   which MongoDB applies atomically per document.
//! - `synced_at` is stored as a native BSON date so range queries work.
//! - `create_index` is a no-op on the server when an identical index exists.

use async_trait::async_trait;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::{Client, Collection, IndexModel};
use tracing::{debug, info};

use boxoffice_sync_core::contract::{DocumentStore, StoreError, UpsertOutcome};
use boxoffice_sync_core::indexes::IndexSpec;
use boxoffice_sync_core::transform::SyncedDocument;

use crate::load_config::StoreSettings;

pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Builds a client for `settings.uri`, bound to the configured collection.
    ///
    /// The driver connects lazily; an unreachable server shows up as an error
    /// on the first operation, not here.
    pub async fn connect(settings: &StoreSettings) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&settings.uri).await.map_err(|e| {
            tracing::error!(error = %e, "[STORE] Failed to construct MongoDB client");
            e
        })?;
        let collection = client
            .database(&settings.database)
            .collection::<Document>(&settings.collection);
        info!(
            database = %settings.database,
            collection = %settings.collection,
            "[STORE] Connected to MongoDB"
        );
        Ok(Self { client, collection })
    }

    /// Shuts the client down. Consumes the store so it can only happen once.
    pub async fn close(self) {
        self.client.shutdown().await;
        info!("[STORE] MongoDB connection closed");
    }
}

/// Converts a synced document into its stored BSON form.
pub fn to_bson_document(document: &SyncedDocument) -> Result<Document, StoreError> {
    let mut stored = bson::to_document(document)?;
    stored.insert(
        "synced_at",
        Bson::DateTime(bson::DateTime::from_millis(document.synced_at.timestamp_millis())),
    );
    Ok(stored)
}

fn index_keys(index: &IndexSpec) -> Document {
    let mut keys = Document::new();
    keys.insert(index.field, index.direction.as_i32());
    keys
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn replace_document(&self, document: &SyncedDocument) -> Result<UpsertOutcome, StoreError> {
        let replacement = to_bson_document(document)?;
        debug!(document_id = %document.id, "[STORE] replace_one with upsert");

        let result = self
            .collection
            .replace_one(doc! { "_id": document.id.as_str() }, replacement)
            .upsert(true)
            .await?;

        let outcome = if result.upserted_id.is_some() {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Replaced
        };
        info!(
            document_id = %document.id,
            matched = result.matched_count,
            modified = result.modified_count,
            outcome = ?outcome,
            "[STORE] Upsert acknowledged"
        );
        Ok(outcome)
    }

    async fn ensure_index(&self, index: &IndexSpec) -> Result<String, StoreError> {
        let model = IndexModel::builder().keys(index_keys(index)).build();
        let created = self.collection.create_index(model).await?;
        debug!(index = %created.index_name, "[STORE] create_index acknowledged");
        Ok(created.index_name)
    }
}
