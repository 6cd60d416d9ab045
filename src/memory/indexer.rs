//! Message ingestion: raw inbound message → stored record

use crate::channels::InboundMessage;
use crate::error::{Error, Result};
use crate::memory::embedding::EmbeddingProvider;
use crate::memory::record::{format_when, Record};
use crate::memory::store::RecordStore;
use std::sync::Arc;

/// Attempts at inserting with a fresh id before giving up
const MAX_INSERT_ATTEMPTS: usize = 3;

/// Turns inbound messages into stored records
pub struct Indexer {
    store: Arc<dyn RecordStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Indexer {
    /// Create an indexer over the given store and embedding provider
    pub fn new(store: Arc<dyn RecordStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// Index one message: validate, canonicalize the timestamp, embed, insert.
    ///
    /// The timestamp is converted to its canonical form exactly once, here.
    /// The embedding is computed before any insert so a provider failure
    /// leaves the store untouched. An id collision on insert is retried with
    /// a fresh id; persistent storage faults surface to the caller.
    pub async fn index(&self, message: &InboundMessage) -> Result<Record> {
        let epoch_secs: f64 = message.ts.trim().parse().map_err(|_| {
            Error::MalformedMessage(format!("timestamp is not numeric: {:?}", message.ts))
        })?;
        let when = format_when(epoch_secs)?;

        let embedding = self.embedder.embed(&message.text).await?;
        let mut record = Record::new(message.text.clone(), embedding, when);

        let mut attempts = 0;
        loop {
            match self.store.insert(record.clone()).await {
                Ok(()) => {
                    tracing::debug!(id = %record.id, when = %record.when, "Indexed message");
                    return Ok(record);
                }
                Err(Error::Storage(reason)) => {
                    attempts += 1;
                    if attempts >= MAX_INSERT_ATTEMPTS {
                        return Err(Error::Storage(reason));
                    }
                    tracing::warn!(
                        id = %record.id,
                        attempt = attempts,
                        "Insert failed ({}), retrying with a fresh id",
                        reason
                    );
                    record.refresh_id();
                }
                Err(e) => return Err(e),
            }
        }
    }
}
