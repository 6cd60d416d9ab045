//! Recency-weighted retrieval
//!
//! Retrieval runs in two independent stages. Similarity search selects which
//! records qualify as candidates (bounded by the context size); a full
//! recency re-sort then decides their final order. Similarity never affects
//! order past stage one, and recency never admits a record that similarity
//! excluded.

use crate::error::Result;
use crate::memory::embedding::EmbeddingProvider;
use crate::memory::record::{parse_when, Record};
use crate::memory::store::RecordStore;
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Default bound on the grounding context
pub const DEFAULT_CONTEXT_SIZE: usize = 20;

/// The ordered evidence selected to ground one answer
///
/// Records are most-recent-first. Exists only for the duration of one
/// retrieve-and-answer cycle.
#[derive(Debug, Clone)]
pub struct RankedContext {
    /// The question being answered
    pub query: String,
    /// At most `context_size` records, most recent first
    pub records: Vec<Record>,
}

impl RankedContext {
    /// Number of records in the context
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records were selected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Selects and orders the grounding context for a query
pub struct Retriever {
    store: Arc<dyn RecordStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    context_size: usize,
}

impl Retriever {
    /// Create a retriever with the given context bound
    pub fn new(
        store: Arc<dyn RecordStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        context_size: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            context_size,
        }
    }

    /// Retrieve the grounding context for a query.
    ///
    /// A record whose stored timestamp no longer parses is dropped with a
    /// warning; one corrupt record must not fail the whole query. An empty
    /// store yields an empty context, not an error.
    pub async fn retrieve(&self, query: &str) -> Result<RankedContext> {
        let query_embedding = self.embedder.embed(query).await?;

        // Candidate membership: the context_size most similar records.
        let candidates = self
            .store
            .search(&query_embedding, self.context_size)
            .await?;

        let mut dated: Vec<(Record, NaiveDateTime)> = Vec::with_capacity(candidates.len());
        for scored in candidates {
            match parse_when(&scored.record.when) {
                Ok(instant) => dated.push((scored.record, instant)),
                Err(e) => {
                    tracing::warn!(id = %scored.record.id, "Dropping candidate: {}", e);
                }
            }
        }

        // Final order: recency only. Stable, so records sharing a second
        // keep their similarity order.
        dated.sort_by(|a, b| b.1.cmp(&a.1));

        let mut records: Vec<Record> = dated.into_iter().map(|(record, _)| record).collect();
        // Deliberately independent of the search limit above: changing the
        // candidate fetch count cannot overflow the context.
        records.truncate(self.context_size);

        Ok(RankedContext {
            query: query.to_string(),
            records,
        })
    }
}
