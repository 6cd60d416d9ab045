//! Message indexing and recency-weighted retrieval
//!
//! Every chat message becomes an immutable `Record` (text + embedding +
//! canonical timestamp). Questions are answered from a `RankedContext`:
//! similarity search picks the candidates, a recency re-sort orders them.

pub mod embedding;
pub mod indexer;
pub mod prompt;
pub mod record;
pub mod retriever;
pub mod store;

pub use embedding::{EmbeddingProvider, OpenAiEmbedding};
pub use indexer::Indexer;
pub use prompt::compose;
pub use record::{format_when, parse_when, Record};
pub use retriever::{RankedContext, Retriever, DEFAULT_CONTEXT_SIZE};
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore, ScoredRecord};
