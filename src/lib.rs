//! Hindsight - Chat history Q&A assistant
//!
//! Hindsight listens to a Slack channel, indexes every message it sees as a
//! semantically searchable record, and answers questions addressed to it by
//! grounding an LLM in the most relevant *and* most recent messages.
//!
//! ## Architecture
//!
//! ```text
//! Slack events ──► Gateway (axum, signature check)
//!                     │
//!                     ├── message ──► Indexer ──► Record Store
//!                     │                 │             ▲
//!                     │             Embedding         │ similarity search
//!                     │              Provider         │
//!                     └── mention ──► Answer Engine ──┘
//!                                       │
//!                            Retriever (recency re-rank)
//!                                       │
//!                                Prompt Composer
//!                                       │
//!                               Answer Synthesizer ──► chat.postMessage
//! ```
//!
//! Retrieval is two-stage: similarity search decides which records qualify
//! for the grounding context, a recency sort decides their final order, so
//! the freshest qualified evidence always leads the prompt.
//!
//! ## Modules
//!
//! - [`gateway`]: webhook intake, challenge handshake, event dispatch
//! - [`channels`]: typed Slack payloads, signature auth, Web API client
//! - [`memory`]: records, stores, embedding, indexing, retrieval, prompts
//! - [`agent`]: answer synthesis pipeline
//! - [`config`]: configuration management

pub mod agent;
pub mod channels;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;

pub use config::HindsightConfig;
pub use error::{Error, Result};
