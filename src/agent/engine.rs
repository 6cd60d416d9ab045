//! Answer engine: retrieve, compose, synthesize

use crate::agent::synthesizer::AnswerSynthesizer;
use crate::error::Result;
use crate::memory::{compose, Retriever};
use std::sync::Arc;

/// Runs the full question-answering pipeline for one query
pub struct AnswerEngine {
    retriever: Arc<Retriever>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
}

impl AnswerEngine {
    /// Create an engine over the given retriever and synthesizer
    pub fn new(retriever: Arc<Retriever>, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }

    /// Answer a question from indexed chat history.
    ///
    /// Every failure is scoped to this one query; an empty store still
    /// produces a prompt (with an empty context block) and an answer.
    pub async fn answer(&self, query: &str) -> Result<String> {
        let context = self.retriever.retrieve(query).await?;
        tracing::debug!(
            query = %query,
            context_len = context.len(),
            "Retrieved grounding context"
        );

        let prompt = compose(query, &context);
        let answer = self.synthesizer.synthesize(&prompt).await?;

        tracing::info!(
            query = %query,
            context_len = context.len(),
            answer_len = answer.len(),
            "Answered question"
        );
        Ok(answer)
    }
}
