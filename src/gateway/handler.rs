//! Inbound event dispatch
//!
//! Every Slack event resolves to one of three actions: answer a question
//! addressed to the bot, index an ordinary message, or ignore. Planning is a
//! pure function so the routing rules are testable without any I/O; the
//! dispatcher then runs the side effects. Failures are scoped to the one
//! event that caused them.

use crate::agent::AnswerEngine;
use crate::channels::{
    extract_message, extract_query, InboundMessage, MessageEvent, OutboundMessage, SlackClient,
};
use crate::error::Error;
use crate::memory::Indexer;
use std::sync::Arc;

/// What to do with one inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    /// The bot was asked a question; answer into the given channel
    Answer {
        /// Extracted question text
        query: String,
        /// Channel to post the answer to
        channel: String,
    },
    /// An ordinary message; index it
    Index(InboundMessage),
    /// Nothing to do (bot echo, unusable payload)
    Ignore {
        /// Why the event was skipped
        reason: String,
    },
}

/// Decide what to do with an event. Pure; no side effects.
pub fn plan_event(event: &MessageEvent, bot_user_id: &str) -> EventAction {
    // Never react to bot traffic, including our own answers.
    if event.bot_id.is_some() {
        return EventAction::Ignore {
            reason: "bot message".to_string(),
        };
    }
    if event.user.as_deref() == Some(bot_user_id) {
        return EventAction::Ignore {
            reason: "own message".to_string(),
        };
    }

    if let Some(query) = extract_query(event, bot_user_id) {
        return match &event.channel {
            Some(channel) => EventAction::Answer {
                query,
                channel: channel.clone(),
            },
            None => EventAction::Ignore {
                reason: "mention without channel".to_string(),
            },
        };
    }

    match extract_message(event) {
        Ok(message) => EventAction::Index(message),
        Err(e) => EventAction::Ignore {
            reason: e.to_string(),
        },
    }
}

/// Runs the side effects decided by `plan_event`
pub struct EventDispatcher {
    indexer: Arc<Indexer>,
    engine: Arc<AnswerEngine>,
    slack: Arc<SlackClient>,
    bot_user_id: String,
}

impl EventDispatcher {
    /// Create a dispatcher wired to the indexing and answering pipelines
    pub fn new(
        indexer: Arc<Indexer>,
        engine: Arc<AnswerEngine>,
        slack: Arc<SlackClient>,
        bot_user_id: String,
    ) -> Self {
        Self {
            indexer,
            engine,
            slack,
            bot_user_id,
        }
    }

    /// Handle one event to completion
    pub async fn dispatch(&self, event: MessageEvent) {
        match plan_event(&event, &self.bot_user_id) {
            EventAction::Answer { query, channel } => {
                tracing::info!(query = %query, channel = %channel, "Answering question");
                match self.engine.answer(&query).await {
                    Ok(answer) => {
                        let outbound = OutboundMessage {
                            channel,
                            text: answer,
                        };
                        if let Err(e) = self.slack.post_message(&outbound).await {
                            tracing::error!("Failed to deliver answer: {}", e);
                        }
                    }
                    // No retry here: a duplicate answer in the channel is
                    // worse than a missing one.
                    Err(e) => tracing::error!(query = %query, "Failed to answer: {}", e),
                }
            }
            EventAction::Index(message) => match self.indexer.index(&message).await {
                Ok(record) => tracing::info!(id = %record.id, "Stored message"),
                Err(Error::MalformedMessage(reason)) => {
                    tracing::warn!("Dropped malformed message: {}", reason);
                }
                Err(e) => tracing::error!("Failed to index message: {}", e),
            },
            EventAction::Ignore { reason } => {
                tracing::debug!(reason = %reason, "Ignoring event");
            }
        }
    }
}
