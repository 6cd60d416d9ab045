//! Slack channel adapter
//!
//! Typed event payloads, fail-closed extraction of the fields indexing
//! needs, rich-text mention scanning for questions addressed to the bot,
//! and a thin Web API client for the handful of calls the assistant makes
//! (`auth.test`, `conversations.list`, `conversations.join`,
//! `chat.postMessage`).

use crate::channels::message::{InboundMessage, OutboundMessage};
use crate::config::SlackConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::json;

// =============================================================================
// Event payloads
// =============================================================================

/// Top-level Slack events envelope
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    /// `url_verification` or `event_callback`
    #[serde(rename = "type")]
    pub kind: String,

    /// Present on `url_verification` requests
    pub challenge: Option<String>,

    /// Present on `event_callback` requests
    pub event: Option<MessageEvent>,
}

/// A message-shaped event from the events API
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    /// `message` or `app_mention`
    #[serde(rename = "type")]
    pub kind: String,

    /// Sending user ID
    pub user: Option<String>,

    /// Set when the sender is a bot (including this one)
    pub bot_id: Option<String>,

    /// Message text
    pub text: Option<String>,

    /// Origination timestamp, numeric-string epoch seconds
    pub ts: Option<String>,

    /// Channel the message was posted in
    pub channel: Option<String>,

    /// Rich-text block structure, used for mention detection
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// A layout block within a message
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    /// Block type (`rich_text` is the one we care about)
    #[serde(rename = "type")]
    pub kind: String,

    /// Sections within the block
    #[serde(default)]
    pub elements: Vec<RichTextSection>,
}

/// A section of a rich-text block
#[derive(Debug, Clone, Deserialize)]
pub struct RichTextSection {
    /// Section type
    #[serde(rename = "type")]
    pub kind: String,

    /// Leaf elements (user mentions, text runs, links, ...)
    #[serde(default)]
    pub elements: Vec<RichTextElement>,
}

/// A leaf element of a rich-text section
#[derive(Debug, Clone, Deserialize)]
pub struct RichTextElement {
    /// Element type (`user`, `text`, ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Mentioned user ID (for `user` elements)
    pub user_id: Option<String>,

    /// Text content (for `text` elements)
    pub text: Option<String>,
}

// =============================================================================
// Extraction
// =============================================================================

/// Reduce an event to the fields indexing needs, failing closed.
///
/// A missing `text` or `ts` makes the whole event unusable for indexing; no
/// partial or best-effort extraction.
pub fn extract_message(event: &MessageEvent) -> Result<InboundMessage> {
    let text = event
        .text
        .clone()
        .ok_or_else(|| Error::MalformedMessage("message event missing text".to_string()))?;
    let ts = event
        .ts
        .clone()
        .ok_or_else(|| Error::MalformedMessage("message event missing ts".to_string()))?;
    Ok(InboundMessage { text, ts })
}

/// Find a question addressed to the bot.
///
/// Scans rich-text sections for a mention of `bot_user_id`; the text runs of
/// the mentioning section form the question. Returns `None` when the bot is
/// not mentioned or the mention carries no text.
pub fn extract_query(event: &MessageEvent, bot_user_id: &str) -> Option<String> {
    for block in &event.blocks {
        if block.kind != "rich_text" {
            continue;
        }
        for section in &block.elements {
            let mentions_bot = section
                .elements
                .iter()
                .any(|e| e.kind == "user" && e.user_id.as_deref() == Some(bot_user_id));
            if !mentions_bot {
                continue;
            }

            let query = section
                .elements
                .iter()
                .filter(|e| e.kind == "text")
                .filter_map(|e| e.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
                .trim()
                .to_string();

            if !query.is_empty() {
                return Some(query);
            }
        }
    }
    None
}

// =============================================================================
// Web API client
// =============================================================================

/// Minimal Slack Web API client
pub struct SlackClient {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
}

/// Common envelope of Slack Web API responses
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
    #[serde(flatten)]
    rest: serde_json::Value,
}

impl SlackClient {
    /// Create a client from config and a bot token
    pub fn new(config: &SlackConfig, bot_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Call a Web API method, checking the `ok` envelope field
    async fn call(&self, method: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(self.api_url(method))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("{method} request failed: {e}")))?;

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Channel(format!("{method} returned malformed JSON: {e}")))?;

        if !parsed.ok {
            return Err(Error::Channel(format!(
                "{method} failed: {}",
                parsed.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        Ok(parsed.rest)
    }

    /// Identify the bot, returning its own user ID
    pub async fn auth_test(&self) -> Result<String> {
        let response = self.call("auth.test", json!({})).await?;
        response
            .get("user_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Channel("auth.test response missing user_id".to_string()))
    }

    /// Join a channel by name, returning its ID
    pub async fn join_channel(&self, name: &str) -> Result<String> {
        let response = self.call("conversations.list", json!({})).await?;
        let channels = response
            .get("channels")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                Error::Channel("conversations.list response missing channels".to_string())
            })?;

        let channel_id = channels
            .iter()
            .find(|c| c.get("name").and_then(|n| n.as_str()) == Some(name))
            .and_then(|c| c.get("id"))
            .and_then(|id| id.as_str())
            .ok_or_else(|| Error::Channel(format!("channel not found: {name}")))?
            .to_string();

        self.call("conversations.join", json!({ "channel": channel_id }))
            .await?;
        tracing::info!(channel = %name, channel_id = %channel_id, "Joined channel");
        Ok(channel_id)
    }

    /// Post a plain text message, returning the posted message's `ts`
    pub async fn post_message(&self, message: &OutboundMessage) -> Result<String> {
        let response = self
            .call(
                "chat.postMessage",
                json!({ "channel": message.channel, "text": message.text }),
            )
            .await?;
        response
            .get("ts")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Channel("chat.postMessage response missing ts".to_string()))
    }
}
