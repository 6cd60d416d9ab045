//! Chat platform boundary
//!
//! Typed inbound payloads, webhook authentication, and the outbound Web API
//! client. The rest of the crate only sees `InboundMessage` and plain query
//! strings.

mod auth;
mod message;
mod slack;

pub use auth::{AuthOutcome, SlackAuth};
pub use message::{InboundMessage, OutboundMessage};
pub use slack::{
    extract_message, extract_query, Block, EventEnvelope, MessageEvent, RichTextElement,
    RichTextSection, SlackClient,
};
