//! Channel boundary message types

use serde::{Deserialize, Serialize};

/// A raw inbound chat message, reduced to what indexing needs
///
/// `ts` is the platform's origination timestamp as a numeric string of epoch
/// seconds (possibly fractional), exactly as Slack delivers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message content (may be empty)
    pub text: String,

    /// Origination timestamp, numeric-string epoch seconds
    pub ts: String,
}

/// An outbound answer addressed to a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Target channel ID
    pub channel: String,

    /// Plain text content
    pub text: String,
}
