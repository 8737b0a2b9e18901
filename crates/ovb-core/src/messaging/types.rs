use chrono::Utc;

use crate::domain::PeerId;

/// Incoming text message, stripped down to what the bot reacts to.
///
/// Platform-specific fields (attachments, sender id, conversation metadata)
/// stay in the adapter.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub peer_id: PeerId,
    pub text: String,
}

/// Deduplication token passed with every outbound send (VK `random_id`).
///
/// The platform drops a message whose token it has already seen for the same
/// recipient, so every send generates a fresh one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DedupToken(pub i64);

impl DedupToken {
    /// Fresh token from the current timestamp (millisecond resolution).
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }
}
