use std::fmt;

/// Peer ids above this value are group conversations; the chat id is the
/// remainder after subtracting it (VK convention).
pub const GROUP_CHAT_PEER_OFFSET: i64 = 2_000_000_000;

/// Raw VK peer id as delivered in a `message_new` update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerId(pub i64);

/// Normalized conversation id used for `messages.send` and persistence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl ChatId {
    /// Derive a conversation id from a raw peer id.
    ///
    /// Peer ids strictly above the offset denote group conversations and are
    /// shifted down; everything else passes through unchanged.
    pub fn from_peer(peer: PeerId) -> Self {
        if peer.0 > GROUP_CHAT_PEER_OFFSET {
            Self(peer.0 - GROUP_CHAT_PEER_OFFSET)
        } else {
            Self(peer.0)
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
