use async_trait::async_trait;

use crate::{
    domain::{ChatId, PeerId},
    messaging::types::DedupToken,
    Result,
};

/// Outbound messaging port.
///
/// VK is the first implementation. Replies to an incoming message go to the raw
/// peer; scheduled messages go to the normalized conversation id. The platform
/// treats the two address forms differently, so the port keeps them apart.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_to_peer(&self, peer: PeerId, text: &str, dedup: DedupToken) -> Result<()>;

    async fn send_to_chat(&self, chat: ChatId, text: &str, dedup: DedupToken) -> Result<()>;
}
