//! VK adapter.
//!
//! This crate implements the `ovb-core` MessagingPort over the VK API and
//! hosts the long-poll listener plus the message handlers.

use async_trait::async_trait;

pub mod api;
pub mod handlers;
pub mod longpoll;
pub mod router;

use ovb_core::{
    domain::{ChatId, PeerId},
    messaging::{port::MessagingPort, types::DedupToken},
    Result,
};

use crate::api::VkApi;

#[derive(Clone)]
pub struct VkMessenger {
    api: VkApi,
}

impl VkMessenger {
    pub fn new(api: VkApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MessagingPort for VkMessenger {
    async fn send_to_peer(&self, peer: PeerId, text: &str, dedup: DedupToken) -> Result<()> {
        self.api.messages_send_to_peer(peer, text, dedup).await
    }

    async fn send_to_chat(&self, chat: ChatId, text: &str, dedup: DedupToken) -> Result<()> {
        self.api.messages_send_to_chat(chat, text, dedup).await
    }
}
