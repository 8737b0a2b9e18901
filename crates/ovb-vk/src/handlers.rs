//! Incoming message handling.
//!
//! The command surface is a single activation command: it pins the current
//! conversation as the target for the scheduled daily messages.

use std::sync::Arc;

use tracing::{error, info};

use ovb_core::{
    domain::ChatId,
    messaging::types::{DedupToken, IncomingMessage},
};

use crate::router::AppState;

pub(crate) const ACTIVATION_COMMAND: &str = "/start";

fn is_activation(text: &str) -> bool {
    text.eq_ignore_ascii_case(ACTIVATION_COMMAND)
}

/// React to one incoming text message. Everything except the activation
/// command is ignored.
pub async fn handle_message(msg: IncomingMessage, state: Arc<AppState>) {
    if !is_activation(&msg.text) {
        return;
    }

    let chat = ChatId::from_peer(msg.peer_id);

    let confirmation = format!(
        "Бот активирован для этой беседы. Ежедневно в {} и {} будут отправляться запланированные сообщения.",
        state.cfg.close_time, state.cfg.open_time
    );
    if let Err(e) = state
        .messenger
        .send_to_peer(msg.peer_id, &confirmation, DedupToken::now())
        .await
    {
        error!("failed to send activation reply to peer {}: {e}", msg.peer_id);
    }

    info!("chat {chat} activated");

    if let Err(e) = state.store.set(chat) {
        error!("error updating chat id file: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{sync::Mutex, time::Duration};

    use async_trait::async_trait;

    use ovb_core::{
        config::Config,
        domain::PeerId,
        messaging::port::MessagingPort,
        schedule::DailyTime,
        store::{ChatStore, WriteOutcome},
        Result,
    };

    #[test]
    fn activation_matches_case_insensitively_and_exactly() {
        assert!(is_activation("/start"));
        assert!(is_activation("/START"));
        assert!(is_activation("/Start"));

        assert!(!is_activation("start"));
        assert!(!is_activation("/start now"));
        assert!(!is_activation(" /start"));
        assert!(!is_activation(""));
    }

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn send_to_peer(&self, peer: PeerId, text: &str, _: DedupToken) -> Result<()> {
            self.sent.lock().unwrap().push((peer.0, text.to_string()));
            Ok(())
        }

        async fn send_to_chat(&self, chat: ChatId, text: &str, _: DedupToken) -> Result<()> {
            self.sent.lock().unwrap().push((chat.0, text.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        value: Mutex<Option<ChatId>>,
    }

    impl ChatStore for MemoryStore {
        fn get(&self) -> Option<ChatId> {
            *self.value.lock().unwrap()
        }

        fn set(&self, chat: ChatId) -> Result<WriteOutcome> {
            let mut value = self.value.lock().unwrap();
            let outcome = match *value {
                None => WriteOutcome::Created,
                Some(prev) if prev == chat => WriteOutcome::Unchanged,
                Some(_) => WriteOutcome::Updated,
            };
            *value = Some(chat);
            Ok(outcome)
        }
    }

    fn test_state() -> (Arc<AppState>, Arc<RecordingMessenger>, Arc<MemoryStore>) {
        let cfg = Config {
            vk_token: "token".to_string(),
            group_id: None,
            api_version: "5.131".to_string(),
            chat_id_file: "/tmp/ovb-handlers-test".into(),
            close_time: DailyTime::parse("10:00").unwrap(),
            open_time: DailyTime::parse("20:00").unwrap(),
            close_message: "closed".to_string(),
            open_message: "open".to_string(),
            startup_message: "test".to_string(),
            long_poll_wait: Duration::from_secs(25),
            request_timeout: Duration::from_secs(10),
        };
        let messenger = Arc::new(RecordingMessenger::default());
        let store = Arc::new(MemoryStore::default());
        let state = Arc::new(AppState {
            cfg: Arc::new(cfg),
            store: store.clone(),
            messenger: messenger.clone(),
        });
        (state, messenger, store)
    }

    #[tokio::test]
    async fn activation_persists_derived_chat_id_and_replies() {
        let (state, messenger, store) = test_state();

        let msg = IncomingMessage {
            peer_id: PeerId(2_000_000_123),
            text: "/start".to_string(),
        };
        handle_message(msg, state).await;

        assert_eq!(store.get(), Some(ChatId(123)));

        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        // The reply goes back to the raw peer and names both schedule times.
        assert_eq!(sent[0].0, 2_000_000_123);
        assert!(sent[0].1.contains("10:00"));
        assert!(sent[0].1.contains("20:00"));
    }

    #[tokio::test]
    async fn other_messages_are_ignored() {
        let (state, messenger, store) = test_state();

        for text in ["hello", "", "/stop", "/start please"] {
            let msg = IncomingMessage {
                peer_id: PeerId(2_000_000_123),
                text: text.to_string(),
            };
            handle_message(msg, state.clone()).await;
        }

        assert_eq!(store.get(), None);
        assert!(messenger.sent.lock().unwrap().is_empty());
    }
}
