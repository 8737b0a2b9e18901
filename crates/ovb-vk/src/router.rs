//! Startup sequence and long-poll entry point.

use std::sync::Arc;

use tracing::{error, info, warn};

use ovb_core::{
    config::Config,
    messaging::{port::MessagingPort, types::DedupToken},
    schedule::DailyScheduler,
    store::ChatStore,
};

use crate::{api::VkApi, handlers, longpoll::LongPoller, VkMessenger};

/// Shared dependencies for the message handlers.
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<dyn ChatStore>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Arm the schedules from the stored chat id, then listen for updates.
///
/// Schedule arming happens before the long-poll session is established, so a
/// broken poll connection never silences the daily messages.
pub async fn run_polling(cfg: Arc<Config>, store: Arc<dyn ChatStore>) -> anyhow::Result<()> {
    let api = VkApi::new(
        cfg.vk_token.clone(),
        cfg.api_version.clone(),
        cfg.request_timeout,
    );

    // Startup banner, best-effort.
    match api.group_info().await {
        Ok(g) => info!("ovb started: @{} ({})", g.screen_name, g.name),
        Err(e) => warn!("could not fetch group info: {e}"),
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(VkMessenger::new(api.clone()));
    let scheduler = DailyScheduler::new(messenger.clone());

    match store.get() {
        Some(chat) => {
            scheduler
                .schedule("close", cfg.close_time, &cfg.close_message, chat)
                .await;
            scheduler
                .schedule("open", cfg.open_time, &cfg.open_message, chat)
                .await;

            // One-off probe so a dead token shows up in the log right away.
            if let Err(e) = messenger
                .send_to_chat(chat, &cfg.startup_message, DedupToken::now())
                .await
            {
                error!("startup message to chat {chat} failed: {e}");
            }
        }
        None => {
            error!(
                "chat id not found; check {} or send {} in the target conversation to create it",
                cfg.chat_id_file.display(),
                handlers::ACTIVATION_COMMAND
            );
        }
    }

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        store,
        messenger,
    });

    let poller = LongPoller::new(api, cfg.group_id, cfg.long_poll_wait);
    poller
        .run(move |msg| handlers::handle_message(msg, state.clone()))
        .await?;

    Ok(())
}
