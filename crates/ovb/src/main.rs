use std::sync::Arc;

use ovb_core::{config::Config, store::FileChatStore};

#[tokio::main]
async fn main() -> Result<(), ovb_core::Error> {
    ovb_core::logging::init("ovb")?;

    let cfg = Arc::new(Config::load()?);
    let store = Arc::new(FileChatStore::new(cfg.chat_id_file.clone()));

    ovb_vk::router::run_polling(cfg, store)
        .await
        .map_err(|e| ovb_core::Error::External(format!("vk bot failed: {e}")))?;

    Ok(())
}
