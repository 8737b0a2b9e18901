/// Core error type for the bot.
///
/// The VK adapter maps its specific failures into this type so the core can
/// handle them consistently (fatal config error vs logged-and-ignored).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("vk api error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
