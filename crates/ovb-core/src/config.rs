use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, schedule::DailyTime, Result};

/// Typed configuration, loaded from the environment.
///
/// Only `VK_TOKEN` is required; everything else defaults to the behavior of the
/// original bot (chatId.txt next to the binary, 10:00 close / 20:00 open).
#[derive(Clone, Debug)]
pub struct Config {
    pub vk_token: String,
    pub group_id: Option<i64>,
    pub api_version: String,

    pub chat_id_file: PathBuf,

    pub close_time: DailyTime,
    pub open_time: DailyTime,
    pub close_message: String,
    pub open_message: String,
    pub startup_message: String,

    pub long_poll_wait: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let vk_token = env_str("VK_TOKEN").unwrap_or_default();
        if vk_token.trim().is_empty() {
            return Err(Error::Config(
                "VK_TOKEN environment variable is required".to_string(),
            ));
        }

        // Normally resolved via groups.getById from the token; the override
        // exists for tokens the resolution call is not allowed for.
        let group_id = env_i64("VK_GROUP_ID");
        let api_version = env_str("VK_API_VERSION").unwrap_or_else(|| "5.131".to_string());

        let chat_id_file =
            env_path("CHAT_ID_FILE").unwrap_or_else(|| PathBuf::from("chatId.txt"));

        let close_time = DailyTime::parse(&env_str("CLOSE_TIME").unwrap_or_else(|| "10:00".to_string()))?;
        let open_time = DailyTime::parse(&env_str("OPEN_TIME").unwrap_or_else(|| "20:00".to_string()))?;

        let close_message =
            env_str("CLOSE_MESSAGE").unwrap_or_else(|| "Оффтоп закрыт".to_string());
        let open_message = env_str("OPEN_MESSAGE").unwrap_or_else(|| "Оффтоп открыт".to_string());
        let startup_message = env_str("STARTUP_MESSAGE").unwrap_or_else(|| "test".to_string());

        let long_poll_wait = Duration::from_secs(env_u64("LONG_POLL_WAIT").unwrap_or(25));
        let request_timeout =
            Duration::from_millis(env_u64("REQUEST_TIMEOUT_MS").unwrap_or(10_000));

        Ok(Self {
            vk_token,
            group_id,
            api_version,
            chat_id_file,
            close_time,
            open_time,
            close_message,
            open_message,
            startup_message,
            long_poll_wait,
            request_timeout,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}
