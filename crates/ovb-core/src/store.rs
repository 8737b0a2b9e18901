//! Persistence for the activated conversation id.
//!
//! The backing store is a one-line text file holding a single decimal number.
//! Handlers and the bootstrap only see the `ChatStore` trait so tests can
//! inject an in-memory implementation.

use std::{fs, path::PathBuf};

use tracing::{error, info, warn};

use crate::{domain::ChatId, Result};

/// Outcome of a `set` call, used for logging and assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The backing file did not exist and was created.
    Created,
    /// The stored id differed and was overwritten.
    Updated,
    /// The stored id already matched; the file was left untouched.
    Unchanged,
}

/// Store for the single activated conversation id.
pub trait ChatStore: Send + Sync {
    /// Returns the stored id, or `None` when nothing (valid) is stored.
    /// Read failures are logged, not raised.
    fn get(&self) -> Option<ChatId>;

    /// Persists `chat`, rewriting the backing file only when the stored value
    /// differs.
    fn set(&self, chat: ChatId) -> Result<WriteOutcome>;
}

/// `ChatStore` over a one-line text file.
pub struct FileChatStore {
    path: PathBuf,
}

impl FileChatStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ChatStore for FileChatStore {
    fn get(&self) -> Option<ChatId> {
        let txt = match fs::read_to_string(&self.path) {
            Ok(txt) => txt,
            Err(e) => {
                warn!("could not read chat id file {}: {e}", self.path.display());
                return None;
            }
        };

        match txt.trim().parse::<i64>() {
            Ok(id) => Some(ChatId(id)),
            Err(_) => {
                error!(
                    "chat id file {} does not contain a number",
                    self.path.display()
                );
                None
            }
        }
    }

    fn set(&self, chat: ChatId) -> Result<WriteOutcome> {
        if self.path.exists() {
            let existing = fs::read_to_string(&self.path)?;
            if let Ok(prev) = existing.trim().parse::<i64>() {
                if prev == chat.0 {
                    info!(
                        "chat id {chat} is already recorded in {}",
                        self.path.display()
                    );
                    return Ok(WriteOutcome::Unchanged);
                }
                fs::write(&self.path, chat.0.to_string())?;
                info!("chat id changed from {prev} to {chat} and updated in file");
                return Ok(WriteOutcome::Updated);
            }

            // Unparseable content counts as a mismatch.
            fs::write(&self.path, chat.0.to_string())?;
            info!(
                "chat id file {} had invalid content, replaced with {chat}",
                self.path.display()
            );
            return Ok(WriteOutcome::Updated);
        }

        fs::write(&self.path, chat.0.to_string())?;
        info!("chat id {chat} written to {}", self.path.display());
        Ok(WriteOutcome::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_store(name: &str) -> FileChatStore {
        let path = PathBuf::from(format!("/tmp/ovb-store-{name}-{}", std::process::id()));
        let _ = fs::remove_file(&path);
        FileChatStore::new(path)
    }

    #[test]
    fn set_creates_file_and_get_reads_it_back() {
        let store = tmp_store("create");
        assert_eq!(store.set(ChatId(123)).unwrap(), WriteOutcome::Created);
        assert_eq!(fs::read_to_string(&store.path).unwrap(), "123");
        assert_eq!(store.get(), Some(ChatId(123)));
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn set_same_id_leaves_file_untouched() {
        let store = tmp_store("same");
        store.set(ChatId(123)).unwrap();
        assert_eq!(store.set(ChatId(123)).unwrap(), WriteOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&store.path).unwrap(), "123");
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn set_different_id_overwrites() {
        let store = tmp_store("overwrite");
        store.set(ChatId(123)).unwrap();
        assert_eq!(store.set(ChatId(456)).unwrap(), WriteOutcome::Updated);
        assert_eq!(fs::read_to_string(&store.path).unwrap(), "456");
        assert_eq!(store.get(), Some(ChatId(456)));
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn get_missing_file_is_none() {
        let store = tmp_store("missing");
        assert_eq!(store.get(), None);
    }

    #[test]
    fn get_non_numeric_content_is_none() {
        let store = tmp_store("garbage");
        fs::write(&store.path, "not a number").unwrap();
        assert_eq!(store.get(), None);
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn get_tolerates_surrounding_whitespace() {
        let store = tmp_store("whitespace");
        fs::write(&store.path, " 123\n").unwrap();
        assert_eq!(store.get(), Some(ChatId(123)));
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn set_replaces_invalid_content() {
        let store = tmp_store("invalid");
        fs::write(&store.path, "garbage").unwrap();
        assert_eq!(store.set(ChatId(7)).unwrap(), WriteOutcome::Updated);
        assert_eq!(fs::read_to_string(&store.path).unwrap(), "7");
        let _ = fs::remove_file(&store.path);
    }
}
