//! Messenger abstractions (VK today; anything with numeric chats later).

pub mod port;
pub mod types;
