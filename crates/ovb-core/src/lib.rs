//! Core domain + application logic for the offtop VK bot.
//!
//! This crate is intentionally platform-agnostic. The VK API (message sending,
//! long polling) lives behind ports (traits) implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod schedule;
pub mod store;

pub use errors::{Error, Result};
