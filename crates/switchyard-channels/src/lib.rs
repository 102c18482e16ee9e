//! Switchyard Channels - Chat Adapters
//!
//! Turns chat-platform events into `switchyard_core::ChatMessage`s and posts
//! answers back:
//! - Slack (Events API webhooks, `chat.postMessage` replies)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod slack;

pub use error::{Error, Result};

pub use slack::{SlackAdapter, SlackConfig, SlackPayload};
