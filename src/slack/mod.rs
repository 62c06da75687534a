//! Slack Module
//!
//! Posts notification messages to a Slack channel.

mod client;
mod types;

use async_trait::async_trait;

use crate::error::SlackError;

pub use client::SlackClient;
pub use types::{Attachment, AttachmentField, PostMessageParams};

/// Destination for notification messages.
#[async_trait]
pub trait ChatPoster: Send + Sync {
    /// Posts `text` with `params` to the channel named `channel`.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        params: &PostMessageParams,
    ) -> Result<(), SlackError>;
}
