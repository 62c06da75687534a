//! Slack Web API client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::types::{ApiResponse, ConversationsListResponse, PostMessageParams, PostMessageRequest};
use super::ChatPoster;
use crate::error::SlackError;

const SLACK_API_BASE: &str = "https://slack.com/api";

pub struct SlackClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(token: &str) -> Self {
        Self::new_with_base_url(token, SLACK_API_BASE)
    }

    pub fn new_with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Checks that the token is accepted.
    #[instrument(skip(self), level = "debug")]
    pub async fn auth_test(&self) -> Result<(), SlackError> {
        let response = self
            .client
            .post(format!("{}/auth.test", self.base_url))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let resp: ApiResponse = Self::handle_response(response).await?;
        check_ok(resp.ok, resp.error)
    }

    /// Resolves a channel or private group name to its id.
    #[instrument(skip(self), level = "debug")]
    pub async fn channel_id(&self, channel_name: &str) -> Result<String, SlackError> {
        let name = channel_name.trim_start_matches('#');
        let mut cursor = String::new();

        loop {
            let mut url = format!(
                "{}/conversations.list?types=public_channel,private_channel&exclude_archived=true&limit=200",
                self.base_url
            );
            if !cursor.is_empty() {
                url.push_str(&format!("&cursor={}", urlencoding::encode(&cursor)));
            }

            let response = self
                .client
                .get(&url)
                .header("Authorization", self.auth_header())
                .send()
                .await?;

            let resp: ConversationsListResponse = Self::handle_response(response).await?;
            check_ok(resp.ok, resp.error)?;

            if let Some(ch) = resp.channels.into_iter().find(|ch| ch.name == name) {
                return Ok(ch.id);
            }

            cursor = resp
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                return Err(SlackError::ChannelNotFound(name.to_string()));
            }
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SlackError> {
        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

fn check_ok(ok: bool, error: Option<String>) -> Result<(), SlackError> {
    if ok {
        Ok(())
    } else {
        Err(SlackError::Api(error.unwrap_or_else(|| "unknown_error".to_string())))
    }
}

#[async_trait]
impl ChatPoster for SlackClient {
    #[instrument(skip(self, text, params), level = "info")]
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        params: &PostMessageParams,
    ) -> Result<(), SlackError> {
        self.auth_test().await?;
        let channel_id = self.channel_id(channel).await?;

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .header("Authorization", self.auth_header())
            .json(&PostMessageRequest {
                channel: &channel_id,
                text,
                params,
            })
            .send()
            .await?;

        let resp: ApiResponse = Self::handle_response(response).await?;
        check_ok(resp.ok, resp.error)?;
        debug!("Posted message to {} ({})", channel, channel_id);
        Ok(())
    }
}
