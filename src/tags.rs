use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serenity::async_trait;
use serenity::model::prelude::ChannelId;

use crate::channel_info::{ForumTag, TagEmoji};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

const UNREADABLE_BODY: &str = "<unreadable response body>";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TagPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<EmojiPayload>,
    pub moderated: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EmojiPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Serialize)]
struct AvailableTags<'a> {
    available_tags: &'a [TagPayload],
}

impl From<&ForumTag> for TagPayload {
    fn from(tag: &ForumTag) -> Self {
        let emoji = tag.emoji.as_ref().map(|emoji| match emoji {
            TagEmoji::Custom { id, name } => EmojiPayload {
                id: Some(id.to_string()),
                name: name.clone(),
            },
            TagEmoji::Unicode(name) => EmojiPayload {
                id: None,
                name: Some(name.clone()),
            },
        });

        TagPayload {
            name: tag.name.clone(),
            emoji,
            moderated: tag.moderated,
        }
    }
}

/// Replaces the full set of available tags on a forum channel.
///
/// Returns whether the platform accepted the update; callers decide whether
/// a rejected update matters.
#[async_trait]
pub trait TagPatcher: Send + Sync {
    async fn patch_tags(&self, channel: ChannelId, tags: &[TagPayload]) -> bool;
}

pub struct TagPatchClient {
    client: reqwest::Client,
    api_base: String,
    authorization: String,
}

impl TagPatchClient {
    pub fn new(token: &str) -> Self {
        let token = token.trim();
        let authorization = if token.starts_with("Bot ") {
            token.to_string()
        } else {
            format!("Bot {token}")
        };

        Self {
            client: reqwest::Client::new(),
            api_base: DISCORD_API_BASE.to_string(),
            authorization,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn channel_url(&self, channel: ChannelId) -> String {
        format!("{}/channels/{}", self.api_base.trim_end_matches('/'), channel)
    }
}

#[async_trait]
impl TagPatcher for TagPatchClient {
    async fn patch_tags(&self, channel: ChannelId, tags: &[TagPayload]) -> bool {
        let response = self
            .client
            .patch(self.channel_url(channel))
            .header(AUTHORIZATION, &self.authorization)
            .json(&AvailableTags {
                available_tags: tags,
            })
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(why) => {
                error!(error = %why, channel_id = %channel, "Failed to send forum tag update");
                return false;
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(channel_id = %channel, tags = tags.len(), "Forum tags updated");
            return true;
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
        warn!(channel_id = %channel, status = %status, body = %body, "Forum tag update rejected");
        false
    }
}
