use serde::Deserialize;
use serenity::model::prelude::{
    ChannelId, ChannelType, EmojiId, GuildChannel, PermissionOverwrite, PermissionOverwriteType,
    Permissions,
};

pub const TEXT: u8 = 0;
pub const VOICE: u8 = 2;
pub const CATEGORY: u8 = 4;
pub const ANNOUNCEMENT: u8 = 5;
pub const FORUM: u8 = 15;

/// A guild channel as Discord puts it on the wire.
///
/// Only the fields the cloner reads are kept. Serenity's own models are
/// converted through their serialized form so the forum specific fields
/// (tags, sort order) don't depend on how a given serenity release models them.
#[derive(Deserialize, Debug, Clone)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub position: u16,
    #[serde(default)]
    pub parent_id: Option<ChannelId>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub rate_limit_per_user: Option<u16>,
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub user_limit: Option<u32>,
    #[serde(default)]
    pub default_sort_order: Option<u8>,
    #[serde(default)]
    pub available_tags: Vec<WireForumTag>,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireForumTag {
    pub name: String,
    #[serde(default)]
    pub moderated: bool,
    #[serde(default)]
    pub emoji_id: Option<EmojiId>,
    #[serde(default)]
    pub emoji_name: Option<String>,
}

impl ChannelInfo {
    pub fn from_guild_channel(channel: &GuildChannel) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(channel)?)
    }

    pub fn is_category(&self) -> bool {
        self.kind == CATEGORY
    }

    pub fn overwrite_for(&self, principal: PermissionOverwriteType) -> Option<&PermissionOverwrite> {
        self.permission_overwrites
            .iter()
            .find(|o| o.kind == principal)
    }

    /// True when `principal` has an explicit deny of VIEW_CHANNEL here.
    pub fn denies_view(&self, principal: PermissionOverwriteType) -> bool {
        self.overwrite_for(principal)
            .is_some_and(|o| o.deny.contains(Permissions::VIEW_CHANNEL))
    }

    pub fn allows_view(&self, principal: PermissionOverwriteType) -> bool {
        self.overwrite_for(principal)
            .is_some_and(|o| o.allow.contains(Permissions::VIEW_CHANNEL))
    }

    /// Builds the clone template, or `None` for channel types that aren't cloned.
    pub fn template(&self) -> Option<ChannelTemplate> {
        let kind = match self.kind {
            TEXT => ChannelKind::Text {
                topic: self.topic.clone(),
                rate_limit_per_user: self.rate_limit_per_user,
                nsfw: self.nsfw,
            },
            ANNOUNCEMENT => ChannelKind::Announcement {
                topic: self.topic.clone(),
            },
            VOICE => ChannelKind::Voice {
                bitrate: self.bitrate,
                user_limit: self.user_limit,
            },
            FORUM => ChannelKind::Forum {
                topic: self.topic.clone(),
                default_sort_order: self.default_sort_order,
                tags: self.available_tags.iter().map(ForumTag::from).collect(),
            },
            _ => return None,
        };

        Some(ChannelTemplate {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            kind,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTemplate {
    pub id: ChannelId,
    pub name: String,
    pub position: u16,
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelKind {
    Text {
        topic: Option<String>,
        rate_limit_per_user: Option<u16>,
        nsfw: bool,
    },
    Announcement {
        topic: Option<String>,
    },
    Voice {
        bitrate: Option<u32>,
        user_limit: Option<u32>,
    },
    Forum {
        topic: Option<String>,
        default_sort_order: Option<u8>,
        tags: Vec<ForumTag>,
    },
}

impl ChannelKind {
    /// Position of the kind's group when channels are enumerated.
    pub fn group(&self) -> u8 {
        match self {
            ChannelKind::Text { .. } => 0,
            ChannelKind::Announcement { .. } => 1,
            ChannelKind::Voice { .. } => 2,
            ChannelKind::Forum { .. } => 3,
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        match self {
            ChannelKind::Text { .. } => ChannelType::Text,
            ChannelKind::Announcement { .. } => ChannelType::News,
            ChannelKind::Voice { .. } => ChannelType::Voice,
            ChannelKind::Forum { .. } => ChannelType::Forum,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::Text { .. } => "text",
            ChannelKind::Announcement { .. } => "announcement",
            ChannelKind::Voice { .. } => "voice",
            ChannelKind::Forum { .. } => "forum",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForumTag {
    pub name: String,
    pub emoji: Option<TagEmoji>,
    pub moderated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagEmoji {
    Custom { id: EmojiId, name: Option<String> },
    Unicode(String),
}

impl From<&WireForumTag> for ForumTag {
    fn from(tag: &WireForumTag) -> Self {
        let name = tag.emoji_name.clone().filter(|n| !n.is_empty());
        let emoji = match (tag.emoji_id, name) {
            (Some(id), name) => Some(TagEmoji::Custom { id, name }),
            (None, Some(name)) => Some(TagEmoji::Unicode(name)),
            (None, None) => None,
        };

        ForumTag {
            name: tag.name.clone(),
            emoji,
            moderated: tag.moderated,
        }
    }
}

/// Orders templates the way they get recreated: grouped by kind (text,
/// announcement, voice, forum), then a stable sort by position over the whole list.
pub fn order_for_cloning(mut channels: Vec<ChannelTemplate>) -> Vec<ChannelTemplate> {
    channels.sort_by_key(|c| c.kind.group());
    channels.sort_by_key(|c| c.position);
    channels
}
