use std::sync::Arc;

use anyhow::Context as _;
use serenity::async_trait;
use serenity::builder::{CreateChannel, EditChannel, EditRole};
use serenity::http::Http;
use serenity::model::prelude::{
    ChannelId, ChannelType, GuildId, PermissionOverwrite, Permissions, RoleId, SortOrder, UserId,
};

use crate::channel_info::{ChannelInfo, ChannelKind, ChannelTemplate};

/// Everything the cloner needs from a Discord guild.
///
/// All calls are awaited one at a time by the callers; rate limiting is left
/// to the implementation.
#[async_trait]
pub trait GuildApi: Send + Sync {
    fn guild_id(&self) -> GuildId;

    /// The bot's own user, the principal that performs every write.
    fn actor_id(&self) -> UserId;

    /// All channels of the guild, categories included.
    async fn channels(&self) -> anyhow::Result<Vec<ChannelInfo>>;

    async fn create_category(&self, name: &str) -> anyhow::Result<ChannelId>;

    /// Creates a channel under `category` without explicit overwrites.
    async fn create_channel(
        &self,
        category: ChannelId,
        template: &ChannelTemplate,
    ) -> anyhow::Result<ChannelId>;

    /// Creates or replaces the overwrite for the overwrite's principal.
    async fn write_overwrite(
        &self,
        target: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> anyhow::Result<()>;

    /// Replaces the channel's overwrites with its category's.
    async fn sync_with_category(
        &self,
        channel: ChannelId,
        category: ChannelId,
    ) -> anyhow::Result<()>;

    async fn can_manage_roles(&self) -> anyhow::Result<bool>;

    async fn create_role(&self, name: &str, permissions: Permissions) -> anyhow::Result<RoleId>;

    async fn role_exists(&self, role: RoleId) -> anyhow::Result<bool>;

    async fn delete_channel(&self, channel: ChannelId) -> anyhow::Result<()>;

    async fn delete_role(&self, role: RoleId) -> anyhow::Result<()>;
}

pub struct SerenityGuild {
    http: Arc<Http>,
    guild_id: GuildId,
    actor: UserId,
}

impl SerenityGuild {
    pub fn new(http: Arc<Http>, guild_id: GuildId, actor: UserId) -> Self {
        Self {
            http,
            guild_id,
            actor,
        }
    }

    async fn channel_info(&self, id: ChannelId) -> anyhow::Result<ChannelInfo> {
        let channel = self
            .http
            .get_channel(id)
            .await?
            .guild()
            .ok_or_else(|| anyhow::anyhow!("channel {id} is not a guild channel"))?;
        Ok(ChannelInfo::from_guild_channel(&channel)?)
    }
}

#[async_trait]
impl GuildApi for SerenityGuild {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    fn actor_id(&self) -> UserId {
        self.actor
    }

    async fn channels(&self) -> anyhow::Result<Vec<ChannelInfo>> {
        let channels = self
            .http
            .get_channels(self.guild_id)
            .await
            .with_context(|| format!("failed to list channels of guild {}", self.guild_id))?;

        channels
            .iter()
            .map(|c| ChannelInfo::from_guild_channel(c).map_err(anyhow::Error::from))
            .collect()
    }

    async fn create_category(&self, name: &str) -> anyhow::Result<ChannelId> {
        let category = self
            .guild_id
            .create_channel(&*self.http, CreateChannel::new(name).kind(ChannelType::Category))
            .await?;
        Ok(category.id)
    }

    async fn create_channel(
        &self,
        category: ChannelId,
        template: &ChannelTemplate,
    ) -> anyhow::Result<ChannelId> {
        let mut builder = CreateChannel::new(&template.name)
            .kind(template.kind.channel_type())
            .category(category);

        match &template.kind {
            ChannelKind::Text {
                topic,
                rate_limit_per_user,
                nsfw,
            } => {
                if let Some(topic) = topic {
                    builder = builder.topic(topic);
                }
                if let Some(seconds) = rate_limit_per_user {
                    builder = builder.rate_limit_per_user(*seconds);
                }
                builder = builder.nsfw(*nsfw);
            }
            ChannelKind::Announcement { topic } => {
                if let Some(topic) = topic {
                    builder = builder.topic(topic);
                }
            }
            ChannelKind::Voice {
                bitrate,
                user_limit,
            } => {
                if let Some(bitrate) = bitrate {
                    builder = builder.bitrate(*bitrate);
                }
                if let Some(limit) = user_limit {
                    builder = builder.user_limit(*limit);
                }
            }
            ChannelKind::Forum {
                topic,
                default_sort_order,
                ..
            } => {
                if let Some(topic) = topic {
                    builder = builder.topic(topic);
                }
                if let Some(order) = default_sort_order {
                    builder = builder.default_sort_order(SortOrder::from(*order));
                }
            }
        }

        let channel = self.guild_id.create_channel(&*self.http, builder).await?;
        Ok(channel.id)
    }

    async fn write_overwrite(
        &self,
        target: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> anyhow::Result<()> {
        target.create_permission(&*self.http, overwrite).await?;
        Ok(())
    }

    async fn sync_with_category(
        &self,
        channel: ChannelId,
        category: ChannelId,
    ) -> anyhow::Result<()> {
        let overwrites = self.channel_info(category).await?.permission_overwrites;
        channel
            .edit(&*self.http, EditChannel::new().permissions(overwrites))
            .await?;
        Ok(())
    }

    async fn can_manage_roles(&self) -> anyhow::Result<bool> {
        let member = self.http.get_member(self.guild_id, self.actor).await?;
        let roles = self.http.get_guild_roles(self.guild_id).await?;
        let everyone = RoleId::new(self.guild_id.get());

        let permissions = roles
            .iter()
            .filter(|r| r.id == everyone || member.roles.contains(&r.id))
            .fold(Permissions::empty(), |acc, r| acc | r.permissions);

        Ok(permissions.intersects(Permissions::ADMINISTRATOR | Permissions::MANAGE_ROLES))
    }

    async fn create_role(&self, name: &str, permissions: Permissions) -> anyhow::Result<RoleId> {
        let role = self
            .guild_id
            .create_role(&*self.http, EditRole::new().name(name).permissions(permissions))
            .await?;
        Ok(role.id)
    }

    async fn role_exists(&self, role: RoleId) -> anyhow::Result<bool> {
        let roles = self.http.get_guild_roles(self.guild_id).await?;
        Ok(roles.iter().any(|r| r.id == role))
    }

    async fn delete_channel(&self, channel: ChannelId) -> anyhow::Result<()> {
        channel.delete(&*self.http).await?;
        Ok(())
    }

    async fn delete_role(&self, role: RoleId) -> anyhow::Result<()> {
        self.guild_id.delete_role(&*self.http, role).await?;
        Ok(())
    }
}
