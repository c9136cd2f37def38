use serenity::model::prelude::{
    ChannelId, GuildId, PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};

use crate::guild::GuildApi;

/// The @everyone role shares its ID with the guild.
pub fn everyone(guild: GuildId) -> PermissionOverwriteType {
    PermissionOverwriteType::Role(RoleId::new(guild.get()))
}

pub fn access_perms(kind: PermissionOverwriteType) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::VIEW_CHANNEL.union(Permissions::SEND_MESSAGES),
        deny: Permissions::empty(),
        kind,
    }
}

pub fn actor_perms(actor: UserId) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::VIEW_CHANNEL
            .union(Permissions::MANAGE_CHANNELS)
            .union(Permissions::SEND_MESSAGES),
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Member(actor),
    }
}

pub fn hidden_perms(guild: GuildId) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::VIEW_CHANNEL,
        kind: everyone(guild),
    }
}

/// Base permissions of the role created alongside a category.
pub fn role_perms() -> Permissions {
    Permissions::VIEW_CHANNEL
        .union(Permissions::CREATE_INSTANT_INVITE)
        .union(Permissions::SEND_MESSAGES)
        .union(Permissions::SEND_MESSAGES_IN_THREADS)
        .union(Permissions::ATTACH_FILES)
        .union(Permissions::ADD_REACTIONS)
        .union(Permissions::READ_MESSAGE_HISTORY)
}

pub async fn grant_access(
    api: &dyn GuildApi,
    principal: PermissionOverwriteType,
    category: ChannelId,
) -> anyhow::Result<()> {
    api.write_overwrite(category, access_perms(principal)).await
}

/// Keeps the bot from locking itself out of the category it is filling.
pub async fn ensure_actor_access(
    api: &dyn GuildApi,
    actor: UserId,
    category: ChannelId,
) -> anyhow::Result<()> {
    api.write_overwrite(category, actor_perms(actor)).await
}

pub async fn apply_everyone_toggle(
    api: &dyn GuildApi,
    category: ChannelId,
    guild: GuildId,
    enabled: bool,
) -> anyhow::Result<()> {
    if enabled {
        return Ok(());
    }
    api.write_overwrite(category, hidden_perms(guild)).await
}
