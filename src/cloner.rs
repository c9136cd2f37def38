use anyhow::Context as _;
use serenity::model::prelude::{ChannelId, PermissionOverwriteType};
use thiserror::Error;

use crate::channel_info::{order_for_cloning, ChannelInfo, ChannelKind, ChannelTemplate};
use crate::cleanup;
use crate::config::DiscordOptions;
use crate::guild::GuildApi;
use crate::permissions;
use crate::resources::CreatedResources;
use crate::tags::{TagPatcher, TagPayload};

#[derive(Debug, Error)]
#[error("category `{name}` was not found, available categories: {available:?}")]
pub struct CategoryNotFound {
    pub name: String,
    pub available: Vec<String>,
}

fn find_category<'a>(
    channels: &'a [ChannelInfo],
    name: &str,
) -> Result<&'a ChannelInfo, CategoryNotFound> {
    channels
        .iter()
        .find(|c| c.is_category() && c.name == name)
        .ok_or_else(|| {
            let mut categories: Vec<&ChannelInfo> =
                channels.iter().filter(|c| c.is_category()).collect();
            categories.sort_by_key(|c| c.position);
            CategoryNotFound {
                name: name.to_string(),
                available: categories.iter().map(|c| c.name.clone()).collect(),
            }
        })
}

/// Clones the category named `source` into a new category called `new_name`.
///
/// Fails with [`CategoryNotFound`] before touching anything when the source is
/// missing. Any later unrecoverable error deletes what was created so far
/// before it is returned.
#[instrument(skip(api, tags, options), fields(guild_id = %api.guild_id()))]
pub async fn clone_category(
    api: &dyn GuildApi,
    tags: &dyn TagPatcher,
    source: &str,
    new_name: &str,
    options: &DiscordOptions,
) -> anyhow::Result<CreatedResources> {
    let channels = api.channels().await?;
    let source_category = find_category(&channels, source)?;
    info!(category_id = %source_category.id, "Found source category");

    let mut created = CreatedResources::default();
    let result = run(
        api,
        tags,
        &channels,
        source_category.id,
        new_name,
        options,
        &mut created,
    )
    .await;

    match result {
        Ok(()) => Ok(created),
        Err(why) => {
            error!(error = %why, "Cloning interrupted, removing what was created");
            match cleanup::delete_created(api, &created).await {
                Ok(report) if report.is_clean() => info!("Rollback finished"),
                Ok(report) => warn!(failed = report.failed, "Rollback left resources behind"),
                Err(rollback) => error!(error = %rollback, "Rollback failed"),
            }
            Err(why.context(format!("cloning `{source}` into `{new_name}` failed")))
        }
    }
}

async fn run(
    api: &dyn GuildApi,
    tags: &dyn TagPatcher,
    channels: &[ChannelInfo],
    source: ChannelId,
    new_name: &str,
    options: &DiscordOptions,
    created: &mut CreatedResources,
) -> anyhow::Result<()> {
    let category = api
        .create_category(new_name)
        .await
        .context("failed to create category")?;
    created.record_category(category);
    info!(category_id = %category, ":file_folder: Created category");

    permissions::ensure_actor_access(api, api.actor_id(), category)
        .await
        .context("failed to grant the bot access to the new category")?;
    permissions::apply_everyone_toggle(api, category, api.guild_id(), options.everyone_access)
        .await
        .context("failed to apply the @everyone visibility")?;

    if options.create_role_per_category {
        create_role(api, category, new_name, created).await?;
    }

    let mut templates = Vec::new();
    for channel in channels.iter().filter(|c| c.parent_id == Some(source)) {
        match channel.template() {
            Some(template) => templates.push(template),
            None => info!(
                channel = %channel.name,
                kind = channel.kind,
                "Skipping channel of unsupported type"
            ),
        }
    }

    for template in order_for_cloning(templates) {
        let id = api
            .create_channel(category, &template)
            .await
            .with_context(|| {
                format!(
                    "failed to create {} channel `{}`",
                    template.kind.label(),
                    template.name
                )
            })?;
        created.record_channel(id);
        info!(
            channel_id = %id,
            channel = %template.name,
            kind = template.kind.label(),
            ":hash: Created channel"
        );

        if options.sync_channels_to_category {
            api.sync_with_category(id, category)
                .await
                .with_context(|| format!("failed to sync `{}` with its category", template.name))?;
        }

        patch_forum_tags(tags, id, &template).await;
    }

    Ok(())
}

async fn create_role(
    api: &dyn GuildApi,
    category: ChannelId,
    name: &str,
    created: &mut CreatedResources,
) -> anyhow::Result<()> {
    match api.can_manage_roles().await {
        Ok(true) => {}
        Ok(false) => {
            warn!("Bot is missing Manage Roles, skipping role creation");
            return Ok(());
        }
        Err(why) => {
            warn!(error = %why, "Could not check bot permissions, skipping role creation");
            return Ok(());
        }
    }

    let role = match api.create_role(name, permissions::role_perms()).await {
        Ok(role) => role,
        Err(why) => {
            error!(error = %why, "Failed to create role, continuing without one");
            return Ok(());
        }
    };
    created.record_role(role);
    info!(role_id = %role, ":busts_in_silhouette: Created role");

    if let Err(why) =
        permissions::grant_access(api, PermissionOverwriteType::Role(role), category).await
    {
        error!(error = %why, role_id = %role, "Failed to grant the role category access");
    }
    Ok(())
}

async fn patch_forum_tags(
    tags: &dyn TagPatcher,
    channel: ChannelId,
    template: &ChannelTemplate,
) {
    let ChannelKind::Forum { tags: forum_tags, .. } = &template.kind else {
        return;
    };
    if forum_tags.is_empty() {
        return;
    }

    let payload: Vec<TagPayload> = forum_tags.iter().map(TagPayload::from).collect();
    if tags.patch_tags(channel, &payload).await {
        info!(channel_id = %channel, tags = payload.len(), ":label: Applied forum tags");
    } else {
        warn!(channel_id = %channel, "Forum tags were not applied, the channel keeps none");
    }
}
