use anyhow::Context as _;
use serenity::model::prelude::ChannelId;

use crate::guild::GuildApi;
use crate::resources::CreatedResources;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: usize,
    pub missing: usize,
    pub failed: usize,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Deletes what a run created: channels first, then the category, then the role.
///
/// Each resource is handled on its own, a missing or undeletable one doesn't
/// stop the rest. Only a failure to look the guild up at all is returned.
#[instrument(skip_all, fields(channels = created.channel_ids.len()))]
pub async fn delete_created(
    api: &dyn GuildApi,
    created: &CreatedResources,
) -> anyhow::Result<CleanupReport> {
    if created.is_empty() {
        debug!("Nothing was created, skipping cleanup");
        return Ok(CleanupReport::default());
    }

    let existing = match api.channels().await {
        Ok(channels) => channels
            .into_iter()
            .map(|c| c.id)
            .collect::<Vec<ChannelId>>(),
        Err(why) => {
            error!(error = %why, "Cleanup failed, could not list guild channels");
            return Err(why).context("cleanup could not list guild channels");
        }
    };

    let mut report = CleanupReport::default();

    for id in created.channel_ids.iter().chain(created.category_id.iter()) {
        if !existing.contains(id) {
            warn!(channel_id = %id, "Channel no longer exists, skipping");
            report.missing += 1;
            continue;
        }
        match api.delete_channel(*id).await {
            Ok(()) => {
                info!(channel_id = %id, ":wastebasket: Deleted channel");
                report.deleted += 1;
            }
            Err(why) => {
                error!(error = %why, channel_id = %id, "Failed to delete channel");
                report.failed += 1;
            }
        }
    }

    if let Some(role) = created.role_id {
        match api.role_exists(role).await {
            Ok(false) => {
                warn!(role_id = %role, "Role no longer exists, skipping");
                report.missing += 1;
            }
            Ok(true) => match api.delete_role(role).await {
                Ok(()) => {
                    info!(role_id = %role, ":wastebasket: Deleted role");
                    report.deleted += 1;
                }
                Err(why) => {
                    error!(error = %why, role_id = %role, "Failed to delete role");
                    report.failed += 1;
                }
            },
            Err(why) => {
                error!(error = %why, role_id = %role, "Failed to look up role");
                report.failed += 1;
            }
        }
    }

    info!(
        deleted = report.deleted,
        missing = report.missing,
        failed = report.failed,
        "Cleanup finished"
    );
    Ok(report)
}
