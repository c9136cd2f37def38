pub mod channel_info;
pub mod cleanup;
pub mod cloner;
pub mod config;
pub mod console;
pub mod guild;
pub mod handler;
pub mod permissions;
pub mod resources;
pub mod tags;
pub mod verify;

#[cfg(test)]
mod test_support;

#[macro_use]
extern crate tracing;

use std::time::{Duration, Instant};

use crate::cloner::CategoryNotFound;
use crate::config::DiscordOptions;
use crate::console::InteractionMode;
use crate::guild::GuildApi;
use crate::resources::CreatedResources;
use crate::tags::TagPatcher;

/// One full run: clone the source category into `new_name`, then in test mode
/// verify the result and offer to remove it again.
pub async fn run(
    api: &dyn GuildApi,
    tags: &dyn TagPatcher,
    options: &DiscordOptions,
    new_name: &str,
    mode: InteractionMode,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let created = match cloner::clone_category(
        api,
        tags,
        &options.source_category_name,
        new_name,
        options,
    )
    .await
    {
        Ok(created) => created,
        Err(why) => {
            if let Some(not_found) = why.downcast_ref::<CategoryNotFound>() {
                error!(
                    category = %not_found.name,
                    available = ?not_found.available,
                    "Source category not found"
                );
            }
            return Err(why);
        }
    };

    let elapsed = started.elapsed();
    let elapsed = elapsed - Duration::from_nanos(u64::from(elapsed.subsec_nanos() % 1_000_000));
    info!(
        category = new_name,
        channels = created.channel_ids.len(),
        role = created.role_id.is_some(),
        elapsed = %humantime::format_duration(elapsed),
        ":white_check_mark: Category cloned"
    );
    debug!(created = %serde_json::to_string(&created)?, "Created resources");

    if options.test_mode {
        test_pass(api, options, &created, mode).await?;
    }
    Ok(())
}

async fn test_pass(
    api: &dyn GuildApi,
    options: &DiscordOptions,
    created: &CreatedResources,
    mode: InteractionMode,
) -> anyhow::Result<()> {
    console::pause(mode, "Inspect the new category, then press Enter to verify it.").await?;

    match verify::verify(api, created, options).await {
        Ok(report) if report.has_errors() => warn!("{}", report.summary()),
        Ok(report) => info!("{}", report.summary()),
        Err(why) => error!(error = %why, "Verification could not run"),
    }

    let remove = options.auto_cleanup
        || console::confirm(mode, "Delete everything this run created?", false).await?;
    if !remove {
        info!("Keeping the cloned category");
        return Ok(());
    }

    let report = cleanup::delete_created(api, created).await?;
    if !report.is_clean() {
        warn!(failed = report.failed, "Some resources could not be deleted");
    }
    Ok(())
}
