use std::fmt;

use serenity::model::prelude::{ChannelId, PermissionOverwriteType};

use crate::channel_info::ChannelInfo;
use crate::config::DiscordOptions;
use crate::guild::GuildApi;
use crate::permissions::everyone;
use crate::resources::CreatedResources;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    Success,
    Warning,
    Error,
    Info,
}

impl FindingKind {
    fn emoji(self) -> &'static str {
        match self {
            FindingKind::Success => "✅",
            FindingKind::Warning => "⚠️",
            FindingKind::Error => "❌",
            FindingKind::Info => "ℹ️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: FindingKind,
    pub category: &'static str,
    pub message: String,
    pub description: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.kind.emoji(),
            self.category,
            self.message,
            self.description
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct VerificationReport {
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
}

impl VerificationReport {
    fn push(
        &mut self,
        kind: FindingKind,
        category: &'static str,
        message: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.findings.push(Finding {
            kind,
            category,
            message: message.into(),
            description: description.into(),
        });
    }

    fn recommend(&mut self, recommendation: impl Into<String>) {
        let recommendation = recommendation.into();
        if !self.recommendations.contains(&recommendation) {
            self.recommendations.push(recommendation);
        }
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(FindingKind::Error) > 0
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Verification summary: {} success, {} warning(s), {} error(s), {} info",
            self.count(FindingKind::Success),
            self.count(FindingKind::Warning),
            self.count(FindingKind::Error),
            self.count(FindingKind::Info),
        );
        for finding in &self.findings {
            summary.push_str(&format!("\n  {finding}"));
        }
        if !self.recommendations.is_empty() {
            summary.push_str("\nRecommendations:");
            for recommendation in &self.recommendations {
                summary.push_str(&format!("\n  • {recommendation}"));
            }
        }
        summary
    }
}

/// Checks that what a run created is still there and visible the way the
/// options asked for. Never modifies anything.
#[instrument(skip_all)]
pub async fn verify(
    api: &dyn GuildApi,
    created: &CreatedResources,
    options: &DiscordOptions,
) -> anyhow::Result<VerificationReport> {
    let channels = api.channels().await?;
    let everyone = everyone(api.guild_id());
    let find = |id: ChannelId| channels.iter().find(|c| c.id == id);
    let mut report = VerificationReport::default();

    let category = match created.category_id {
        None => {
            report.push(
                FindingKind::Error,
                "Category",
                "Category ID missing",
                "The run did not record a category ID",
            );
            report.recommend("Check the log for the error that stopped category creation");
            None
        }
        Some(id) => match find(id) {
            None => {
                report.push(
                    FindingKind::Error,
                    "Category",
                    "Category not found",
                    format!("Category {id} no longer exists"),
                );
                report.recommend(
                    "Make sure nobody deleted the category while the run was in progress",
                );
                None
            }
            Some(category) => {
                if category.denies_view(everyone) {
                    report.push(
                        FindingKind::Warning,
                        "Category",
                        "Category hidden from everyone",
                        format!("`{}` denies View Channel to @everyone", category.name),
                    );
                } else {
                    report.push(
                        FindingKind::Success,
                        "Category",
                        "Category exists",
                        format!("`{}` is visible", category.name),
                    );
                }
                Some(category)
            }
        },
    };

    if created.channel_ids.is_empty() {
        report.push(
            FindingKind::Warning,
            "Channels",
            "No channels created",
            "The run did not create any channels",
        );
        report.recommend("Check that the source category contains supported channels");
    } else {
        let mut verified = 0;
        for id in &created.channel_ids {
            match find(*id) {
                None => {
                    report.push(
                        FindingKind::Error,
                        "Channels",
                        "Channel not found",
                        format!("Channel {id} no longer exists"),
                    );
                    report.recommend("Re-run the clone to recreate the missing channels");
                }
                Some(channel) => {
                    verified += 1;
                    if channel.denies_view(everyone) {
                        report.push(
                            FindingKind::Warning,
                            "Channels",
                            "Channel hidden from everyone",
                            format!("`{}` denies View Channel to @everyone", channel.name),
                        );
                    }
                }
            }
        }
        report.push(
            FindingKind::Info,
            "Channels",
            "Channels verified",
            format!("{verified}/{} channels exist", created.channel_ids.len()),
        );
    }

    if let Some(role) = created.role_id {
        match api.role_exists(role).await {
            Ok(true) => {
                report.push(
                    FindingKind::Success,
                    "Role",
                    "Role exists",
                    format!("Role {role} was found"),
                );
                if let Some(category) = category {
                    if category.allows_view(PermissionOverwriteType::Role(role)) {
                        report.push(
                            FindingKind::Success,
                            "Role",
                            "Role has category access",
                            format!("Role {role} may view `{}`", category.name),
                        );
                    } else {
                        report.push(
                            FindingKind::Warning,
                            "Role",
                            "Role lacks category access",
                            format!("Role {role} has no View Channel allow on `{}`", category.name),
                        );
                        report.recommend("Grant the role View Channel on the category");
                    }
                }
            }
            Ok(false) => report.push(
                FindingKind::Error,
                "Role",
                "Role not found",
                format!("Role {role} no longer exists"),
            ),
            Err(why) => {
                report.push(
                    FindingKind::Error,
                    "Role",
                    "Role lookup failed",
                    format!("Role {role} could not be looked up: {why}"),
                );
                report.recommend("Check the role in Discord by hand");
            }
        }
    }

    if options.sync_channels_to_category && !created.channel_ids.is_empty() {
        let total = created.channel_ids.len();
        let inheriting = created
            .channel_ids
            .iter()
            .filter_map(|id| find(*id))
            .filter(|c: &&ChannelInfo| c.permission_overwrites.is_empty())
            .count();
        let description = format!("{inheriting}/{total} channels inherit the category permissions");
        if inheriting == total {
            report.push(
                FindingKind::Success,
                "Permissions",
                "Channels inherit",
                description,
            );
        } else {
            report.push(
                FindingKind::Warning,
                "Permissions",
                "Channels don't all inherit",
                description,
            );
            report.recommend("Sync the channels' permissions with the category in Discord");
        }
    }

    if !options.everyone_access {
        if let Some(category) = category {
            if category.denies_view(everyone) {
                report.push(
                    FindingKind::Success,
                    "Permissions",
                    "Everyone denied",
                    "The category explicitly hides itself from @everyone",
                );
            } else {
                report.push(
                    FindingKind::Warning,
                    "Permissions",
                    "Everyone not denied",
                    "Everyone access is disabled but the category has no deny for @everyone",
                );
                report.recommend("Deny View Channel for @everyone on the category");
            }
        }
    }

    Ok(report)
}
