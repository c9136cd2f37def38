//! Settings for one cloning run.
//!
//! Sources, lowest priority first: built-in defaults, `cloner.toml` (or the
//! file passed with `--config`), `DISCORD_*` environment variables, command
//! line flags.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use serenity::model::prelude::GuildId;
use thiserror::Error;

pub const MIN_TOKEN_LEN: usize = 50;

#[derive(Parser, Debug, Default)]
#[command(name = "category_cloner", version, about = "Clone a Discord category with its channels")]
pub struct Cli {
    /// Name of the category to create
    #[arg(short, long)]
    pub name: Option<String>,

    /// Settings file (defaults to ./cloner.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bot token
    #[arg(long)]
    pub token: Option<String>,

    /// ID of the server holding the template category
    #[arg(long)]
    pub server_id: Option<String>,

    /// Name of the template category
    #[arg(long)]
    pub source_category: Option<String>,

    #[arg(long, value_name = "BOOL")]
    pub create_role_per_category: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub everyone_access: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub sync_channels_to_category: Option<bool>,

    /// Verify the clone afterwards and offer to delete it
    #[arg(long, value_name = "BOOL")]
    pub test_mode: Option<bool>,

    /// Delete the clone after verification without asking
    #[arg(long, value_name = "BOOL")]
    pub auto_cleanup: Option<bool>,

    /// Never prompt; also implied by CI or a redirected stdin
    #[arg(long)]
    pub non_interactive: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Settings as read from the sources, before validation.
#[derive(Deserialize, Debug, Default)]
pub struct RawSettings {
    pub token: Option<String>,
    pub server_id: Option<String>,
    pub source_category_name: Option<String>,
    #[serde(default)]
    pub create_role_per_category: bool,
    #[serde(default)]
    pub everyone_access: bool,
    #[serde(default)]
    pub sync_channels_to_category: bool,
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default)]
    pub auto_cleanup: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub json_output: bool,
}

#[derive(Debug, Clone)]
pub struct DiscordOptions {
    pub token: String,
    pub guild_id: GuildId,
    pub source_category_name: String,
    pub create_role_per_category: bool,
    pub everyone_access: bool,
    pub sync_channels_to_category: bool,
    pub test_mode: bool,
    pub auto_cleanup: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub verbose: bool,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord: DiscordOptions,
    pub output: OutputOptions,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self, SettingsError> {
        let file = match &cli.config {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::with_name("cloner").required(false),
        };

        let raw: RawSettings = config::Config::builder()
            .set_default("create_role_per_category", false)?
            .set_default("everyone_access", true)?
            .set_default("sync_channels_to_category", true)?
            .set_default("test_mode", false)?
            .set_default("auto_cleanup", false)?
            .set_default("verbose", false)?
            .set_default("json_output", false)?
            .add_source(file)
            .add_source(config::Environment::with_prefix("DISCORD"))
            .set_override_option("token", cli.token.clone())?
            .set_override_option("server_id", cli.server_id.clone())?
            .set_override_option("source_category_name", cli.source_category.clone())?
            .set_override_option("create_role_per_category", cli.create_role_per_category)?
            .set_override_option("everyone_access", cli.everyone_access)?
            .set_override_option("sync_channels_to_category", cli.sync_channels_to_category)?
            .set_override_option("test_mode", cli.test_mode)?
            .set_override_option("auto_cleanup", cli.auto_cleanup)?
            .set_override_option("verbose", cli.verbose.then_some(true))?
            .set_override_option("json_output", cli.json.then_some(true))?
            .build()?
            .try_deserialize()?;

        raw.validate()
    }
}

impl RawSettings {
    /// Checks every rule and reports all violations at once, in rule order.
    pub fn validate(self) -> Result<Settings, SettingsError> {
        let mut problems = Vec::new();

        let token = self.token.map(|t| t.trim().to_string()).unwrap_or_default();
        if token.len() < MIN_TOKEN_LEN {
            problems.push(format!(
                "Token is required and must be at least {MIN_TOKEN_LEN} characters long"
            ));
        }

        let guild_id = self
            .server_id
            .as_deref()
            .map(str::trim)
            .and_then(|id| id.parse::<u64>().ok())
            .filter(|id| *id != 0)
            .map(GuildId::new);
        if guild_id.is_none() {
            problems.push("ServerId is required and must be a non-zero numeric ID".to_string());
        }

        let source_category_name = self.source_category_name.unwrap_or_default();
        if source_category_name.trim().is_empty() {
            problems.push("SourceCategoryName is required".to_string());
        }

        if self.auto_cleanup && !self.test_mode {
            problems.push("AutoCleanup requires TestMode to be enabled".to_string());
        }

        match guild_id {
            Some(guild_id) if problems.is_empty() => Ok(Settings {
                discord: DiscordOptions {
                    token,
                    guild_id,
                    source_category_name,
                    create_role_per_category: self.create_role_per_category,
                    everyone_access: self.everyone_access,
                    sync_channels_to_category: self.sync_channels_to_category,
                    test_mode: self.test_mode,
                    auto_cleanup: self.auto_cleanup,
                },
                output: OutputOptions {
                    verbose: self.verbose,
                    json: self.json_output,
                },
            }),
            _ => Err(SettingsError::Invalid(problems)),
        }
    }
}
