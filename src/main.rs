use serenity::prelude::*;

use anyhow::Context as _;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info_span, warn};
use tracing_futures::Instrument;
use tracing_subscriber::EnvFilter;

use category_cloner::config::{Cli, OutputOptions, Settings};
use category_cloner::console::{self, InteractionMode};
use category_cloner::guild::SerenityGuild;
use category_cloner::handler::Handler;
use category_cloner::tags::TagPatchClient;

fn init_tracing(output: OutputOptions) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if output.verbose {
            "category_cloner=debug,info"
        } else {
            "info"
        })
    });

    if output.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    let cli = Cli::parse();
    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(why) => {
            eprintln!("Invalid settings:\n{why}");
            std::process::exit(1);
        }
    };
    init_tracing(settings.output);

    let mode = InteractionMode::detect(cli.non_interactive);
    let options = settings.discord;
    let name = console::category_name(mode, cli.name, options.test_mode).await?;

    let (ready_tx, ready_rx) = async_channel::bounded(1);
    let mut client = Client::builder(&options.token, GatewayIntents::GUILDS)
        .event_handler(Handler::new(ready_tx))
        .await
        .context("failed to create the Discord client")?;

    let http = client.http.clone();
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(why) = client.start().await {
            error!(error = %why, "An error occurred while running the client");
        }
    });

    let actor = tokio::select! {
        user = ready_rx.recv() => user.context("the gateway client stopped before it was ready")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted before the bot connected");
            shard_manager.shutdown_all().await;
            return Ok(());
        }
    };

    let api = SerenityGuild::new(http, options.guild_id, actor);
    let tags = TagPatchClient::new(&options.token);
    let span = info_span!("clone_run", guild_id = %options.guild_id, category = %name);

    let result = tokio::select! {
        result = category_cloner::run(&api, &tags, &options, &name, mode).instrument(span) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, resources created so far are left in place");
            Ok(())
        }
    };

    shard_manager.shutdown_all().await;
    result
}
