#[macro_use]
extern crate tracing;

use clap::Parser;
use greencampus_core::config::Configuration;
use greencampus_core::error::GreenCampusResult;
use greencampus_models::Client;

use crate::cli::{AppCli, Command};

mod api;
mod cli;
mod init;

fn main() -> anyhow::Result<()> {
    init::logging();
    let cli = AppCli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name_fn(|| {
            use std::sync::atomic::{AtomicUsize, Ordering};
            static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
            let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
            format!("greencampus-{}", id)
        })
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))?;
    Ok(())
}

async fn run(cli: AppCli) -> GreenCampusResult<()> {
    let mut config = Configuration::from_env()?;
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    match cli.command {
        Command::Server(args) => {
            if let Some(listen_on) = args.listen_on {
                config.listen_on = listen_on;
            }
            if args.no_seed {
                config.seed_on_start = false;
            }
            cli::server::server_start(config).await
        }
        Command::Seed(args) => cli::seed::seed(&open(&config).await?, &args).await,
        Command::Leaderboard(args) => cli::leaderboard::users(&open(&config).await?, &args).await,
        Command::Campuses => cli::leaderboard::campuses(&open(&config).await?).await,
        Command::RefreshBadges => cli::refresh_badges::refresh_badges(&open(&config).await?).await,
    }
}

/// Migrated store for one-shot commands.
async fn open(config: &Configuration) -> GreenCampusResult<Client> {
    let client = Client::connect(&config.database_url).await?;
    client.migrate().await?;
    Ok(client)
}
