use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::runtime::Builder;
use tracing::{Level, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod config;
mod error;
mod upload;

use crate::api::client::HttpClient;
use crate::cli::assets::{Context, handle_assets_command};
use crate::cli::commands::{Cli, Commands};
use crate::config::{Config, LogConfig};
use crate::upload::clipboard::{SystemClipboard, hold_selection};

fn log_level(config: &LogConfig, verbose: u8) -> Level {
    let configured = config.level.parse::<Level>().unwrap_or(Level::WARN);
    let requested = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    configured.max(requested)
}

fn init_tracing(config: &LogConfig, verbose: u8) -> Option<WorkerGuard> {
    let filter = Targets::new().with_target("muxcli", log_level(config, verbose));

    let (file_layer, guard) = match &config.dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "muxcli.log");
            let (nb, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(nb)
                .with_filter(filter.clone());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // stdout is reserved for command output
    let stderr_layer = fmt::layer()
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    Registry::default()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    guard
}

/// Keeps a copied selection alive after the uploading process has exited.
fn hold_clipboard() -> Result<()> {
    let mut clipboard = SystemClipboard::new()?;
    hold_selection(
        std::io::stdin().lock(),
        std::io::stdout().lock(),
        &mut clipboard,
    )?;
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let assets = match cli.command {
        Commands::Assets(assets) => assets,
        Commands::HoldClipboard => return hold_clipboard(),
    };

    let (token_id, token_secret) = config.credentials()?;
    let client = HttpClient::new(
        &config.api.base_url,
        token_id,
        token_secret,
        config.api_timeout(),
    )?;
    debug!(base_url = %config.api.base_url, "API client ready");

    let ctx = Context {
        api: Arc::new(client),
        config,
        json: cli.json,
    };

    // uploads are I/O bound; one thread drives all of them
    let runtime = Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(handle_assets_command(assets, &ctx))
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    let guard = init_tracing(&config.log, cli.verbose);

    let result = run(cli, config);

    // flush the file log before exiting
    drop(guard);
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
