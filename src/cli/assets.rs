use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::DateTime;
use dialoguer::Confirm;
use serde_json::json;
use tracing::warn;

use crate::api::VideoApi;
use crate::api::model::{Asset, AssetRequest, PlaybackPolicy, STREAM_BASE_URL};
use crate::config::Config;
use crate::error::CliError;
use crate::upload::pipeline::{BatchOutcome, PipelineOptions};
use crate::upload::poll::{PollSettings, wait_for_asset};
use crate::upload::clipboard::{Clipboard, SystemClipboard};
use crate::upload::report::Report;
use crate::upload::selector::TerminalPrompter;
use crate::upload::{UploadRun, upload};

use super::commands::{AssetCommands, Assets, CreateArgs, UploadArgs};

pub struct Context {
    pub api: Arc<dyn VideoApi>,
    pub config: Config,
    pub json: bool,
}

impl Context {
    fn poll_settings(&self, timeout_override: Option<u64>) -> PollSettings {
        let timeout_secs = timeout_override.unwrap_or(self.config.upload.poll_timeout_secs);
        PollSettings {
            interval: Duration::from_millis(self.config.upload.poll_interval_ms.max(1)),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    fn print<T: serde::Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

pub async fn handle_assets_command(assets: Assets, ctx: &Context) -> Result<()> {
    match assets.command {
        AssetCommands::Upload(args) => handle_upload(args, ctx).await?,
        AssetCommands::Create(args) => handle_create(args, ctx).await?,
        AssetCommands::Get { asset_id } => {
            let asset = ctx.api.get_asset(&asset_id).await?;
            ctx.print(&asset, || print_asset(&asset))?;
        }
        AssetCommands::List { limit, page } => {
            let assets = ctx.api.list_assets(limit, page).await?;
            ctx.print(&assets, || print_asset_list(&assets))?;
        }
        AssetCommands::Delete { asset_id, yes } => {
            if !yes && !confirm_delete(&asset_id)? {
                println!("Aborted, asset {} was not deleted", asset_id);
                return Ok(());
            }
            ctx.api.delete_asset(&asset_id).await?;
            ctx.print(&json!({ "deleted": asset_id }), || {
                println!("Deleted asset {}", asset_id)
            })?;
        }
    }
    Ok(())
}

fn confirm_delete(asset_id: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!("Delete asset {}?", asset_id))
        .default(false)
        .interact()?)
}

async fn handle_create(args: CreateArgs, ctx: &Context) -> Result<()> {
    let policy = PlaybackPolicy::from_private(args.flags.private);
    let mut asset = ctx
        .api
        .create_asset(&AssetRequest::new(args.url.clone(), policy))
        .await?;

    if args.wait {
        asset = wait_for_asset(
            ctx.api.as_ref(),
            &asset.id,
            &args.url,
            &ctx.poll_settings(args.timeout),
        )
        .await?;
    }

    ctx.print(&asset, || print_asset(&asset))
}

async fn handle_upload(args: UploadArgs, ctx: &Context) -> Result<()> {
    let options = PipelineOptions {
        concurrency: args
            .concurrent
            .map(|c| c as usize)
            .unwrap_or(ctx.config.upload.concurrency)
            .max(1),
        policy: PlaybackPolicy::from_private(args.flags.private),
        poll: ctx.poll_settings(args.timeout),
    };

    let mut system_clipboard = if args.no_clipboard {
        None
    } else {
        match SystemClipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                None
            }
        }
    };
    let clipboard = system_clipboard
        .as_mut()
        .map(|c| c as &mut dyn Clipboard);

    let run = upload(
        ctx.api.clone(),
        &args.path,
        &args.filter,
        &options,
        &TerminalPrompter,
        clipboard,
    )
    .await?;

    match run {
        UploadRun::NoFiles => {
            ctx.print(&json!({ "assets": [], "failures": [] }), || {
                println!("No files found")
            })?;
            Ok(())
        }
        UploadRun::Finished {
            outcome,
            report,
            copied,
        } => {
            ctx.print(&outcome_json(&outcome), || {
                print_upload_summary(report.as_ref(), copied)
            })?;
            for failure in &outcome.failures {
                eprintln!(
                    "Failed {} at {}: {}",
                    failure.filename, failure.stage, failure.error
                );
            }
            if outcome.failures.is_empty() {
                Ok(())
            } else {
                Err(CliError::BatchFailed {
                    failed: outcome.failures.len(),
                    total: outcome.total(),
                }
                .into())
            }
        }
    }
}

fn outcome_json(outcome: &BatchOutcome) -> serde_json::Value {
    let failures: Vec<_> = outcome
        .failures
        .iter()
        .map(|f| {
            json!({
                "filename": f.filename,
                "stage": f.stage,
                "error": f.error.to_string(),
            })
        })
        .collect();
    json!({ "assets": outcome.rows, "failures": failures })
}

fn print_upload_summary(report: Option<&Report>, copied: bool) {
    let Some(report) = report else {
        return;
    };
    println!();
    print!("{}", report.summary);
    if copied {
        if report.clipboard.contains('\t') {
            println!("\nTable copied to clipboard.");
        } else {
            println!("\nPlayback URL copied to clipboard.");
        }
    }
}

pub fn format_created(created_at: Option<&str>) -> String {
    created_at
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_duration(duration: Option<f64>) -> String {
    match duration {
        Some(secs) => {
            let total = secs.round() as u64;
            format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
        }
        None => "-".to_string(),
    }
}

fn print_asset(asset: &Asset) {
    println!("Asset {}", asset.id);
    println!("  Status:   {}", asset.status);
    println!("  Duration: {}", format_duration(asset.duration));
    println!("  Created:  {}", format_created(asset.created_at.as_deref()));
    for playback in &asset.playback_ids {
        println!(
            "  Playback: {}/{}.m3u8 ({})",
            STREAM_BASE_URL, playback.id, playback.policy
        );
    }
    if let Some(errors) = &asset.errors {
        println!("  Errors:   {}", errors);
    }
}

fn print_asset_list(assets: &[Asset]) {
    if assets.is_empty() {
        println!("No assets found");
        return;
    }
    let width = assets.iter().map(|a| a.id.len()).max().unwrap_or(0).max(8);
    println!(
        "{:<width$}  {:<9}  {:>8}  {}",
        "Asset ID", "Status", "Duration", "Created"
    );
    for asset in assets {
        println!(
            "{:<width$}  {:<9}  {:>8}  {}",
            asset.id,
            asset.status.to_string(),
            format_duration(asset.duration),
            format_created(asset.created_at.as_deref()),
        );
    }
}
