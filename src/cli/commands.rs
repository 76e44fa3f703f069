use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::upload::clipboard::HOLD_COMMAND;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Log more (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage video assets
    Assets(Assets),
    #[command(name = HOLD_COMMAND, hide = true)]
    HoldClipboard,
}

#[derive(Parser)]
pub struct Assets {
    #[command(subcommand)]
    pub command: AssetCommands,
}

/// Flags shared by every command that creates an asset.
#[derive(Args, Debug, Clone, Copy)]
pub struct AssetFlags {
    /// Give the new asset a signed playback policy instead of a public one
    #[arg(long)]
    pub private: bool,
}

#[derive(Subcommand)]
pub enum AssetCommands {
    /// Upload a local file, or the files of a directory, as new assets
    Upload(UploadArgs),
    /// Create an asset from a remote video URL
    Create(CreateArgs),
    /// Show a single asset
    Get {
        #[arg(required = true)]
        asset_id: String,
    },
    /// List assets
    List {
        #[arg(long, default_value_t = 25)]
        limit: u32,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Delete an asset
    Delete {
        #[arg(required = true)]
        asset_id: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct UploadArgs {
    /// File or directory to upload
    #[arg(required = true)]
    pub path: PathBuf,

    /// Case-insensitive regex matched against file names
    #[arg(short, long, default_value = "")]
    pub filter: String,

    /// Maximum number of files uploaded at once [default: 3]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrent: Option<u32>,

    /// Seconds to wait for processing before giving up, 0 waits forever
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not copy the result to the clipboard
    #[arg(long)]
    pub no_clipboard: bool,

    #[command(flatten)]
    pub flags: AssetFlags,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Publicly reachable URL of the source video
    #[arg(required = true)]
    pub url: String,

    /// Wait until the asset is ready to play
    #[arg(long)]
    pub wait: bool,

    /// Seconds to wait for processing before giving up, 0 waits forever
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub flags: AssetFlags,
}
