// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::{PermissionArg, PhotoOptions};

#[derive(Parser)]
#[command(name = "still-camera")]
#[command(about = "Take a single photo through the camera session controller")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo and save it to the library
    Photo {
        /// Output directory (default: ~/Pictures/still-camera)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Authorization status reported by the permission authority
        #[arg(short, long, value_enum, default_value = "authorized")]
        permission: PermissionArg,

        /// Answer "no" when the user is prompted for access
        #[arg(long)]
        deny_request: bool,

        /// Retake once before saving
        #[arg(long)]
        retake: bool,

        /// Make the first capture fail with this reason
        #[arg(long)]
        fail_capture: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=still_camera=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Photo {
            output,
            permission,
            deny_request,
            retake,
            fail_capture,
        }) => cli::take_photo(PhotoOptions {
            output,
            permission,
            deny_request,
            retake,
            fail_capture,
        }),
        Some(Commands::Config) => cli::show_config(),
        None => cli::take_photo(PhotoOptions {
            output: None,
            permission: PermissionArg::Authorized,
            deny_request: false,
            retake: false,
            fail_capture: None,
        }),
    }
}
