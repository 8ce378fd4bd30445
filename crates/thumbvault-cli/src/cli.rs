use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "thumbvault",
    about = "thumbvault: store images and serve cached thumbnails",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Service configuration file
    #[arg(short, long, global = true, default_value = thumbvault_service::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Storage root to use when the configuration file does not exist
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Provider to use (defaults to the configured default)
    #[arg(short, long, global = true, default_value = "")]
    pub provider: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store an image file and print its id
    Save(SaveArgs),
    /// Write the original image to a file
    Get(GetArgs),
    /// Write a thumbnail bounded by width x height to a file
    Thumbnail(ThumbnailArgs),
    /// Delete the original image
    Delete(IdArgs),
    /// Remove cached thumbnails of an image
    Purge(IdArgs),
    /// Resize a file directly, without a provider
    Resize(ResizeArgs),
    /// List configured providers
    Providers,
    /// Show storage and cache statistics for a provider
    Stats,
}

#[derive(Args)]
pub struct SaveArgs {
    pub file: PathBuf,
    /// Store under this id instead of a fresh one
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub id: String,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct BoundsArgs {
    /// Maximum width; 0 leaves the width unconstrained
    #[arg(short = 'W', long, default_value = "0", allow_negative_numbers = true)]
    pub width: i32,
    /// Maximum height; 0 leaves the height unconstrained
    #[arg(short = 'H', long, default_value = "0", allow_negative_numbers = true)]
    pub height: i32,
}

#[derive(Args)]
pub struct ThumbnailArgs {
    pub id: String,
    #[command(flatten)]
    pub bounds: BoundsArgs,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ResizeArgs {
    pub file: PathBuf,
    #[command(flatten)]
    pub bounds: BoundsArgs,
    #[arg(short, long)]
    pub output: PathBuf,
}
