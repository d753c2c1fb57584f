use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aigotchi")]
#[command(about = "Offline-aware virtual companion simulator", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Companion persona (mika or kana)
    #[arg(long, global = true, default_value = "mika")]
    pub persona: String,

    /// Your display name, used in her messages
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Override the data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show current stats, mood and a message
    Status,
    /// Perform one care action (feed, play, clean, nap, headpat, checkin)
    Do {
        action: String,
    },
    /// Run a live session with periodic ticks
    Run,
    /// Remove the persisted state for the persona
    Reset,
}
