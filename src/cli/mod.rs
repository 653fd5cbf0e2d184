//! CLI module for yt-trimmer
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::LogFormat;

pub mod args;
pub mod commands;

/// YouTube clip creator
///
/// Lists formats, requests trimmed downloads, merges clip sequences and runs
/// the HTTP relay the browser front-end talks to.
#[derive(Parser, Debug)]
#[command(name = "trimmer")]
#[command(about = "YouTube clip creator - trim, download and merge clips")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: trimmer.toml or config/trimmer.toml)
    #[arg(long, env = "TRIMMER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level or filter directive
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the request relay
    Serve(args::ServeArgs),
    /// List the formats available for a video
    Formats(args::FormatsArgs),
    /// Request a trimmed download of one clip
    Clip(args::ClipArgs),
    /// Merge several clips into one video
    Merge(args::MergeArgs),
}
