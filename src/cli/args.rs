//! Command-line argument definitions

use clap::Args;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides bind_addr)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Arguments for the formats command
#[derive(Args, Debug)]
pub struct FormatsArgs {
    /// YouTube video URL
    #[arg(short, long)]
    pub url: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// YouTube video URL
    #[arg(short, long)]
    pub url: String,

    /// Start time (HH:MM:SS)
    #[arg(short, long)]
    pub start: String,

    /// End time (HH:MM:SS)
    #[arg(short, long)]
    pub end: String,

    /// Resolution note, e.g. 720p
    #[arg(short, long)]
    pub resolution: String,

    /// Video length in seconds; clamps the range like the editor does
    #[arg(short, long)]
    pub duration: Option<f64>,
}

/// Arguments for the merge command
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Clip as URL,START,END (repeat up to five times, in output order)
    #[arg(short, long = "clip", required = true)]
    pub clips: Vec<String>,

    /// Print the final status as JSON
    #[arg(long)]
    pub json: bool,
}
