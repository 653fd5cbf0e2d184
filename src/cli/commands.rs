//! Command implementations

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::adapters::{AppConfig, HeadlessPlayer};
use crate::app::{AppContainer, ClipRequest, DefaultAppContainer};
use crate::cli::args::{ClipArgs, FormatsArgs, MergeArgs};
use crate::cli::Commands;
use crate::domain::model::{JobStatus, TimeRange, MIN_CLIP_GAP};
use crate::domain::rules::{ClipRange, CommitOutcome};
use crate::domain::sequence::{ClipSequence, ItemPatch, MAX_CLIPS};
use crate::error::{TrimmerError, TrimmerResult};
use crate::relay;
use crate::utils::time::{from_display, to_display};

/// Run `command` against an already resolved configuration
pub async fn execute(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Serve(_) => serve(config).await,
        Commands::Formats(args) => {
            let container = DefaultAppContainer::new(config)?;
            formats(&container, args).await
        }
        Commands::Clip(args) => {
            let container = DefaultAppContainer::new(config)?;
            clip(&container, args).await
        }
        Commands::Merge(args) => {
            let container = DefaultAppContainer::new(config)?;
            merge(&container, args).await
        }
    }
}

/// Execute the serve command
pub async fn serve(config: &AppConfig) -> Result<()> {
    info!(bind = %config.bind_addr, "Starting relay");
    relay::serve(config).await.context("Relay server failed")
}

/// Execute the formats command
pub async fn formats(container: &dyn AppContainer, args: FormatsArgs) -> Result<()> {
    let info = container
        .clip_interactor()
        .list_formats(&args.url)
        .await
        .context("Failed to fetch formats")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Resolutions:");
    for note in info.resolutions() {
        let ids: Vec<&str> = info
            .formats
            .iter()
            .filter(|f| f.ext == "mp4" && f.note.as_deref() == Some(note))
            .map(|f| f.format_id.as_str())
            .collect();
        println!("  {:<8} {}", note, ids.join(", "));
    }
    match info.audio_format() {
        Some(audio) => println!("Audio: {} ({})", audio.format_id, audio.ext),
        None => println!("Audio: none"),
    }
    Ok(())
}

/// Execute the clip command
pub async fn clip(container: &dyn AppContainer, args: ClipArgs) -> Result<()> {
    let range = resolve_range(&args.start, &args.end, args.duration)?;
    info!(range = %range, resolution = %args.resolution, "Requesting clip");

    let response = container
        .clip_interactor()
        .create_clip(&ClipRequest {
            url: args.url,
            range,
            resolution: args.resolution,
        })
        .await
        .context("Failed to create clip")?;

    info!(
        format_id = %response.format_id,
        duration = %to_display(response.range.duration()),
        "Clip ready"
    );
    println!("{}", response.downloadable_url);
    Ok(())
}

/// Execute the merge command
pub async fn merge(container: &dyn AppContainer, args: MergeArgs) -> Result<()> {
    let sequence = build_sequence(&args.clips)?;
    let interactor = container.merge_interactor();
    let poller = interactor.poller();

    let mut rx = poller.subscribe();
    let progress = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            if let JobStatus::Processing { progress, stage } = &status {
                info!(progress, stage = %stage, "Merging");
            }
            if status.is_terminal() {
                break;
            }
        }
    });

    let started = interactor
        .merge(&sequence)
        .await
        .context("Failed to start merge")?;
    info!(status = %started, "Merge submitted");

    let status = poller.wait_for_settled().await;
    progress.abort();

    if args.json {
        let report = serde_json::json!({
            "job": status,
            "clips": sequence.merge_request().videos.len(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return match status {
            JobStatus::Completed { .. } => Ok(()),
            other => bail!("Merge did not complete: {}", other),
        };
    }

    match status {
        JobStatus::Completed { result_path } => {
            println!("{}", result_path);
            Ok(())
        }
        JobStatus::Failed {
            stage,
            error_message,
        } => bail!("Merge failed ({}): {}", stage, error_message),
        other => bail!("Merge job cannot be tracked (last status: {})", other),
    }
}

/// Range for a single clip. With a known duration the text goes through the
/// same clamped commits as the editor; otherwise it must already be valid.
pub fn resolve_range(start: &str, end: &str, duration: Option<f64>) -> TrimmerResult<TimeRange> {
    match duration {
        Some(duration) => {
            let mut clip = ClipRange::new();
            clip.on_player_ready(Arc::new(HeadlessPlayer::new(duration)));
            if clip.commit_start(start) == CommitOutcome::Reverted {
                return Err(TrimmerError::InvalidTimeFormat {
                    time: start.to_string(),
                });
            }
            if clip.commit_end(end) == CommitOutcome::Reverted {
                return Err(TrimmerError::InvalidTimeFormat {
                    time: end.to_string(),
                });
            }
            if !clip.range().is_valid() {
                warn!(range = %clip.range(), "Video shorter than the minimum clip");
                return Err(TrimmerError::InvalidTimeRange {
                    start: clip.raw().start.clone(),
                    end: clip.raw().end.clone(),
                });
            }
            Ok(*clip.range())
        }
        None => parse_range(start, end),
    }
}

fn parse_range(start: &str, end: &str) -> TrimmerResult<TimeRange> {
    let parse = |text: &str| {
        from_display(text)
            .map(|secs| secs as f64)
            .ok_or_else(|| TrimmerError::InvalidTimeFormat {
                time: text.to_string(),
            })
    };
    let (start_secs, end_secs) = (parse(start)?, parse(end)?);
    if start_secs + MIN_CLIP_GAP > end_secs {
        return Err(TrimmerError::InvalidTimeRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    Ok(TimeRange {
        start: start_secs,
        end: end_secs,
        total_duration: end_secs,
    })
}

/// Sequence from `URL,START,END` specs, in the given order
pub fn build_sequence(specs: &[String]) -> Result<ClipSequence> {
    if specs.len() > MAX_CLIPS {
        bail!("At most {} clips can be merged, got {}", MAX_CLIPS, specs.len());
    }

    let mut sequence = ClipSequence::new();
    for (index, spec) in specs.iter().enumerate() {
        let mut parts = spec.rsplitn(3, ',');
        let (end, start, url) = match (parts.next(), parts.next(), parts.next()) {
            (Some(end), Some(start), Some(url)) => (end, start, url),
            _ => bail!("Clip '{}' is not URL,START,END", spec),
        };
        let range = parse_range(start.trim(), end.trim())
            .with_context(|| format!("Invalid times in clip {}", index + 1))?;

        if index > 0 {
            sequence.insert()?;
        }
        sequence.update(index, ItemPatch::source_url(url.trim()))?;
        let item = sequence.update(index, ItemPatch::range(range))?;
        if item.video_id.is_none() {
            warn!(url = %item.source_url, "Clip has no YouTube video id and will be skipped");
        }
    }
    Ok(sequence)
}
