use clap::Parser;
use lyricsync::audio::{ClockAudio, MprisAudio};
use lyricsync::mpris::{discover_player, get_metadata, is_blocked};
use lyricsync::pool::{BoxedAudio, Session};
use lyricsync::replace_all::parse_replacement_text;
use lyricsync::store;
use lyricsync::sync::timing::DEFAULT_TAP_DURATION;
use lyricsync::sync::{StartPoint, SyncTiming};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Virtual clock length when neither the player nor the document knows it.
const FALLBACK_DURATION: f64 = 300.0;
/// Room left after the last known timestamp on the virtual clock.
const CLOCK_TAIL: f64 = 30.0;

/// Application configuration from CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Config {
    /// Correction document (JSON) to edit
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Where to write the edited document (defaults to --input)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Index of the line to sync
    #[arg(long, default_value_t = 0)]
    segment: usize,
    /// Replace every line with the contents of this text file and sync the whole song
    #[arg(long = "replace-all", value_name = "PATH")]
    replace_all: Option<PathBuf>,
    /// Arm a session right away, starting at the first word missing a timestamp
    #[arg(long)]
    resume: bool,
    /// MPRIS service to drive. Falls back to LYRICSYNC_PLAYER, then playerctld
    #[arg(long, value_name = "SERVICE")]
    player: Option<String>,
    /// Blocklist for MPRIS player service names (comma-separated, case-insensitive)
    #[arg(long = "block", value_name = "SERVICE1,SERVICE2", value_delimiter = ',')]
    block: Vec<String>,
    /// Track length in seconds for the built-in clock
    #[arg(long, value_name = "SECS")]
    duration: Option<f64>,
    /// Word length in seconds given to a quick tap
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TAP_DURATION)]
    tap_duration: f64,
    /// Read commands from stdin and print timing changes to stdout
    #[arg(long)]
    pipe: bool,
    /// Also write an enhanced LRC rendering on exit
    #[arg(long, value_name = "PATH")]
    export_lrc: Option<PathBuf>,
    /// Enable debug logging to stderr
    #[arg(long)]
    debug_log: bool,
}

fn player_from_env_if_empty(cli: &mut Config) {
    if cli.player.is_none()
        && let Ok(s) = std::env::var("LYRICSYNC_PLAYER")
    {
        let s = s.trim();
        if !s.is_empty() {
            cli.player = Some(s.to_string());
        }
    }
}

fn init_tracing(debug_log: bool) {
    if !debug_log {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lyricsync=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// MPRIS player when one is configured or discoverable, otherwise the
/// virtual clock.
async fn open_audio(cfg: &Config, last_timestamp: Option<f64>) -> BoxedAudio {
    let service = match cfg.player.clone() {
        Some(service) => Some(service),
        None => discover_player(&cfg.block).await,
    };
    if let Some(service) = service.filter(|s| !is_blocked(s, &cfg.block)) {
        let length = match get_metadata(&service).await {
            Ok(meta) => {
                tracing::info!(service = %service, title = %meta.title, artist = %meta.artist, "syncing against player");
                meta.length
            }
            Err(e) => {
                tracing::warn!(service = %service, error = %e, "could not read track metadata");
                None
            }
        };
        return Box::new(MprisAudio::connect(service, length.or(cfg.duration)).await);
    }
    let duration = cfg
        .duration
        .or(last_timestamp.map(|t| t + CLOCK_TAIL))
        .unwrap_or(FALLBACK_DURATION);
    tracing::info!(duration, "no player attached, using virtual clock");
    Box::new(ClockAudio::new(Some(duration)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut cfg = Config::parse();
    player_from_env_if_empty(&mut cfg);
    init_tracing(cfg.debug_log);

    let mut doc = store::load(&cfg.input).await?;
    if let Some(path) = &cfg.replace_all {
        let text = store::read_text(path).await?;
        let segments = parse_replacement_text(&text);
        if segments.is_empty() {
            return Err(format!("{} contains no lyrics", path.display()).into());
        }
        tracing::info!(lines = segments.len(), "replacing all lyrics");
        doc.corrected_segments = segments;
    }

    let audio = open_audio(&cfg, doc.last_timestamp()).await;
    let timing = SyncTiming::default().with_tap_duration(cfg.tap_duration);
    let output = cfg.output.clone().unwrap_or_else(|| cfg.input.clone());
    let session = Session::new(audio, doc, cfg.segment, cfg.replace_all.is_some(), timing);
    let autostart = cfg.resume.then_some(StartPoint::FirstIncomplete);

    let result = if cfg.pipe {
        lyricsync::ui::run_pipe(session, Some(output.clone()), autostart).await
    } else {
        lyricsync::ui::run_modern(session, Some(output.clone()), autostart).await
    };

    // Print error if any, for better diagnostics
    let doc = match result {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(e);
        }
    };
    store::save(&output, &doc).await?;
    if let Some(path) = &cfg.export_lrc {
        let lrc = lyricsync::lrc::export_enhanced_lrc(&doc.corrected_segments);
        store::write_text(path, &lrc).await?;
        tracing::info!(path = %path.display(), "exported enhanced LRC");
    }
    Ok(())
}
