use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use flipdisc_viewer::{
    config::ViewerConfig,
    headless,
    logging::{self, LogTarget},
    preview::FontPreview,
    source::{FileFrameSource, FrameSource, HttpFrameSource},
    viewer::Viewer,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Terminal viewer for flip-disc display boards.
#[derive(Parser)]
#[command(name = "flipdisc-viewer", version)]
struct Cli {
    /// Config file (default: ~/.config/flipdisc-viewer/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    scheme: Option<String>,

    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    /// Append logs to this file; interactive views log nowhere otherwise
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play what a site is showing
    Play {
        #[command(flatten)]
        feed: FeedArgs,
        /// Re-fetch the playlist on every tick
        #[arg(long)]
        follow: bool,
    },
    /// Interactive font preview
    Font {
        #[command(flatten)]
        font: FontArgs,
        /// Initial text
        text: Option<String>,
    },
    /// Print frames as text and exit
    Snapshot {
        #[command(flatten)]
        feed: FeedArgs,
        #[arg(long, default_value_t = 1)]
        frames: usize,
    },
    /// Render text once and print it
    Render {
        #[command(flatten)]
        font: FontArgs,
        text: String,
    },
}

#[derive(Args)]
struct FeedArgs {
    /// Display site to follow
    #[arg(long)]
    site: Option<String>,
    /// Play a saved playlist file instead of a server
    #[arg(long, conflicts_with = "site")]
    file: Option<PathBuf>,
}

#[derive(Args)]
struct FontArgs {
    #[arg(long)]
    font: Option<String>,
    #[arg(long)]
    space_width: Option<i32>,
    #[arg(long, allow_hyphen_values = true)]
    kerning: Option<i32>,
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, Command::Play { .. } | Command::Font { .. });
    let target = match (&cli.log_file, interactive) {
        (Some(path), _) => LogTarget::File(path),
        (None, true) => LogTarget::Off,
        (None, false) => LogTarget::Stderr,
    };
    logging::init(target)?;

    let mut config = ViewerConfig::load(cli.config.as_deref());
    if let Some(scheme) = cli.scheme {
        config.server.scheme = scheme;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command {
        Command::Play { feed, follow } => {
            let (source, label) = open_feed(&mut config, feed)?;
            tracing::info!(%label, follow, "starting playback");
            Viewer::new(config, source, label, follow)?.play()
        }
        Command::Font { font, text } => {
            apply_font(&mut config, font);
            let source = http_source(&config)?;
            FontPreview::new(config, source, text.unwrap_or_default())?.run()
        }
        Command::Snapshot { feed, frames } => {
            let (source, label) = open_feed(&mut config, feed)?;
            let printed = headless::snapshot(&source, &config, &label, frames, &mut io::stdout())?;
            tracing::info!(printed, "snapshot done");
            Ok(())
        }
        Command::Render { font, text } => {
            apply_font(&mut config, font);
            let source = http_source(&config)?;
            headless::render_text(&source, &config, &text, &mut io::stdout())
        }
    }
}

fn http_source(config: &ViewerConfig) -> Result<HttpFrameSource> {
    HttpFrameSource::new(config.server.clone(), config.request_timeout())
        .context("Failed to set up the HTTP client")
}

/// Pick the frame source for `play` and `snapshot`, plus a label for it.
fn open_feed(
    config: &mut ViewerConfig,
    feed: FeedArgs,
) -> Result<(Box<dyn FrameSource + Send>, String)> {
    if let Some(site) = feed.site {
        config.site = site;
    }
    match feed.file {
        Some(path) => {
            let label = path.display().to_string();
            Ok((Box::new(FileFrameSource::new(path)), label))
        }
        None => {
            let label = config.site.clone();
            Ok((Box::new(http_source(config)?), label))
        }
    }
}

fn apply_font(config: &mut ViewerConfig, font: FontArgs) {
    if let Some(name) = font.font {
        config.font.name = name;
    }
    if let Some(space_width) = font.space_width {
        config.font.space_width = space_width;
    }
    if let Some(kerning) = font.kerning {
        config.font.kerning = kerning;
    }
}
