//! Non-interactive commands: print boards as text and exit.

use std::io::Write;

use anyhow::{Context, Result, bail};

use crate::config::ViewerConfig;
use crate::driver::PlaybackDriver;
use crate::render::BoardRenderer;
use crate::source::FrameSource;

/// Print `frames` successive frames of what `site` is playing. Returns how
/// many frames were printed.
pub fn snapshot<S, W>(
    source: &S,
    config: &ViewerConfig,
    label: &str,
    frames: usize,
    out: &mut W,
) -> Result<usize>
where
    S: FrameSource + ?Sized,
    W: Write,
{
    let playlist = source
        .get_playlist(&config.site)
        .with_context(|| format!("Failed to fetch the playlist for {label}"))?;
    let Some(item) = playlist.videos.into_iter().next() else {
        bail!("{label} is not playing anything");
    };

    let mut driver = PlaybackDriver::with_item(item, config.poll_interval());
    let mut printed = 0;
    for _ in 0..frames {
        let Some(state) = driver.advance() else {
            break;
        };
        let grid = BoardRenderer::rasterize(&BoardRenderer::project(&state), &config.display);
        writeln!(out, "--- {label} {state} ---")?;
        writeln!(out, "{}", BoardRenderer::to_text(&grid))?;
        printed += 1;
    }

    if printed == 0 {
        tracing::warn!("{label} has no frames");
    }
    Ok(printed)
}

/// Render `text` once and print it.
pub fn render_text<S, W>(source: &S, config: &ViewerConfig, text: &str, out: &mut W) -> Result<()>
where
    S: FrameSource + ?Sized,
    W: Write,
{
    let render = source
        .render_text(&config.font_request(text))
        .with_context(|| format!("Failed to render {text:?} in {}", config.font.name))?;
    let grid = BoardRenderer::rasterize(&BoardRenderer::project_font(&render), &config.display);
    writeln!(out, "{}", BoardRenderer::to_text(&grid))?;
    Ok(())
}
