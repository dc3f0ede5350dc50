//! Playback driver: owns the frame index and decides what plays next.
//!
//! The driver never performs I/O on its own schedule. Callers either hand it
//! fetch results through `accept` (the interactive viewer, whose fetches run
//! on the request worker) or let `tick` pull from a `FrameSource` directly
//! (headless snapshots and tests).

pub mod ticker;

use std::time::Duration;

use crate::error::SourceError;
use crate::source::FrameSource;
use crate::types::{PlaybackState, Playlist, PlaylistItem};

/// When the driver goes back to the frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Fetch until the first success, then keep playing that item.
    Once,
    /// Fetch again on every tick to pick up playlist changes.
    EveryTick,
}

#[derive(Debug)]
pub struct PlaybackDriver {
    refresh: Refresh,
    current: Option<PlaylistItem>,
    frame_index: Option<usize>,
    fallback_period: Duration,
}

impl PlaybackDriver {
    pub fn new(refresh: Refresh, fallback_period: Duration) -> Self {
        PlaybackDriver {
            refresh,
            current: None,
            frame_index: None,
            fallback_period,
        }
    }

    /// A driver for a fixed item that never refreshes.
    pub fn with_item(item: PlaylistItem, fallback_period: Duration) -> Self {
        PlaybackDriver {
            refresh: Refresh::Once,
            current: Some(item),
            frame_index: None,
            fallback_period,
        }
    }

    pub fn needs_refresh(&self) -> bool {
        self.refresh == Refresh::EveryTick || self.current.is_none()
    }

    pub fn current(&self) -> Option<&PlaylistItem> {
        self.current.as_ref()
    }

    /// Index of the frame most recently published, if any.
    pub fn frame_index(&self) -> Option<usize> {
        self.frame_index
    }

    /// Time between ticks: `1000ms / fps` for a loaded item played from a
    /// single fetch, the fallback period otherwise.
    pub fn period(&self) -> Duration {
        if self.refresh == Refresh::EveryTick {
            return self.fallback_period;
        }
        match &self.current {
            Some(item) if item.fps.is_finite() && item.fps > 0.0 => {
                Duration::from_micros((1_000_000.0 / item.fps).round().max(1.0) as u64)
            }
            _ => self.fallback_period,
        }
    }

    /// Apply a playlist fetch. Only the first video is played.
    ///
    /// Failures and empty playlists keep the last known item. Returns true
    /// when the playing item changed.
    pub fn accept(&mut self, result: Result<Playlist, SourceError>) -> bool {
        let playlist = match result {
            Ok(playlist) => playlist,
            Err(e) => {
                tracing::warn!("playlist refresh failed, keeping last frame: {e}");
                return false;
            }
        };
        let Some(item) = playlist.videos.into_iter().next() else {
            tracing::debug!("playlist has no videos, keeping last item");
            return false;
        };
        if self.current.as_ref() == Some(&item) {
            return false;
        }

        tracing::info!(
            frames = item.frame_count(),
            fps = item.fps,
            "now playing a new item"
        );
        self.current = Some(item);
        self.frame_index = None;
        true
    }

    /// Step to the next frame and build its state.
    ///
    /// Loops forever. Returns `None` when there is no item or it has no frames.
    pub fn advance(&mut self) -> Option<PlaybackState> {
        let item = self.current.as_ref()?;
        let count = item.frame_count();
        if count == 0 {
            return None;
        }

        let index = match self.frame_index {
            None => 0,
            Some(prev) => (prev + 1) % count,
        };
        self.frame_index = Some(index);

        Some(PlaybackState::from_frame(
            &item.layout,
            &item.frames[index],
            index,
            count,
        ))
    }

    /// Refresh from `source` if due, then advance.
    pub fn tick<S: FrameSource + ?Sized>(&mut self, source: &S, site: &str) -> Option<PlaybackState> {
        if self.needs_refresh() {
            self.accept(source.get_playlist(site));
        }
        self.advance()
    }
}
