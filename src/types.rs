//! Shared data model for the flip-disc viewer.
//!
//! Everything that crosses the wire lives here:
//! - Frame Source → Driver: `Playlist`, `PlaylistItem`, `Frame`, `FontRender`
//! - Driver → Renderer: `PlaybackState`

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Dots and boards
// ---------------------------------------------------------------------------

/// Wire encodings the flip-disc servers use for a single disc.
#[derive(Deserialize)]
#[serde(untagged)]
enum DotRepr {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl DotRepr {
    fn into_dot<E: serde::de::Error>(self) -> Result<bool, E> {
        match self {
            DotRepr::Bool(b) => Ok(b),
            DotRepr::Int(n) => Ok(n != 0),
            DotRepr::Text(s) => match s.as_str() {
                "⚫️" | "⚫" | "1" | "true" | "#" => Ok(true),
                "⚪️" | "⚪" | "0" | "false" | "" | " " => Ok(false),
                other => Err(E::custom(format!("invalid dot {other:?}"))),
            },
        }
    }
}

/// One physical flip-disc panel: rows of dots, `true` meaning flipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub rows: Vec<Vec<bool>>,
}

impl Board {
    pub fn new(rows: Vec<Vec<bool>>) -> Self {
        Board { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row. Rows may be ragged.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// True when the board holds no dots at all.
    pub fn is_blank(&self) -> bool {
        self.width() == 0
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        // The font server sends `null` for unknown glyphs and for the rows of
        // a zero-width space. Both decode as empty.
        let raw: Option<Vec<Option<Vec<DotRepr>>>> = Option::deserialize(d)?;
        let rows = raw
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.unwrap_or_default()
                    .into_iter()
                    .map(DotRepr::into_dot)
                    .collect::<Result<Vec<bool>, D::Error>>()
            })
            .collect::<Result<_, D::Error>>()?;
        Ok(Board { rows })
    }
}

// ---------------------------------------------------------------------------
// Layout, frames and playlists
// ---------------------------------------------------------------------------

/// Decode an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// How named boards tile into the composite display, row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout(pub Vec<Vec<String>>);

impl Layout {
    pub fn rows(&self) -> &[Vec<String>] {
        &self.0
    }

    /// Every board name in row-major order. Duplicates are kept.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().flatten().map(String::as_str)
    }
}

/// One playback instant: board name to board.
pub type Frame = HashMap<String, Board>;

/// A video: frames sharing one layout, played at `fps`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub layout: Layout,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frames: Vec<Frame>,
    #[serde(default, alias = "frameRate")]
    pub fps: f64,
}

impl PlaylistItem {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// What a site is currently scheduled to play.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Vec<PlaylistItem>,
}

// ---------------------------------------------------------------------------
// Font rendering
// ---------------------------------------------------------------------------

/// Body of a font render request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontRequest {
    pub font_name: String,
    pub text: String,
    pub space_width: i32,
    pub kerning: i32,
}

/// The shapes the font endpoint answers with.
///
/// Decoding tries the shallowest shape first, so `[]` and `[[]]` both
/// land in `Single` as an empty board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontRender {
    /// One board for the whole text.
    Single(Board),
    /// One board per output line.
    MultiLine(Vec<Board>),
    /// Lines of per-letter boards.
    Lettered(Vec<Vec<Board>>),
}

impl Default for FontRender {
    fn default() -> Self {
        FontRender::Single(Board::default())
    }
}

impl FontRender {
    /// Normalize every variant to lines of boards placed side by side.
    pub fn lines(&self) -> Vec<Vec<&Board>> {
        match self {
            FontRender::Single(board) => vec![vec![board]],
            FontRender::MultiLine(lines) => lines.iter().map(|b| vec![b]).collect(),
            FontRender::Lettered(lines) => {
                lines.iter().map(|line| line.iter().collect()).collect()
            }
        }
    }

    /// Total number of dots across all boards.
    pub fn dot_count(&self) -> usize {
        self.lines()
            .iter()
            .flatten()
            .map(|b| b.rows.iter().map(Vec::len).sum::<usize>())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Driver → Renderer boundary
// ---------------------------------------------------------------------------

/// The renderable snapshot for one tick. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub layout: Layout,
    pub boards: HashMap<String, Board>,
    pub frame_index: usize,
    pub frame_count: usize,
}

impl PlaybackState {
    /// Pair every name in `layout` with its board in `frame`. Names the
    /// frame lacks are left out.
    pub fn from_frame(layout: &Layout, frame: &Frame, frame_index: usize, frame_count: usize) -> Self {
        let mut boards = HashMap::new();
        for name in layout.names() {
            if let Some(board) = frame.get(name) {
                boards.insert(name.to_string(), board.clone());
            }
        }
        PlaybackState {
            layout: layout.clone(),
            boards,
            frame_index,
            frame_count,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {}/{} ({} boards)",
            self.frame_index + 1,
            self.frame_count,
            self.boards.len()
        )
    }
}
