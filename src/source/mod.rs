//! Frame sources: where boards and playlists come from.

pub mod http;
pub mod worker;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::types::{FontRender, FontRequest, Playlist, PlaylistItem};

pub use http::HttpFrameSource;

/// The two calls the viewer makes against a flip-disc server.
pub trait FrameSource {
    /// Render `request.text` with a bitmap font.
    fn render_text(&self, request: &FontRequest) -> Result<FontRender, SourceError>;

    /// Playlist currently scheduled for `site`.
    fn get_playlist(&self, site: &str) -> Result<Playlist, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn render_text(&self, request: &FontRequest) -> Result<FontRender, SourceError> {
        (**self).render_text(request)
    }

    fn get_playlist(&self, site: &str) -> Result<Playlist, SourceError> {
        (**self).get_playlist(site)
    }
}

/// Plays a playlist saved as JSON. The file is re-read on every call, so
/// edits show up on the next refresh.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileFrameSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for FileFrameSource {
    fn render_text(&self, _request: &FontRequest) -> Result<FontRender, SourceError> {
        Err(SourceError::Unsupported("text rendering"))
    }

    fn get_playlist(&self, _site: &str) -> Result<Playlist, SourceError> {
        let json = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        // A saved file holds either a whole playlist or a single item.
        let value: serde_json::Value = serde_json::from_str(&json)?;
        if value.get("videos").is_some() {
            return Ok(serde_json::from_value(value)?);
        }
        let item: PlaylistItem = serde_json::from_value(value)?;
        Ok(Playlist { videos: vec![item] })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_json(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_a_full_playlist() {
        let file = write_json(
            r#"{"videos": [{"layout": [["a"]], "frames": [{"a": [[1, 0]]}], "fps": 2}]}"#,
        );
        let playlist = FileFrameSource::new(file.path()).get_playlist("any").unwrap();
        assert_eq!(playlist.videos.len(), 1);
        assert_eq!(playlist.videos[0].frames[0]["a"].rows, vec![vec![true, false]]);
    }

    #[test]
    fn reads_a_bare_item() {
        let file = write_json(r#"{"layout": [["a"]], "frames": [{"a": [[0]]}], "frameRate": 8}"#);
        let playlist = FileFrameSource::new(file.path()).get_playlist("any").unwrap();
        assert_eq!(playlist.videos.len(), 1);
        assert_eq!(playlist.videos[0].fps, 8.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileFrameSource::new(dir.path().join("nope.json"));
        assert!(matches!(source.get_playlist("any"), Err(SourceError::Io { .. })));
    }

    #[test]
    fn malformed_file_is_a_decode_error() {
        let file = write_json("{\"videos\": 3}");
        let source = FileFrameSource::new(file.path());
        assert!(matches!(source.get_playlist("any"), Err(SourceError::Decode(_))));
    }

    #[test]
    fn text_rendering_is_unsupported() {
        let source = FileFrameSource::new("unused.json");
        let request = FontRequest {
            font_name: "TI84".into(),
            text: "hi".into(),
            space_width: 1,
            kerning: 0,
        };
        assert!(matches!(
            source.render_text(&request),
            Err(SourceError::Unsupported(_))
        ));
    }
}
