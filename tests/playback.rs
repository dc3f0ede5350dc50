use std::io::Write;
use std::time::Duration;

use flipdisc_viewer::{
    config::DisplayConfig,
    driver::{PlaybackDriver, Refresh},
    render::BoardRenderer,
    source::FileFrameSource,
};

const PLAYLIST: &str = r#"{
  "videos": [
    {
      "layout": [["A", "B"], ["C", "D"]],
      "fps": 4,
      "frames": [
        {"A": [[true, false]], "B": [[false, true]], "C": [[true, true]], "D": [[false, false]]},
        {"A": [[0, 1]], "B": [[1, 0]], "C": [[0, 0]]}
      ]
    }
  ]
}"#;

fn plain() -> DisplayConfig {
    DisplayConfig {
        on: '#',
        off: '.',
        on_color: None,
        spaced: false,
        panel_gap: 1,
        row_gap: 0,
    }
}

#[test]
fn file_playlist_plays_and_loops() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(PLAYLIST.as_bytes())?;
    let source = FileFrameSource::new(file.path());

    let mut driver = PlaybackDriver::new(Refresh::Once, Duration::from_secs(1));
    let mut frames = Vec::new();
    for _ in 0..3 {
        let state = driver.tick(&source, "armory").expect("frame");
        let grid = BoardRenderer::rasterize(&BoardRenderer::project(&state), &plain());
        frames.push(BoardRenderer::to_text(&grid));
    }

    assert_eq!(driver.period(), Duration::from_millis(250));
    // Frame two has no "D" board; its cell renders empty.
    assert_eq!(frames, ["#. .#\n## ..", ".# #.\n..", "#. .#\n## .."]);
    Ok(())
}

#[test]
fn vanished_file_keeps_last_item_when_following() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(PLAYLIST.as_bytes())?;
    let path = file.path().to_path_buf();
    let source = FileFrameSource::new(&path);

    let mut driver = PlaybackDriver::new(Refresh::EveryTick, Duration::from_millis(100));
    let first = driver.tick(&source, "armory").expect("first frame");
    drop(file);

    let second = driver.tick(&source, "armory").expect("still playing");
    let third = driver.tick(&source, "armory").expect("still playing");
    assert_eq!(second.frame_index, 1);
    assert_eq!(third, first);
    Ok(())
}
