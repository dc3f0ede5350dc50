use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::render::cell::{Color, NamedColor};
use crate::types::FontRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub server: ServerConfig,
    /// Display site whose playlist `play` and `snapshot` follow.
    pub site: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub font: FontConfig,
    pub display: DisplayConfig,
    pub key_bindings: KeyBindings,
}

/// Where the flip-disc server lives. Built once; the URL is derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub name: String,
    pub space_width: i32,
    pub kerning: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub on: char,
    pub off: char,
    pub on_color: Option<Color>,
    /// Follow each dot with a blank column so discs look round.
    pub spaced: bool,
    pub panel_gap: u16,
    pub row_gap: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub quit: String,
    pub pause: String,
    pub fullscreen: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            server: ServerConfig::default(),
            site: "armory".into(),
            poll_interval_ms: 1000,
            request_timeout_ms: 5000,
            font: FontConfig::default(),
            display: DisplayConfig::default(),
            key_bindings: KeyBindings::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            scheme: "http".into(),
            host: "localhost".into(),
            port: 8080,
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        FontConfig {
            name: "TI84".into(),
            space_width: 1,
            kerning: 0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            on: '●',
            off: '·',
            on_color: Some(Color::Named(NamedColor::Yellow)),
            spaced: true,
            panel_gap: 2,
            row_gap: 1,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            quit: "q".into(),
            pause: "Space".into(),
            fullscreen: "F11".into(),
        }
    }
}

impl ServerConfig {
    /// `scheme://host:port`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Join an absolute path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }
}

impl ViewerConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults silently; an unreadable or invalid one
    /// yields defaults with a warning.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        match std::fs::read_to_string(&config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(
                        path = %config_path.display(),
                        "invalid viewer config ({e}), using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(
                    path = %config_path.display(),
                    "cannot read viewer config ({e}), using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("flipdisc-viewer");
        path.push("config.json");
        path
    }

    /// Font render request for `text` using the configured font settings.
    pub fn font_request(&self, text: &str) -> FontRequest {
        FontRequest {
            font_name: self.font.name.clone(),
            text: text.to_string(),
            space_width: self.font.space_width,
            kerning: self.font.kerning,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(ch) = binding.strip_prefix("Ctrl-") {
        if !event.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        return match ch.chars().next() {
            Some(c) => event.code == KeyCode::Char(c),
            None => false,
        };
    }

    // Plain bindings must not fire while Ctrl or Alt is held.
    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }

    match binding {
        "Enter" => event.code == KeyCode::Enter,
        "Esc" => event.code == KeyCode::Esc,
        "Space" => event.code == KeyCode::Char(' '),
        "Tab" => event.code == KeyCode::Tab,
        s => {
            if let Some(rest) = s.strip_prefix('F') {
                if let Ok(n) = rest.parse::<u8>() {
                    return event.code == KeyCode::F(n);
                }
            }
            match s.chars().next() {
                Some(c) => event.code == KeyCode::Char(c),
                None => false,
            }
        }
    }
}
