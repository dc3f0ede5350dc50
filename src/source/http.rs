use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::config::ServerConfig;
use crate::error::SourceError;
use crate::types::{FontRender, FontRequest, Playlist};

use super::FrameSource;

pub const FONT_RENDER_PATH: &str = "/v1/fonts/render";

/// `{base}/v1/sites/{site}/playing`, with `site` percent-encoded as a
/// single path segment.
pub fn playing_url(server: &ServerConfig, site: &str) -> Result<String, SourceError> {
    let base = server.base_url();
    let invalid = |reason: String| SourceError::InvalidUrl {
        base: base.clone(),
        reason,
    };
    let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("not a hierarchical URL".into()))?
        .pop_if_empty()
        .extend(["v1", "sites", site, "playing"]);
    Ok(url.into())
}

/// Talks JSON to a flip-disc server.
#[derive(Debug, Clone)]
pub struct HttpFrameSource {
    client: Client,
    server: ServerConfig,
}

impl HttpFrameSource {
    pub fn new(server: ServerConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flipdisc-viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SourceError::Transport {
                url: server.base_url(),
                source,
            })?;
        Ok(HttpFrameSource { client, server })
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    fn read_json<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<T, SourceError> {
        let transport = |source| SourceError::Transport {
            url: url.to_string(),
            source,
        };
        let response = response.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(transport)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl FrameSource for HttpFrameSource {
    fn render_text(&self, request: &FontRequest) -> Result<FontRender, SourceError> {
        let url = self.server.url(FONT_RENDER_PATH);
        tracing::debug!(%url, text = %request.text, "rendering text");
        let response = self.client.post(&url).json(request).send();
        Self::read_json(&url, response)
    }

    fn get_playlist(&self, site: &str) -> Result<Playlist, SourceError> {
        let url = playing_url(&self.server, site)?;
        tracing::debug!(%url, "fetching playlist");
        let response = self.client.get(&url).send();
        Self::read_json(&url, response)
    }
}
