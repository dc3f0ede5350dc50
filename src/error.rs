use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to a frame source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build a request URL from {base}: {reason}")]
    InvalidUrl { base: String, reason: String },

    #[error("{0} is not supported by this source")]
    Unsupported(&'static str),
}
