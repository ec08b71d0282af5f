use std::path::PathBuf;

use thiserror::Error;

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Everything that can go wrong between "submit" and "image in hand".
///
/// The session collapses all of these into one retryable message; the
/// variants exist so the event log records what actually happened.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{key} not set")]
    MissingCredential { key: &'static str },

    #[error("unknown image provider '{name}' (available: {available})")]
    UnknownProvider { name: String, available: String },

    #[error("failed reading image {}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{provider} request failed ({endpoint})")]
    Transport {
        provider: String,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed ({status}): {body}")]
    Service {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an invalid payload: {detail}")]
    InvalidResponse { provider: String, detail: String },

    #[error("{provider} did not return an image")]
    EmptyResponse { provider: String },

    #[error("failed rendering {what}: {detail}")]
    Render { what: &'static str, detail: String },
}

impl GenerationError {
    /// Short machine-readable tag for event payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } | Self::UnknownProvider { .. } => "configuration",
            Self::ImageRead { .. } => "input",
            Self::Transport { .. } => "transport",
            Self::Service { .. } | Self::InvalidResponse { .. } | Self::EmptyResponse { .. } => {
                "service"
            }
            Self::Render { .. } => "render",
        }
    }
}

/// Joins the error and its sources, skipping repeats.
pub fn error_chain_text(err: &(dyn std::error::Error + 'static), max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(cause) = current {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
            parts.push(trimmed.to_string());
        }
        current = cause.source();
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
