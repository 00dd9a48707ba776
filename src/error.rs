use thiserror::Error;

/// Fatal failures: unreadable input, unwritable output, bad config.
///
/// Per-frame detection problems (empty grids, no keypoint near a string,
/// no fret to the left) never surface here; they are handled locally.
#[derive(Debug, Error)]
pub enum TabError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid detections stream: {message}")]
    Format { message: String },
    #[error("malformed tab block: {message}")]
    Parse { message: String },
    #[error("invalid config: {message}")]
    Config { message: String },
}

impl TabError {
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
