//! Error types for the dashboard pipeline.

use thiserror::Error;

/// Outcome of one fetch attempt. `Ok` is a usable value, `Err` says why not.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Why a fetch produced no usable value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network unreachable, timeout, or an unreadable body
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Body decoded but did not have the expected shape
    #[error("unexpected payload: {0}")]
    Shape(String),
}

impl FetchError {
    /// Short machine-friendly kind name, used as a log field.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Http { .. } => "http",
            Self::Shape(_) => "shape",
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Transport(format!("could not read response body: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// A render target could not produce its view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{target} failed to render: {message}")]
pub struct RenderError {
    pub target: String,
    pub message: String,
}

impl RenderError {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Configuration could not be loaded or is invalid.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
