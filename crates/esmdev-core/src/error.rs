use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error taxonomy for request handling.
///
/// Transforms never recover from their own failures; every error travels up
/// to the dispatcher, which turns it into an HTTP response via [`Error::status`].
#[derive(Error, Debug)]
pub enum Error {
    /// A file, package manifest, or manifest field could not be found.
    #[error("Cannot resolve {target}: {reason}")]
    Resolution { target: String, reason: String },

    /// Component or script source is malformed.
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// Filesystem access failed for a reason other than a missing file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No dispatcher route matched the request.
    #[error("No route for {path}")]
    RouteNotFound { path: String },

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    #[must_use]
    pub fn resolution(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            target: target.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Classify a failed read: a missing file is a resolution failure, anything
    /// else is an IO failure.
    #[must_use]
    pub fn from_read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::resolution(path.display().to_string(), "file not found")
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// HTTP status code this error is answered with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Resolution { .. } | Self::RouteNotFound { .. } => 404,
            Self::Parse { .. }
            | Self::Io { .. }
            | Self::ConfigRead { .. }
            | Self::ConfigParse { .. } => 500,
        }
    }

    /// Short stable name of the error kind, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution { .. } => "resolution",
            Self::Parse { .. } => "parse",
            Self::Io { .. } => "io",
            Self::RouteNotFound { .. } => "route_not_found",
            Self::ConfigRead { .. } | Self::ConfigParse { .. } => "config",
        }
    }
}
