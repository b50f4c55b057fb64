use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not determine the {0} directory")]
    NoDirectory(&'static str),

    #[error("invalid {key}: {value}. {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("{} contains no slides", path.display())]
    EmptyDeck { path: PathBuf },

    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify_debouncer_mini::notify::Error,
    },
}

/// Failures opening the presenter window. Recoverable: the presentation
/// carries on unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenterError {
    #[error(
        "The presenter window could not be opened. This platform does not support a second native window."
    )]
    WindowDenied,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
