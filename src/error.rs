//! Error type shared by the graph, the pathfinder and the file store.
//!
//! An unreachable destination is not an error: searches report it as an
//! empty [`RouteResult`](crate::route::RouteResult) with infinite cost.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("no path between {from} and {to}")]
    PathNotFound { from: String, to: String },

    #[error("room already exists: {0}")]
    DuplicateRoom(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("i/o failure on {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl NavError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        NavError::Persistence {
            path: path.into(),
            source,
        }
    }
}
