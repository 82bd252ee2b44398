use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status error: {0}")]
    HttpStatus(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Validation failed with {} error(s):\n  {}", .0.len(), .0.join("\n  "))]
    Validation(Vec<String>),

    #[error("Slug collision in {namespace}: '{slug}' is produced by both '{first}' and '{second}'")]
    SlugCollision {
        namespace: &'static str,
        slug: String,
        first: String,
        second: String,
    },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Attach the target path to an IO failure.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
