//! Configuration error type and the file helpers that produce it.

use std::io;
use std::path::{Path, PathBuf};

use cadenza_mixer::MixerError;
use thiserror::Error;

/// Errors from loading, saving or applying a session or project.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A session or project file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    ReadFile {
        /// File that was opened.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// A session or project file could not be written.
    #[error("cannot write '{}': {source}", path.display())]
    WriteFile {
        /// File that was written.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// A parent directory for a saved file could not be created.
    #[error("cannot create directory '{}': {source}", path.display())]
    CreateDir {
        /// Directory that was created.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// Session TOML did not parse.
    #[error("session TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Session could not be encoded as TOML.
    #[error("session TOML encoding: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Project JSON did not parse or encode.
    #[error("project JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An insert names an effect the registry does not know.
    #[error("unknown effect type: {0}")]
    UnknownEffect(String),

    /// The router rejected the configured layout.
    #[error("mixer setup failed: {0}")]
    Mixer(#[from] MixerError),
}

/// Reads a whole text file.
pub(crate) fn read_text(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_owned(),
        source,
    })
}

/// Writes `content` to `path`, creating missing parent directories.
pub(crate) fn write_creating_dirs(path: &Path, content: &str) -> Result<(), ConfigError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_owned(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| ConfigError::WriteFile {
        path: path.to_owned(),
        source,
    })
}
