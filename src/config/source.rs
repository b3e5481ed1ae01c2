//! Configuration sources.
//!
//! A source only has to hand out its raw bytes and a modification marker.
//! Parsing lives in the loader.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Syntax the source is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Toml,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Json => f.write_str("JSON"),
            SourceFormat::Toml => f.write_str("TOML"),
        }
    }
}

/// Where the policy comes from.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Modification marker; a different value means the content may have changed.
    fn modified(&self) -> io::Result<SystemTime>;

    /// Full content of the source.
    fn read(&self) -> io::Result<Vec<u8>>;

    /// Syntax of the content returned by [`ConfigSource::read`].
    fn format(&self) -> SourceFormat;
}

/// A configuration file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: SourceFormat,
}

impl FileSource {
    /// Create a source for `path`. A `.toml` extension selects TOML, anything
    /// else is read as JSON.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => SourceFormat::Toml,
            _ => SourceFormat::Json,
        };
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn modified(&self) -> io::Result<SystemTime> {
        fs::metadata(&self.path)?.modified()
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    fn format(&self) -> SourceFormat {
        self.format
    }
}
