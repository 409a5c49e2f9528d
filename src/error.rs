//! Error types for pylock
//!
//! Uses `thiserror` for library errors; the CLI boundary wraps these in
//! `anyhow::Result`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pylock operations
pub type LockResult<T> = Result<T, LockError>;

/// Main error type for pylock operations
#[derive(Error, Debug)]
pub enum LockError {
    /// IO error while reading or writing a lockfile
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lockfile is not valid TOML
    #[error("invalid lockfile syntax: {0}")]
    Toml(#[from] toml::de::Error),

    /// Lockfile has no [metadata] block
    #[error("no [metadata] block found in {file}")]
    MissingMetadata { file: PathBuf },

    /// Version string does not parse
    #[error("invalid version '{text}'")]
    InvalidVersion { text: String },

    /// Constraint expression does not parse
    #[error("invalid constraint '{text}': {reason}")]
    InvalidConstraint { text: String, reason: String },

    /// Package not found in the lockfile
    #[error("no package record named '{name}'")]
    UnknownPackage { name: String },
}
