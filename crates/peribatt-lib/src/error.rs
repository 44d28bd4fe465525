//! Unified error type for the peribatt-lib crate.
//!
//! [`PeribattError`] wraps module-specific errors (`FetchError`,
//! `SettingsError`) and the generic `Io`/`Config` kinds. `From` impls allow
//! `?` to propagate across module boundaries seamlessly.

use std::fmt;

use crate::runner::FetchError;
use crate::settings::SettingsError;

/// Unified error type for peribatt-lib operations.
#[derive(Debug)]
pub enum PeribattError {
    /// Report fetch error (spawn failure, non-zero exit, stderr output).
    Fetch(FetchError),
    /// Settings store error (unknown key, type mismatch, range, persistence).
    Settings(SettingsError),
    /// Standard I/O error (file read/write).
    Io(std::io::Error),
    /// Configuration path resolution error.
    Config(String),
}

impl fmt::Display for PeribattError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeribattError::Fetch(e) => write!(f, "{e}"),
            PeribattError::Settings(e) => write!(f, "{e}"),
            PeribattError::Io(e) => write!(f, "I/O error: {e}"),
            PeribattError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for PeribattError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PeribattError::Fetch(e) => Some(e),
            PeribattError::Settings(e) => Some(e),
            PeribattError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for PeribattError {
    fn from(e: FetchError) -> Self {
        PeribattError::Fetch(e)
    }
}

impl From<SettingsError> for PeribattError {
    fn from(e: SettingsError) -> Self {
        PeribattError::Settings(e)
    }
}

impl From<std::io::Error> for PeribattError {
    fn from(e: std::io::Error) -> Self {
        PeribattError::Io(e)
    }
}

/// Crate-level Result alias using [`PeribattError`].
pub type Result<T> = std::result::Result<T, PeribattError>;
