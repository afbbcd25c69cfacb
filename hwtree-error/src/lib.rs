//! Unified error handling for hwtree
//!
//! This crate provides the single error type used across hwtree components.
//! Malformed persisted values never reach this type: the tree recovers from
//! them locally. Errors here come from the host side (files, JSON, probes).

use std::io;
use std::path::PathBuf;

/// Result type alias using HwtreeError
pub type Result<T> = std::result::Result<T, HwtreeError>;

/// Unified error type for all hwtree operations
#[derive(thiserror::Error, Debug)]
pub enum HwtreeError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Configuration and Settings Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid settings key {key:?}: {reason}")]
    InvalidSettingsKey {
        key: String,
        reason: String,
    },

    // ============================================================================
    // Platform Errors
    // ============================================================================
    #[error("Super-I/O probe failed: {0}")]
    Probe(String),
}

impl HwtreeError {
    /// Create a probe error from a string
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create an invalid settings key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSettingsKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
