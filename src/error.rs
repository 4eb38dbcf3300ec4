//! Error types.
//!
//! Everything here is a local validation or I/O failure, surfaced to the
//! caller immediately.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of round operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("slot {slot} is out of range (round has {slot_count} slots)")]
    InvalidSlot { slot: usize, slot_count: usize },
}

/// Failures loading or validating a puzzle configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("catalog is empty: item_count must be at least 1")]
    EmptyCatalog,

    #[error("target count {target_count} does not fit: {reason}")]
    MismatchedTargetCount { target_count: usize, reason: String },

    #[error("target index {index} is out of range for {item_count} items")]
    TargetOutOfRange { index: usize, item_count: usize },

    #[error("target index {index} is listed more than once")]
    DuplicateTarget { index: usize },

    #[error("{images} images configured but item_count is {item_count}")]
    ImageCountMismatch { images: usize, item_count: usize },

    #[error("no images found in {}", .0.display())]
    NoImages(PathBuf),

    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
