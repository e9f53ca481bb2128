// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the annotation store and project configuration.
//!
//! Every store operation either applies completely or returns one of these
//! and leaves the prior state intact. The `Display` text is meant to be
//! shown to the annotator as is.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    // Validation failures.
    #[error("Please select an event type.")]
    EmptyEventType,
    #[error("{0} already exists. Please complete or delete it first.")]
    Duplicate(String),
    #[error("Please create or select an event first.")]
    NoSelection,
    #[error("Invalid event selection.")]
    InvalidSelection,
    #[error("Start frame cannot be after end frame.")]
    StartAfterEnd,
    #[error("End frame cannot be before start frame.")]
    EndBeforeStart,
    #[error("No actions to undo")]
    NothingToUndo,
    #[error("Please fill in all metadata fields before saving.")]
    IncompleteMetadata,
    #[error("Event '{0}' is missing start or end time.")]
    IncompleteEvent(String),
    #[error("No recording is open.")]
    NoRecording,
    #[error("No more {0} events can be created.")]
    OrdinalLimit(String),

    // I/O failures.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    // Format mismatches.
    #[error("unrecognized events file header: {0}")]
    UnknownFormat(String),
    #[error("line {line}: {message}")]
    Row { line: u64, message: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Operation refused because it would violate an invariant.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::Io { .. } | Self::Csv(_) | Self::UnknownFormat(_) | Self::Row { .. }
        )
    }
}

/// Outcome of a store operation: a status message on success.
pub type StoreResult = Result<String, StoreError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(Option<String>),
}
