// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project configuration import and session snapshot export.
//!
//! Both support YAML and JSON, chosen by file extension.

use crate::error::ConfigError;
use crate::models::event::Frame;
use crate::models::metadata::Metadata;
use crate::models::project::{ProjectConfig, Rgb};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One event with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub start: Option<Frame>,
    pub end: Option<Frame>,
    pub duration: Option<f64>,
    pub color: Rgb,
    pub marker_interval: bool,
}

/// Everything known about an annotated recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub project: String,
    pub recording: String,
    pub fps: f64,
    pub total_frames: Frame,
    pub metadata: Metadata,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    let extension = path.extension().and_then(|s| s.to_str());
    match extension {
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedExtension(extension.map(str::to_string))),
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Import a project configuration file.
pub fn import_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let format = format_of(path)?;
    let text = read(path)?;
    let config = match format {
        Format::Yaml => serde_yaml::from_str(&text)?,
        Format::Json => serde_json::from_str(&text)?,
    };
    Ok(config)
}

/// Export a session snapshot to YAML or JSON.
pub fn export_snapshot(snapshot: &SessionSnapshot, path: &Path) -> Result<(), ConfigError> {
    let text = match format_of(path)? {
        Format::Yaml => serde_yaml::to_string(snapshot)?,
        Format::Json => serde_json::to_string_pretty(snapshot)?,
    };
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
