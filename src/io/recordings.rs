// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Recording discovery inside a project directory.

use super::media::SCENE_VIDEO_FILE_NAME;
use crate::util::sorting::natural_sort_key;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A recording directory holding a scene video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recording {
    /// Directory name, also used as the `file_name` metadata field
    pub name: String,
    pub dir: PathBuf,
    pub video: PathBuf,
}

impl Recording {
    /// Describe a recording directory, whether or not its video exists.
    pub fn from_dir(dir: &Path) -> Self {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            dir: dir.to_path_buf(),
            video: dir.join(SCENE_VIDEO_FILE_NAME),
        }
    }
}

/// Immediate subdirectories of `project_dir` that contain a scene video,
/// in natural order of their names.
pub fn find_recordings(project_dir: &Path) -> std::io::Result<Vec<Recording>> {
    let mut recordings = Vec::new();
    for entry in std::fs::read_dir(project_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let recording = Recording::from_dir(&entry.path());
        if recording.video.is_file() {
            recordings.push(recording);
        }
    }
    recordings.sort_by_cached_key(|r| natural_sort_key(&r.name));
    log::info!("Found {} recordings in {}", recordings.len(), project_dir.display());
    Ok(recordings)
}
