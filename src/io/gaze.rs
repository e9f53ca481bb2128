// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! `gazeData.tsv` loading.

use crate::error::StoreError;
use crate::models::event::Frame;
use crate::models::gaze::{GazeIndex, GazePoint};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const GAZE_FILE_NAME: &str = "gazeData.tsv";
pub const LOCAL_GAZE_FILE_NAME: &str = "gazeData_local.tsv";

const FRAME_COLUMN: &str = "frame_idx";
const X_COLUMN: &str = "gaze_pos_vid_x";
const Y_COLUMN: &str = "gaze_pos_vid_y";
const PUPIL_COLUMN: &str = "pup_diam_r";

/// Gaze file of a recording directory, preferring `gazeData.tsv`.
pub fn locate_gaze_file(dir: &Path) -> Option<PathBuf> {
    [GAZE_FILE_NAME, LOCAL_GAZE_FILE_NAME]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_frame_index(text: &str) -> Option<Frame> {
    let text = text.trim();
    if let Ok(frame) = text.parse::<Frame>() {
        return Some(frame);
    }
    // Some exporters write integral floats ("12.0").
    parse_number(text)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= f64::from(Frame::MAX))
        .map(|v| v as Frame)
}

/// Build the frame index from a tab-separated gaze export.
///
/// Rows without both coordinates contribute no gaze point but may still
/// carry a pupil diameter.
pub fn read_gaze(path: &Path) -> Result<GazeIndex, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    read_gaze_from(file)
}

pub fn read_gaze_from<R: std::io::Read>(source: R) -> Result<GazeIndex, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (Some(frame_col), Some(x_col), Some(y_col)) =
        (column(FRAME_COLUMN), column(X_COLUMN), column(Y_COLUMN))
    else {
        return Err(StoreError::UnknownFormat(headers.iter().collect::<Vec<_>>().join("\t")));
    };
    let pupil_col = column(PUPIL_COLUMN);

    let mut index = GazeIndex::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let field = |col: usize| record.get(col).unwrap_or("");

        let Some(frame) = parse_frame_index(field(frame_col)) else {
            skipped += 1;
            continue;
        };
        if let Some(diameter) = pupil_col.and_then(|col| parse_number(field(col))) {
            index.push_pupil(frame, diameter);
        }
        match (parse_number(field(x_col)), parse_number(field(y_col))) {
            (Some(x), Some(y)) => index.insert(frame, GazePoint { x, y }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} gaze rows without a frame or coordinates", skipped);
    }
    log::info!(
        "Indexed {} gaze samples over {} frames",
        index.sample_count(),
        index.frame_count()
    );
    Ok(index)
}
