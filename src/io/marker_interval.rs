// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! `markerInterval.tsv` reading and writing.
//!
//! The file lists the frame intervals of the project's repeatable marker
//! event type, one per row, without names.

use crate::error::StoreError;
use crate::models::event::{Event, Frame};
use std::fs::File;
use std::path::Path;

pub const MARKER_INTERVAL_FILE_NAME: &str = "markerInterval.tsv";

const HEADER: [&str; 2] = ["start_frame", "end_frame"];

/// Write `(start, end)` rows for every complete event.
pub fn write_intervals(path: &Path, events: &[&Event]) -> Result<usize, StoreError> {
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(file);
    writer.write_record(HEADER)?;

    let mut written = 0;
    for event in events {
        if let (Some(start), Some(end)) = (event.start, event.end) {
            writer.write_record([start.to_string(), end.to_string()])?;
            written += 1;
        }
    }
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    Ok(written)
}

/// Read intervals in file order.
pub fn read_intervals(path: &Path) -> Result<Vec<(Frame, Frame)>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(start_col), Some(end_col)) = (column(HEADER[0]), column(HEADER[1])) else {
        return Err(StoreError::UnknownFormat(headers.iter().collect::<Vec<_>>().join("\t")));
    };

    let mut intervals = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(index as u64 + 2, |p| p.line());
        let parse = |col: usize| -> Result<Frame, StoreError> {
            let text = record.get(col).unwrap_or("");
            text.parse::<Frame>().map_err(|e| StoreError::Row {
                line,
                message: format!("invalid frame index '{}': {}", text, e),
            })
        };
        let (start, end) = (parse(start_col)?, parse(end_col)?);
        if start > end {
            return Err(StoreError::Row {
                line,
                message: format!("start frame {} is after end frame {}", start, end),
            });
        }
        intervals.push((start, end));
    }
    Ok(intervals)
}
