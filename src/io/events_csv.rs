// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! `events.csv` reading and writing.
//!
//! Files are always written in the current layout. Reading accepts the
//! current layout and three older ones; the layout is recognised from the
//! header row by a list of schema matchers tried in order.

use crate::error::StoreError;
use crate::models::event::{duration_text, frame_text, parse_frame, Event, Frame};
use crate::models::metadata::{Metadata, CONDITION, FILE_NAME, PARTICIPANT_ID, SERIES_TITLE};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// File name of the event table inside a recording directory.
pub const EVENTS_FILE_NAME: &str = "events.csv";

/// Header of the current layout.
pub const HEADER: [&str; 6] = [
    PARTICIPANT_ID,
    FILE_NAME,
    "event_name",
    "start_frame",
    "end_frame",
    "duration",
];

/// Column layouts that can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `participant_id, file_name, event_name, start_frame, end_frame, duration`
    Current,
    /// `..., monitor_id, event_type, start_time|start_frame, end_time|end_frame, duration`
    Monitor,
    /// `Segment, Start Frame, End Frame, Type`
    Segment,
    /// `Event, Start Frame, End Frame`
    Simple,
}

/// Result of reading an events file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedEvents {
    pub schema: Schema,
    pub events: Vec<Event>,
    /// Metadata values found in the first data row.
    pub metadata: BTreeMap<String, String>,
}

/// Column alternatives; the first one present in the header is used.
type Column = &'static [&'static str];

struct SchemaMatcher {
    schema: Schema,
    required: &'static [Column],
    /// `Ok(None)` skips a not-applicable row.
    map_row: fn(&Row<'_>) -> Result<Option<Event>, String>,
}

const START: Column = &["start_frame", "start_time"];
const END: Column = &["end_frame", "end_time"];
const LEGACY_START: Column = &["Start Frame"];
const LEGACY_END: Column = &["End Frame"];

static MATCHERS: [SchemaMatcher; 4] = [
    SchemaMatcher {
        schema: Schema::Current,
        required: &[&["event_name"]],
        map_row: map_current,
    },
    SchemaMatcher {
        schema: Schema::Monitor,
        required: &[&["monitor_id"], &["event_type"]],
        map_row: map_monitor,
    },
    SchemaMatcher {
        schema: Schema::Segment,
        required: &[&["Segment"], &["Type"], LEGACY_START, LEGACY_END],
        map_row: map_segment,
    },
    SchemaMatcher {
        schema: Schema::Simple,
        required: &[&["Event"], LEGACY_START, LEGACY_END],
        map_row: map_simple,
    },
];

const METADATA_COLUMNS: [&str; 3] = [PARTICIPANT_ID, CONDITION, SERIES_TITLE];

struct Row<'a> {
    headers: &'a csv::StringRecord,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn get(&self, column: &[&str]) -> &str {
        column
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h == *name))
            .and_then(|i| self.record.get(i))
            .unwrap_or("")
    }

    fn bounds(&self, start: &[&str], end: &[&str]) -> Result<(Option<Frame>, Option<Frame>), String> {
        let start = parse_frame(self.get(start))?;
        let end = parse_frame(self.get(end))?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(format!("start frame {} is after end frame {}", s, e));
            }
        }
        Ok((start, end))
    }

    fn event(&self, name: &str, start: &[&str], end: &[&str]) -> Result<Option<Event>, String> {
        let (start, end) = self.bounds(start, end)?;
        Ok(Some(Event {
            name: name.to_string(),
            start,
            end,
        }))
    }
}

fn is_not_applicable(value: &str) -> bool {
    value.is_empty() || value == "N.A."
}

fn map_current(row: &Row<'_>) -> Result<Option<Event>, String> {
    let name = row.get(&["event_name"]);
    if is_not_applicable(name) {
        return Ok(None);
    }
    row.event(name, START, END)
}

fn map_monitor(row: &Row<'_>) -> Result<Option<Event>, String> {
    let category = row.get(&["event_type"]);
    let monitor = row.get(&["monitor_id"]);
    if is_not_applicable(category) || monitor.is_empty() {
        return Ok(None);
    }
    let name = match category {
        "approach" => format!("Approach {}", monitor),
        "view" | "viewing" => format!("View {}", monitor),
        _ => return Ok(None),
    };
    row.event(&name, START, END)
}

fn map_segment(row: &Row<'_>) -> Result<Option<Event>, String> {
    let kind = row.get(&["Type"]);
    if kind == "N.A." {
        return Ok(None);
    }
    let name = if kind.is_empty() { row.get(&["Segment"]) } else { kind };
    if name.is_empty() {
        return Ok(None);
    }
    row.event(name, LEGACY_START, LEGACY_END)
}

fn map_simple(row: &Row<'_>) -> Result<Option<Event>, String> {
    let name = row.get(&["Event"]);
    if is_not_applicable(name) {
        return Ok(None);
    }
    row.event(name, LEGACY_START, LEGACY_END)
}

fn detect(headers: &csv::StringRecord) -> Option<&'static SchemaMatcher> {
    MATCHERS.iter().find(|matcher| {
        matcher
            .required
            .iter()
            .all(|column| column.iter().any(|name| headers.iter().any(|h| h == *name)))
    })
}

/// Recognise the layout of an events file header.
pub fn detect_schema(headers: &csv::StringRecord) -> Option<Schema> {
    detect(headers).map(|matcher| matcher.schema)
}

/// Read an events file in any known layout.
///
/// Any unparseable row fails the whole read.
pub fn read_events(path: &Path) -> Result<LoadedEvents, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    read_events_from(file)
}

pub fn read_events_from<R: std::io::Read>(source: R) -> Result<LoadedEvents, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let matcher = detect(&headers)
        .ok_or_else(|| StoreError::UnknownFormat(headers.iter().collect::<Vec<_>>().join(",")))?;

    let mut loaded = LoadedEvents {
        schema: matcher.schema,
        events: Vec::new(),
        metadata: BTreeMap::new(),
    };

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = Row {
            headers: &headers,
            record: &record,
        };
        if index == 0 {
            for column in METADATA_COLUMNS {
                let value = row.get(&[column]);
                if !is_not_applicable(value) {
                    loaded.metadata.insert(column.to_string(), value.to_string());
                }
            }
        }
        let line = record.position().map_or(index as u64 + 2, |p| p.line());
        if let Some(event) = (matcher.map_row)(&row).map_err(|message| StoreError::Row { line, message })? {
            loaded.events.push(event);
        }
    }

    Ok(loaded)
}

/// Write events in the current layout, ordered by start frame (unset last).
pub fn write_events(path: &Path, events: &[&Event], metadata: &Metadata, fps: f64) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    write_events_to(file, events, metadata, fps)
}

pub fn write_events_to<W: std::io::Write>(
    sink: W,
    events: &[&Event],
    metadata: &Metadata,
    fps: f64,
) -> Result<(), StoreError> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|event| (event.start.is_none(), event.start));

    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(HEADER)?;
    for event in sorted {
        writer.write_record([
            metadata.field(PARTICIPANT_ID).to_string(),
            metadata.field(FILE_NAME).to_string(),
            event.name.clone(),
            frame_text(event.start),
            frame_text(event.end),
            duration_text(event.duration_seconds(fps)),
        ])?;
    }
    writer.flush().map_err(|e| StoreError::Csv(e.into()))?;
    Ok(())
}
