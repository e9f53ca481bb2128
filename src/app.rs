// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session state.
//!
//! A [`Session`] coordinates everything that belongs to one open recording:
//! the event store, gaze samples, session metadata, the frame cursor and,
//! when a backend is compiled in, the scene video. Front ends drive the
//! session; they never touch the files directly.

use crate::error::{StoreError, StoreResult};
use crate::io::events_csv::EVENTS_FILE_NAME;
use crate::io::gaze::{locate_gaze_file, read_gaze};
use crate::io::marker_interval::MARKER_INTERVAL_FILE_NAME;
use crate::io::media::{open_video, FrameCursor, VideoSource};
use crate::io::recordings::Recording;
use crate::io::serialization::{EventRecord, SessionSnapshot};
use crate::models::event::{Event, Frame};
use crate::models::gaze::{GazeIndex, GazePoint};
use crate::models::metadata::{Metadata, METADATA_FILE_NAME};
use crate::models::project::ProjectConfig;
use crate::models::store::EventStore;
use crate::overlay::{self, EventBadge};
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;
use std::rc::Rc;

/// State of the recording being annotated.
pub struct Session {
    config: Rc<ProjectConfig>,
    store: EventStore,
    gaze: GazeIndex,
    metadata: Metadata,
    cursor: FrameCursor,
    video: Option<Box<dyn VideoSource>>,
    recording: Option<Recording>,
    /// Frame rate used when no video is open
    fallback_fps: f64,
    unsaved: bool,
}

impl Session {
    pub fn new(config: Rc<ProjectConfig>) -> Self {
        Self {
            store: EventStore::new(Rc::clone(&config)),
            metadata: Metadata::for_project(&config),
            config,
            gaze: GazeIndex::new(),
            cursor: FrameCursor::unbounded(0, 0.0),
            video: None,
            recording: None,
            fallback_fps: 0.0,
            unsaved: false,
        }
    }

    /// Frame rate for durations when the scene video cannot be decoded.
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fallback_fps = fps;
        if self.video.is_none() {
            self.cursor = FrameCursor::unbounded(self.cursor.total(), fps);
        }
        self
    }

    /// Open a recording directory, replacing everything currently loaded.
    ///
    /// Only the directory itself is required. Missing or unreadable data
    /// files are logged and skipped.
    pub fn open_recording(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            anyhow::bail!("Recording directory not found: {}", dir.display());
        }

        self.store.clear();
        self.gaze.clear();
        self.video = None;
        self.metadata = Metadata::for_project(&self.config);
        let recording = Recording::from_dir(dir);
        self.metadata.set_file_name(recording.name.clone());
        log::info!("Opening recording {}", recording.name);

        if recording.video.is_file() {
            match open_video(&recording.video) {
                Ok(video) => self.video = Some(video),
                Err(e) => log::warn!("Scene video unavailable: {:#}", e),
            }
        } else {
            log::warn!("No scene video at {}", recording.video.display());
        }

        match locate_gaze_file(dir) {
            Some(path) => match read_gaze(&path) {
                Ok(gaze) => self.gaze = gaze,
                Err(e) => log::warn!("Failed to load gaze data: {}", e),
            },
            None => log::warn!("No gaze data in {}", dir.display()),
        }

        let metadata_path = dir.join(METADATA_FILE_NAME);
        if metadata_path.is_file() {
            if let Err(e) = self.metadata.load_from_csv(&metadata_path, &self.config) {
                log::warn!("Failed to load metadata: {}", e);
            }
        }

        let events_path = dir.join(EVENTS_FILE_NAME);
        if events_path.is_file() {
            match self.store.load_with_metadata(&events_path) {
                Ok((_, seeds)) => {
                    for (field, value) in &seeds {
                        self.metadata.fill_if_empty(field, value);
                    }
                }
                Err(e) => log::warn!("Failed to load events: {}", e),
            }
        }

        let marker_path = dir.join(MARKER_INTERVAL_FILE_NAME);
        if marker_path.is_file() {
            if let Err(e) = self.store.load_marker_intervals(&marker_path) {
                log::warn!("Failed to load marker intervals: {}", e);
            }
        }

        self.cursor = match &self.video {
            Some(video) => FrameCursor::for_source(video.as_ref()),
            None => FrameCursor::unbounded(self.inferred_frame_count(), self.fallback_fps),
        };
        self.recording = Some(recording);
        self.unsaved = false;
        Ok(())
    }

    /// Use `video` as the scene video of the open recording.
    pub fn attach_video(&mut self, video: Box<dyn VideoSource>) {
        let current = self.cursor.current();
        self.cursor = FrameCursor::for_source(video.as_ref());
        self.cursor.set(current);
        self.video = Some(video);
    }

    /// Frame count when it has to be guessed from the data files.
    fn inferred_frame_count(&self) -> Frame {
        let last_bound = self
            .store
            .events()
            .iter()
            .flat_map(|e| [e.start, e.end])
            .flatten()
            .max();
        [self.gaze.last_frame(), last_bound]
            .into_iter()
            .flatten()
            .max()
            .map_or(0, |last| last.saturating_add(1))
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn events(&self) -> &[Event] {
        self.store.events()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn gaze(&self) -> &GazeIndex {
        &self.gaze
    }

    pub fn cursor(&self) -> &FrameCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut FrameCursor {
        &mut self.cursor
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn fps(&self) -> f64 {
        self.cursor.fps()
    }

    /// Whether anything changed since the recording was opened or saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    fn track(&mut self, result: StoreResult) -> StoreResult {
        if result.is_ok() {
            self.unsaved = true;
        }
        result
    }

    pub fn create_event(&mut self, event_type: &str) -> StoreResult {
        let result = self.store.create(event_type);
        self.track(result)
    }

    pub fn select_event(&mut self, index: usize) -> StoreResult {
        self.store.select(index)
    }

    /// Set the selected event's start to the current frame.
    pub fn mark_start(&mut self) -> StoreResult {
        let result = self.store.mark_start(self.cursor.current());
        self.track(result)
    }

    /// Set the selected event's end to the current frame.
    pub fn mark_end(&mut self) -> StoreResult {
        let result = self.store.mark_end(self.cursor.current());
        self.track(result)
    }

    pub fn delete_event(&mut self) -> StoreResult {
        let result = self.store.delete_selected();
        self.track(result)
    }

    pub fn undo(&mut self) -> StoreResult {
        let result = self.store.undo();
        self.track(result)
    }

    /// Select the event at `index` and move the cursor to its start, or to
    /// its end with `use_end`.
    pub fn jump_to_event(&mut self, index: usize, use_end: bool) -> StoreResult {
        let message = self.store.select(index)?;
        if let Some(frame) = self.store.jump_target(index, use_end) {
            self.cursor.set(frame);
        }
        Ok(message)
    }

    pub fn update_metadata(&mut self, field: &str, value: &str) {
        self.metadata.update_field(field, value);
        self.unsaved = true;
    }

    /// Write `markerInterval.tsv` and `events.csv` into the recording
    /// directory.
    ///
    /// Nothing is written unless the event table would be accepted. The
    /// marker file goes first, so a failed marker write leaves `events.csv`
    /// untouched.
    pub fn save(&mut self) -> StoreResult {
        let dir = self
            .recording
            .as_ref()
            .map(|r| r.dir.clone())
            .ok_or(StoreError::NoRecording)?;
        self.store.check_save(&self.metadata)?;
        self.store
            .save_marker_intervals(&dir.join(MARKER_INTERVAL_FILE_NAME))?;
        let message = self
            .store
            .save(&dir.join(EVENTS_FILE_NAME), &self.metadata, self.cursor.fps())?;
        self.unsaved = false;
        Ok(message)
    }

    /// Event containing the current frame.
    pub fn active_event(&self) -> Option<&Event> {
        overlay::active_event(self.store.events(), self.cursor.current())
    }

    /// Overlay label and color for the current frame.
    pub fn active_badge(&self) -> Option<EventBadge> {
        self.active_event()
            .map(|event| overlay::badge(event, &self.config, self.cursor.fps()))
    }

    pub fn current_gaze(&self) -> &[GazePoint] {
        self.gaze.points(self.cursor.current())
    }

    /// Decode the current frame and draw the overlays on it.
    pub fn render_current(&mut self, max_size: Option<(u32, u32)>) -> Result<RgbImage> {
        let frame = self.cursor.current();
        let video = self.video.as_mut().context("No scene video is open")?;
        let image = video
            .decode_frame(frame)
            .with_context(|| format!("Failed to decode frame {}", frame))?;
        let badge = self.active_badge();
        Ok(overlay::render(&image, badge.as_ref(), self.gaze.points(frame), max_size))
    }

    /// Everything currently known about the recording, for export.
    pub fn snapshot(&self) -> SessionSnapshot {
        let fps = self.cursor.fps();
        let events = self
            .store
            .events()
            .iter()
            .map(|event| EventRecord {
                name: event.name.clone(),
                start: event.start,
                end: event.end,
                duration: event.duration_seconds(fps),
                color: self.config.color(&event.name),
                marker_interval: self.config.is_marker_interval_event(&event.name),
            })
            .collect();

        SessionSnapshot {
            project: self.config.project_name().to_string(),
            recording: self
                .recording
                .as_ref()
                .map(|r| r.name.clone())
                .unwrap_or_default(),
            fps,
            total_frames: self.cursor.total(),
            metadata: self.metadata.clone(),
            events,
        }
    }
}
