// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation event store.
//!
//! Owns the events of the loaded recording, the selection the next mark or
//! delete applies to, and the undo history. Every mutation validates first,
//! then snapshots, then applies, so a refused operation never changes state.

use super::event::{Event, Frame};
use super::history::EventHistory;
use super::metadata::Metadata;
use super::project::{marker_ordinal, ProjectConfig};
use crate::error::{StoreError, StoreResult};
use crate::io::{events_csv, marker_interval};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Events of one recording plus selection and undo history.
#[derive(Debug, Clone)]
pub struct EventStore {
    config: Rc<ProjectConfig>,
    events: Vec<Event>,
    /// Index into `events`; revalidated after every mutation
    selected: Option<usize>,
    history: EventHistory,
}

impl EventStore {
    pub fn new(config: Rc<ProjectConfig>) -> Self {
        Self {
            config,
            events: Vec::new(),
            selected: None,
            history: EventHistory::new(),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.selected.and_then(|i| self.events.get(i))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Create an empty event of the given type and select it.
    ///
    /// Single-instance types may exist only once; asking for an existing one
    /// selects it and fails. Marker interval types repeat with an ordinal.
    pub fn create(&mut self, event_type: &str) -> StoreResult {
        let event_type = event_type.trim();
        if event_type.is_empty() {
            return Err(StoreError::EmptyEventType);
        }

        let name = match self.config.marker_base(event_type) {
            Some(base) => {
                let next = self
                    .events
                    .iter()
                    .filter_map(|e| match marker_ordinal(base, &e.name) {
                        Some(n) => Some(n),
                        None if e.name == base => Some(0),
                        None => None,
                    })
                    .max()
                    .map_or(Some(1), |n| n.checked_add(1))
                    .ok_or_else(|| StoreError::OrdinalLimit(base.to_string()))?;
                format!("{} {}", base, next)
            }
            None => {
                if let Some(existing) = self.events.iter().position(|e| e.name == event_type) {
                    self.selected = Some(existing);
                    return Err(StoreError::Duplicate(event_type.to_string()));
                }
                event_type.to_string()
            }
        };

        self.snapshot();
        self.events.push(Event::new(name.clone()));
        self.selected = Some(self.events.len() - 1);
        self.clamp_selection();
        log::info!("Created event {}", name);
        Ok(format!("Created {}", name))
    }

    /// Select the event at `index`.
    pub fn select(&mut self, index: usize) -> StoreResult {
        let event = self.events.get(index).ok_or(StoreError::InvalidSelection)?;
        let message = format!("Selected {}", event.name);
        self.selected = Some(index);
        Ok(message)
    }

    pub fn mark_start(&mut self, frame: Frame) -> StoreResult {
        self.mark(Bound::Start, frame)
    }

    pub fn mark_end(&mut self, frame: Frame) -> StoreResult {
        self.mark(Bound::End, frame)
    }

    fn mark(&mut self, bound: Bound, frame: Frame) -> StoreResult {
        let index = self.selected.ok_or(StoreError::NoSelection)?;
        let event = self.events.get(index).ok_or(StoreError::InvalidSelection)?;

        match bound {
            Bound::Start if event.end.is_some_and(|end| frame > end) => {
                return Err(StoreError::StartAfterEnd)
            }
            Bound::End if event.start.is_some_and(|start| frame < start) => {
                return Err(StoreError::EndBeforeStart)
            }
            _ => {}
        }

        self.snapshot();
        let event = &mut self.events[index];
        let label = match bound {
            Bound::Start => {
                event.start = Some(frame);
                "start"
            }
            Bound::End => {
                event.end = Some(frame);
                "end"
            }
        };
        self.clamp_selection();
        Ok(format!("Marked {} at frame {}", label, frame))
    }

    /// Remove the selected event. Selection moves to the event that took its
    /// place, or the new last one.
    pub fn delete_selected(&mut self) -> StoreResult {
        let index = self.selected.ok_or(StoreError::NoSelection)?;
        if index >= self.events.len() {
            return Err(StoreError::InvalidSelection);
        }

        self.snapshot();
        let removed = self.events.remove(index);
        self.selected = Some(index.min(self.events.len().saturating_sub(1)));
        self.clamp_selection();
        log::info!("Deleted event {}, {} remaining", removed.name, self.events.len());
        Ok(format!("Deleted {}", removed.name))
    }

    /// Restore the event list captured before the last mutation.
    ///
    /// The current selection is kept if it still resolves, otherwise the
    /// selection captured with the snapshot is tried instead of clearing it,
    /// so undoing the deletion of the only event selects it again.
    pub fn undo(&mut self) -> StoreResult {
        let snapshot = self.history.pop().ok_or(StoreError::NothingToUndo)?;
        let previous = self.selected;
        self.events = snapshot.events;

        let len = self.events.len();
        self.selected = previous
            .filter(|i| *i < len)
            .or(snapshot.selected);
        self.clamp_selection();
        log::info!("Undo, {} events", self.events.len());
        Ok("Undid last action".to_string())
    }

    /// Frame to seek to for the event at `index`.
    pub fn jump_target(&self, index: usize, use_end: bool) -> Option<Frame> {
        let event = self.events.get(index)?;
        match (use_end, event.start, event.end) {
            (true, _, Some(end)) => Some(end),
            (_, Some(start), _) => Some(start),
            (_, None, end) => end,
        }
    }

    /// First complete event containing `frame`.
    pub fn event_at(&self, frame: Frame) -> Option<&Event> {
        self.events.iter().find(|e| e.contains(frame))
    }

    /// Drop events, selection and history. Required before attaching a
    /// different recording.
    pub fn clear(&mut self) {
        self.events.clear();
        self.selected = None;
        self.history.clear();
    }

    /// Write the event table.
    ///
    /// Marker interval events go to their own file and are skipped here.
    /// All checks run before the file is touched.
    pub fn save(&self, path: &Path, metadata: &Metadata, fps: f64) -> StoreResult {
        let rows = self.rows_to_save(metadata)?;
        events_csv::write_events(path, &rows, metadata, fps)?;
        log::info!("Saved {} events to {}", rows.len(), path.display());
        Ok(format!("Events saved to {}", path.display()))
    }

    /// Check that [`EventStore::save`] would accept the current state,
    /// without writing anything.
    pub fn check_save(&self, metadata: &Metadata) -> Result<(), StoreError> {
        self.rows_to_save(metadata).map(|_| ())
    }

    fn rows_to_save(&self, metadata: &Metadata) -> Result<Vec<&Event>, StoreError> {
        if !metadata.is_complete() {
            return Err(StoreError::IncompleteMetadata);
        }

        let mut rows = Vec::with_capacity(self.events.len());
        for event in &self.events {
            if self.config.is_marker_interval_event(&event.name) {
                continue;
            }
            if !event.is_complete() {
                return Err(StoreError::IncompleteEvent(event.name.clone()));
            }
            rows.push(event);
        }
        Ok(rows)
    }

    /// Write marker interval events.
    ///
    /// Without marker events an existing file is emptied down to its header
    /// and a missing one is not created.
    pub fn save_marker_intervals(&self, path: &Path) -> Result<Option<usize>, StoreError> {
        let markers: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| self.config.is_marker_interval_event(&e.name))
            .collect();
        if markers.is_empty() && !path.exists() {
            return Ok(None);
        }
        let written = marker_interval::write_intervals(path, &markers)?;
        log::info!("Saved {} marker intervals to {}", written, path.display());
        Ok(Some(written))
    }

    /// Replace the event list with the contents of an events file. Undo
    /// history is discarded.
    pub fn load(&mut self, path: &Path) -> StoreResult {
        self.load_with_metadata(path).map(|(message, _)| message)
    }

    /// Like [`EventStore::load`], also returning metadata values found in
    /// the file's first row.
    pub fn load_with_metadata(&mut self, path: &Path) -> Result<(String, BTreeMap<String, String>), StoreError> {
        self.clear();

        let loaded = events_csv::read_events(path)?;

        self.events = loaded.events;
        self.selected = (!self.events.is_empty()).then_some(0);
        log::info!(
            "Loaded {} events ({:?} layout) from {}",
            self.events.len(),
            loaded.schema,
            path.display()
        );
        Ok((format!("Loaded {} events", self.events.len()), loaded.metadata))
    }

    /// Append marker interval events read from `markerInterval.tsv`, named
    /// after the project's marker type with ordinals in file order.
    pub fn load_marker_intervals(&mut self, path: &Path) -> StoreResult {
        let Some(base) = self.config.marker_type().map(str::to_string) else {
            return Ok("Project has no marker interval event type".to_string());
        };
        let intervals = marker_interval::read_intervals(path)?;
        let count = intervals.len();
        for (i, (start, end)) in intervals.into_iter().enumerate() {
            self.events
                .push(Event::with_bounds(format!("{} {}", base, i + 1), start, end));
        }
        if self.selected.is_none() && !self.events.is_empty() {
            self.selected = Some(0);
        }
        log::info!("Loaded {} marker intervals from {}", count, path.display());
        Ok(format!("Loaded {} marker intervals", count))
    }

    fn snapshot(&mut self) {
        self.history.push(&self.events, self.selected);
    }

    fn clamp_selection(&mut self) {
        if self.selected.is_some_and(|i| i >= self.events.len()) {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::HISTORY_DEPTH;
    use crate::models::metadata::{CONDITION, PARTICIPANT_ID, SERIES_TITLE};
    use crate::models::project::tests::sample_config;
    use std::path::PathBuf;

    fn store() -> EventStore {
        EventStore::new(Rc::new(sample_config()))
    }

    fn metadata() -> Metadata {
        let mut metadata = Metadata::default();
        metadata.update_field(PARTICIPANT_ID, "P01");
        metadata.update_field(CONDITION, "guided");
        metadata.update_field(SERIES_TITLE, "Series A");
        metadata.set_file_name("rec01");
        metadata
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zarafe-store-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn assert_ordered(store: &EventStore) {
        for event in store.events() {
            if let (Some(start), Some(end)) = (event.start, event.end) {
                assert!(start <= end, "{:?}", event);
            }
        }
    }

    #[test]
    fn test_annotation_scenario() {
        let mut store = store();
        let dir = temp_dir("scenario");
        let path = dir.join("events.csv");

        assert!(store.create("Approach M1").is_ok());
        assert!(store.mark_start(100).is_ok());
        assert!(matches!(store.mark_end(50), Err(StoreError::EndBeforeStart)));
        assert_eq!(store.events()[0].start, Some(100));
        assert_eq!(store.events()[0].end, None);
        assert!(store.mark_end(150).is_ok());

        store.save(&path, &metadata(), 30.0).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "participant_id,file_name,event_name,start_frame,end_frame,duration\n\
             P01,rec01,Approach M1,100,150,1.7\n"
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_duplicate_selects_existing() {
        let mut store = store();
        store.create("View M1").unwrap();
        store.create("Approach M2").unwrap();
        assert_eq!(store.selected(), Some(1));
        let depth = store.history.len();

        let err = store.create("View M1").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref name) if name == "View M1"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.selected(), Some(0));
        assert_eq!(store.history.len(), depth);
    }

    #[test]
    fn test_marker_events_repeat_with_ordinals() {
        let mut store = store();
        store.create("Accuracy Test").unwrap();
        store.create("Accuracy Test").unwrap();
        store.select(0).unwrap();
        store.delete_selected().unwrap();
        store.create("Accuracy Test").unwrap();

        let names: Vec<&str> = store.events().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Accuracy Test 2", "Accuracy Test 3"]);
    }

    #[test]
    fn test_empty_type_is_rejected() {
        let mut store = store();
        assert!(matches!(store.create("  "), Err(StoreError::EmptyEventType)));
        assert!(store.is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_marking_requires_selection() {
        let mut store = store();
        assert!(matches!(store.mark_start(1), Err(StoreError::NoSelection)));
        assert!(matches!(store.mark_end(1), Err(StoreError::NoSelection)));
        assert!(matches!(store.delete_selected(), Err(StoreError::NoSelection)));
        assert!(matches!(store.select(0), Err(StoreError::InvalidSelection)));
    }

    #[test]
    fn test_start_after_end_is_refused_without_history() {
        let mut store = store();
        store.create("View M2").unwrap();
        store.mark_end(40).unwrap();
        let depth = store.history.len();

        assert!(matches!(store.mark_start(41), Err(StoreError::StartAfterEnd)));
        assert_eq!(store.history.len(), depth);
        assert!(store.mark_start(40).is_ok());
        assert_eq!(store.events()[0], Event::with_bounds("View M2", 40, 40));
    }

    #[test]
    fn test_marks_overwrite() {
        let mut store = store();
        store.create("View M2").unwrap();
        store.mark_start(10).unwrap();
        store.mark_start(20).unwrap();
        assert_eq!(store.events()[0].start, Some(20));
    }

    #[test]
    fn test_ordering_invariant_over_operation_sequence() {
        let mut store = store();
        let frames = [5, 90, 12, 40, 3, 77, 60, 8, 100, 0, 55, 21];
        let types = ["Approach M1", "View M1", "Accuracy Test", "Break", "Approach M2"];

        for (step, frame) in frames.iter().cycle().take(120).enumerate() {
            let _ = match step % 6 {
                0 => store.create(types[step % types.len()]),
                1 | 4 => store.mark_start(*frame),
                2 | 5 => store.mark_end(*frame),
                _ if step % 4 == 0 => store.delete_selected(),
                _ => store.undo(),
            };
            assert_ordered(&store);
            if let Some(selected) = store.selected() {
                assert!(selected < store.len());
            }
        }
    }

    #[test]
    fn test_undo_restores_previous_list() {
        let mut store = store();
        store.create("Approach M1").unwrap();
        store.mark_start(10).unwrap();

        let before = store.events().to_vec();
        store.mark_end(30).unwrap();
        store.undo().unwrap();
        assert_eq!(store.events(), before.as_slice());

        let before = store.events().to_vec();
        store.create("View M1").unwrap();
        store.undo().unwrap();
        assert_eq!(store.events(), before.as_slice());
    }

    #[test]
    fn test_undo_beyond_history_fails_without_change() {
        let mut store = store();
        for i in 0..(HISTORY_DEPTH + 3) {
            store.create(&format!("Custom {}", i)).unwrap();
        }
        for _ in 0..HISTORY_DEPTH {
            store.undo().unwrap();
        }
        let remaining = store.events().to_vec();
        assert_eq!(remaining.len(), 3);

        for _ in 0..5 {
            assert!(matches!(store.undo(), Err(StoreError::NothingToUndo)));
            assert_eq!(store.events(), remaining.as_slice());
        }
    }

    #[test]
    fn test_delete_only_event_then_undo() {
        let mut store = store();
        store.create("Approach M1").unwrap();

        store.delete_selected().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);

        store.undo().unwrap();
        assert_eq!(store.events(), &[Event::new("Approach M1")]);
        assert_eq!(store.selected(), Some(0));
    }

    #[test]
    fn test_delete_reclamps_selection() {
        let mut store = store();
        store.create("Approach M1").unwrap();
        store.create("View M1").unwrap();
        store.create("Break").unwrap();

        store.delete_selected().unwrap();
        assert_eq!(store.selected(), Some(1));

        store.select(0).unwrap();
        store.delete_selected().unwrap();
        assert_eq!(store.selected(), Some(0));
        assert_eq!(store.events(), &[Event::new("View M1")]);
    }

    #[test]
    fn test_jump_target() {
        let mut store = store();
        store.create("Approach M1").unwrap();
        assert_eq!(store.jump_target(0, false), None);
        store.mark_end(80).unwrap();
        assert_eq!(store.jump_target(0, false), Some(80));
        store.mark_start(20).unwrap();
        assert_eq!(store.jump_target(0, false), Some(20));
        assert_eq!(store.jump_target(0, true), Some(80));
        assert_eq!(store.jump_target(5, true), None);
    }

    #[test]
    fn test_event_at() {
        let mut store = store();
        store.create("Approach M1").unwrap();
        store.mark_start(10).unwrap();
        store.mark_end(20).unwrap();
        store.create("View M1").unwrap();
        store.mark_start(15).unwrap();

        assert_eq!(store.event_at(10).map(|e| e.name.as_str()), Some("Approach M1"));
        assert_eq!(store.event_at(20).map(|e| e.name.as_str()), Some("Approach M1"));
        assert!(store.event_at(21).is_none());
    }

    #[test]
    fn test_save_refuses_incomplete_state() {
        let dir = temp_dir("refuse");
        let path = dir.join("events.csv");
        let mut store = store();
        store.create("Approach M1").unwrap();
        store.mark_start(5).unwrap();

        let err = store.save(&path, &metadata(), 30.0).unwrap_err();
        assert!(matches!(err, StoreError::IncompleteEvent(ref name) if name == "Approach M1"));
        assert!(!path.exists());

        store.mark_end(9).unwrap();
        let err = store.save(&path, &Metadata::default(), 30.0).unwrap_err();
        assert!(matches!(err, StoreError::IncompleteMetadata));
        assert!(!path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_marker_events_are_routed_to_interval_file() {
        let dir = temp_dir("markers");
        let events_path = dir.join(events_csv::EVENTS_FILE_NAME);
        let marker_path = dir.join(marker_interval::MARKER_INTERVAL_FILE_NAME);

        let mut store = store();
        store.create("Accuracy Test").unwrap();
        store.mark_start(0).unwrap();
        store.mark_end(30).unwrap();
        store.create("Accuracy Test").unwrap();
        store.create("Break").unwrap();
        store.mark_start(40).unwrap();
        store.mark_end(50).unwrap();

        store.save(&events_path, &metadata(), 25.0).unwrap();
        assert_eq!(store.save_marker_intervals(&marker_path).unwrap(), Some(1));

        let mut reloaded = EventStore::new(Rc::new(sample_config()));
        reloaded.load(&events_path).unwrap();
        reloaded.load_marker_intervals(&marker_path).unwrap();
        assert_eq!(
            reloaded.events(),
            &[
                Event::with_bounds("Break", 40, 50),
                Event::with_bounds("Accuracy Test 1", 0, 30),
            ]
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_deleting_last_marker_empties_interval_file() {
        let dir = temp_dir("markers-deleted");
        let events_path = dir.join(events_csv::EVENTS_FILE_NAME);
        let marker_path = dir.join(marker_interval::MARKER_INTERVAL_FILE_NAME);

        let mut store = store();
        assert_eq!(store.save_marker_intervals(&marker_path).unwrap(), None);
        assert!(!marker_path.exists());

        store.create("Accuracy Test").unwrap();
        store.mark_start(0).unwrap();
        store.mark_end(10).unwrap();
        store.save(&events_path, &metadata(), 30.0).unwrap();
        assert_eq!(store.save_marker_intervals(&marker_path).unwrap(), Some(1));

        store.delete_selected().unwrap();
        store.save(&events_path, &metadata(), 30.0).unwrap();
        assert_eq!(store.save_marker_intervals(&marker_path).unwrap(), Some(0));

        let mut reopened = EventStore::new(Rc::new(sample_config()));
        reopened.load(&events_path).unwrap();
        reopened.load_marker_intervals(&marker_path).unwrap();
        assert!(reopened.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_marker_ordinal_limit_is_refused() {
        let dir = temp_dir("ordinal-limit");
        let path = dir.join("events.csv");
        std::fs::write(
            &path,
            format!("Event,Start Frame,End Frame\nAccuracy Test {},1,2\n", u32::MAX),
        )
        .unwrap();

        let mut store = store();
        store.load(&path).unwrap();
        let before = store.events().to_vec();

        let err = store.create("Accuracy Test").unwrap_err();
        assert!(matches!(err, StoreError::OrdinalLimit(ref base) if base == "Accuracy Test"));
        assert!(err.is_validation());
        assert_eq!(store.events(), before.as_slice());
        assert!(!store.can_undo());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_discards_history() {
        let dir = temp_dir("load-history");
        let path = dir.join("events.csv");
        std::fs::write(&path, "Event,Start Frame,End Frame\nBreak,10,20\n").unwrap();

        let mut store = store();
        store.create("Approach M1").unwrap();
        store.mark_start(5).unwrap();
        assert!(store.can_undo());

        store.load(&path).unwrap();
        assert!(!store.can_undo());
        assert!(matches!(store.undo(), Err(StoreError::NothingToUndo)));
        assert_eq!(store.events(), &[Event::with_bounds("Break", 10, 20)]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_round_trip() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("events.csv");
        let mut store = store();
        for (name, start, end) in [("View M2", 300, 420), ("Approach M1", 10, 99), ("Break", 0, 0)] {
            store.create(name).unwrap();
            store.mark_start(start).unwrap();
            store.mark_end(end).unwrap();
        }
        store.save(&path, &metadata(), 30.0).unwrap();

        let mut fresh = EventStore::new(Rc::new(sample_config()));
        let (_, seeded) = fresh.load_with_metadata(&path).unwrap();
        let mut expected = store.events().to_vec();
        expected.sort_by_key(|e| e.start);
        assert_eq!(fresh.events(), expected.as_slice());
        assert_eq!(fresh.selected(), Some(0));
        assert_eq!(seeded.get(PARTICIPANT_ID).map(String::as_str), Some("P01"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_legacy_simple_layout() {
        let dir = temp_dir("legacy");
        let path = dir.join("events.csv");
        std::fs::write(&path, "Event,Start Frame,End Frame\nEvent 1,10,20\n").unwrap();

        let mut store = store();
        store.load(&path).unwrap();
        assert_eq!(store.events(), &[Event::with_bounds("Event 1", 10, 20)]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_load_leaves_store_empty() {
        let dir = temp_dir("badload");
        let path = dir.join("events.csv");
        std::fs::write(&path, "Event,Start Frame,End Frame\nEvent 1,10,20\nEvent 2,x,1\n").unwrap();

        let mut store = store();
        store.create("Approach M1").unwrap();
        assert!(store.load(&path).is_err());
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);

        assert!(matches!(
            store.load(&dir.join("missing.csv")),
            Err(StoreError::Io { .. })
        ));
        std::fs::remove_dir_all(&dir).ok();
    }
}
