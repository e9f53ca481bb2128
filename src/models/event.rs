// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation event data structures.
//!
//! An event is a named frame interval on the recording timeline. Either
//! bound may be unset while the annotator is still working on it.

use serde::{Deserialize, Serialize};

/// Zero-based index of a decoded video frame.
pub type Frame = u32;

/// Text written for unset bounds and unavailable durations in exported files.
pub const NOT_AVAILABLE: &str = "N.A.";

/// One labeled time interval on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub start: Option<Frame>,
    pub end: Option<Frame>,
}

impl Event {
    /// Create a new event with both bounds unset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            end: None,
        }
    }

    /// Create an event with both bounds set.
    pub fn with_bounds(name: impl Into<String>, start: Frame, end: Frame) -> Self {
        Self {
            name: name.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Both bounds are set.
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Check if `frame` lies within `[start, end]`. Incomplete events contain nothing.
    pub fn contains(&self, frame: Frame) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= frame && frame <= end,
            _ => false,
        }
    }

    /// Duration in seconds, `(end - start + 1) / fps` rounded to one decimal.
    pub fn duration_seconds(&self, fps: f64) -> Option<f64> {
        duration_seconds(self.start?, self.end?, fps)
    }

    /// Line shown in event lists, e.g. `Approach M1: Start=100, End=N/A`.
    pub fn display_text(&self) -> String {
        format!(
            "{}: Start={}, End={}",
            self.name,
            bound_text(self.start, "N/A"),
            bound_text(self.end, "N/A")
        )
    }
}

/// Compute an interval duration in seconds, rounded to one decimal place.
pub fn duration_seconds(start: Frame, end: Frame, fps: f64) -> Option<f64> {
    if fps <= 0.0 || !fps.is_finite() || end < start {
        return None;
    }
    let seconds = (f64::from(end) - f64::from(start) + 1.0) / fps;
    Some((seconds * 10.0).round() / 10.0)
}

/// Format a duration for exported files.
pub fn duration_text(duration: Option<f64>) -> String {
    match duration {
        Some(seconds) => format!("{:.1}", seconds),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn bound_text(bound: Option<Frame>, unset: &str) -> String {
    bound.map_or_else(|| unset.to_string(), |frame| frame.to_string())
}

/// Format a bound for exported files (`N.A.` when unset).
pub fn frame_text(bound: Option<Frame>) -> String {
    bound_text(bound, NOT_AVAILABLE)
}

/// Parse a stored bound. `-1`, `N.A.` and blank cells are unset.
pub fn parse_frame(text: &str) -> Result<Option<Frame>, String> {
    let text = text.trim();
    if text.is_empty() || text == NOT_AVAILABLE || text == "-1" {
        return Ok(None);
    }
    text.parse::<Frame>()
        .map(Some)
        .map_err(|e| format!("invalid frame index '{}': {}", text, e))
}
