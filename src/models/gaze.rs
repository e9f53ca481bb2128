// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Gaze samples indexed by video frame.

use super::event::Frame;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A gaze position in scene video pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
}

/// Frame index to gaze points, plus the pupil diameter trace.
#[derive(Debug, Clone, Default)]
pub struct GazeIndex {
    points: HashMap<Frame, Vec<GazePoint>>,
    /// `(frame, diameter)` in file order.
    pupil: Vec<(Frame, f64)>,
}

impl GazeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: Frame, point: GazePoint) {
        self.points.entry(frame).or_default().push(point);
    }

    pub fn push_pupil(&mut self, frame: Frame, diameter: f64) {
        self.pupil.push((frame, diameter));
    }

    /// Gaze points recorded during `frame`, possibly none.
    pub fn points(&self, frame: Frame) -> &[GazePoint] {
        self.points.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of frames with at least one gaze point.
    pub fn frame_count(&self) -> usize {
        self.points.len()
    }

    /// Highest frame with a gaze point.
    pub fn last_frame(&self) -> Option<Frame> {
        self.points.keys().copied().max()
    }

    pub fn sample_count(&self) -> usize {
        self.points.values().map(Vec::len).sum()
    }

    pub fn pupil_series(&self) -> &[(Frame, f64)] {
        &self.pupil
    }

    /// Mean pupil diameter over `[start, end]`.
    pub fn mean_pupil(&self, start: Frame, end: Frame) -> Option<f64> {
        let (sum, count) = self
            .pupil
            .iter()
            .filter(|(frame, _)| (start..=end).contains(frame))
            .fold((0.0, 0usize), |(sum, count), (_, d)| (sum + d, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.pupil.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.pupil.clear();
    }
}
