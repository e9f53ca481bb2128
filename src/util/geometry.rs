// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides conversions between scene video pixel coordinates
//! and the coordinates of a frame scaled for display.

use crate::models::gaze::GazePoint;

/// Largest size with the aspect ratio of `width x height` that fits in
/// `max_width x max_height`. Never scales up.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height))
        .min(1.0);
    let fitted = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (fitted(width), fitted(height))
}

/// Map a gaze point in video pixels onto a display of another size.
///
/// Points outside the video are dropped.
pub fn scale_to_display(
    point: &GazePoint,
    video_width: u32,
    video_height: u32,
    display_width: u32,
    display_height: u32,
) -> Option<(i64, i64)> {
    let inside = point.x >= 0.0
        && point.y >= 0.0
        && point.x < f64::from(video_width)
        && point.y < f64::from(video_height);
    if !inside {
        return None;
    }
    let scale_x = f64::from(display_width) / f64::from(video_width);
    let scale_y = f64::from(display_height) / f64::from(video_height);
    Some(((point.x * scale_x) as i64, (point.y * scale_y) as i64))
}
