// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame overlays.
//!
//! Decides which event the current frame belongs to and draws what the
//! annotator sees on top of a decoded frame: a colored border while inside
//! an event and a dot for every gaze sample of the frame.

use crate::models::event::{Event, Frame};
use crate::models::gaze::GazePoint;
use crate::models::project::{ProjectConfig, Rgb};
use crate::util::geometry::{fit_within, scale_to_display};
use image::{imageops, Rgb as Pixel, RgbImage};

const GAZE_COLOR: Rgb = [0, 255, 0];
const GAZE_ALPHA: f32 = 150.0 / 255.0;
const GAZE_RADIUS: i64 = 2;

/// Label and color of the event the current frame is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBadge {
    pub label: String,
    pub color: Rgb,
}

/// First complete event whose `[start, end]` contains `frame`.
pub fn active_event(events: &[Event], frame: Frame) -> Option<&Event> {
    events.iter().find(|event| event.contains(frame))
}

/// Overlay text for an event: `Approach M1 (1.7s)`.
///
/// Names of target events are shortened to their first and last word.
pub fn badge(event: &Event, config: &ProjectConfig, fps: f64) -> EventBadge {
    let duration = event
        .duration_seconds(fps)
        .map_or_else(|| "N/A".to_string(), |d| format!("{:.1}s", d));

    let words: Vec<&str> = event.name.split_whitespace().collect();
    let label = match words.as_slice() {
        [first, .., last] if !config.is_marker_interval_event(&event.name) => {
            format!("{} {} ({})", first, last, duration)
        }
        _ => format!("{} ({})", event.name, duration),
    };

    EventBadge {
        label,
        color: config.color(&event.name),
    }
}

/// Draw gaze points and the event border onto a copy of `frame`.
///
/// With `max_size` the frame is first shrunk to fit, keeping its aspect
/// ratio; gaze coordinates are scaled to match. The border adds one pixel
/// on every side.
pub fn render(
    frame: &RgbImage,
    badge: Option<&EventBadge>,
    gaze: &[GazePoint],
    max_size: Option<(u32, u32)>,
) -> RgbImage {
    let (width, height) = frame.dimensions();
    let mut display = match max_size {
        Some((max_w, max_h)) => {
            let (w, h) = fit_within(width, height, max_w, max_h);
            if (w, h) == (width, height) {
                frame.clone()
            } else {
                imageops::resize(frame, w, h, imageops::FilterType::Triangle)
            }
        }
        None => frame.clone(),
    };

    let (display_w, display_h) = display.dimensions();
    for point in gaze {
        if let Some((x, y)) = scale_to_display(point, width, height, display_w, display_h) {
            draw_dot(&mut display, x, y);
        }
    }

    match badge {
        Some(badge) => add_border(&display, badge.color),
        None => display,
    }
}

fn draw_dot(image: &mut RgbImage, cx: i64, cy: i64) {
    let (w, h) = (i64::from(image.width()), i64::from(image.height()));
    for y in (cy - GAZE_RADIUS)..=(cy + GAZE_RADIUS) {
        for x in (cx - GAZE_RADIUS)..=(cx + GAZE_RADIUS) {
            let inside = (x - cx).pow(2) + (y - cy).pow(2) <= GAZE_RADIUS.pow(2);
            if !inside || x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            for (channel, target) in pixel.0.iter_mut().zip(GAZE_COLOR) {
                let blended = f32::from(*channel) * (1.0 - GAZE_ALPHA) + f32::from(target) * GAZE_ALPHA;
                *channel = blended.round() as u8;
            }
        }
    }
}

fn add_border(image: &RgbImage, color: Rgb) -> RgbImage {
    let mut bordered = RgbImage::from_pixel(image.width() + 2, image.height() + 2, Pixel(color));
    imageops::replace(&mut bordered, image, 1, 1);
    bordered
}
