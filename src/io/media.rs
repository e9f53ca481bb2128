// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video frame access.
//!
//! Decoding sits behind the [`VideoSource`] trait so annotation can run
//! without a video backend. Frame navigation and playback timing live in
//! [`FrameCursor`], which only needs the frame count and frame rate.

use crate::models::event::{duration_seconds, Frame};
use anyhow::Result;
use image::RgbImage;
use std::time::Duration;

/// Scene video file name inside a recording directory.
pub const SCENE_VIDEO_FILE_NAME: &str = "worldCamera.mp4";

/// Playback tick used when the frame rate is unknown.
const FALLBACK_INTERVAL_MS: u64 = 33;

/// A decodable video.
pub trait VideoSource {
    fn frame_count(&self) -> Frame;

    fn fps(&self) -> f64;

    /// Decode frame `index` as RGB.
    fn decode_frame(&mut self, index: Frame) -> Result<RgbImage>;
}

/// Current position and playback state.
///
/// A cursor over a decoded video stops at its last frame. Without a video
/// the length is only an estimate and seeking past it is allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCursor {
    current: Frame,
    total: Frame,
    fps: f64,
    playing: bool,
    /// `total` is the real frame count
    bounded: bool,
}

impl Default for FrameCursor {
    fn default() -> Self {
        Self::new(0, 0.0)
    }
}

impl FrameCursor {
    pub fn new(total: Frame, fps: f64) -> Self {
        Self {
            current: 0,
            total,
            fps,
            playing: false,
            bounded: true,
        }
    }

    /// Cursor over frames whose count is not known. `known` frames are
    /// reported as the length but never limit seeking.
    pub fn unbounded(known: Frame, fps: f64) -> Self {
        Self {
            bounded: false,
            ..Self::new(known, fps)
        }
    }

    pub fn for_source(source: &dyn VideoSource) -> Self {
        Self::new(source.frame_count(), source.fps())
    }

    pub fn current(&self) -> Frame {
        self.current
    }

    pub fn total(&self) -> Frame {
        self.total
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_bounded(&self) -> bool {
        self.bounded
    }

    fn last(&self) -> Frame {
        if self.bounded {
            self.total.saturating_sub(1)
        } else {
            Frame::MAX
        }
    }

    /// Unbounded cursors grow their length to cover the current frame.
    fn extend_to_current(&mut self) {
        if !self.bounded {
            self.total = self.total.max(self.current.saturating_add(1));
        }
    }

    /// Advance one frame. Returns false at the last frame.
    pub fn next(&mut self) -> bool {
        if self.current < self.last() {
            self.current += 1;
            self.extend_to_current();
            true
        } else {
            false
        }
    }

    /// Step back one frame. Returns false at the first frame.
    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Move by `offset` frames, clamped to the video.
    pub fn jump(&mut self, offset: i64) {
        let target = i64::from(self.current).saturating_add(offset);
        self.current = target.clamp(0, i64::from(self.last())) as Frame;
        self.extend_to_current();
    }

    /// Seek to `frame`, clamped to the video.
    pub fn set(&mut self, frame: Frame) {
        self.current = frame.min(self.last());
        self.extend_to_current();
    }

    /// Toggle play/pause, returning the new state.
    pub fn toggle_playback(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Timer interval between frames during playback.
    pub fn playback_interval(&self) -> Duration {
        if self.fps > 0.0 {
            Duration::from_millis((1000.0 / self.fps) as u64)
        } else {
            Duration::from_millis(FALLBACK_INTERVAL_MS)
        }
    }

    /// Playback tick: advance, stopping at the end. Returns whether a new
    /// frame should be shown.
    pub fn tick(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        let advanced = self.next();
        if !advanced {
            self.stop();
        }
        advanced
    }

    /// Duration in seconds of an interval at this video's frame rate.
    pub fn duration(&self, start: Frame, end: Frame) -> Option<f64> {
        duration_seconds(start, end, self.fps)
    }

    /// Position text as shown to the annotator (`Frame: 1 / 300`).
    pub fn position_text(&self) -> String {
        format!("Frame: {} / {}", u64::from(self.current) + 1, self.total)
    }
}

/// Open the scene video with the compiled-in backend.
#[cfg(feature = "video-opencv")]
pub fn open_video(path: &std::path::Path) -> Result<Box<dyn VideoSource>> {
    Ok(Box::new(opencv_source::OpenCvVideo::open(path)?))
}

/// Open the scene video with the compiled-in backend.
#[cfg(not(feature = "video-opencv"))]
pub fn open_video(path: &std::path::Path) -> Result<Box<dyn VideoSource>> {
    anyhow::bail!(
        "cannot decode {}: built without a video backend (enable the `video-opencv` feature)",
        path.display()
    )
}

#[cfg(feature = "video-opencv")]
mod opencv_source {
    use super::VideoSource;
    use crate::models::event::Frame;
    use anyhow::{anyhow, Context, Result};
    use image::RgbImage;
    use opencv::{core::Mat, imgproc, prelude::*, videoio};
    use std::path::Path;

    /// OpenCV-backed video that reads sequentially and seeks only when the
    /// requested frame is not the next one.
    pub struct OpenCvVideo {
        capture: videoio::VideoCapture,
        frame_count: Frame,
        fps: f64,
        last_read: Option<Frame>,
    }

    impl OpenCvVideo {
        pub fn open(path: &Path) -> Result<Self> {
            let path_str = path.to_str().ok_or_else(|| anyhow!("non UTF-8 path: {}", path.display()))?;
            let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)
                .with_context(|| format!("Failed to open video {}", path.display()))?;
            if !capture.is_opened()? {
                return Err(anyhow!("Error opening video: {}", path.display()));
            }
            let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as Frame;
            let fps = capture.get(videoio::CAP_PROP_FPS)?;
            log::info!("Opened video {} ({} frames at {:.2} fps)", path.display(), frame_count, fps);
            Ok(Self {
                capture,
                frame_count,
                fps,
                last_read: None,
            })
        }
    }

    impl VideoSource for OpenCvVideo {
        fn frame_count(&self) -> Frame {
            self.frame_count
        }

        fn fps(&self) -> f64 {
            self.fps
        }

        fn decode_frame(&mut self, index: Frame) -> Result<RgbImage> {
            let sequential = self.last_read.is_some_and(|last| last + 1 == index)
                || (self.last_read.is_none() && index == 0);
            if !sequential {
                self.capture.set(videoio::CAP_PROP_POS_FRAMES, f64::from(index))?;
            }

            let mut bgr = Mat::default();
            if !self.capture.read(&mut bgr)? || bgr.empty() {
                self.last_read = None;
                return Err(anyhow!("Failed to decode frame {}", index));
            }
            self.last_read = Some(index);

            let mut rgb = Mat::default();
            imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;
            let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
            let data = rgb.data_bytes()?.to_vec();
            RgbImage::from_raw(width, height, data)
                .ok_or_else(|| anyhow!("Frame {} has an unexpected buffer size", index))
        }
    }
}
