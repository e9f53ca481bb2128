// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for recording data files, media and project files.

pub mod events_csv;
pub mod gaze;
pub mod marker_interval;
pub mod media;
pub mod recordings;
pub mod serialization;
