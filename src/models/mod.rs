// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for events, session metadata and project configuration.

pub mod event;
pub mod gaze;
pub mod history;
pub mod metadata;
pub mod project;
pub mod store;
