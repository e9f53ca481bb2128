// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! ZARAFE - Zone Annotation of Recorded And Fixated Events
//!
//! Annotation of eye-tracking scene videos: labeled frame intervals per
//! target, exported together with session metadata.

pub mod app;
pub mod error;
pub mod io;
pub mod models;
pub mod overlay;
pub mod script;
pub mod util;

pub use app::Session;
pub use error::{ConfigError, StoreError, StoreResult};
pub use models::event::{Event, Frame};
pub use models::metadata::Metadata;
pub use models::project::ProjectConfig;
pub use models::store::EventStore;
