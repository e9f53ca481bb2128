// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session metadata.
//!
//! Flat string fields describing the annotated session: who was recorded,
//! under which condition, and which image each target showed. The required
//! subset must be filled in before events can be exported.

use super::project::ProjectConfig;
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const PARTICIPANT_ID: &str = "participant_id";
pub const CONDITION: &str = "condition";
pub const SERIES_TITLE: &str = "series_title";
pub const FILE_NAME: &str = "file_name";

/// Fields that must be non-empty before saving.
pub const REQUIRED_FIELDS: [&str; 3] = [PARTICIPANT_ID, CONDITION, SERIES_TITLE];

/// File name of the optional per-recording metadata seed.
pub const METADATA_FILE_NAME: &str = "metadata.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: BTreeMap<String, String>,
}

impl Default for Metadata {
    fn default() -> Self {
        let mut fields = BTreeMap::new();
        for field in [PARTICIPANT_ID, CONDITION, SERIES_TITLE, FILE_NAME] {
            fields.insert(field.to_string(), String::new());
        }
        Self { fields }
    }
}

impl Metadata {
    /// Empty metadata with one image field per configured target.
    pub fn for_project(config: &ProjectConfig) -> Self {
        let mut metadata = Self::default();
        for id in config.target_ids() {
            metadata.fields.insert(id.to_string(), String::new());
        }
        metadata
    }

    pub fn update_field(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Value of a field, empty when unknown.
    pub fn field(&self, field: &str) -> &str {
        self.fields.get(field).map_or("", |value| value.as_str())
    }

    /// Set a field only if it is currently empty. Returns whether it changed.
    pub fn fill_if_empty(&mut self, field: &str, value: &str) -> bool {
        if value.is_empty() || !self.field(field).is_empty() {
            return false;
        }
        self.update_field(field, value);
        true
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.update_field(FILE_NAME, file_name);
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| self.field(field).trim().is_empty())
            .collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Seed fields from the first row of a `metadata.csv`.
    ///
    /// Column names are resolved through the project's `metadata_columns`
    /// mapping. The file name field is never taken from the file.
    pub fn load_from_csv(&mut self, path: &Path, config: &ProjectConfig) -> Result<usize, StoreError> {
        let file = std::fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);
        let headers = reader.headers()?.clone();

        let Some(record) = reader.records().next().transpose()? else {
            return Ok(0);
        };

        let fields: Vec<String> = self
            .fields
            .keys()
            .filter(|field| field.as_str() != FILE_NAME)
            .cloned()
            .collect();

        let mut loaded = 0;
        for field in fields {
            let column = config.metadata_column(&field);
            if let Some(value) = headers
                .iter()
                .position(|h| h == column)
                .and_then(|i| record.get(i))
            {
                self.update_field(&field, value);
                loaded += 1;
            }
        }
        log::info!("Loaded {} metadata fields from {}", loaded, path.display());
        Ok(loaded)
    }
}
