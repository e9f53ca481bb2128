// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project configuration.
//!
//! A project directory holds a `zarafe_config.json` describing the event
//! vocabulary, per-type colors, the targets (monitors) events refer to and
//! the condition options. The configuration is loaded once per project and
//! handed to every component that needs it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the project configuration inside a project directory.
pub const CONFIG_FILE_NAME: &str = "zarafe_config.json";

/// Placeholder replaced by each target id in target-scoped event types.
pub const TARGET_PLACEHOLDER: &str = "{target}";

const DEFAULT_PROJECT_NAME: &str = "Video Annotation Tool";

/// An RGB color.
pub type Rgb = [u8; 3];

pub const DEFAULT_COLOR: Rgb = [123, 171, 61];

fn default_color() -> Rgb {
    DEFAULT_COLOR
}

/// Which events an event type definition produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppliesTo {
    /// Expanded once per configured target.
    Targets,
    /// Repeatable marker interval, exported to `markerInterval.tsv`.
    GlassesValidator,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub name: String,
}

/// Event type as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<AppliesTo>,
}

/// A monitor or other scene object that events refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Substring-based color override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRule {
    pub pattern: String,
    pub color: Rgb,
}

/// One entry of the expanded event vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventType {
    pub name: String,
    pub color: Rgb,
    /// Repeatable marker interval type.
    pub marker: bool,
}

/// Complete project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub event_types: Vec<EventTypeDef>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default = "default_color")]
    pub default_color: Rgb,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_rules: Vec<ColorRule>,
    /// Metadata field name -> column name in `metadata.csv`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata_columns: BTreeMap<String, String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project: ProjectInfo::default(),
            event_types: Vec::new(),
            targets: Vec::new(),
            conditions: Vec::new(),
            default_color: DEFAULT_COLOR,
            color_rules: Vec::new(),
            metadata_columns: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn project_name(&self) -> &str {
        if self.project.name.is_empty() {
            DEFAULT_PROJECT_NAME
        } else {
            &self.project.name
        }
    }

    /// Expanded event vocabulary, target templates resolved once per target.
    pub fn event_types(&self) -> Vec<EventType> {
        let mut expanded = Vec::new();
        for def in &self.event_types {
            let color = def.color.unwrap_or(self.default_color);
            match def.applies_to {
                Some(AppliesTo::Targets) => {
                    for target in &self.targets {
                        expanded.push(EventType {
                            name: def.name.replace(TARGET_PLACEHOLDER, &target.id),
                            color,
                            marker: false,
                        });
                    }
                }
                Some(AppliesTo::GlassesValidator) => expanded.push(EventType {
                    name: def.name.clone(),
                    color,
                    marker: true,
                }),
                _ => expanded.push(EventType {
                    name: def.name.clone(),
                    color,
                    marker: false,
                }),
            }
        }
        expanded
    }

    /// Names of the expanded event vocabulary.
    pub fn event_type_names(&self) -> Vec<String> {
        self.event_types().into_iter().map(|t| t.name).collect()
    }

    /// The marker interval type whose events `markerInterval.tsv` holds.
    pub fn marker_type(&self) -> Option<&str> {
        self.marker_defs().next().map(|def| def.name.as_str())
    }

    /// Marker type an event name belongs to: the bare type name or the
    /// type name followed by an ordinal (`Accuracy Test 2`).
    pub fn marker_base(&self, event_name: &str) -> Option<&str> {
        self.marker_defs()
            .map(|def| def.name.as_str())
            .find(|base| marker_ordinal(base, event_name).is_some() || event_name == *base)
    }

    pub fn is_marker_interval_event(&self, event_name: &str) -> bool {
        self.marker_base(event_name).is_some()
    }

    /// Display color for an event.
    pub fn color(&self, event_name: &str) -> Rgb {
        if let Some(base) = self.marker_base(event_name) {
            if let Some(def) = self.marker_defs().find(|def| def.name == base) {
                return def.color.unwrap_or(self.default_color);
            }
        }
        if let Some(event_type) = self.event_types().into_iter().find(|t| t.name == event_name) {
            return event_type.color;
        }
        self.color_rules
            .iter()
            .find(|rule| event_name.contains(&rule.pattern))
            .map_or(self.default_color, |rule| rule.color)
    }

    pub fn target_ids(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.id.as_str()).collect()
    }

    /// Column in `metadata.csv` holding the given metadata field.
    pub fn metadata_column<'a>(&'a self, field: &'a str) -> &'a str {
        self.metadata_columns
            .get(field)
            .map_or(field, |column| column.as_str())
    }

    fn marker_defs(&self) -> impl Iterator<Item = &EventTypeDef> {
        self.event_types
            .iter()
            .filter(|def| def.applies_to == Some(AppliesTo::GlassesValidator))
    }
}

/// Ordinal suffix of a repeatable event name, e.g. `3` for `Accuracy Test 3`.
pub fn marker_ordinal(base: &str, event_name: &str) -> Option<u32> {
    let suffix = event_name.strip_prefix(base)?.strip_prefix(' ')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok().filter(|n| *n > 0)
}
