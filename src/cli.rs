// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "zarafe", version, about = "Annotate eye-tracking scene videos with labeled events")]
pub struct Args {
    /// Project configuration (JSON or YAML). Defaults to zarafe_config.json
    /// in the project directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Frame rate used for durations when the scene video cannot be opened
    #[arg(long, global = true, default_value_t = 30.0)]
    pub fps: f64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the recordings of a project directory
    List { project: PathBuf },

    /// Print the events and metadata of a recording
    Show {
        recording: PathBuf,
        /// Also describe this frame: active event and gaze points
        #[arg(long)]
        frame: Option<u32>,
    },

    /// Replay an annotation script against a recording
    Run {
        recording: PathBuf,
        script: PathBuf,
        /// Save after the script even if it has no `save` command
        #[arg(long)]
        save: bool,
    },

    /// Rewrite a recording's events file in the current layout
    Migrate {
        recording: PathBuf,
        /// Metadata to fill in, as field=value
        #[arg(long = "meta", value_parser = parse_field)]
        meta: Vec<(String, String)>,
    },

    /// Export metadata and events to JSON or YAML
    Export { recording: PathBuf, output: PathBuf },

    /// Render a frame with its overlays to an image file
    Render {
        recording: PathBuf,
        #[arg(long, default_value_t = 0)]
        frame: u32,
        #[arg(long, short)]
        output: PathBuf,
        /// Fit the frame within WIDTHxHEIGHT
        #[arg(long, value_parser = parse_size)]
        max_size: Option<(u32, u32)>,
    },
}

fn parse_field(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(field, value)| (field.trim().to_string(), value.trim().to_string()))
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| format!("expected field=value, got '{}'", arg))
}

fn parse_size(arg: &str) -> Result<(u32, u32), String> {
    let (w, h) = arg
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", arg))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("{}: {}", v, e));
    Ok((parse(w)?, parse(h)?))
}
