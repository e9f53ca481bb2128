// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! ZARAFE - Zone Annotation of Recorded And Fixated Events
//!
//! Command-line front end: inspect recordings, replay annotation scripts,
//! migrate old events files and export or render annotated frames.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use zarafe::io::events_csv::EVENTS_FILE_NAME;
use zarafe::io::recordings::find_recordings;
use zarafe::io::serialization::{export_snapshot, import_config};
use zarafe::models::project::CONFIG_FILE_NAME;
use zarafe::{script, ProjectConfig, Session};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    match &args.command {
        Command::List { project } => list(project),
        Command::Show { recording, frame } => {
            let session = open(&args, recording)?;
            show(session, *frame)
        }
        Command::Run {
            recording,
            script: script_path,
            save,
        } => {
            let steps = script::load_script(script_path)?;
            let mut session = open(&args, recording)?;
            let report = script::replay(&mut session, &steps)?;
            println!("{} commands applied, {} refused", report.applied, report.refused);
            if *save && session.has_unsaved_changes() {
                println!("{}", session.save()?);
            }
            Ok(())
        }
        Command::Migrate { recording, meta } => {
            let mut session = open(&args, recording)?;
            let events_path = recording.join(EVENTS_FILE_NAME);
            if events_path.is_file() {
                let backup = events_path.with_extension("csv.bak");
                std::fs::copy(&events_path, &backup)
                    .with_context(|| format!("Failed to back up {}", events_path.display()))?;
                log::info!("Backed up events to {}", backup.display());
            }
            for (field, value) in meta {
                session.update_metadata(field, value);
            }
            println!("{}", session.save()?);
            Ok(())
        }
        Command::Export { recording, output } => {
            let session = open(&args, recording)?;
            export_snapshot(&session.snapshot(), output)?;
            println!("Exported {} events to {}", session.events().len(), output.display());
            Ok(())
        }
        Command::Render {
            recording,
            frame,
            output,
            max_size,
        } => {
            let mut session = open(&args, recording)?;
            session.cursor_mut().set(*frame);
            let image = session.render_current(*max_size)?;
            image
                .save(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Rendered frame {} to {}", session.cursor().current(), output.display());
            Ok(())
        }
    }
}

fn config_path(args: &Args, recording: &Path) -> PathBuf {
    args.config.clone().unwrap_or_else(|| {
        recording
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_FILE_NAME)
    })
}

fn open(args: &Args, recording: &Path) -> Result<Session> {
    let path = config_path(args, recording);
    let config = import_config(&path)
        .with_context(|| format!("Failed to load project configuration {}", path.display()))?;
    log::info!("Project: {}", config.project_name());

    let mut session = Session::new(Rc::new(config)).with_fps(args.fps);
    session.open_recording(recording)?;
    Ok(session)
}

fn list(project: &Path) -> Result<()> {
    let recordings = find_recordings(project)
        .with_context(|| format!("Failed to read project directory {}", project.display()))?;
    let config_file = project.join(CONFIG_FILE_NAME);
    if config_file.is_file() {
        let config: ProjectConfig = import_config(&config_file)?;
        println!("{}", config.project_name());
    }
    for recording in recordings {
        let annotated = if recording.dir.join(EVENTS_FILE_NAME).is_file() {
            "annotated"
        } else {
            "-"
        };
        println!("{:<40} {}", recording.name, annotated);
    }
    Ok(())
}

fn show(mut session: Session, frame: Option<u32>) -> Result<()> {
    if let Some(recording) = session.recording() {
        println!("Recording: {}", recording.name);
    }
    println!("{}", session.cursor().position_text());

    println!("Metadata:");
    for (field, value) in session.metadata().fields() {
        println!("  {:<20} {}", field, value);
    }
    let missing = session.metadata().missing_fields();
    if !missing.is_empty() {
        println!("  missing: {}", missing.join(", "));
    }

    let fps = session.fps();
    println!("Events:");
    for (index, event) in session.events().iter().enumerate() {
        let duration = event
            .duration_seconds(fps)
            .map_or_else(|| "N/A".to_string(), |d| format!("{:.1}s", d));
        println!("  [{}] {} ({})", index, event.display_text(), duration);
    }
    println!(
        "Gaze: {} samples on {} frames",
        session.gaze().sample_count(),
        session.gaze().frame_count()
    );

    if let Some(frame) = frame {
        session.cursor_mut().set(frame);
        println!("{}", session.cursor().position_text());
        match session.active_badge() {
            Some(badge) => println!("  in event: {}", badge.label),
            None => println!("  in event: none"),
        }
        for point in session.current_gaze() {
            println!("  gaze: ({:.1}, {:.1})", point.x, point.y);
        }
    }
    Ok(())
}
