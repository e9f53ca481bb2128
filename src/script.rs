// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation scripts.
//!
//! A script is a text file with one session command per line, e.g.
//!
//! ```text
//! # first approach
//! create Approach M1
//! goto 120
//! start
//! end 180
//! meta participant_id P01
//! save
//! ```
//!
//! The whole script is parsed before anything runs. During replay, refused
//! operations are logged and skipped; I/O failures stop the replay.

use crate::app::Session;
use crate::error::StoreError;
use crate::models::event::Frame;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One script line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(String),
    Select(usize),
    Goto(Frame),
    Next,
    Prev,
    Skip(i64),
    /// Mark start, optionally moving the cursor first
    Start(Option<Frame>),
    End(Option<Frame>),
    Delete,
    Undo,
    Meta { field: String, value: String },
    Save,
}

/// A command and the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub line: usize,
    pub command: Command,
}

/// Outcome counts of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub refused: usize,
}

fn number<T: std::str::FromStr>(arg: &str, what: &str) -> Result<T, String> {
    arg.parse()
        .map_err(|_| format!("expected {} but found '{}'", what, arg))
}

fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let no_args = |command: Command| {
        if rest.is_empty() {
            Ok(command)
        } else {
            Err(format!("'{}' takes no arguments", keyword))
        }
    };
    let optional_frame = |rest: &str| -> Result<Option<Frame>, String> {
        if rest.is_empty() {
            Ok(None)
        } else {
            number(rest, "a frame index").map(Some)
        }
    };

    let command = match keyword.to_ascii_lowercase().as_str() {
        "create" if rest.is_empty() => return Err("'create' needs an event type".to_string()),
        "create" => Command::Create(rest.to_string()),
        "select" => Command::Select(number(rest, "an event index")?),
        "goto" => Command::Goto(number(rest, "a frame index")?),
        "next" => no_args(Command::Next)?,
        "prev" => no_args(Command::Prev)?,
        "skip" => Command::Skip(number(rest, "a frame offset")?),
        "start" => Command::Start(optional_frame(rest)?),
        "end" => Command::End(optional_frame(rest)?),
        "delete" => no_args(Command::Delete)?,
        "undo" => no_args(Command::Undo)?,
        "meta" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, ""), |(f, v)| (f, v.trim()));
            if field.is_empty() {
                return Err("'meta' needs a field name".to_string());
            }
            Command::Meta {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        "save" => no_args(Command::Save)?,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Some(command))
}

/// Parse script text. Fails on the first bad line.
pub fn parse_script(text: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let parsed = parse_line(line).map_err(|message| ScriptError::Parse {
            line: line_number,
            message,
        })?;
        if let Some(command) = parsed {
            steps.push(Step {
                line: line_number,
                command,
            });
        }
    }
    Ok(steps)
}

pub fn load_script(path: &Path) -> Result<Vec<Step>, ScriptError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&text)
}

fn apply(session: &mut Session, command: &Command) -> Result<String, StoreError> {
    match command {
        Command::Create(event_type) => session.create_event(event_type),
        Command::Select(index) => session.select_event(*index),
        Command::Goto(frame) => {
            session.cursor_mut().set(*frame);
            Ok(session.cursor().position_text())
        }
        Command::Next => {
            session.cursor_mut().next();
            Ok(session.cursor().position_text())
        }
        Command::Prev => {
            session.cursor_mut().prev();
            Ok(session.cursor().position_text())
        }
        Command::Skip(offset) => {
            session.cursor_mut().jump(*offset);
            Ok(session.cursor().position_text())
        }
        Command::Start(frame) => {
            if let Some(frame) = frame {
                session.cursor_mut().set(*frame);
            }
            session.mark_start()
        }
        Command::End(frame) => {
            if let Some(frame) = frame {
                session.cursor_mut().set(*frame);
            }
            session.mark_end()
        }
        Command::Delete => session.delete_event(),
        Command::Undo => session.undo(),
        Command::Meta { field, value } => {
            session.update_metadata(field, value);
            Ok(format!("Set {} to '{}'", field, value))
        }
        Command::Save => session.save(),
    }
}

/// Run parsed steps against `session`.
pub fn replay(session: &mut Session, steps: &[Step]) -> Result<ReplayReport, StoreError> {
    let mut report = ReplayReport::default();
    for step in steps {
        match apply(session, &step.command) {
            Ok(message) => {
                log::info!("line {}: {}", step.line, message);
                report.applied += 1;
            }
            Err(e) if e.is_validation() => {
                log::warn!("line {}: {}", step.line, e);
                report.refused += 1;
            }
            Err(e) => return Err(e),
        }
    }
    log::info!(
        "Replayed {} commands, {} refused",
        report.applied + report.refused,
        report.refused
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::Event;
    use crate::models::project::tests::sample_config;
    use std::rc::Rc;

    #[test]
    fn test_parse_commands() {
        let steps = parse_script(
            "# setup\n\
             create Approach M1\n\
             \n\
             goto 120\n\
             start\n\
             end 180\n\
             skip -5\n\
             meta series_title Series A\n\
             SAVE\n",
        )
        .unwrap();

        let commands: Vec<&Command> = steps.iter().map(|s| &s.command).collect();
        assert_eq!(
            commands,
            vec![
                &Command::Create("Approach M1".to_string()),
                &Command::Goto(120),
                &Command::Start(None),
                &Command::End(Some(180)),
                &Command::Skip(-5),
                &Command::Meta {
                    field: "series_title".to_string(),
                    value: "Series A".to_string(),
                },
                &Command::Save,
            ]
        );
        assert_eq!(steps[0].line, 2);
        assert_eq!(steps[1].line, 4);
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = parse_script("create Break\ngoto ten\n").unwrap_err();
        assert!(matches!(err, ScriptError::Parse { line: 2, .. }));
        assert_eq!(
            err.to_string(),
            "line 2: expected a frame index but found 'ten'"
        );

        assert!(parse_script("undo now").is_err());
        assert!(parse_script("create").is_err());
        assert!(parse_script("rewind 3").is_err());
    }

    struct Blank;

    impl crate::io::media::VideoSource for Blank {
        fn frame_count(&self) -> Frame {
            100
        }

        fn fps(&self) -> f64 {
            30.0
        }

        fn decode_frame(&mut self, _index: Frame) -> anyhow::Result<image::RgbImage> {
            Ok(image::RgbImage::new(4, 4))
        }
    }

    #[test]
    fn test_replay_skips_refused_operations() {
        let mut session = Session::new(Rc::new(sample_config()));
        session.attach_video(Box::new(Blank));
        let steps = parse_script(
            "start\n\
             create View M1\n\
             end 0\n\
             start 5\n\
             create View M1\n\
             undo\n\
             undo\n\
             undo\n",
        )
        .unwrap();

        let report = replay(&mut session, &steps).unwrap();
        // start without selection, start after end, duplicate, third undo
        assert_eq!(report, ReplayReport { applied: 4, refused: 4 });
        assert!(session.events().is_empty());
        assert_eq!(session.cursor().current(), 5);
    }

    #[test]
    fn test_replay_marks_at_cursor() {
        let mut session = Session::new(Rc::new(sample_config()));
        let steps = parse_script("create Break\nstart\nend\n").unwrap();
        replay(&mut session, &steps).unwrap();
        assert_eq!(session.events(), &[Event::with_bounds("Break", 0, 0)]);
    }

    #[test]
    fn test_replay_without_video_keeps_requested_frames() {
        let dir = std::env::temp_dir().join(format!("zarafe-script-novideo-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut session = Session::new(Rc::new(sample_config())).with_fps(30.0);
        session.open_recording(&dir).unwrap();
        assert!(!session.has_video());

        let steps = parse_script("create Break\nstart 100\nend 150\ngoto 400\n").unwrap();
        let report = replay(&mut session, &steps).unwrap();
        assert_eq!(report, ReplayReport { applied: 4, refused: 0 });
        assert_eq!(session.events(), &[Event::with_bounds("Break", 100, 150)]);
        assert_eq!(session.cursor().current(), 400);
        std::fs::remove_dir_all(&dir).ok();
    }
}
