// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

use std::path::PathBuf;
use std::rc::Rc;
use zarafe::io::events_csv::EVENTS_FILE_NAME;
use zarafe::io::marker_interval::MARKER_INTERVAL_FILE_NAME;
use zarafe::io::recordings::find_recordings;
use zarafe::io::serialization::{export_snapshot, import_config};
use zarafe::models::project::CONFIG_FILE_NAME;
use zarafe::script::{parse_script, replay};
use zarafe::{Event, Session};

const CONFIG: &str = r#"{
    "project": { "name": "Gallery Study" },
    "event_types": [
        { "name": "Approach {target}", "color": [255, 0, 0], "applies_to": "targets" },
        { "name": "View {target}", "color": [0, 0, 255], "applies_to": "targets" },
        { "name": "Accuracy Test", "applies_to": "glassesValidator" }
    ],
    "targets": [ { "id": "M1" }, { "id": "M2" } ],
    "conditions": [ "guided" ]
}"#;

fn project_dir(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("zarafe-it-{}-{}", name, std::process::id()));
    let recording = root.join("P01_rec");
    std::fs::create_dir_all(&recording).unwrap();
    std::fs::write(root.join(CONFIG_FILE_NAME), CONFIG).unwrap();
    std::fs::write(recording.join("worldCamera.mp4"), b"").unwrap();
    std::fs::write(
        recording.join("gazeData.tsv"),
        "frame_idx\tgaze_pos_vid_x\tgaze_pos_vid_y\tpup_diam_r\n\
         0\t10.0\t10.0\t3.0\n\
         120\t400.5\t300.25\t3.5\n\
         299\t5.0\t5.0\t3.2\n",
    )
    .unwrap();
    root
}

#[test]
fn annotate_save_and_reopen() {
    let root = project_dir("workflow");
    let recordings = find_recordings(&root).unwrap();
    assert_eq!(recordings.len(), 1);
    let recording = &recordings[0];

    let config = Rc::new(import_config(&root.join(CONFIG_FILE_NAME)).unwrap());
    let mut session = Session::new(Rc::clone(&config)).with_fps(30.0);
    session.open_recording(&recording.dir).unwrap();
    assert_eq!(session.cursor().total(), 300);
    assert!(session.events().is_empty());

    let steps = parse_script(
        "create Approach M1\n\
         start 100\n\
         end 150\n\
         create View M1\n\
         start 120\n\
         end 110\n\
         end 200\n\
         create Accuracy Test\n\
         start 0\n\
         end 29\n\
         save\n\
         meta participant_id P01\n\
         meta condition guided\n\
         meta series_title Series A\n\
         save\n",
    )
    .unwrap();
    let report = replay(&mut session, &steps).unwrap();
    // end before start, save with missing metadata
    assert_eq!(report.refused, 2);
    assert!(!session.has_unsaved_changes());

    let events_csv = std::fs::read_to_string(recording.dir.join(EVENTS_FILE_NAME)).unwrap();
    assert_eq!(
        events_csv,
        "participant_id,file_name,event_name,start_frame,end_frame,duration\n\
         P01,P01_rec,Approach M1,100,150,1.7\n\
         P01,P01_rec,View M1,120,200,2.7\n"
    );
    let markers = std::fs::read_to_string(recording.dir.join(MARKER_INTERVAL_FILE_NAME)).unwrap();
    assert_eq!(markers, "start_frame\tend_frame\n0\t29\n");

    let mut reopened = Session::new(config).with_fps(30.0);
    reopened.open_recording(&recording.dir).unwrap();
    assert_eq!(
        reopened.events(),
        &[
            Event::with_bounds("Approach M1", 100, 150),
            Event::with_bounds("View M1", 120, 200),
            Event::with_bounds("Accuracy Test 1", 0, 29),
        ]
    );
    assert_eq!(reopened.metadata().field("participant_id"), "P01");

    reopened.cursor_mut().set(120);
    let badge = reopened.active_badge().unwrap();
    assert_eq!(badge.label, "Approach M1 (1.7s)");
    assert_eq!(badge.color, [255, 0, 0]);
    assert_eq!(reopened.current_gaze().len(), 1);
    assert_eq!(reopened.gaze().mean_pupil(0, 120), Some(3.25));

    let export = root.join("session.json");
    export_snapshot(&reopened.snapshot(), &export).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(value["project"], "Gallery Study");
    assert_eq!(value["events"][2]["marker_interval"], true);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn legacy_events_file_is_read() {
    let root = project_dir("legacy");
    let dir = root.join("P01_rec");
    std::fs::write(
        dir.join(EVENTS_FILE_NAME),
        "Segment,Start Frame,End Frame,Type\n\
         seg1,10,40,Approach M2\n\
         seg2,50,60,N.A.\n\
         seg3,70,90,\n",
    )
    .unwrap();

    let config = Rc::new(import_config(&root.join(CONFIG_FILE_NAME)).unwrap());
    let mut session = Session::new(config).with_fps(30.0);
    session.open_recording(&dir).unwrap();
    assert_eq!(
        session.events(),
        &[
            Event::with_bounds("Approach M2", 10, 40),
            Event::with_bounds("seg3", 70, 90),
        ]
    );
    assert_eq!(session.store().selected(), Some(0));

    std::fs::remove_dir_all(&root).ok();
}
