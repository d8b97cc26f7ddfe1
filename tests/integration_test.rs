//! Cross-module integration tests exercising the public API surface as
//! a caller would, rather than single-unit behavior.

use bytes::Bytes;
use pupil_realtime::matching::Matcher;
use pupil_realtime::models::{Component, ConnectionType, Sensor, SensorName, Status};
use pupil_realtime::sample::{GazeDatum, GazeSample, VideoFrame};
use pupil_realtime::template::{validate_item, InputType, TemplateItem, WidgetType};

fn connected_sensor(name: SensorName) -> Sensor {
    Sensor {
        sensor: name,
        conn_type: ConnectionType::Direct,
        connected: true,
        ip: Some("10.0.0.5".into()),
        port: Some(8086),
        params: Some("cam=1".into()),
        protocol: "rtsp".into(),
        stream_error: false,
    }
}

fn gaze(ts: f64) -> GazeDatum {
    GazeDatum::Gaze(GazeSample {
        x: 0.0,
        y: 0.0,
        worn: true,
        timestamp_unix_seconds: ts,
    })
}

fn scene_frame() -> VideoFrame {
    VideoFrame {
        width: 1,
        height: 1,
        yuv: Bytes::from_static(&[0, 0, 0]),
        timestamp_unix_seconds: None,
    }
}

/// A sensor disconnecting then reconnecting with changed params should
/// leave status with exactly one entry at that identity, matching §4.5's
/// replace-in-place merge and the ordering rule from §3.
#[test]
fn status_merge_and_ordering_survive_a_reconnect_cycle() {
    pupil_realtime::logging::init_for_tests();
    let mut status = Status::default();
    status.update(Component::Sensor(Sensor {
        connected: false,
        ..connected_sensor(SensorName::World)
    }));
    status.update(Component::Sensor(connected_sensor(SensorName::Gaze)));
    status.update(Component::Sensor(connected_sensor(SensorName::World)));

    assert_eq!(status.sensors.len(), 2);
    let ordered = status.sensors_ordered();
    assert!(ordered[0].connected && ordered[1].connected);
    assert_eq!(ordered[0].sensor, SensorName::Gaze);
    assert_eq!(ordered[1].sensor, SensorName::World);

    assert!(status.direct_world_sensor().connected);
    assert!(!status.direct_eyes_sensor().connected);
}

/// Reproduces §4.7's matching policy end to end: gaze and eyes samples
/// accumulate in their caches, then a scene frame triggers both matches.
#[test]
fn matcher_produces_both_tuples_when_eyes_are_available() {
    let mut matcher = Matcher::new(200);
    matcher.push_gaze(1.00, gaze(1.00));
    matcher.push_gaze(1.10, gaze(1.10));
    matcher.push_eyes(1.05, scene_frame());

    let outcome = matcher.match_world_frame(scene_frame(), 1.12);
    assert!(outcome.scene.is_some());
    assert!(outcome.scene_eyes.is_some());

    // A restart mid-stream clears both caches; the next scene frame
    // finds nothing to match against.
    matcher.clear();
    let outcome = matcher.match_world_frame(scene_frame(), 2.0);
    assert!(outcome.scene.is_none());
    assert!(outcome.scene_eyes.is_none());
}

/// A radio-list template item rejects zero or multiple selections but
/// accepts a single choice drawn from its allowed list.
#[test]
fn template_validation_rejects_out_of_range_answers() {
    let item = TemplateItem {
        id: "q-mood".into(),
        widget_type: WidgetType::RadioList,
        input_type: InputType::Any,
        title: "Mood".into(),
        choices: vec!["good".into(), "bad".into()],
        required: true,
    };
    assert!(!validate_item(&item, &[]).is_empty());
    assert!(!validate_item(&item, &["ugly".to_string()]).is_empty());
    assert!(validate_item(&item, &["good".to_string()]).is_empty());
}
