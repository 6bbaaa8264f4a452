use super::*;

fn frame() -> FrameRGBA {
    FrameRGBA {
        width: 1,
        height: 1,
        data: vec![0; 4],
        premultiplied: true,
    }
}

#[test]
fn start_stop_report_status() {
    let mut s = StreamOutput::new();
    assert_eq!(s.status(), OutputStatus::stopped());
    let st = s.start(100.0).unwrap();
    assert!(st.output_active);
    assert_eq!(st.output_state, OutputState::Started);
    assert!(s.start(110.0).is_err());
    assert_eq!(s.duration_ms(400.0), 300.0);
    let st = s.stop().unwrap();
    assert!(!st.output_active);
    assert!(s.stop().is_err());
}

#[test]
fn frames_count_only_while_live() {
    let mut s = StreamOutput::new();
    s.push_frame(&frame());
    s.start(0.0).unwrap();
    s.push_frame(&frame());
    s.push_frame(&frame());
    assert_eq!(s.frames_sent(), 2);
}

#[test]
fn status_wire_format() {
    let v = serde_json::to_value(OutputStatus::started()).unwrap();
    assert_eq!(v["outputActive"], true);
    assert_eq!(v["outputState"], "OBS_WEBSOCKET_OUTPUT_STARTED");
}
