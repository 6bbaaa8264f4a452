use super::*;

fn fade(ms: u32) -> TransitionConfig {
    TransitionConfig {
        kind: TransitionKind::Fade,
        duration_ms: ms,
    }
}

#[test]
fn defaults_match_studio() {
    let c = TransitionConfig::default();
    assert_eq!(c.kind, TransitionKind::Fade);
    assert_eq!(c.duration_ms, 300);
}

#[test]
fn progress_is_monotone_and_clamped() {
    let mut m = TransitionMachine::new();
    m.begin(SceneId::from("a"), SceneId::from("b"), fade(300), 1000.0);
    let mut last = 0.0;
    for now in [1000.0, 1100.0, 1050.0, 1200.0, 1299.0, 1400.0, 5000.0] {
        let f = m.advance(now).unwrap();
        assert!(f.progress >= last);
        assert!(f.progress <= 1.0);
        last = f.progress;
    }
    assert_eq!(last, 1.0);
    assert_eq!(m.finish(), Some(SceneId::from("b")));
    assert!(!m.is_active());
    assert!(m.advance(6000.0).is_none());
}

#[test]
fn fade_midpoint() {
    let mut m = TransitionMachine::new();
    m.begin(SceneId::from("a"), SceneId::from("b"), fade(300), 0.0);
    assert_eq!(m.advance(0.0).unwrap().progress, 0.0);
    assert!((m.advance(150.0).unwrap().progress - 0.5).abs() < 1e-9);
    assert!(m.finish().is_none());
}

#[test]
fn cut_forces_completion() {
    let mut m = TransitionMachine::new();
    let cfg = TransitionConfig {
        kind: TransitionKind::Cut,
        duration_ms: 300,
    };
    m.begin(SceneId::from("a"), SceneId::from("b"), cfg, 0.0);
    let f = m.advance(0.0).unwrap();
    assert!(f.is_finished());
    assert_eq!(m.finish(), Some(SceneId::from("b")));
}

#[test]
fn zero_duration_completes_on_first_tick() {
    let mut m = TransitionMachine::new();
    m.begin(SceneId::from("a"), SceneId::from("b"), fade(0), 10.0);
    assert_eq!(m.advance(10.0).unwrap().progress, 1.0);
}

#[test]
fn cancel_and_involves() {
    let mut m = TransitionMachine::new();
    m.begin(SceneId::from("a"), SceneId::from("b"), fade(300), 0.0);
    assert!(m.involves(&SceneId::from("a")));
    assert!(!m.involves(&SceneId::from("c")));
    assert!(m.cancel().is_some());
    assert_eq!(m.state(), &TransitionState::Idle);
}

#[test]
fn kind_parsing_and_limits() {
    assert_eq!("Slide".parse::<TransitionKind>().unwrap(), TransitionKind::Slide);
    assert!("wipe".parse::<TransitionKind>().is_err());
    assert!(fade(MAX_DURATION_MS + 1).validate().is_err());
    let json = serde_json::to_string(&fade(500)).unwrap();
    assert_eq!(json, r#"{"type":"fade","durationMs":500}"#);
}
