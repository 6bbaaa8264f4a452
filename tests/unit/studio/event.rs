use super::*;

#[test]
fn scene_change_payload() {
    let e = StudioEvent::CurrentProgramSceneChanged {
        scene_id: SceneId::from("s-1"),
        scene_name: "Intro".to_owned(),
    };
    assert_eq!(e.event_type(), "CurrentProgramSceneChanged");
    assert_eq!(
        e.event_data(),
        json!({ "sceneName": "Intro", "sceneUuid": "s-1" })
    );
}

#[test]
fn output_payload() {
    let e = StudioEvent::StreamStateChanged(OutputStatus::stopped());
    assert_eq!(e.event_type(), "StreamStateChanged");
    assert_eq!(e.event_data()["outputState"], "OBS_WEBSOCKET_OUTPUT_STOPPED");
    assert_eq!(e.event_data()["outputActive"], false);
}
