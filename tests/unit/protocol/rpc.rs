use super::*;
use crate::foundation::core::IdGen;

fn studio() -> Studio {
    Studio::with_ids(IdGen::with_epoch(11))
}

fn identified() -> ProtocolSession {
    let mut session = ProtocolSession::new();
    let mut s = studio();
    session
        .handle(
            &mut s,
            &Envelope::new(OpCode::Identify, json!({ "rpcVersion": 1 })),
            0.0,
        )
        .unwrap();
    session
}

fn request(
    session: &mut ProtocolSession,
    s: &mut Studio,
    request_type: &str,
    data: Value,
) -> Value {
    let msg = Envelope::new(
        OpCode::Request,
        json!({ "requestType": request_type, "requestId": "r1", "requestData": data }),
    );
    let mut out = session.handle(s, &msg, 0.0).unwrap();
    assert_eq!(out.len(), 1);
    let reply = out.remove(0);
    assert_eq!(reply.op, OpCode::RequestResponse as u8);
    assert_eq!(reply.d["requestId"], "r1");
    reply.d
}

fn code(reply: &Value) -> u64 {
    reply["requestStatus"]["code"].as_u64().unwrap()
}

#[test]
fn hello_advertises_versions() {
    let hello = ProtocolSession::new().hello();
    assert_eq!(hello.op, 0);
    assert_eq!(hello.d["obsWebSocketVersion"], OBS_WEBSOCKET_VERSION);
    assert_eq!(hello.d["rpcVersion"], 1);
    assert!(hello.d.get("authentication").is_none());
}

#[test]
fn identify_negotiates_rpc_one() {
    let mut s = studio();
    let mut session = ProtocolSession::new();
    let out = session
        .handle(
            &mut s,
            &Envelope::new(OpCode::Identify, json!({ "rpcVersion": 1 })),
            0.0,
        )
        .unwrap();
    assert_eq!(out[0].op, OpCode::Identified as u8);
    assert_eq!(out[0].d["negotiatedRpcVersion"], 1);
    assert!(session.is_identified());
}

#[test]
fn identify_rejects_other_rpc_versions() {
    let mut s = studio();
    let mut session = ProtocolSession::new();
    let err = session
        .handle(
            &mut s,
            &Envelope::new(OpCode::Identify, json!({ "rpcVersion": 2 })),
            0.0,
        )
        .unwrap_err();
    assert!(matches!(err, OnAirError::Protocol(_)));
    assert!(!session.is_identified());
}

#[test]
fn requests_before_identify_are_protocol_errors() {
    let mut s = studio();
    let mut session = ProtocolSession::new();
    let msg = Envelope::new(
        OpCode::Request,
        json!({ "requestType": "GetVersion", "requestId": "x" }),
    );
    assert!(matches!(
        session.handle(&mut s, &msg, 0.0),
        Err(OnAirError::Protocol(_))
    ));
}

#[test]
fn unknown_op_codes_are_rejected() {
    let mut s = studio();
    let mut session = identified();
    let err = session
        .handle_text(&mut s, r#"{"op":9,"d":{}}"#, 0.0)
        .unwrap_err();
    assert!(matches!(err, OnAirError::Protocol(_)));
}

#[test]
fn get_version_lists_available_requests() {
    let mut s = studio();
    let mut session = identified();
    let reply = request(&mut session, &mut s, "GetVersion", json!({}));
    assert_eq!(code(&reply), 100);
    assert_eq!(reply["requestStatus"]["result"], true);
    let data = &reply["responseData"];
    assert_eq!(data["obsVersion"], OBS_VERSION);
    assert_eq!(data["availableRequests"].as_array().unwrap().len(), 9);
    assert_eq!(data["supportedImageFormats"], json!(["png", "jpg"]));
}

#[test]
fn unknown_and_missing_request_types_have_codes() {
    let mut s = studio();
    let mut session = identified();
    let reply = request(&mut session, &mut s, "GetInputList", json!({}));
    assert_eq!(code(&reply), 204);
    assert_eq!(reply["requestStatus"]["result"], false);

    let msg = Envelope::new(OpCode::Request, json!({ "requestId": "r2" }));
    let out = session.handle(&mut s, &msg, 0.0).unwrap();
    assert_eq!(out[0].d["requestStatus"]["code"], 203);
}

#[test]
fn scene_list_reports_program_and_order() {
    let mut s = studio();
    let b = s.create_scene(Some("Interview"));
    let mut session = identified();
    let reply = request(&mut session, &mut s, "GetSceneList", json!({}));
    let data = &reply["responseData"];
    assert_eq!(data["currentProgramSceneName"], "Scene 1");
    assert!(data["currentPreviewSceneName"].is_null());
    let scenes = data["scenes"].as_array().unwrap();
    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[1]["sceneName"], "Interview");
    assert_eq!(scenes[1]["sceneUuid"], b.as_str());
    assert_eq!(scenes[1]["sceneIndex"], 1);
}

#[test]
fn set_program_scene_by_name_starts_the_transition() {
    let mut s = studio();
    let b = s.create_scene(Some("B"));
    let mut session = identified();
    let reply = request(
        &mut session,
        &mut s,
        "SetCurrentProgramScene",
        json!({ "sceneName": "B" }),
    );
    assert_eq!(code(&reply), 100);
    assert!(reply.get("responseData").is_none());
    assert!(s.is_transitioning());
    assert_eq!(s.transition().active().map(|t| &t.to), Some(&b));
}

#[test]
fn set_program_scene_errors() {
    let mut s = studio();
    let mut session = identified();
    let missing = request(&mut session, &mut s, "SetCurrentProgramScene", json!({}));
    assert_eq!(code(&missing), 300);
    let unknown = request(
        &mut session,
        &mut s,
        "SetCurrentProgramScene",
        json!({ "sceneName": "Nope" }),
    );
    assert_eq!(code(&unknown), 600);
    let wrong_type = request(
        &mut session,
        &mut s,
        "SetCurrentProgramScene",
        json!({ "sceneName": 3 }),
    );
    assert_eq!(code(&wrong_type), 400);
}

#[test]
fn record_lifecycle_reports_output_codes() {
    let mut s = studio();
    let mut session = identified();
    assert_eq!(code(&request(&mut session, &mut s, "StopRecord", json!({}))), 501);
    assert_eq!(code(&request(&mut session, &mut s, "StartRecord", json!({}))), 100);
    assert_eq!(code(&request(&mut session, &mut s, "StartRecord", json!({}))), 500);
    let stopped = request(&mut session, &mut s, "StopRecord", json!({}));
    assert_eq!(code(&stopped), 100);
    let path = stopped["responseData"]["outputPath"].as_str().unwrap();
    assert!(path.starts_with("recording-"));
    assert_eq!(s.take_recordings().len(), 1);
}

#[test]
fn stream_lifecycle_reports_output_codes() {
    let mut s = studio();
    let mut session = identified();
    assert_eq!(code(&request(&mut session, &mut s, "StartStream", json!({}))), 100);
    assert_eq!(code(&request(&mut session, &mut s, "StartStream", json!({}))), 500);
    assert_eq!(code(&request(&mut session, &mut s, "StopStream", json!({}))), 100);
    assert_eq!(code(&request(&mut session, &mut s, "StopStream", json!({}))), 501);
}

#[test]
fn events_are_wrapped_with_intent() {
    let mut s = studio();
    s.start_streaming(0.0).unwrap();
    let events = drain_events(&mut s);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].op, OpCode::Event as u8);
    assert_eq!(events[0].d["eventType"], "StreamStateChanged");
    assert_eq!(events[0].d["eventIntent"], 1);
    assert_eq!(events[0].d["eventData"]["outputActive"], true);
    assert_eq!(
        events[0].d["eventData"]["outputState"],
        "OBS_WEBSOCKET_OUTPUT_STARTED"
    );
    assert!(drain_events(&mut s).is_empty());
}

#[test]
fn handle_text_round_trips_json() {
    let mut s = studio();
    let mut session = ProtocolSession::new();
    let out = session
        .handle_text(&mut s, r#"{"op":1,"d":{"rpcVersion":1}}"#, 0.0)
        .unwrap();
    let reply: Value = serde_json::from_str(&out[0]).unwrap();
    assert_eq!(reply["op"], 2);
    assert!(session.handle_text(&mut s, "not json", 0.0).is_err());
}
