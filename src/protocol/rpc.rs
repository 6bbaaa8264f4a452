//! A subset of the obs-websocket 5 protocol, transport-agnostic.
//!
//! Messages are `{ "op": <code>, "d": { ... } }` envelopes. The session answers `Identify` and
//! `Request` messages against a [`Studio`]; hosts pump studio events out with
//! [`drain_events`]. Authentication is not supported, so `Hello` never carries a challenge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::foundation::core::SceneId;
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::studio::event::StudioEvent;
use crate::studio::state::Studio;

pub const OBS_VERSION: &str = "30.0.0";
pub const OBS_WEBSOCKET_VERSION: &str = "5.6.3";
pub const RPC_VERSION: u32 = 1;

/// Message op codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Hello = 0,
    Identify = 1,
    Identified = 2,
    Event = 5,
    Request = 6,
    RequestResponse = 7,
}

impl TryFrom<u8> for OpCode {
    type Error = OnAirError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Hello),
            1 => Ok(Self::Identify),
            2 => Ok(Self::Identified),
            5 => Ok(Self::Event),
            6 => Ok(Self::Request),
            7 => Ok(Self::RequestResponse),
            other => Err(OnAirError::protocol(format!("unsupported op code {other}"))),
        }
    }
}

/// Request status codes used in `requestStatus.code`.
pub mod status {
    pub const SUCCESS: u16 = 100;
    pub const MISSING_REQUEST_TYPE: u16 = 203;
    pub const UNKNOWN_REQUEST_TYPE: u16 = 204;
    pub const MISSING_REQUEST_FIELD: u16 = 300;
    pub const INVALID_REQUEST_FIELD_TYPE: u16 = 400;
    pub const OUTPUT_RUNNING: u16 = 500;
    pub const OUTPUT_NOT_RUNNING: u16 = 501;
    pub const RESOURCE_NOT_FOUND: u16 = 600;
    pub const REQUEST_PROCESSING_FAILED: u16 = 702;
}

/// Wire envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
}

impl Envelope {
    pub fn new(op: OpCode, d: Value) -> Self {
        Self { op: op as u8, d }
    }

    pub fn op_code(&self) -> OnAirResult<OpCode> {
        OpCode::try_from(self.op)
    }

    pub fn to_json(&self) -> OnAirResult<String> {
        serde_json::to_string(self).map_err(|e| OnAirError::serde(e.to_string()))
    }

    pub fn from_json(text: &str) -> OnAirResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| OnAirError::protocol(format!("malformed message: {e}")))
    }
}

/// Requests this server answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestType {
    GetVersion,
    GetStats,
    GetSceneList,
    GetCurrentProgramScene,
    SetCurrentProgramScene,
    StartRecord,
    StopRecord,
    StartStream,
    StopStream,
}

impl RequestType {
    pub const ALL: [RequestType; 9] = [
        Self::GetVersion,
        Self::GetStats,
        Self::GetSceneList,
        Self::GetCurrentProgramScene,
        Self::SetCurrentProgramScene,
        Self::StartRecord,
        Self::StopRecord,
        Self::StartStream,
        Self::StopStream,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetVersion => "GetVersion",
            Self::GetStats => "GetStats",
            Self::GetSceneList => "GetSceneList",
            Self::GetCurrentProgramScene => "GetCurrentProgramScene",
            Self::SetCurrentProgramScene => "SetCurrentProgramScene",
            Self::StartRecord => "StartRecord",
            Self::StopRecord => "StopRecord",
            Self::StartStream => "StartStream",
            Self::StopStream => "StopStream",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

/// `requestStatus` object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RequestStatus {
    fn ok() -> Self {
        Self {
            result: true,
            code: status::SUCCESS,
            comment: None,
        }
    }

    fn fail(code: u16, comment: impl Into<String>) -> Self {
        Self {
            result: false,
            code,
            comment: Some(comment.into()),
        }
    }
}

type Handled = Result<Option<Value>, RequestStatus>;

/// One client connection.
#[derive(Debug, Default)]
pub struct ProtocolSession {
    negotiated_rpc: Option<u32>,
}

impl ProtocolSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_identified(&self) -> bool {
        self.negotiated_rpc.is_some()
    }

    /// First message sent to a client.
    pub fn hello(&self) -> Envelope {
        Envelope::new(
            OpCode::Hello,
            json!({
                "obsWebSocketVersion": OBS_WEBSOCKET_VERSION,
                "rpcVersion": RPC_VERSION,
            }),
        )
    }

    /// Handle one raw text message, returning the raw replies.
    pub fn handle_text(
        &mut self,
        studio: &mut Studio,
        text: &str,
        now_ms: f64,
    ) -> OnAirResult<Vec<String>> {
        let msg = Envelope::from_json(text)?;
        self.handle(studio, &msg, now_ms)?
            .iter()
            .map(Envelope::to_json)
            .collect()
    }

    /// Handle one client message.
    ///
    /// Protocol violations (unknown op, requests before `Identify`, malformed payloads) are
    /// errors; request-level failures are reported inside the `RequestResponse`.
    pub fn handle(
        &mut self,
        studio: &mut Studio,
        msg: &Envelope,
        now_ms: f64,
    ) -> OnAirResult<Vec<Envelope>> {
        match msg.op_code()? {
            OpCode::Identify => Ok(vec![self.identify(&msg.d)?]),
            OpCode::Request => {
                if !self.is_identified() {
                    return Err(OnAirError::protocol("request received before Identify"));
                }
                Ok(vec![self.request(studio, &msg.d, now_ms)?])
            }
            op => Err(OnAirError::protocol(format!(
                "op code {} is not accepted from clients",
                op as u8
            ))),
        }
    }

    fn identify(&mut self, d: &Value) -> OnAirResult<Envelope> {
        let requested = match d.get("rpcVersion") {
            None => RPC_VERSION,
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| OnAirError::protocol("rpcVersion must be an integer"))?,
        };
        if requested != RPC_VERSION {
            return Err(OnAirError::protocol(format!(
                "unsupported rpc version {requested}"
            )));
        }
        self.negotiated_rpc = Some(requested);
        tracing::debug!(rpc = requested, "protocol client identified");
        Ok(Envelope::new(
            OpCode::Identified,
            json!({ "negotiatedRpcVersion": requested }),
        ))
    }

    fn request(&mut self, studio: &mut Studio, d: &Value, now_ms: f64) -> OnAirResult<Envelope> {
        let request_id = d
            .get("requestId")
            .and_then(Value::as_str)
            .ok_or_else(|| OnAirError::protocol("request is missing requestId"))?;
        let request_type = d.get("requestType").and_then(Value::as_str);
        let empty = Value::Object(Map::new());
        let data = d.get("requestData").unwrap_or(&empty);

        let handled = match request_type {
            None => Err(RequestStatus::fail(
                status::MISSING_REQUEST_TYPE,
                "request is missing requestType",
            )),
            Some(name) => match RequestType::parse(name) {
                Some(rt) => handle_request(studio, rt, data, now_ms),
                None => Err(RequestStatus::fail(
                    status::UNKNOWN_REQUEST_TYPE,
                    format!("unknown request type '{name}'"),
                )),
            },
        };

        let (status, response_data) = match handled {
            Ok(data) => (RequestStatus::ok(), data),
            Err(status) => {
                tracing::debug!(
                    request = request_type.unwrap_or(""),
                    code = status.code,
                    "request failed"
                );
                (status, None)
            }
        };
        let mut out = json!({
            "requestType": request_type.unwrap_or(""),
            "requestId": request_id,
            "requestStatus": status,
        });
        if let (Some(data), Some(obj)) = (response_data, out.as_object_mut()) {
            obj.insert("responseData".to_owned(), data);
        }
        Ok(Envelope::new(OpCode::RequestResponse, out))
    }
}

fn handle_request(studio: &mut Studio, rt: RequestType, data: &Value, now_ms: f64) -> Handled {
    match rt {
        RequestType::GetVersion => Ok(Some(json!({
            "obsVersion": OBS_VERSION,
            "obsWebSocketVersion": OBS_WEBSOCKET_VERSION,
            "rpcVersion": RPC_VERSION,
            "availableRequests": RequestType::ALL.map(RequestType::as_str),
            "supportedImageFormats": ["png", "jpg"],
            "platform": "web",
            "platformDescription": "onair studio",
        }))),
        RequestType::GetStats => {
            let stats = studio.stats();
            Ok(Some(json!({
                "cpuUsage": 0,
                "memoryUsage": 0,
                "availableDiskSpace": 0,
                "activeFps": stats.fps,
                "averageFrameRenderTime": stats.average_render_ms,
                "renderSkippedFrames": stats.dropped_frames,
                "renderTotalFrames": stats.total_frames,
                "outputSkippedFrames": 0,
                "outputTotalFrames": stats.total_frames,
            })))
        }
        RequestType::GetSceneList => {
            let scenes: Vec<Value> = studio
                .scenes()
                .scenes()
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    json!({ "sceneIndex": i, "sceneName": s.name, "sceneUuid": s.id.as_str() })
                })
                .collect();
            let preview = studio
                .preview_scene_id()
                .filter(|_| studio.studio_mode())
                .and_then(|id| studio.scene(id))
                .map(|s| s.name.clone());
            let current = studio.current_scene();
            Ok(Some(json!({
                "currentProgramSceneName": current.map(|s| s.name.as_str()),
                "currentProgramSceneUuid": current.map(|s| s.id.as_str()),
                "currentPreviewSceneName": preview,
                "scenes": scenes,
            })))
        }
        RequestType::GetCurrentProgramScene => {
            let current = studio.current_scene();
            let name = current.map(|s| s.name.as_str());
            let uuid = current.map(|s| s.id.as_str());
            Ok(Some(json!({
                "sceneName": name,
                "sceneUuid": uuid,
                "currentProgramSceneName": name,
                "currentProgramSceneUuid": uuid,
            })))
        }
        RequestType::SetCurrentProgramScene => {
            let id = scene_from_request(studio, data)?;
            studio
                .switch_scene(&id, true, now_ms)
                .map_err(|e| RequestStatus::fail(status::REQUEST_PROCESSING_FAILED, e.to_string()))?;
            Ok(None)
        }
        RequestType::StartRecord => {
            if studio.recorder().is_active() {
                return Err(RequestStatus::fail(status::OUTPUT_RUNNING, "recording is already active"));
            }
            studio.start_recording(now_ms).map_err(processing_failed)?;
            Ok(None)
        }
        RequestType::StopRecord => {
            if !studio.recorder().is_active() {
                return Err(RequestStatus::fail(status::OUTPUT_NOT_RUNNING, "recording is not active"));
            }
            let name = studio.finish_recording().map_err(processing_failed)?;
            Ok(Some(json!({ "outputPath": name })))
        }
        RequestType::StartStream => {
            if studio.stream().is_active() {
                return Err(RequestStatus::fail(status::OUTPUT_RUNNING, "stream is already active"));
            }
            studio.start_streaming(now_ms).map_err(processing_failed)?;
            Ok(None)
        }
        RequestType::StopStream => {
            if !studio.stream().is_active() {
                return Err(RequestStatus::fail(status::OUTPUT_NOT_RUNNING, "stream is not active"));
            }
            studio.stop_streaming().map_err(processing_failed)?;
            Ok(None)
        }
    }
}

fn processing_failed(e: OnAirError) -> RequestStatus {
    RequestStatus::fail(status::REQUEST_PROCESSING_FAILED, e.to_string())
}

/// Resolve `sceneName` or `sceneUuid` from request data.
fn scene_from_request(studio: &Studio, data: &Value) -> Result<SceneId, RequestStatus> {
    if let Some(uuid) = string_field(data, "sceneUuid")? {
        let id = SceneId::from(uuid);
        return match studio.scene(&id) {
            Some(_) => Ok(id),
            None => Err(RequestStatus::fail(
                status::RESOURCE_NOT_FOUND,
                format!("no scene with uuid '{uuid}'"),
            )),
        };
    }
    let Some(name) = string_field(data, "sceneName")? else {
        return Err(RequestStatus::fail(
            status::MISSING_REQUEST_FIELD,
            "sceneName or sceneUuid is required",
        ));
    };
    studio
        .scenes()
        .by_name(name)
        .map(|s| s.id.clone())
        .ok_or_else(|| {
            RequestStatus::fail(
                status::RESOURCE_NOT_FOUND,
                format!("no scene named '{name}'"),
            )
        })
}

fn string_field<'a>(data: &'a Value, key: &str) -> Result<Option<&'a str>, RequestStatus> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(RequestStatus::fail(
            status::INVALID_REQUEST_FIELD_TYPE,
            format!("{key} must be a string"),
        )),
    }
}

/// Event message for `event`.
pub fn event_message(event: &StudioEvent) -> Envelope {
    Envelope::new(
        OpCode::Event,
        json!({
            "eventType": event.event_type(),
            "eventIntent": 1,
            "eventData": event.event_data(),
        }),
    )
}

/// Drain the studio's pending events as protocol messages.
pub fn drain_events(studio: &mut Studio) -> Vec<Envelope> {
    studio.take_events().iter().map(event_message).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/protocol/rpc.rs"]
mod tests;
