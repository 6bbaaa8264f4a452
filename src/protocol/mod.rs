/// obs-websocket 5 compatible request/event handling.
pub mod rpc;
