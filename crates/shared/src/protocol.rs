//! JSON payloads exchanged with the participant bridge and the robot
//! control endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSessionRequest {
    pub join_url: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSessionResponse {
    pub session_id: String,
}

/// Snapshot of the participants list as scraped by the bridge.
///
/// `raised_hands` is signed on the wire so a misbehaving bridge surfaces
/// as an invalid count instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaisedHandsReport {
    pub raised_hands: i64,
    #[serde(default)]
    pub meeting_ended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoMoveRequest {
    pub angle: u32,
}
