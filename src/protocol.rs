//! Request and response bodies of the HTTP API.

use crate::types::*;
use crate::view::SubmitDraft;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// Participant names, one per line
    pub names: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: RoomCode,
    /// Where the client should navigate next
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub names: Vec<String>,
}

impl From<Room> for RoomInfo {
    fn from(room: Room) -> Self {
        Self {
            code: room.code,
            names: room.names,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitListRequest {
    pub name: String,
    /// Ranked games, one per line
    pub games: String,
}

/// Submission progress without any list contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStatus {
    pub code: RoomCode,
    pub roster: Vec<String>,
    pub remaining: Vec<String>,
    pub all_submitted: bool,
}

/// One list as shown in a view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListCard {
    pub label: String,
    pub games: Vec<String>,
    /// Only set once authors are revealed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl ListCard {
    pub fn byline(&self) -> Option<String> {
        self.author.as_ref().map(|name| format!("By: {}", name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub view_id: ViewId,
    pub code: RoomCode,
    pub phase: ViewPhase,
    pub roster: Vec<String>,
    pub remaining: Vec<String>,
    pub submitted_count: usize,
    pub lists: Vec<ListCard>,
    pub draft: SubmitDraft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub msg: String,
}

/// Failed view action: the error plus the view as it stands afterwards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewError {
    pub code: String,
    pub msg: String,
    pub view: ViewSnapshot,
}
