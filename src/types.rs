use serde::{Deserialize, Serialize};

/// Store-generated keys
pub type RoomId = i64;
pub type SubmissionId = i64;

/// Short join code shown to participants
pub type RoomCode = String;

/// Session id for an open room view
pub type ViewId = String;

/// Minimum number of ranked items a list must carry
pub const DEFAULT_MIN_LIST_ITEMS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub code: RoomCode,
    /// Participant roster, fixed at creation
    pub names: Vec<String>,
}

impl Room {
    pub fn has_participant(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// A room as it is written to the store (id is generated there)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRoom {
    pub code: RoomCode,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: SubmissionId,
    pub room_id: RoomId,
    pub name: String,
    /// Ranked items, best first
    pub games: Vec<String>,
}

/// Upsert payload; `(room_id, name)` is the conflict key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSubmission {
    pub room_id: RoomId,
    pub name: String,
    pub games: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewPhase {
    LoadingRoom,
    LoadingSubmissions,
    AwaitingSubmissions,
    AllSubmitted,
    Revealed,
}
