use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// In-process store with the same key constraints as the relational schema
pub struct MemoryStore {
    rooms: RwLock<HashMap<RoomId, Room>>,
    submissions: RwLock<HashMap<SubmissionId, Submission>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            submissions: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_room(&self, room: NewRoom) -> StoreResult<Room> {
        let mut rooms = self.rooms.write().await;
        if rooms.values().any(|r| r.code == room.code) {
            return Err(StoreError::Conflict(format!(
                "room code {} already exists",
                room.code
            )));
        }

        let room = Room {
            id: self.next_id(),
            code: room.code,
            names: room.names,
        };
        rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn find_room_by_code(&self, code: &str) -> StoreResult<Option<Room>> {
        let rooms = self.rooms.read().await;
        let matches: Vec<&Room> = rooms.values().filter(|r| r.code == code).collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0].clone())),
            count => Err(StoreError::Ambiguous {
                table: "rooms",
                count,
            }),
        }
    }

    async fn list_submissions(&self, room_id: RoomId) -> StoreResult<Vec<Submission>> {
        let mut list: Vec<Submission> = self
            .submissions
            .read()
            .await
            .values()
            .filter(|s| s.room_id == room_id)
            .cloned()
            .collect();
        list.sort_by_key(|s| s.id);
        Ok(list)
    }

    async fn upsert_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
        if !self.rooms.read().await.contains_key(&submission.room_id) {
            return Err(StoreError::Rejected(format!(
                "room {} does not exist",
                submission.room_id
            )));
        }

        let mut submissions = self.submissions.write().await;
        if let Some(existing) = submissions
            .values_mut()
            .find(|s| s.room_id == submission.room_id && s.name == submission.name)
        {
            existing.games = submission.games;
            return Ok(existing.clone());
        }

        let stored = Submission {
            id: self.next_id(),
            room_id: submission.room_id,
            name: submission.name,
            games: submission.games,
        };
        submissions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
