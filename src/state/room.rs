use super::{parse_lines, AppState};
use crate::error::AppError;
use crate::store::StoreError;
use crate::types::*;
use rand::Rng;

/// Base-36 alphabet for room codes
const CODE_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const CODE_LENGTH: usize = 6;
/// Give up after this many codes turn out to be taken
const MAX_CODE_ATTEMPTS: usize = 8;

/// Generate a random room code (6 base-36 characters)
fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

impl AppState {
    /// Create a room from newline-separated participant names
    pub async fn create_room(&self, names_text: &str) -> Result<RoomCode, AppError> {
        self.create_room_with(names_text, generate_room_code).await
    }

    async fn create_room_with<F>(&self, names_text: &str, mut next_code: F) -> Result<RoomCode, AppError>
    where
        F: FnMut() -> RoomCode,
    {
        let names = parse_lines(names_text);
        if names.is_empty() {
            return Err(AppError::Validation("Enter at least one name".to_string()));
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = next_code();
            if self.store.code_exists(&code).await? {
                tracing::debug!("Room code {} taken (attempt {})", code, attempt);
                continue;
            }

            let new_room = NewRoom {
                code,
                names: names.clone(),
            };
            match self.store.insert_room(new_room).await {
                Ok(room) => {
                    tracing::info!(
                        "Created room {} with {} participants",
                        room.code,
                        room.names.len()
                    );
                    return Ok(room.code);
                }
                // Lost a race with another insert of the same code
                Err(StoreError::Conflict(e)) => {
                    tracing::warn!("Room code conflict on insert (attempt {}): {}", attempt, e);
                }
                Err(e) => {
                    tracing::error!("Failed to create room: {}", e);
                    return Err(e.into());
                }
            }
        }

        Err(StoreError::Conflict(format!(
            "no free room code after {} attempts",
            MAX_CODE_ATTEMPTS
        ))
        .into())
    }

    /// Fetch the single room with this code
    pub async fn get_room(&self, code: &str) -> Result<Room, AppError> {
        self.store
            .find_room_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Existence check never sees a taken code, as when another insert of the
    /// same code lands between check and insert
    struct RacingStore {
        inner: MemoryStore,
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl Store for RacingStore {
        async fn insert_room(&self, room: NewRoom) -> StoreResult<Room> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert_room(room).await
        }

        async fn find_room_by_code(&self, code: &str) -> StoreResult<Option<Room>> {
            self.inner.find_room_by_code(code).await
        }

        async fn list_submissions(&self, room_id: RoomId) -> StoreResult<Vec<Submission>> {
            self.inner.list_submissions(room_id).await
        }

        async fn upsert_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
            self.inner.upsert_submission(submission).await
        }

        fn name(&self) -> &str {
            "racing"
        }

        async fn code_exists(&self, _code: &str) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_generated_codes_are_base36() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[tokio::test]
    async fn test_create_room_keeps_trimmed_order() {
        let state = AppState::in_memory();
        let code = state
            .create_room("  Carol\n\nAlice  \n \nBob\n")
            .await
            .unwrap();

        let room = state.get_room(&code).await.unwrap();
        assert_eq!(room.names, vec!["Carol", "Alice", "Bob"]);
        assert_eq!(room.code, code);
    }

    #[tokio::test]
    async fn test_create_room_rejects_blank_input() {
        let state = AppState::in_memory();
        for input in ["", "   ", "\n\n", " \t \n  "] {
            let result = state.create_room(input).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_blank_input_never_calls_store() {
        let state = AppState::in_memory();
        let result = state
            .create_room_with("\n", || panic!("no code should be generated"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_taken_code_is_regenerated() {
        let state = AppState::in_memory();
        state
            .create_room_with("A", || "aaaaaa".to_string())
            .await
            .unwrap();

        let mut codes = vec!["bbbbbb".to_string(), "aaaaaa".to_string()];
        let code = state
            .create_room_with("B", || codes.pop().unwrap())
            .await
            .unwrap();
        assert_eq!(code, "bbbbbb");
        assert_eq!(state.get_room("aaaaaa").await.unwrap().names, vec!["A"]);
    }

    #[tokio::test]
    async fn test_gives_up_when_codes_keep_colliding() {
        let state = AppState::in_memory();
        state
            .create_room_with("A", || "aaaaaa".to_string())
            .await
            .unwrap();

        let result = state
            .create_room_with("B", || "aaaaaa".to_string())
            .await;
        assert!(matches!(
            result,
            Err(AppError::Storage(StoreError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn test_get_room_not_found() {
        let state = AppState::in_memory();
        let result = state.get_room("nope00").await;
        assert!(matches!(result, Err(AppError::NotFound(code)) if code == "nope00"));
    }

    #[tokio::test]
    async fn test_insert_conflict_is_regenerated() {
        let store = Arc::new(RacingStore {
            inner: MemoryStore::new(),
            inserts: AtomicUsize::new(0),
        });
        let state = AppState::new(store.clone());
        state
            .create_room_with("A", || "aaaaaa".to_string())
            .await
            .unwrap();

        let mut codes = vec!["bbbbbb".to_string(), "aaaaaa".to_string()];
        let code = state
            .create_room_with("B", || codes.pop().unwrap())
            .await
            .unwrap();

        assert_eq!(code, "bbbbbb");
        assert_eq!(store.inserts.load(Ordering::SeqCst), 3);
        assert_eq!(state.get_room("bbbbbb").await.unwrap().names, vec!["B"]);
        assert_eq!(state.get_room("aaaaaa").await.unwrap().names, vec!["A"]);
    }
}
